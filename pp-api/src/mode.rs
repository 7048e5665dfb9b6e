use crate::beatmap::{GameMode, ModeStars};

/// Picks the mode a standard request is actually for.
///
/// Beatmaps without a standard rating are mode specific. Ratings are scanned
/// taiko, fruits, mania and every non-zero one replaces the previous pick, so
/// the last rated mode in that order wins.
pub fn detect_mode(requested: GameMode, stars: &ModeStars) -> GameMode {
    if requested != GameMode::Standard || stars.standard != 0.0 {
        return requested;
    }

    let mut mode = requested;
    for candidate in [GameMode::Taiko, GameMode::Fruits, GameMode::Mania] {
        if stars.get(candidate) > 0.0 {
            mode = candidate;
        }
    }
    mode
}
