use serde::Serialize;

/// Number of values in a canonical pp vector.
pub const PP_VECTOR_LEN: usize = 4;

/// Accuracies (in percent) the canonical pp vector is computed at, in order.
pub const CANONICAL_ACCURACIES: [f64; PP_VECTOR_LEN] = [100.0, 99.0, 98.0, 95.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Standard,
    Taiko,
    Fruits,
    Mania,
}

impl GameMode {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(GameMode::Standard),
            1 => Some(GameMode::Taiko),
            2 => Some(GameMode::Fruits),
            3 => Some(GameMode::Mania),
            _ => None,
        }
    }
}

/// Star rating per game mode. Zero means the beatmap is not rated for that mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModeStars {
    pub standard: f64,
    pub taiko: f64,
    pub fruits: f64,
    pub mania: f64,
}

impl ModeStars {
    /// Ratings with only `mode` set to `stars`.
    pub fn single(mode: GameMode, stars: f64) -> Self {
        let mut ratings = ModeStars::default();
        ratings.set(mode, stars);
        ratings
    }

    pub fn get(&self, mode: GameMode) -> f64 {
        match mode {
            GameMode::Standard => self.standard,
            GameMode::Taiko => self.taiko,
            GameMode::Fruits => self.fruits,
            GameMode::Mania => self.mania,
        }
    }

    pub fn set(&mut self, mode: GameMode, stars: f64) {
        match mode {
            GameMode::Standard => self.standard = stars,
            GameMode::Taiko => self.taiko = stars,
            GameMode::Fruits => self.fruits = stars,
            GameMode::Mania => self.mania = stars,
        }
    }
}

/// Identity of a beatmap as known upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeatmapRef {
    pub beatmap_id: u32,
    pub checksum: String,
    pub set_id: u32,
}

/// Working beatmap entity of a single request.
#[derive(Clone, Debug, PartialEq)]
pub struct Beatmap {
    pub beatmap_id: u32,
    pub checksum: String,
    pub set_id: u32,
    pub song_name: String,
    /// Playable duration in seconds.
    pub hit_length: u32,
    pub stars: ModeStars,
    pub ar: f64,
    pub bpm: f64,
}

/// pp values at [`CANONICAL_ACCURACIES`] without mods.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PpVector([f64; PP_VECTOR_LEN]);

impl PpVector {
    pub const fn new(values: [f64; PP_VECTOR_LEN]) -> Self {
        PpVector(values)
    }

    /// All four values are zero. Such a vector was never computed and must not be served.
    pub fn is_unset(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl TryFrom<&[f64]> for PpVector {
    type Error = usize;

    /// Fails with the actual length when it is not [`PP_VECTOR_LEN`].
    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        <[f64; PP_VECTOR_LEN]>::try_from(values)
            .map(PpVector)
            .map_err(|_| values.len())
    }
}
