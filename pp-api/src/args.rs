use crate::beatmap::GameMode;
use crate::errors::PpError;
use std::collections::HashMap;
use std::str::FromStr;

/// Caller intent of a pp request.
#[derive(Clone, Debug, PartialEq)]
pub struct PpRequest {
    pub beatmap_id: u32,
    pub mods: u32,
    /// `None` when the caller sent a mode id that is not a known game mode.
    pub mode: Option<GameMode>,
    /// `None` when no accuracy was given. Negative values are treated as absent.
    pub accuracy: Option<f64>,
}

impl PpRequest {
    /// Validates the `b`, `m`, `g` and `a` query parameters.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, PpError> {
        let beatmap_id = params
            .get("b")
            .ok_or(PpError::InvalidArguments)
            .and_then(|b| parse_digits(b))?;

        let mods = params.get("m").map(|m| parse_digits(m)).transpose()?;
        let mode = params.get("g").map(|g| parse_digits(g)).transpose()?;

        let accuracy = params
            .get("a")
            .map(|a| {
                f64::from_str(a.trim())
                    .ok()
                    .filter(|a| a.is_finite())
                    .ok_or(PpError::InvalidArguments)
            })
            .transpose()?
            .filter(|a| *a >= 0.0);

        Ok(PpRequest {
            beatmap_id,
            mods: mods.unwrap_or(0),
            mode: GameMode::from_id(mode.unwrap_or(0)),
            accuracy,
        })
    }

    /// No mods and no accuracy: the only condition whose pp vector is cached.
    pub fn is_canonical(&self) -> bool {
        self.mods == 0 && self.accuracy.is_none()
    }
}

// Only plain digit strings are accepted, no sign and no whitespace.
fn parse_digits(value: &str) -> Result<u32, PpError> {
    if value.is_empty() || !value.bytes().all(|c| c.is_ascii_digit()) {
        return Err(PpError::InvalidArguments);
    }
    value.parse().map_err(|_| PpError::InvalidArguments)
}
