//! Scale adapter: the two operations the game needs, plus one-at-a-time access.

mod http;
mod simulated;

pub use http::{BatteryStatus, CalibrationStep, HttpScale};
pub use simulated::SimulatedScale;

use crate::logic::normalize_reading;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Errors from the scale or the pour station.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleError {
    /// Network or device failure; retry by repeating the action.
    Transport(String),
    /// The scale answered with an error message.
    Device(String),
    /// Another tare or measurement is still running.
    Busy,
    /// Measuring requires a tare first.
    NotTared,
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::Transport(msg) => write!(f, "Failed to reach scale: {}", msg),
            ScaleError::Device(msg) => write!(f, "Scale error: {}", msg),
            ScaleError::Busy => write!(f, "Scale is busy"),
            ScaleError::NotTared => write!(f, "Tare the scale before measuring"),
        }
    }
}

impl std::error::Error for ScaleError {}

/// A connected scale.
#[async_trait]
pub trait Scale: Send + Sync {
    /// Current weight in grams.
    async fn read_weight(&self) -> Result<f64, ScaleError>;
    async fn tare(&self) -> Result<(), ScaleError>;
}

/// The single scale at the table. Allows one tare or measurement at a time and requires a
/// tare before every measurement.
pub struct PourStation<S: Scale> {
    scale: S,
    tared: Mutex<bool>,
}

impl<S: Scale> PourStation<S> {
    pub fn new(scale: S) -> Self {
        Self {
            scale,
            tared: Mutex::new(false),
        }
    }

    pub fn scale(&self) -> &S {
        &self.scale
    }

    /// Whether the next measurement is allowed.
    pub fn is_tared(&self) -> bool {
        self.tared.try_lock().map(|g| *g).unwrap_or(false)
    }

    /// Zero the scale with the empty glass on it.
    pub async fn tare(&self) -> Result<(), ScaleError> {
        let mut tared = self.tared.try_lock().map_err(|_| ScaleError::Busy)?;
        *tared = false;
        self.scale.tare().await?;
        *tared = true;
        Ok(())
    }

    /// Read the poured weight. Consumes the tare, whether or not the read succeeds.
    pub async fn measure(&self) -> Result<f64, ScaleError> {
        let mut tared = self.tared.try_lock().map_err(|_| ScaleError::Busy)?;
        if !*tared {
            return Err(ScaleError::NotTared);
        }
        *tared = false;
        let weight = self.scale.read_weight().await?;
        Ok(normalize_reading(weight))
    }
}
