//! In-memory scale for playing without hardware.

use crate::scale::{Scale, ScaleError};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Reading {
    gross: f64,
    offset: f64,
    failures: u32,
}

/// Scale whose load is set by hand. Tare zeroes the current load.
#[derive(Debug, Default)]
pub struct SimulatedScale {
    reading: Mutex<Reading>,
}

impl SimulatedScale {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `grams` (total) on the scale.
    pub fn place(&self, grams: f64) {
        if let Ok(mut r) = self.reading.lock() {
            r.gross = grams;
        }
    }

    /// Make the next `count` operations fail like a flaky connection.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut r) = self.reading.lock() {
            r.failures = count;
        }
    }

    fn with_reading<T>(&self, f: impl FnOnce(&mut Reading) -> T) -> Result<T, ScaleError> {
        let mut r = self
            .reading
            .lock()
            .map_err(|_| ScaleError::Device("lock error".to_string()))?;
        if r.failures > 0 {
            r.failures -= 1;
            return Err(ScaleError::Transport("simulated timeout".to_string()));
        }
        Ok(f(&mut *r))
    }
}

#[async_trait]
impl Scale for SimulatedScale {
    async fn read_weight(&self) -> Result<f64, ScaleError> {
        self.with_reading(|r| r.gross - r.offset)
    }

    async fn tare(&self) -> Result<(), ScaleError> {
        self.with_reading(|r| r.offset = r.gross)
    }
}
