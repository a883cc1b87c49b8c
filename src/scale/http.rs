//! HTTP client for the scale service (`/weight`, `/tare`, `/battery`, `/calibrate`, `/reset`).

use crate::scale::{Scale, ScaleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct WeightResponse {
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TareResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Battery state as reported by the scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub voltage: f64,
    pub capacity: f64,
    pub is_plugged: bool,
    pub is_low: bool,
    pub is_full: bool,
}

/// Calibration step: 1 zero point, 2 known weight placed, 3 final tare.
#[derive(Clone, Debug, Serialize)]
pub struct CalibrationStep {
    pub step: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Scale reached over HTTP.
#[derive(Clone)]
pub struct HttpScale {
    client: Client,
    base_url: String,
}

fn transport(e: reqwest::Error) -> ScaleError {
    ScaleError::Transport(e.to_string())
}

impl HttpScale {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ScaleError> {
        let client = Client::builder().timeout(timeout).build().map_err(transport)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn battery(&self) -> Result<BatteryStatus, ScaleError> {
        self.client
            .get(self.url("/battery"))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)
    }

    /// Run one calibration step; returns the instruction for the next one.
    pub async fn calibrate(&self, step: CalibrationStep) -> Result<String, ScaleError> {
        let response: MessageResponse = self
            .client
            .post(self.url("/calibrate"))
            .json(&step)
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        if response.success {
            Ok(response.message.unwrap_or_default())
        } else {
            Err(ScaleError::Device(
                response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "Calibration failed".to_string()),
            ))
        }
    }

    /// Drop the stored calibration and return to factory defaults.
    pub async fn reset(&self) -> Result<String, ScaleError> {
        let response: MessageResponse = self
            .client
            .post(self.url("/reset"))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        if response.success {
            Ok(response.message.unwrap_or_default())
        } else {
            Err(ScaleError::Device(
                response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "Failed to reset scale".to_string()),
            ))
        }
    }
}

#[async_trait]
impl Scale for HttpScale {
    async fn read_weight(&self) -> Result<f64, ScaleError> {
        let response: WeightResponse = self
            .client
            .get(self.url("/weight"))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        match (response.weight, response.error) {
            (_, Some(error)) => Err(ScaleError::Device(error)),
            (Some(weight), None) => Ok(weight),
            (None, None) => Err(ScaleError::Device("Missing weight".to_string())),
        }
    }

    async fn tare(&self) -> Result<(), ScaleError> {
        let response: TareResponse = self
            .client
            .post(self.url("/tare"))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        if response.success {
            Ok(())
        } else {
            Err(ScaleError::Device(
                response.error.unwrap_or_else(|| "Failed to tare scale".to_string()),
            ))
        }
    }
}
