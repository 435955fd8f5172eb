use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TransportError, UploadError};

/// Body returned by `POST /predict`.
///
/// Error responses from the service carry only `error`, so a missing
/// `success` flag reads as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PredictionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Kept for forward compatibility; never rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
}

impl PredictionResponse {
    pub fn succeeded(prediction: impl Into<String>) -> Self {
        Self {
            success: true,
            prediction: Some(prediction.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Parses a response body, rejecting anything that is not a JSON object.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, TransportError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| TransportError::MalformedResponse(format!("body is not JSON: {e}")))?;
        if !value.is_object() {
            return Err(TransportError::MalformedResponse(
                "body is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| TransportError::MalformedResponse(format!("unexpected shape: {e}")))
    }

    /// Splits the response into a rendered prediction or the failure to show.
    pub fn into_outcome(self) -> Result<Prediction, UploadError> {
        if !self.success {
            return Err(UploadError::ServerReportedFailure {
                message: self.error,
            });
        }
        match self.prediction {
            Some(label) => Ok(Prediction {
                label,
                confidence: self.confidence,
            }),
            None => Err(TransportError::MalformedResponse(
                "success response without prediction".to_string(),
            )
            .into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
}

impl Prediction {
    /// CSS-style class for the result label, e.g. `prediction no-tumor`.
    pub fn display_class(&self) -> String {
        format!("prediction {}", self.label.to_lowercase().replacen(' ', "-", 1))
    }
}
