use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SelectionOrigin;

pub const INVALID_TYPE_MESSAGE: &str = "Please select a valid image file.";
pub const INVALID_DROP_MESSAGE: &str = "Please drop a valid image file.";
pub const TOO_LARGE_MESSAGE: &str = "File size must be less than 10MB.";
pub const NO_FILE_SELECTED_MESSAGE: &str = "Please select an image file first.";
pub const ALREADY_SUBMITTING_MESSAGE: &str = "An analysis is already in progress.";
pub const RETRY_UNAVAILABLE_MESSAGE: &str = "Nothing to retry; select an image file first.";
pub const SERVER_FAILURE_FALLBACK_MESSAGE: &str = "An error occurred during analysis.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
pub const CANCELLED_MESSAGE: &str = "Analysis cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidType,
    TooLarge,
    NoFileSelected,
    AlreadySubmitting,
    RetryUnavailable,
    Transport,
    ServerReportedFailure,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("media type '{media_type}' is not an image")]
    InvalidType { media_type: String },
    #[error("file is {size_bytes} bytes, limit is {max_bytes}")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

/// The request could not be completed or its body was not a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("request timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("media type '{media_type}' is not an image")]
    InvalidType {
        media_type: String,
        origin: SelectionOrigin,
    },
    #[error("file is {size_bytes} bytes, limit is {max_bytes}")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
    #[error("no file selected")]
    NoFileSelected,
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("no failed submission to retry")]
    RetryUnavailable,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server reported failure: {}", .message.as_deref().unwrap_or("<no message>"))]
    ServerReportedFailure { message: Option<String> },
    #[error("submission cancelled by a newer selection")]
    Cancelled,
}

impl UploadError {
    pub fn from_validation(error: ValidationError, origin: SelectionOrigin) -> Self {
        match error {
            ValidationError::InvalidType { media_type } => Self::InvalidType { media_type, origin },
            ValidationError::TooLarge {
                size_bytes,
                max_bytes,
            } => Self::TooLarge {
                size_bytes,
                max_bytes,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::NoFileSelected => ErrorKind::NoFileSelected,
            Self::AlreadySubmitting => ErrorKind::AlreadySubmitting,
            Self::RetryUnavailable => ErrorKind::RetryUnavailable,
            Self::Transport(_) => ErrorKind::Transport,
            Self::ServerReportedFailure { .. } => ErrorKind::ServerReportedFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Failures of a submitted request, which may be retried with the same file.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ServerReportedFailure { .. }
        )
    }

    /// Text shown in the host's error panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidType {
                origin: SelectionOrigin::Picker,
                ..
            } => INVALID_TYPE_MESSAGE.to_string(),
            Self::InvalidType {
                origin: SelectionOrigin::Drop,
                ..
            } => INVALID_DROP_MESSAGE.to_string(),
            Self::TooLarge { .. } => TOO_LARGE_MESSAGE.to_string(),
            Self::NoFileSelected => NO_FILE_SELECTED_MESSAGE.to_string(),
            Self::AlreadySubmitting => ALREADY_SUBMITTING_MESSAGE.to_string(),
            Self::RetryUnavailable => RETRY_UNAVAILABLE_MESSAGE.to_string(),
            Self::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::ServerReportedFailure { message } => message
                .as_deref()
                .filter(|message| !message.is_empty())
                .unwrap_or(SERVER_FAILURE_FALLBACK_MESSAGE)
                .to_string(),
            Self::Cancelled => CANCELLED_MESSAGE.to_string(),
        }
    }
}

/// The error currently displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorNotice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&UploadError> for ErrorNotice {
    fn from(value: &UploadError) -> Self {
        Self::new(value.kind(), value.user_message())
    }
}
