use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest upload accepted by default (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const IMAGE_MEDIA_PREFIX: &str = "image/";

/// True when the media type names the `image/*` category.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .get(..IMAGE_MEDIA_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IMAGE_MEDIA_PREFIX))
}

/// A user-selected binary blob with its declared media type.
///
/// The bytes are reference counted so the controller can hand the same
/// blob to the transport on every (re)submission without copying it.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    file_name: Option<String>,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: None,
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }

    /// Checks the media type first, then the size against `max_bytes`.
    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationError> {
        if !self.is_image() {
            return Err(ValidationError::InvalidType {
                media_type: self.media_type.clone(),
            });
        }
        let size_bytes = self.size_bytes();
        if size_bytes > max_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes,
                max_bytes,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    #[default]
    Idle,
    PreviewReady,
    Submitting,
    ResultReady,
    ErrorShown,
}

/// Named visibility regions of the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Preview,
    Loading,
    Results,
    Error,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Preview, Panel::Loading, Panel::Results, Panel::Error];

    pub fn name(self) -> &'static str {
        match self {
            Panel::Preview => "preview",
            Panel::Loading => "loading",
            Panel::Results => "results",
            Panel::Error => "error",
        }
    }
}

/// Displayable preview of the selected image, encoded as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub media_type: String,
    pub data_url: String,
}

/// How a file reached the controller; only affects user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrigin {
    #[default]
    Picker,
    Drop,
}
