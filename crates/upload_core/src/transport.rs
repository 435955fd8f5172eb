use async_trait::async_trait;
use reqwest::{multipart, Client};
use shared::{domain::SelectedFile, error::TransportError, protocol::PredictionResponse};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientSettings;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Issues the single outbound prediction request for a file.
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResponse, TransportError>;
}

pub struct HttpPredictionTransport {
    http: Client,
    predict_url: Url,
}

impl HttpPredictionTransport {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        Ok(Self::with_client(Client::new(), settings.predict_url()?))
    }

    pub fn with_client(http: Client, predict_url: Url) -> Self {
        Self { http, predict_url }
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

/// Name sent with the part when the host did not supply one; the service
/// keys its format check off the extension.
fn upload_file_name(file: &SelectedFile) -> String {
    if let Some(name) = file.file_name().filter(|name| !name.trim().is_empty()) {
        return name.to_string();
    }
    let subtype = file
        .media_type()
        .split_once('/')
        .map(|(_, subtype)| subtype.split(';').next().unwrap_or_default().trim())
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or("bin");
    format!("upload.{}", subtype.to_ascii_lowercase())
}

fn file_part(file: &SelectedFile) -> multipart::Part {
    let file_name = upload_file_name(file);
    let part = multipart::Part::bytes(file.bytes().to_vec()).file_name(file_name.clone());
    match part.mime_str(file.media_type()) {
        Ok(part) => part,
        Err(error) => {
            warn!(
                media_type = file.media_type(),
                %error,
                "upload: media type not sendable; omitting content type"
            );
            multipart::Part::bytes(file.bytes().to_vec()).file_name(file_name)
        }
    }
}

fn network_error(error: reqwest::Error) -> TransportError {
    TransportError::Network(error.to_string())
}

#[async_trait]
impl PredictionTransport for HttpPredictionTransport {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResponse, TransportError> {
        let form = multipart::Form::new().part(FILE_FIELD, file_part(file));
        let response = self
            .http
            .post(self.predict_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        // Error statuses still carry a JSON body with the server's message.
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;
        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            "upload: prediction response received"
        );
        PredictionResponse::from_json_slice(&body)
    }
}
