use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::MAX_UPLOAD_BYTES;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    pub server_url: String,
    pub predict_path: String,
    pub max_upload_bytes: u64,
    /// Unset means the request waits on the transport alone.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            predict_path: "/predict".into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Joins `predict_path` under `server_url`, keeping any path prefix of
    /// the base (`https://host/app` + `/predict` -> `https://host/app/predict`).
    pub fn predict_url(&self) -> anyhow::Result<Url> {
        let mut base = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(self.predict_path.trim_start_matches('/')).with_context(|| {
            format!(
                "cannot join predict path '{}' onto '{}'",
                self.predict_path, self.server_url
            )
        })
    }
}

pub fn load_settings_from_str(raw: &str) -> anyhow::Result<ClientSettings> {
    let settings: ClientSettings = toml::from_str(raw).context("failed to parse client settings")?;
    if settings.max_upload_bytes == 0 {
        anyhow::bail!("max_upload_bytes must be greater than zero");
    }
    Ok(settings)
}

/// Reads settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
    match fs::read_to_string(path) {
        Ok(raw) => load_settings_from_str(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ClientSettings::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read '{}'", path.display())),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
