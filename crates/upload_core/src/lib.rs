use std::sync::Arc;

use shared::{
    domain::{Panel, PreviewImage, SelectedFile, SelectionOrigin, UiMode},
    error::{ErrorNotice, TransportError, UploadError},
    protocol::{Prediction, PredictionResponse},
};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

pub mod config;
pub mod host;
pub mod preview;
pub mod transport;

pub use config::{load_settings, load_settings_from_str, ClientSettings};
pub use host::{dispatch_host_event, run_event_loop, HeadlessHostUi, HostEvent, HostUi};
pub use transport::{HttpPredictionTransport, PredictionTransport};

#[derive(Default)]
struct ControllerState {
    mode: UiMode,
    file: Option<SelectedFile>,
    preview: Option<PreviewImage>,
    prediction: Option<Prediction>,
    error: Option<ErrorNotice>,
    retry_available: bool,
    busy: bool,
    /// Bumped on every selection change; responses for older generations are dropped.
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

impl ControllerState {
    fn cancel_in_flight(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
            info!(
                generation = self.generation,
                "upload: cancelled in-flight submission"
            );
        }
        self.busy = false;
    }

    fn clear(&mut self) {
        self.cancel_in_flight();
        self.mode = UiMode::Idle;
        self.file = None;
        self.preview = None;
        self.prediction = None;
        self.error = None;
        self.retry_available = false;
    }

    fn submit_enabled(&self) -> bool {
        self.file.is_some() && !self.busy
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            mode: self.mode,
            file: self.file.clone(),
            preview: self.preview.clone(),
            prediction: self.prediction.clone(),
            error: self.error.clone(),
            submit_enabled: self.submit_enabled(),
            retry_available: self.retry_available,
        }
    }
}

/// Point-in-time view of the controller, for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub mode: UiMode,
    pub file: Option<SelectedFile>,
    pub preview: Option<PreviewImage>,
    pub prediction: Option<Prediction>,
    pub error: Option<ErrorNotice>,
    pub submit_enabled: bool,
    pub retry_available: bool,
}

/// Drives the select, preview, submit and render flow for one upload form.
///
/// At most one submission is in flight. A new selection or a reset cancels
/// it and its late response is discarded.
pub struct UploadController {
    settings: ClientSettings,
    transport: Arc<dyn PredictionTransport>,
    ui: Arc<dyn HostUi>,
    inner: Mutex<ControllerState>,
}

impl UploadController {
    pub fn new(
        settings: ClientSettings,
        transport: Arc<dyn PredictionTransport>,
        ui: Arc<dyn HostUi>,
    ) -> Self {
        let controller = Self {
            settings,
            transport,
            ui,
            inner: Mutex::new(ControllerState::default()),
        };
        controller.ui.clear_preview();
        controller.render(&ControllerState::default());
        controller
    }

    /// Controller backed by the HTTP transport at `settings.predict_url()`.
    pub fn with_http_transport(
        settings: ClientSettings,
        ui: Arc<dyn HostUi>,
    ) -> anyhow::Result<Self> {
        let transport = HttpPredictionTransport::new(&settings)?;
        Ok(Self::new(settings, Arc::new(transport), ui))
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn mode(&self) -> UiMode {
        self.inner.lock().await.mode
    }

    pub async fn select_file(&self, file: SelectedFile) -> Result<PreviewImage, UploadError> {
        self.select_file_from(file, SelectionOrigin::Picker).await
    }

    /// Validates and stores `file`, replacing any previous selection.
    ///
    /// A rejected file leaves nothing submittable: the previous file and
    /// its preview are dropped and the error is shown.
    pub async fn select_file_from(
        &self,
        file: SelectedFile,
        origin: SelectionOrigin,
    ) -> Result<PreviewImage, UploadError> {
        let mut state = self.inner.lock().await;
        state.cancel_in_flight();

        if let Err(validation) = file.validate(self.settings.max_upload_bytes) {
            let error = UploadError::from_validation(validation, origin);
            warn!(
                media_type = file.media_type(),
                size_bytes = file.size_bytes(),
                ?origin,
                %error,
                "upload: selection rejected"
            );
            state.clear();
            self.ui.clear_preview();
            self.show_error(&mut state, &error);
            return Err(error);
        }

        let preview = preview::encode_preview(&file);
        info!(
            file_name = file.file_name().unwrap_or_default(),
            media_type = file.media_type(),
            size_bytes = file.size_bytes(),
            ?origin,
            "upload: file selected"
        );
        state.mode = UiMode::PreviewReady;
        state.file = Some(file);
        state.preview = Some(preview.clone());
        state.prediction = None;
        state.error = None;
        state.retry_available = false;
        self.ui.render_preview(&preview);
        self.render(&state);
        Ok(preview)
    }

    /// Returns to `Idle`, dropping the file, preview, result and error.
    pub async fn clear_selection(&self) {
        let mut state = self.inner.lock().await;
        state.clear();
        info!("upload: selection cleared");
        self.ui.clear_preview();
        self.render(&state);
    }

    /// Sends the selected file for prediction and renders the outcome.
    pub async fn submit(&self) -> Result<PredictionResponse, UploadError> {
        let (file, generation, cancel_rx) = {
            let mut state = self.inner.lock().await;
            if state.busy {
                warn!("upload: submit ignored; a submission is already in flight");
                return Err(self.refuse_while_busy());
            }
            let Some(file) = state.file.clone() else {
                let error = UploadError::NoFileSelected;
                warn!("upload: submit without a selected file");
                self.show_error(&mut state, &error);
                return Err(error);
            };

            let (cancel_tx, cancel_rx) = oneshot::channel();
            state.cancel = Some(cancel_tx);
            state.busy = true;
            state.mode = UiMode::Submitting;
            state.prediction = None;
            state.error = None;
            state.retry_available = false;
            self.render(&state);
            (file, state.generation, cancel_rx)
        };

        info!(
            generation,
            media_type = file.media_type(),
            size_bytes = file.size_bytes(),
            "upload: submitting file for prediction"
        );
        let outcome = self.request_prediction(&file, cancel_rx).await;

        let mut state = self.inner.lock().await;
        if state.generation != generation || matches!(outcome, Err(UploadError::Cancelled)) {
            debug!(generation, "upload: discarding outcome of superseded submission");
            return Err(UploadError::Cancelled);
        }
        state.busy = false;
        state.cancel = None;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => return Err(self.fail_submission(&mut state, error)),
        };
        match response.clone().into_outcome() {
            Ok(prediction) => {
                info!(label = %prediction.label, "upload: prediction received");
                self.ui
                    .show_prediction(&prediction.label, &prediction.display_class());
                state.mode = UiMode::ResultReady;
                state.prediction = Some(prediction);
                self.render(&state);
                Ok(response)
            }
            Err(error) => Err(self.fail_submission(&mut state, error)),
        }
    }

    /// Resubmits the held file after a failed submission.
    pub async fn retry(&self) -> Result<PredictionResponse, UploadError> {
        {
            let state = self.inner.lock().await;
            if state.busy {
                warn!("upload: retry ignored; a submission is already in flight");
                return Err(self.refuse_while_busy());
            }
            if state.mode != UiMode::ErrorShown || !state.retry_available || state.file.is_none()
            {
                warn!(mode = ?state.mode, "upload: nothing to retry");
                return Err(UploadError::RetryUnavailable);
            }
        }
        info!("upload: retrying submission");
        self.submit().await
    }

    async fn request_prediction(
        &self,
        file: &SelectedFile,
        cancel_rx: oneshot::Receiver<()>,
    ) -> Result<PredictionResponse, UploadError> {
        let request = async {
            match self.settings.request_timeout() {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.transport.predict(file)).await {
                        Ok(result) => result,
                        Err(_) => Err(TransportError::Timeout {
                            after_secs: limit.as_secs(),
                        }),
                    }
                }
                None => self.transport.predict(file).await,
            }
        };

        tokio::select! {
            result = request => result.map_err(UploadError::from),
            _ = cancel_rx => Err(UploadError::Cancelled),
        }
    }

    /// The loading panel stays up, so the refusal goes to the status line.
    fn refuse_while_busy(&self) -> UploadError {
        let error = UploadError::AlreadySubmitting;
        self.ui.show_status(&error.user_message());
        error
    }

    fn fail_submission(&self, state: &mut ControllerState, error: UploadError) -> UploadError {
        warn!(kind = ?error.kind(), %error, "upload: submission failed");
        state.retry_available = error.is_retryable() && state.file.is_some();
        state.mode = UiMode::ErrorShown;
        self.show_error(state, &error);
        error
    }

    fn show_error(&self, state: &mut ControllerState, error: &UploadError) {
        let notice = ErrorNotice::from(error);
        self.ui.show_error(&notice.message);
        state.error = Some(notice);
        self.render(state);
    }

    /// Pushes panel visibility and control state derived from `state`.
    fn render(&self, state: &ControllerState) {
        self.ui
            .set_panel_visible(Panel::Preview, state.preview.is_some());
        self.ui
            .set_panel_visible(Panel::Loading, state.mode == UiMode::Submitting);
        self.ui
            .set_panel_visible(Panel::Results, state.mode == UiMode::ResultReady);
        self.ui
            .set_panel_visible(Panel::Error, state.error.is_some());
        self.ui.set_submit_enabled(state.submit_enabled());
        self.ui.set_retry_visible(state.retry_available);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
