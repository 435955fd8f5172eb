//! Host UI collaborator and the adapter from host events to controller calls.

use std::sync::Arc;

use shared::{
    domain::{Panel, PreviewImage, SelectedFile, SelectionOrigin},
    error::UploadError,
    protocol::PredictionResponse,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

use crate::UploadController;

/// Operations the page exposes to the controller.
///
/// Calls are made while the controller holds its state lock, so
/// implementations must not call back into the controller.
pub trait HostUi: Send + Sync {
    fn render_preview(&self, preview: &PreviewImage);
    fn clear_preview(&self);
    fn set_panel_visible(&self, panel: Panel, visible: bool);
    fn show_prediction(&self, label: &str, display_class: &str);
    fn show_error(&self, message: &str);
    fn set_submit_enabled(&self, enabled: bool);
    fn set_retry_visible(&self, visible: bool);
    /// Transient status line outside the four panels.
    fn show_status(&self, message: &str);
}

/// A host without a surface; useful when only the state machine matters.
pub struct HeadlessHostUi;

impl HostUi for HeadlessHostUi {
    fn render_preview(&self, _preview: &PreviewImage) {}
    fn clear_preview(&self) {}
    fn set_panel_visible(&self, _panel: Panel, _visible: bool) {}
    fn show_prediction(&self, _label: &str, _display_class: &str) {}
    fn show_error(&self, _message: &str) {}
    fn set_submit_enabled(&self, _enabled: bool) {}
    fn set_retry_visible(&self, _visible: bool) {}
    fn show_status(&self, _message: &str) {}
}

/// DOM-level events the host forwards to the controller.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// The file input changed; `None` when it was emptied.
    FileSelected(Option<SelectedFile>),
    FilesDropped(Vec<SelectedFile>),
    FormSubmitted,
    RetryRequested,
    ResetRequested,
}

impl HostEvent {
    fn name(&self) -> &'static str {
        match self {
            HostEvent::FileSelected(_) => "file_selected",
            HostEvent::FilesDropped(_) => "files_dropped",
            HostEvent::FormSubmitted => "form_submitted",
            HostEvent::RetryRequested => "retry_requested",
            HostEvent::ResetRequested => "reset_requested",
        }
    }
}

pub type SubmissionHandle = JoinHandle<Result<PredictionResponse, UploadError>>;

/// Applies one host event. Submissions run on a spawned task so a later
/// selection can still reach the controller and cancel them.
pub async fn dispatch_host_event(
    controller: &Arc<UploadController>,
    event: HostEvent,
) -> Option<SubmissionHandle> {
    debug!(event = event.name(), "upload: host event");
    match event {
        HostEvent::FileSelected(Some(file)) => {
            let _ = controller.select_file(file).await;
            None
        }
        HostEvent::FileSelected(None) => {
            controller.clear_selection().await;
            None
        }
        HostEvent::FilesDropped(files) => {
            let Some(file) = files.into_iter().next() else {
                debug!("upload: empty drop ignored");
                return None;
            };
            let _ = controller
                .select_file_from(file, SelectionOrigin::Drop)
                .await;
            None
        }
        HostEvent::FormSubmitted => {
            let controller = Arc::clone(controller);
            Some(tokio::spawn(async move { controller.submit().await }))
        }
        HostEvent::RetryRequested => {
            let controller = Arc::clone(controller);
            Some(tokio::spawn(async move { controller.retry().await }))
        }
        HostEvent::ResetRequested => {
            controller.clear_selection().await;
            None
        }
    }
}

/// Drains host events until the sender side is dropped.
pub async fn run_event_loop(
    controller: Arc<UploadController>,
    mut events: mpsc::Receiver<HostEvent>,
) {
    info!("upload: event loop started");
    while let Some(event) = events.recv().await {
        // Outcomes are already rendered by the controller.
        let _ = dispatch_host_event(&controller, event).await;
    }
    info!("upload: event loop stopped");
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
