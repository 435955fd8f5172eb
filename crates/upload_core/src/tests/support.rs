use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{Panel, PreviewImage, SelectedFile},
    error::TransportError,
    protocol::PredictionResponse,
};
use tokio::sync::{oneshot, Mutex};
use tracing_subscriber::EnvFilter;

use crate::{ClientSettings, HostUi, PredictionTransport, UploadController};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn png(len: usize) -> SelectedFile {
    SelectedFile::new("image/png", vec![0x89u8; len]).with_file_name("scan.png")
}

pub enum Scripted {
    Respond(PredictionResponse),
    Fail(TransportError),
    Hang,
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SelectedFile>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Holds the next request open until the returned sender fires.
    pub async fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().await = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn seen(&self) -> Vec<SelectedFile> {
        self.seen.lock().await.clone()
    }

    pub async fn wait_for_calls(&self, expected: usize) {
        while self.calls() < expected {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl PredictionTransport for ScriptedTransport {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().await.push(file.clone());

        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Network("script exhausted".into())),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct UiLog {
    pub preview: Option<String>,
    pub panels: HashMap<Panel, bool>,
    pub prediction: Option<(String, String)>,
    pub error_message: Option<String>,
    pub submit_enabled: bool,
    pub retry_visible: bool,
    pub status: Option<String>,
}

impl UiLog {
    pub fn visible(&self, panel: Panel) -> bool {
        self.panels.get(&panel).copied().unwrap_or(false)
    }
}

#[derive(Default)]
pub struct RecordingUi {
    log: StdMutex<UiLog>,
}

impl RecordingUi {
    pub fn log(&self) -> UiLog {
        self.log.lock().expect("ui log").clone()
    }

    fn update(&self, apply: impl FnOnce(&mut UiLog)) {
        apply(&mut self.log.lock().expect("ui log"));
    }
}

impl HostUi for RecordingUi {
    fn render_preview(&self, preview: &PreviewImage) {
        let data_url = preview.data_url.clone();
        self.update(|log| log.preview = Some(data_url));
    }

    fn clear_preview(&self) {
        self.update(|log| log.preview = None);
    }

    fn set_panel_visible(&self, panel: Panel, visible: bool) {
        self.update(|log| {
            log.panels.insert(panel, visible);
        });
    }

    fn show_prediction(&self, label: &str, display_class: &str) {
        let shown = (label.to_string(), display_class.to_string());
        self.update(|log| log.prediction = Some(shown));
    }

    fn show_error(&self, message: &str) {
        let message = message.to_string();
        self.update(|log| log.error_message = Some(message));
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.update(|log| log.submit_enabled = enabled);
    }

    fn set_retry_visible(&self, visible: bool) {
        self.update(|log| log.retry_visible = visible);
    }

    fn show_status(&self, message: &str) {
        let message = message.to_string();
        self.update(|log| log.status = Some(message));
    }
}

pub struct Harness {
    pub controller: Arc<UploadController>,
    pub transport: Arc<ScriptedTransport>,
    pub ui: Arc<RecordingUi>,
}

pub fn harness(script: impl IntoIterator<Item = Scripted>) -> Harness {
    harness_with_settings(ClientSettings::default(), script)
}

pub fn harness_with_settings(
    settings: ClientSettings,
    script: impl IntoIterator<Item = Scripted>,
) -> Harness {
    init_tracing();
    let transport = ScriptedTransport::new(script);
    let ui = Arc::new(RecordingUi::default());
    let controller = Arc::new(UploadController::new(
        settings,
        transport.clone(),
        ui.clone(),
    ));
    Harness {
        controller,
        transport,
        ui,
    }
}
