use super::*;
use crate::test_support::{harness, png, Scripted};
use shared::{domain::UiMode, error::ErrorKind, protocol::PredictionResponse};

#[tokio::test]
async fn empty_drop_is_ignored() {
    let h = harness([]);
    h.controller.select_file(png(8)).await.expect("select");

    let handle = dispatch_host_event(&h.controller, HostEvent::FilesDropped(Vec::new())).await;
    assert!(handle.is_none());
    assert_eq!(h.controller.mode().await, UiMode::PreviewReady);
}

#[tokio::test]
async fn non_image_drop_uses_drop_wording() {
    let h = harness([]);
    dispatch_host_event(
        &h.controller,
        HostEvent::FilesDropped(vec![
            SelectedFile::new("application/pdf", vec![1u8]),
            png(4),
        ]),
    )
    .await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.mode, UiMode::Idle);
    assert!(snapshot.file.is_none());
    let notice = snapshot.error.expect("notice");
    assert_eq!(notice.kind, ErrorKind::InvalidType);
    assert_eq!(notice.message, "Please drop a valid image file.");
}

#[tokio::test]
async fn dropped_image_takes_the_first_file() {
    let h = harness([]);
    let first = png(4).with_file_name("first.png");
    dispatch_host_event(
        &h.controller,
        HostEvent::FilesDropped(vec![first.clone(), png(6)]),
    )
    .await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.mode, UiMode::PreviewReady);
    assert_eq!(snapshot.file, Some(first));
}

#[tokio::test]
async fn emptied_file_input_clears_selection() {
    let h = harness([]);
    dispatch_host_event(&h.controller, HostEvent::FileSelected(Some(png(8)))).await;
    assert!(h.ui.log().visible(Panel::Preview));

    dispatch_host_event(&h.controller, HostEvent::FileSelected(None)).await;
    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.mode, UiMode::Idle);
    assert!(!snapshot.submit_enabled);
    assert!(!h.ui.log().visible(Panel::Preview));
}

#[tokio::test]
async fn form_submit_and_retry_events_run_submissions() {
    let h = harness([
        Scripted::Respond(PredictionResponse::failed("bad image")),
        Scripted::Respond(PredictionResponse::succeeded("Tumor")),
    ]);
    dispatch_host_event(&h.controller, HostEvent::FileSelected(Some(png(8)))).await;

    let submitted = dispatch_host_event(&h.controller, HostEvent::FormSubmitted)
        .await
        .expect("submission handle");
    let err = submitted.await.expect("join").expect_err("server failure");
    assert_eq!(err.user_message(), "bad image");

    let retried = dispatch_host_event(&h.controller, HostEvent::RetryRequested)
        .await
        .expect("retry handle");
    let response = retried.await.expect("join").expect("retry");
    assert_eq!(response.prediction.as_deref(), Some("Tumor"));
    assert_eq!(h.transport.calls(), 2);
}

#[tokio::test]
async fn event_loop_processes_events_in_order() {
    let h = harness([Scripted::Respond(PredictionResponse::succeeded("Glioma"))]);
    let (tx, rx) = mpsc::channel(8);
    let event_loop = tokio::spawn(run_event_loop(Arc::clone(&h.controller), rx));

    tx.send(HostEvent::FileSelected(Some(png(8))))
        .await
        .expect("send");
    tx.send(HostEvent::FormSubmitted).await.expect("send");
    h.transport.wait_for_calls(1).await;
    while h.controller.mode().await != UiMode::ResultReady {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        h.ui.log().prediction.map(|(label, _)| label),
        Some("Glioma".to_string())
    );

    tx.send(HostEvent::ResetRequested).await.expect("send");
    drop(tx);
    event_loop.await.expect("event loop");
    assert_eq!(h.controller.mode().await, UiMode::Idle);
}

#[tokio::test]
async fn submit_event_during_submission_reports_status() {
    let h = harness([Scripted::Respond(PredictionResponse::succeeded("Tumor"))]);
    dispatch_host_event(&h.controller, HostEvent::FileSelected(Some(png(8)))).await;
    let release = h.transport.hold_next().await;

    let first = dispatch_host_event(&h.controller, HostEvent::FormSubmitted)
        .await
        .expect("submission handle");
    h.transport.wait_for_calls(1).await;

    let second = dispatch_host_event(&h.controller, HostEvent::FormSubmitted)
        .await
        .expect("submission handle");
    assert_eq!(
        second.await.expect("join"),
        Err(UploadError::AlreadySubmitting)
    );
    assert_eq!(
        h.ui.log().status.as_deref(),
        Some("An analysis is already in progress.")
    );

    release.send(()).expect("release");
    first.await.expect("join").expect("submit");
    assert_eq!(h.transport.calls(), 1);
}
