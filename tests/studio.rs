mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    FakeBackend, MockBridge, Reply, completed, dead_backend_url, eventually, processing, test_config,
};
use spleeter_studio::Studio;
use spleeter_studio::backend::BackendStatus;
use spleeter_studio::common::models::{AudioFile, StemCount};
use spleeter_studio::task::models::TaskStatus;

async fn studio_for(backend_url: &str) -> (Studio, Arc<MockBridge>, AudioFile) {
    let bridge = MockBridge::running();
    let studio = Studio::new(&test_config(backend_url), bridge.clone()).unwrap();
    let file = studio.select_file("/music/demo-song.mp3").await.unwrap();
    (studio, bridge, file)
}

async fn wait_done(studio: &Studio) -> spleeter_studio::task::models::SeparationTask {
    tokio::time::timeout(Duration::from_secs(5), studio.wait_for_completion())
        .await
        .expect("任务没有结束")
        .expect("任务不存在")
}

#[tokio::test]
async fn test_successful_submission_adopts_server_id() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::ok(json!({"success": true, "task_id": "abc"})));
    backend.script_status(
        "abc",
        vec![
            processing(0.1, "Initializing separator..."),
            processing(0.2, "Separating audio tracks..."),
            processing(0.8, "Saving separated files..."),
            completed(&["/out/vocals.wav", "/out/drums.wav", "/out/bass.wav", "/out/other.wav"]),
        ],
    );
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Four)
        .await
        .unwrap();

    assert_eq!(task.id, "abc");
    assert_ne!(task.status, TaskStatus::Error);
    assert_eq!(studio.polling_task_id().as_deref(), Some("abc"));
    assert!(studio.is_processing());

    let done = wait_done(&studio).await;
    assert_eq!(done.id, "abc");
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.output_file_names().len(), 4);
    assert!(done.start_time.is_some());
    assert!(done.end_time.is_some());
    assert!(!studio.is_processing());
    assert_eq!(studio.backend_status(), BackendStatus::Connected);

    // 只轮询后端分配的ID
    assert_eq!(backend.total_status_hits(), backend.status_hits("abc"));

    let requests = backend.separate_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["input_path"], "/music/demo-song.mp3");
    assert_eq!(requests[0]["output_dir"], "/out");
    assert_eq!(requests[0]["stems"], 4);
}

#[tokio::test]
async fn test_rejected_submission_never_polls() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::ok(json!({"success": false, "message": "bad input"})));
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Two)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.error_message.as_deref(), Some("bad input"));
    assert!(task.end_time.is_some());
    assert!(!studio.is_processing());
    assert!(studio.polling_task_id().is_none());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.total_status_hits(), 0);
}

#[tokio::test]
async fn test_rejected_submission_without_message_uses_fallback() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::ok(json!({"success": false})));
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Two)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(
        task.error_message.as_deref(),
        Some("Separation task failed to start")
    );
}

#[tokio::test]
async fn test_http_error_body_becomes_message() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::Text(
        StatusCode::BAD_REQUEST,
        "Stems must be 2, 4, or 5".to_string(),
    ));
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Five)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.error_message.as_deref(), Some("Stems must be 2, 4, or 5"));
    assert_eq!(task.current_step.as_deref(), Some("Failed to start separation"));
    assert!(!studio.is_processing());
}

#[tokio::test]
async fn test_http_error_without_body_uses_fallback() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::Text(StatusCode::INTERNAL_SERVER_ERROR, String::new()));
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Two)
        .await
        .unwrap();

    assert_eq!(
        task.error_message.as_deref(),
        Some("Failed to start separation task")
    );
}

#[tokio::test]
async fn test_missing_task_id_keeps_provisional_id() {
    let backend = FakeBackend::start().await;
    backend.reply_separate(Reply::ok(json!({"success": true})));
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    let task = studio
        .start_separation(&file, "/out", StemCount::Two)
        .await
        .unwrap();

    assert!(task.id.starts_with("task_"));
    assert_eq!(studio.polling_task_id().as_deref(), Some(task.id.as_str()));
    assert!(eventually(Duration::from_secs(2), || backend.status_hits(&task.id) >= 1).await);

    studio.stop_polling();
}

#[tokio::test]
async fn test_unavailable_backend_fails_task() {
    let bridge = MockBridge::stopped();
    let studio = Studio::new(&test_config(&dead_backend_url().await), bridge.clone()).unwrap();
    let file = AudioFile::new("/music/demo-song.mp3", 1024);

    let task = studio
        .start_separation(&file, "/out", StemCount::Two)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert!(task.error_message.is_some());
    assert!(task.end_time.is_some());
    assert!(!studio.is_processing());
    assert_eq!(studio.backend_status(), BackendStatus::Disconnected);
    assert_eq!(bridge.starts(), 1);
}

#[tokio::test]
async fn test_new_poll_stops_previous_one() {
    let backend = FakeBackend::start().await;
    let (studio, _bridge, _file) = studio_for(&backend.base_url).await;

    studio.start_polling("first");
    assert!(eventually(Duration::from_secs(2), || backend.status_hits("first") >= 2).await);

    studio.start_polling("second");
    assert_eq!(studio.polling_task_id().as_deref(), Some("second"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let first_hits = backend.status_hits("first");
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(backend.status_hits("first"), first_hits);
    assert!(backend.status_hits("second") >= 2);

    studio.stop_polling();
}

#[tokio::test]
async fn test_dropping_studio_stops_polling() {
    let backend = FakeBackend::start().await;
    backend.script_status("abc", vec![processing(0.3, "Separating audio tracks...")]);
    let (studio, _bridge, _file) = studio_for(&backend.base_url).await;

    studio.start_polling("abc");
    assert!(eventually(Duration::from_secs(2), || backend.status_hits("abc") >= 2).await);
    drop(studio);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let hits = backend.status_hits("abc");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.status_hits("abc"), hits);
}

#[tokio::test]
async fn test_stop_polling_is_idempotent() {
    let backend = FakeBackend::start().await;
    let (studio, _bridge, _file) = studio_for(&backend.base_url).await;

    studio.stop_polling();
    studio.stop_polling();

    studio.start_polling("abc");
    studio.stop_polling();
    studio.stop_polling();
    assert!(studio.polling_task_id().is_none());
}

#[tokio::test]
async fn test_can_start_requires_inputs_and_idle() {
    let backend = FakeBackend::start().await;
    backend.script_status("abc", vec![processing(0.1, "Separating audio tracks...")]);
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    assert!(!studio.can_start(None, Some(Path::new("/out"))));
    assert!(!studio.can_start(Some(&file), None));
    assert!(!studio.can_start(Some(&file), Some(Path::new(""))));
    assert!(studio.can_start(Some(&file), Some(Path::new("/out"))));

    studio.start_separation(&file, "/out", StemCount::Two).await;
    assert!(!studio.can_start(Some(&file), Some(Path::new("/out"))));

    studio.stop_polling();
}

#[tokio::test]
async fn test_wait_for_completion_when_idle() {
    let backend = FakeBackend::start().await;
    let (studio, _bridge, _file) = studio_for(&backend.base_url).await;

    assert!(studio.wait_for_completion().await.is_none());
}

#[tokio::test]
async fn test_select_file_and_supplementary_endpoints() {
    let backend = FakeBackend::start().await;
    let (studio, _bridge, file) = studio_for(&backend.base_url).await;

    assert_eq!(file.name, "demo-song.mp3");
    assert_eq!(file.size, 5_242_880);

    let analysis = studio.analyze(&file).await.unwrap();
    assert!(analysis.success);
    assert_eq!(analysis.audio_info.file_path, "/music/demo-song.mp3");
    assert_eq!(analysis.audio_info.duration, 180.0);

    let models = studio.list_models().await.unwrap();
    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["2stems", "4stems", "5stems"]);
}
