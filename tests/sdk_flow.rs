use std::collections::BTreeMap;
use std::time::Duration;

use debugattor::api::{ApiClient, StepStatus};
use debugattor::{ImageInput, Loggable, PixelArray, PixelData, Tracker};
use httpmock::{
    Method::{DELETE, GET, POST},
    MockServer,
};
use serde_json::{Value, json};

fn tracker_for(server: &MockServer) -> Tracker {
    let client = ApiClient::new(&server.url("/api"), Duration::from_secs(5)).expect("client");
    Tracker::with_client(client)
}

#[derive(Debug)]
struct Detection {
    label: String,
    score: f64,
}

impl Loggable for Detection {
    fn record(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        Some(vec![
            ("label", &self.label as &dyn Loggable),
            ("score", &self.score as &dyn Loggable),
        ])
    }
}

#[tokio::test]
async fn records_full_execution() {
    let server = MockServer::start_async().await;

    let start = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/executions");
            then.status(201).json_body(json!({
                "id": "exec-1",
                "startedAt": "2025-09-28T01:45:19Z",
                "finishedAt": null,
                "steps": []
            }));
        })
        .await;
    let add_step = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps")
                .json_body(json!({"name": "loading images"}));
            then.status(201)
                .json_body(json!({"id": "step-1", "name": "loading images", "status": "RUNNING"}));
        })
        .await;
    let text_log = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps/step-1/artifacts")
                .json_body(json!({"type": "LOG", "content": "Loaded 3 images"}));
            then.status(201).json_body(json!({"id": "artifact-1"}));
        })
        .await;
    let summary_content = json!({
        "best": {"label": "circle", "score": 0.75},
        "count": 3
    })
    .to_string();
    let json_log = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps/step-1/artifacts")
                .json_body(json!({"type": "JSON_DATA", "content": summary_content}));
            then.status(201).json_body(json!({"id": "artifact-2"}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps/step-1/artifacts/upload")
                .body_contains("Cyan rectangle")
                .body_contains("IMAGE");
            then.status(201).json_body(json!({"id": "artifact-3"}));
        })
        .await;
    let complete_step = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps/step-1/complete");
            then.status(200);
        })
        .await;
    let complete_execution = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/executions/exec-1/complete");
            then.status(200);
        })
        .await;

    let tracker = tracker_for(&server);
    let execution_id = tracker.start_execution().await.expect("execution id");
    assert_eq!(execution_id, "exec-1");

    let step_id = tracker
        .add_step(&execution_id, "loading images")
        .await
        .expect("step id");
    assert_eq!(step_id, "step-1");

    assert!(
        tracker
            .log_text_artifact(&execution_id, &step_id, "Loaded 3 images")
            .await
    );

    let mut summary: BTreeMap<String, Box<dyn Loggable>> = BTreeMap::new();
    summary.insert("count".into(), Box::new(3_u32));
    summary.insert(
        "best".into(),
        Box::new(Detection {
            label: "circle".into(),
            score: 0.75,
        }),
    );
    assert!(
        tracker
            .log_json_artifact(&execution_id, &step_id, &summary)
            .await
    );

    let mut data = vec![0_u8; 50 * 80 * 3];
    for pixel in data.chunks_exact_mut(3) {
        pixel.copy_from_slice(&[255, 255, 0]);
    }
    let array = PixelArray::new(50, 80, 3, PixelData::U8(data)).expect("array");
    assert!(
        tracker
            .log_image_artifact(&execution_id, &step_id, array.into(), "Cyan rectangle", None)
            .await
    );

    assert!(tracker.complete_step(&execution_id, &step_id).await);
    assert!(tracker.complete_execution(&execution_id).await);

    start.assert_async().await;
    add_step.assert_async().await;
    text_log.assert_async().await;
    json_log.assert_async().await;
    upload.assert_async().await;
    complete_step.assert_async().await;
    complete_execution.assert_async().await;
}

#[tokio::test]
async fn json_payload_matches_normalized_value() {
    let server = MockServer::start_async().await;
    let detection = Detection {
        label: "circle".into(),
        score: 0.5,
    };
    let content = json!({"label": "circle", "score": 0.5}).to_string();

    let mock = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/api/executions/exec-1/steps/step-1/artifacts")
                .json_body(json!({"type": "JSON_DATA", "content": content}));
            then.status(201);
        })
        .await;

    assert!(
        tracker_for(&server)
            .log_json_artifact("exec-1", "step-1", &detection)
            .await
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_image_file_sends_nothing() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(201);
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let input = ImageInput::from(dir.path().join("nonexistent.jpg"));
    assert!(
        !tracker_for(&server)
            .log_image_artifact("exec-1", "step-1", input, "Missing", None)
            .await
    );
    assert_eq!(upload.hits_async().await, 0);
}

#[tokio::test]
async fn server_errors_are_reported_not_raised() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(500).body("boom");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/executions");
            then.status(503);
        })
        .await;

    let tracker = tracker_for(&server);
    assert!(tracker.start_execution().await.is_none());
    assert!(tracker.add_step("exec-1", "step").await.is_none());
    assert!(!tracker.complete_step("exec-1", "step-1").await);
    assert!(!tracker.log_text_artifact("exec-1", "step-1", "msg").await);
    assert!(!tracker.fail_execution("exec-1").await);
    assert!(tracker.fetch_executions().await.is_none());
}

#[tokio::test]
async fn step_without_id_is_a_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/executions/exec-1/steps");
            then.status(201).json_body(json!({"name": "orphan"}));
        })
        .await;

    assert!(
        tracker_for(&server)
            .add_step("exec-1", "orphan")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn reads_and_deletes_executions() {
    let server = MockServer::start_async().await;
    let listing: Value = json!([{
        "id": "exec-1",
        "startedAt": "2025-09-28T01:45:19Z",
        "finishedAt": null,
        "steps": [{
            "id": "step-1",
            "name": "loading images",
            "status": "COMPLETED",
            "artifacts": null
        }]
    }]);
    let single = listing[0].clone();

    server
        .mock_async(move |when, then| {
            when.method(GET).path("/api/executions");
            then.status(200).json_body(listing);
        })
        .await;
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/api/executions/exec-1");
            then.status(200).json_body(single);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/executions/unknown");
            then.status(404);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/executions/exec-1");
            then.status(204);
        })
        .await;

    let tracker = tracker_for(&server);
    let executions = tracker.fetch_executions().await.expect("listing");
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].steps[0].status, Some(StepStatus::Completed));
    assert!(executions[0].steps[0].artifacts.is_empty());

    let execution = tracker.get_execution("exec-1").await.expect("execution");
    assert_eq!(execution.id, "exec-1");
    assert!(tracker.get_execution("unknown").await.is_none());

    assert!(tracker.delete_execution("exec-1").await);
    delete.assert_async().await;
}
