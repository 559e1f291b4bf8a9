use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use survey_coding_client::models::job::{CodingJob, JobStatus};
use survey_coding_client::models::project::Code;
use survey_coding_client::models::row::{Answer, QuestionRef, Row};
use survey_coding_client::services::api::{ApiError, CodingApiClient, Credentials};
use survey_coding_client::services::workflow::{WorkflowError, WorkflowRunner};

const MAX_POLL_ATTEMPTS: u32 = 5;

fn client_for(server: &MockServer) -> CodingApiClient {
    CodingApiClient::new(
        format!("{}/api", server.uri()),
        Credentials {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        },
    )
}

fn runner_for(server: &MockServer) -> WorkflowRunner {
    WorkflowRunner::new(
        client_for(server),
        Duration::from_millis(1),
        MAX_POLL_ATTEMPTS,
    )
}

fn codebook() -> Vec<Code> {
    vec![
        Code {
            id: 1,
            label: "Positive".to_string(),
            category: "SENTIMENT".to_string(),
        },
        Code {
            id: 20,
            label: "Negative".to_string(),
            category: "SENTIMENT".to_string(),
        },
    ]
}

fn created_project_body() -> serde_json::Value {
    json!({
        "id": 101,
        "name": "Feedback",
        "language": "en",
        "questions": [{"id": 7, "name": "Feedback"}]
    })
}

fn status_body(status: &str) -> serde_json::Value {
    json!({"id": 101, "status": status})
}

#[tokio::test]
async fn create_job_returns_pending_job_with_assigned_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/"))
        .and(query_param("request_training", "true"))
        .and(header("X-Api-Key", "key"))
        .and(header("X-Api-Secret", "secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_project_body()))
        .expect(1)
        .mount(&server)
        .await;

    let job = runner_for(&server)
        .create_job("Feedback", "en", codebook(), &["great product".to_string()])
        .await
        .unwrap();

    assert_eq!(job.project_id, 101);
    assert_eq!(job.question_ids, vec![7]);
    assert_eq!(job.status, JobStatus::Pending);
}

#[tokio::test]
async fn create_job_with_invalid_credentials_fails_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = runner_for(&server)
        .create_job("Feedback", "en", codebook(), &["great product".to_string()])
        .await
        .unwrap_err();

    match err {
        WorkflowError::Api(ApiError::Authentication(body)) => {
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected Authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_job_maps_rejected_payload_to_validation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("rows must not be empty"))
        .mount(&server)
        .await;

    let err = runner_for(&server)
        .create_job("Feedback", "en", codebook(), &["x".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Api(ApiError::Validation(_))));
}

#[tokio::test]
async fn poll_status_waits_until_done() {
    let server = MockServer::start().await;
    let calls = AtomicU32::new(0);

    Mock::given(method("GET"))
        .and(path("/api/projects/101/status"))
        .respond_with(move |_: &wiremock::Request| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                ResponseTemplate::new(200).set_body_json(status_body("processing"))
            } else {
                ResponseTemplate::new(200).set_body_json(status_body("done"))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let job = pending_job();
    let polled = runner_for(&server).poll_status(&job).await.unwrap();

    assert_eq!(polled.status, JobStatus::Done);
    assert_eq!(polled.project_id, job.project_id);
}

#[tokio::test]
async fn poll_status_surfaces_failed_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/101/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 101,
            "status": "failed",
            "error": "training diverged"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let polled = runner_for(&server).poll_status(&pending_job()).await.unwrap();

    assert_eq!(polled.status, JobStatus::Failed);
    assert_eq!(polled.error.as_deref(), Some("training diverged"));
}

#[tokio::test]
async fn empty_payload_fails_as_validation_before_any_request() {
    let server = MockServer::start().await;

    // No mock mounted: the empty payload must be rejected client-side.
    let err = runner_for(&server)
        .create_job("Feedback", "en", codebook(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Api(ApiError::Validation(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn poll_status_times_out_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/101/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("processing")))
        .expect(MAX_POLL_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let err = runner_for(&server).poll_status(&pending_job()).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Timeout {
            attempts: MAX_POLL_ATTEMPTS
        }
    ));
}

#[tokio::test]
async fn poll_status_does_not_sleep_after_final_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/101/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("processing")))
        .expect(2)
        .mount(&server)
        .await;

    let runner = WorkflowRunner::new(client_for(&server), Duration::from_millis(300), 2);

    let started = std::time::Instant::now();
    let err = runner.poll_status(&pending_job()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Timeout { attempts: 2 }));
    // Two attempts mean one sleep between them; a trailing sleep after the
    // final attempt would push this past 600ms.
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn two_row_payload_yields_exactly_two_result_entries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_project_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects/101/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("done")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/questions/7/codes-predicted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answers": [
                {"id": 1, "text": "great product", "codes": [1]},
                {"id": 2, "text": "bad service", "codes": [20]}
            ],
            "n_trainings": 1
        })))
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let payload = vec!["great product".to_string(), "bad service".to_string()];

    let job = runner.create_job("Feedback", "en", codebook(), &payload).await.unwrap();
    let job = runner.poll_status(&job).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);

    let results = runner.fetch_results(&job).await.unwrap();

    assert_eq!(results.entries.len(), 2);
    assert_eq!(results.entries[0].text, "great product");
    assert_eq!(results.entries[0].codes, vec![1]);
    assert_eq!(results.entries[1].text, "bad service");
    assert_eq!(results.entries[1].codes, vec![20]);
}

#[tokio::test]
async fn fetch_results_fails_when_predictions_not_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/questions/7/codes-predicted"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let job = CodingJob {
        status: JobStatus::Done,
        ..pending_job()
    };
    let err = runner_for(&server).fetch_results(&job).await.unwrap_err();

    assert!(matches!(err, WorkflowError::ResultsNotReady { question_id: 7 }));
}

#[tokio::test]
async fn add_rows_splits_large_uploads_into_async_batches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/101/rows"))
        .and(query_param("async", "true"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server).with_upload_batch_size(2);
    let rows: Vec<Row> = (0..5)
        .map(|i| Row {
            auxiliary_columns: vec![],
            answers: vec![Answer::new(format!("answer {i}"), QuestionRef::Id(7))],
        })
        .collect();

    client.add_rows(101, &rows, true).await.unwrap();
}

#[tokio::test]
async fn small_uploads_are_sent_in_one_synchronous_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/101/rows"))
        .and(query_param("request_training", "false"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"auxiliary_columns": [], "answers": [{"text": "answer 0", "question": 7}]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rows = vec![Row {
        auxiliary_columns: vec![],
        answers: vec![Answer::new("answer 0", QuestionRef::Id(7))],
    }];

    let created = client.add_rows(101, &rows, false).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].answers[0].question, QuestionRef::Id(7));
}

#[tokio::test]
async fn delete_endpoints_accept_success_and_map_missing_resources() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/101"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/questions/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_project(101).await.unwrap();
    client.delete_question(7).await.unwrap();

    let err = client.delete_project(999).await.unwrap_err();
    match err {
        ApiError::Api { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "no such project");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

fn pending_job() -> CodingJob {
    CodingJob {
        project_id: 101,
        question_ids: vec![7],
        status: JobStatus::Pending,
        created_at: None,
        error: None,
    }
}
