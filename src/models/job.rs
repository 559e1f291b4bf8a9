use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a coding job as tracked by the remote service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// Terminal statuses end the polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// One submitted analysis request.
///
/// Backed by a remote project; the project id is assigned by the service on
/// creation and never changes afterwards. Predictions are fetched per question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingJob {
    pub project_id: i64,
    pub question_ids: Vec<i64>,
    pub status: JobStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Payload returned by the job status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub id: i64,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&JobStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&JobStatus::Done).unwrap(), "\"done\"");

        let status: JobStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, JobStatus::Processing);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_response_tolerates_missing_error() {
        let resp: JobStatusResponse =
            serde_json::from_str(r#"{"id": 42, "status": "failed"}"#).unwrap();
        assert_eq!(resp.id, 42);
        assert_eq!(resp.status, JobStatus::Failed);
        assert!(resp.error.is_none());
    }
}
