use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Predicted codes for one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedAnswer {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    pub codes: Vec<i64>,
}

/// Prediction payload for one question, as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predictions {
    pub answers: Vec<PredictedAnswer>,
    #[serde(default)]
    pub n_trainings: Option<u32>,
    #[serde(default)]
    pub training_completed: Option<DateTime<Utc>>,
    /// Meta information on model performance; shape owned by the service.
    #[serde(default)]
    pub model: Option<serde_json::Value>,
}

/// One entry of the final result mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodedAnswer {
    pub question_id: i64,
    pub answer_id: i64,
    pub text: String,
    pub codes: Vec<i64>,
}

/// Completed analysis for a job, one entry per input row and question.
///
/// Only produced for jobs in terminal state `done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingResults {
    pub project_id: i64,
    pub entries: Vec<CodedAnswer>,
}
