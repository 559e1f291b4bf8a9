//! Sequential submit / poll / fetch workflow on top of [`CodingApiClient`].

use std::time::Duration;

use crate::config::AppConfig;
use crate::models::job::{CodingJob, JobStatus};
use crate::models::prediction::{CodedAnswer, CodingResults};
use crate::models::project::{Code, NewProject, Question};
use crate::models::row::{Answer, QuestionRef, Row};
use crate::services::api::{ApiError, CodingApiClient, Credentials};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("results are only available for completed jobs, current status: {status}")]
    InvalidState { status: JobStatus },

    #[error("job is done but predictions for question {question_id} are missing")]
    ResultsNotReady { question_id: i64 },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives one coding job end to end: submit, poll until terminal, fetch.
///
/// All calls are sequentially awaited; there is never more than one request in
/// flight for a job.
pub struct WorkflowRunner {
    client: CodingApiClient,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl WorkflowRunner {
    pub fn new(client: CodingApiClient, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            client,
            poll_interval,
            max_poll_attempts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = CodingApiClient::new(
            config.coding_base_url.clone(),
            Credentials {
                api_key: config.coding_api_key.clone(),
                api_secret: config.coding_api_secret.clone(),
            },
        )
        .with_upload_batch_size(config.upload_batch_size);

        Self::new(
            client,
            Duration::from_millis(config.poll_interval_ms),
            config.max_poll_attempts,
        )
    }

    /// Access the underlying API client for calls outside the core workflow.
    pub fn client(&self) -> &CodingApiClient {
        &self.client
    }

    /// Submit a new coding job for a batch of text rows.
    ///
    /// Creates a project with a single question carrying `codebook` and one
    /// row per text. Returns the job in status `pending` with the identifier
    /// the service assigned.
    pub async fn create_job(
        &self,
        name: &str,
        language: &str,
        codebook: Vec<Code>,
        texts: &[String],
    ) -> Result<CodingJob, WorkflowError> {
        if texts.is_empty() {
            return Err(ApiError::Validation(
                "payload must contain at least one text row".to_string(),
            )
            .into());
        }

        let question = Question::new(name, codebook);
        let rows = texts
            .iter()
            .map(|text| Row {
                auxiliary_columns: Vec::new(),
                answers: vec![Answer::new(text.clone(), QuestionRef::Name(name.to_string()))],
            })
            .collect();

        let project = NewProject {
            name: name.to_string(),
            language: language.to_string(),
            auxiliary_column_names: Vec::new(),
            translate: false,
            questions: vec![question],
            rows,
        };

        let created = self.client.create_project(&project, true).await?;
        let question_ids: Vec<i64> = created.questions.iter().filter_map(|q| q.id).collect();

        tracing::info!(
            project_id = created.id,
            rows = texts.len(),
            questions = question_ids.len(),
            "coding job submitted"
        );

        Ok(CodingJob {
            project_id: created.id,
            question_ids,
            status: JobStatus::Pending,
            created_at: created.created,
            error: None,
        })
    }

    /// Poll the job status at a fixed interval until it is terminal.
    ///
    /// Returns the job in status `done` or `failed`, never `pending` or
    /// `processing`. Exceeding the attempt budget fails with
    /// [`WorkflowError::Timeout`].
    pub async fn poll_status(&self, job: &CodingJob) -> Result<CodingJob, WorkflowError> {
        for attempt in 1..=self.max_poll_attempts {
            let current = self.client.job_status(job.project_id).await?;

            tracing::debug!(
                project_id = job.project_id,
                attempt,
                status = %current.status,
                "polled job status"
            );

            if current.status.is_terminal() {
                return Ok(CodingJob {
                    status: current.status,
                    error: current.error,
                    ..job.clone()
                });
            }

            // No point sleeping once the attempt budget is spent.
            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(WorkflowError::Timeout {
            attempts: self.max_poll_attempts,
        })
    }

    /// Retrieve the completed analysis mapping for a job in status `done`.
    pub async fn fetch_results(&self, job: &CodingJob) -> Result<CodingResults, WorkflowError> {
        if job.status != JobStatus::Done {
            return Err(WorkflowError::InvalidState { status: job.status });
        }

        let mut entries = Vec::new();
        for &question_id in &job.question_ids {
            let predictions = self
                .client
                .get_predictions(question_id)
                .await?
                .ok_or(WorkflowError::ResultsNotReady { question_id })?;

            for answer in predictions.answers {
                entries.push(CodedAnswer {
                    question_id,
                    answer_id: answer.id,
                    text: answer.text,
                    codes: answer.codes,
                });
            }
        }

        tracing::info!(
            project_id = job.project_id,
            entries = entries.len(),
            "fetched coding results"
        );

        Ok(CodingResults {
            project_id: job.project_id,
            entries,
        })
    }
}
