//! Typed client for the remote text-coding REST API.
//!
//! A job is backed by a remote *project* holding one or more *questions*;
//! rows carry one answer per question and predictions are retrieved per
//! question once training has completed.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::models::job::JobStatusResponse;
use crate::models::prediction::Predictions;
use crate::models::project::{NewProject, Project, Question, VALID_LANGUAGES};
use crate::models::row::{Answer, Row};

/// API key/secret pair identifying the calling account.
///
/// Opaque strings, attached as headers to every request, never mutated.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request rejected by service: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response (status {status}): {body}")]
    Api { status: StatusCode, body: String },
}

/// Client for the text-coding service.
pub struct CodingApiClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    upload_batch_size: usize,
}

impl CodingApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            upload_batch_size: 2000,
        }
    }

    /// Override the number of rows sent per upload request.
    pub fn with_upload_batch_size(mut self, batch_size: usize) -> Self {
        self.upload_batch_size = batch_size.max(1);
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Api-Key", &self.credentials.api_key)
            .header("X-Api-Secret", &self.credentials.api_secret)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Map a non-expected status to the matching error kind.
    async fn check(response: Response, expected: StatusCode) -> Result<Response, ApiError> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(body)
            }
            _ => ApiError::Api { status, body },
        })
    }

    /// Create a new project; questions can only be created through this call.
    pub async fn create_project(
        &self,
        project: &NewProject,
        request_training: bool,
    ) -> Result<Project, ApiError> {
        if !VALID_LANGUAGES.contains(&project.language.as_str()) {
            return Err(ApiError::Validation(format!(
                "invalid language '{}', accepted values are {{{}}}",
                project.language,
                VALID_LANGUAGES.join(",")
            )));
        }

        let response = self
            .request(Method::POST, "/projects/")
            .query(&[("request_training", request_training)])
            .json(project)
            .send()
            .await?;
        let response = Self::check(response, StatusCode::CREATED).await?;
        Ok(response.json().await?)
    }

    /// List all projects belonging to the account (meta information only).
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.request(Method::GET, "/projects/").send().await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Project, ApiError> {
        let response = self
            .request(Method::GET, &format!("/projects/{project_id}"))
            .send()
            .await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Current processing status of a project's coding job.
    pub async fn job_status(&self, project_id: i64) -> Result<JobStatusResponse, ApiError> {
        let response = self
            .request(Method::GET, &format!("/projects/{project_id}/status"))
            .send()
            .await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Add rows to an existing project.
    ///
    /// Uploads exceeding the batch size are split and sent with the `async`
    /// flag so the service queues them instead of processing inline.
    pub async fn add_rows(
        &self,
        project_id: i64,
        rows: &[Row],
        request_training: bool,
    ) -> Result<Vec<Row>, ApiError> {
        if rows.len() <= self.upload_batch_size {
            return self.post_rows(project_id, rows, request_training, false).await;
        }

        let mut created = Vec::with_capacity(rows.len());
        for (batch_number, batch) in rows.chunks(self.upload_batch_size).enumerate() {
            tracing::debug!(project_id, batch_number, batch_len = batch.len(), "uploading row batch");
            let mut part = self.post_rows(project_id, batch, request_training, true).await?;
            created.append(&mut part);
        }
        Ok(created)
    }

    async fn post_rows(
        &self,
        project_id: i64,
        rows: &[Row],
        request_training: bool,
        upload_async: bool,
    ) -> Result<Vec<Row>, ApiError> {
        let mut query = vec![("request_training", request_training.to_string())];
        if upload_async {
            query.push(("async", "true".to_string()));
        }
        let response = self
            .request(Method::POST, &format!("/projects/{project_id}/rows"))
            .query(&query)
            .json(rows)
            .send()
            .await?;
        let response = Self::check(response, StatusCode::CREATED).await?;
        Ok(response.json().await?)
    }

    pub async fn list_rows(&self, project_id: i64) -> Result<Vec<Row>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/projects/{project_id}/rows"))
            .send()
            .await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// List all answers of a question. `no_group` disables the service-side
    /// grouping of identical texts.
    pub async fn list_answers(
        &self,
        question_id: i64,
        no_group: bool,
    ) -> Result<Vec<Answer>, ApiError> {
        let path = if no_group {
            format!("/questions/{question_id}/answers?no_group")
        } else {
            format!("/questions/{question_id}/answers")
        };
        let response = self.request(Method::GET, &path).send().await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    pub async fn get_question(&self, question_id: i64) -> Result<Question, ApiError> {
        let response = self
            .request(Method::GET, &format!("/questions/{question_id}"))
            .send()
            .await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Update a question in place, e.g. to relink its `inherits_from` model.
    pub async fn update_question(
        &self,
        question: &Question,
        request_training: bool,
    ) -> Result<Question, ApiError> {
        let question_id = question.id.ok_or_else(|| {
            ApiError::Validation("question has no id; only created questions can be updated".into())
        })?;
        let response = self
            .request(Method::PATCH, &format!("/questions/{question_id}"))
            .query(&[("request_training", request_training)])
            .json(question)
            .send()
            .await?;
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Ask the service to (re-)train on the question's reviewed answers.
    pub async fn request_predictions(&self, question_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, &format!("/questions/{question_id}/request-training"))
            .send()
            .await?;
        Self::check(response, StatusCode::OK).await?;
        Ok(())
    }

    /// Fetch predicted codes for a question.
    ///
    /// Returns `None` while no predictions are available (204 from the service).
    pub async fn get_predictions(
        &self,
        question_id: i64,
    ) -> Result<Option<Predictions>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/questions/{question_id}/codes-predicted"))
            .send()
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let response = Self::check(response, StatusCode::OK).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn delete_project(&self, project_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/projects/{project_id}"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api { status, body });
        }
        Ok(())
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/questions/{question_id}"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api { status, body });
        }
        Ok(())
    }
}
