use survey_coding_client::{
    config::AppConfig,
    models::project::{NewProject, Question},
    models::row::QuestionRef,
    services::api::{CodingApiClient, Credentials},
    services::ingest,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    let answers_file = std::env::var("ANSWERS_FILE").expect("ANSWERS_FILE must be set");
    let project_name = std::env::var("PROJECT_NAME").expect("PROJECT_NAME must be set");
    let text_column = std::env::var("TEXT_COLUMN").expect("TEXT_COLUMN must be set");
    let source_language_column = std::env::var("SOURCE_LANGUAGE_COLUMN").ok();
    let language = std::env::var("LANGUAGE").unwrap_or_else(|_| "en".to_string());

    let client = CodingApiClient::new(
        config.coding_base_url.clone(),
        Credentials {
            api_key: config.coding_api_key.clone(),
            api_secret: config.coding_api_secret.clone(),
        },
    )
    .with_upload_batch_size(config.upload_batch_size);

    let file = std::fs::File::open(&answers_file).expect("Failed to open answers file");
    let parsed = ingest::rows_from_csv(
        file,
        &text_column,
        &text_column,
        source_language_column.as_deref(),
    )
    .expect("Failed to parse answers file");

    tracing::info!(
        file = %answers_file,
        rows = parsed.rows.len(),
        auxiliary_columns = parsed.auxiliary_column_names.len(),
        "Parsed answers file"
    );

    if let Err(e) = upload(&client, &project_name, &language, &text_column, parsed).await {
        tracing::error!(error = %e, "Upload failed");
        std::process::exit(1);
    }
}

/// Create a project for the parsed file and upload its rows.
async fn upload(
    client: &CodingApiClient,
    project_name: &str,
    language: &str,
    text_column: &str,
    parsed: ingest::ParsedRows,
) -> Result<(), survey_coding_client::services::api::ApiError> {
    let new_project = NewProject {
        name: project_name.to_string(),
        language: language.to_string(),
        auxiliary_column_names: parsed.auxiliary_column_names,
        translate: false,
        questions: vec![Question::new(text_column, vec![])],
        rows: Vec::new(),
    };

    let created = client.create_project(&new_project, false).await?;
    let question_id = created
        .questions
        .first()
        .and_then(|q| q.id)
        .expect("Service did not assign a question id");

    // Rows added after creation must reference the question by its id.
    let mut rows = parsed.rows;
    for row in &mut rows {
        for answer in &mut row.answers {
            answer.question = QuestionRef::Id(question_id);
        }
    }

    let uploaded = client.add_rows(created.id, &rows, true).await?;

    tracing::info!(
        project_id = created.id,
        question_id,
        rows = uploaded.len(),
        "Successfully uploaded answers"
    );

    Ok(())
}
