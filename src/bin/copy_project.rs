use survey_coding_client::{
    config::AppConfig,
    models::project::NewProject,
    models::row::QuestionRef,
    services::api::{CodingApiClient, Credentials},
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

    let source_id: i64 = std::env::var("SOURCE_PROJECT_ID")
        .expect("SOURCE_PROJECT_ID must be set")
        .parse()
        .expect("SOURCE_PROJECT_ID must be an integer");
    let copy_name = std::env::var("COPY_NAME").expect("COPY_NAME must be set");

    let client = CodingApiClient::new(
        config.coding_base_url.clone(),
        Credentials {
            api_key: config.coding_api_key.clone(),
            api_secret: config.coding_api_secret.clone(),
        },
    )
    .with_upload_batch_size(config.upload_batch_size);

    if let Err(e) = copy_project(&client, source_id, &copy_name).await {
        tracing::error!(error = %e, source_id, "Project copy failed");
        std::process::exit(1);
    }
}

/// Duplicate a project together with all of its rows.
async fn copy_project(
    client: &CodingApiClient,
    source_id: i64,
    copy_name: &str,
) -> Result<(), survey_coding_client::services::api::ApiError> {
    let source = client.get_project(source_id).await?;
    let mut rows = client.list_rows(source_id).await?;

    tracing::info!(
        source_id,
        name = %source.name,
        rows = rows.len(),
        questions = source.questions.len(),
        "Copying project"
    );

    let mut questions = source.questions.clone();
    for question in &mut questions {
        question.id = None;
    }

    let new_project = NewProject {
        name: copy_name.to_string(),
        language: source.language.clone(),
        auxiliary_column_names: source.auxiliary_column_names.clone(),
        translate: source.translate,
        questions,
        rows: Vec::new(),
    };

    let created = client.create_project(&new_project, false).await?;

    // Rows added after creation reference questions by their new ids, in the
    // same order as the source project's questions.
    let copied_ids: Vec<i64> = created.questions.iter().filter_map(|q| q.id).collect();
    for row in &mut rows {
        for (id, answer) in copied_ids.iter().zip(&mut row.answers) {
            answer.id = None;
            answer.question = QuestionRef::Id(*id);
        }
    }

    let uploaded = client.add_rows(created.id, &rows, true).await?;

    tracing::info!(
        copy_id = created.id,
        name = %created.name,
        rows = uploaded.len(),
        "Successfully created project copy"
    );

    Ok(())
}
