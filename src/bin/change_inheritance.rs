use survey_coding_client::{
    config::AppConfig,
    services::api::{ApiError, CodingApiClient, Credentials},
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

    let question_id: i64 = std::env::var("QUESTION_ID")
        .expect("QUESTION_ID must be set")
        .parse()
        .expect("QUESTION_ID must be an integer");
    let inherits_from: i64 = std::env::var("INHERITS_FROM")
        .expect("INHERITS_FROM must be set")
        .parse()
        .expect("INHERITS_FROM must be an integer");

    let client = CodingApiClient::new(
        config.coding_base_url.clone(),
        Credentials {
            api_key: config.coding_api_key.clone(),
            api_secret: config.coding_api_secret.clone(),
        },
    );

    if let Err(e) = relink(&client, question_id, inherits_from).await {
        tracing::error!(error = %e, question_id, "Inheritance update failed");
        std::process::exit(1);
    }
}

/// Point a question's model at another question and retrain.
async fn relink(
    client: &CodingApiClient,
    question_id: i64,
    inherits_from: i64,
) -> Result<(), ApiError> {
    let mut question = client.get_question(question_id).await?;

    if let Some(current) = question.inherits_from {
        let linked = client.get_question(current).await?;
        tracing::info!(
            question_id,
            inherits_from = current,
            linked_name = %linked.name,
            "Current inheritance"
        );
    }

    // The target must exist; a missing id should fail here, not during training.
    let target = client.get_question(inherits_from).await?;

    question.inherits_from = Some(inherits_from);
    let updated = client.update_question(&question, true).await?;
    client.request_predictions(question_id).await?;

    tracing::info!(
        question_id,
        inherits_from,
        target_name = %target.name,
        updated_name = %updated.name,
        "Linked question and requested training"
    );

    Ok(())
}
