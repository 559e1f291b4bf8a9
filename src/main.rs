use tracing_subscriber::EnvFilter;

use survey_coding_client::config::AppConfig;
use survey_coding_client::models::job::JobStatus;
use survey_coding_client::models::project::Code;
use survey_coding_client::services::workflow::WorkflowRunner;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(base_url = %config.coding_base_url, "Starting coding workflow demo");

    let runner = WorkflowRunner::from_config(&config);

    if let Err(e) = run_demo(&runner).await {
        tracing::error!(error = %e, "Demo workflow failed");
        std::process::exit(1);
    }
}

/// Drive one coding job end to end against the remote service.
async fn run_demo(runner: &WorkflowRunner) -> Result<(), Box<dyn std::error::Error>> {
    let existing = runner.client().list_projects().await?;
    tracing::info!(count = existing.len(), "Listed existing projects");

    let codebook = vec![
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
    ];

    let texts = vec![
        "Great product, I would order again".to_string(),
        "Delivery took three weeks and support never answered".to_string(),
        "Does what it says, no complaints".to_string(),
    ];

    let job = runner
        .create_job("Customer feedback demo", "en", codebook, &texts)
        .await?;
    tracing::info!(project_id = job.project_id, status = %job.status, "Created coding job");

    let job = runner.poll_status(&job).await?;

    if job.status == JobStatus::Failed {
        return Err(format!(
            "coding job {} failed on the service side: {}",
            job.project_id,
            job.error.as_deref().unwrap_or("unknown")
        )
        .into());
    }

    let results = runner.fetch_results(&job).await?;
    for entry in &results.entries {
        tracing::info!(
            question_id = entry.question_id,
            answer_id = entry.answer_id,
            text = %entry.text,
            codes = ?entry.codes,
            "Predicted codes"
        );
    }
    tracing::info!(entries = results.entries.len(), "Workflow complete");

    Ok(())
}
