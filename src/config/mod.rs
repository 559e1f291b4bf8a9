use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the coding service API.
    #[serde(default = "default_base_url")]
    pub coding_base_url: String,

    /// API key identifying the account.
    pub coding_api_key: String,

    /// API secret paired with the key.
    pub coding_api_secret: String,

    /// Fixed delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Rows per upload request; larger payloads are split into batches.
    #[serde(default = "default_upload_batch_size")]
    pub upload_batch_size: usize,
}

fn default_base_url() -> String {
    "https://api.textcoding.example/api".to_string()
}

// Predictions are usually ready within ~20s, worst case a few minutes.
fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_upload_batch_size() -> usize {
    2000
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
