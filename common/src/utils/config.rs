use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Base directory for per-request clone targets.
    #[serde(default = "default_clone_dir")]
    pub clone_dir: String,
    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,
    #[serde(default = "default_ingest_rate_per_minute")]
    pub ingest_rate_per_minute: u32,
    #[serde(default = "default_summary_rate_per_minute")]
    pub summary_rate_per_minute: u32,
    #[serde(default = "default_ingest_max_body_bytes")]
    pub ingest_max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            clone_dir: default_clone_dir(),
            clone_timeout_secs: default_clone_timeout_secs(),
            ingest_rate_per_minute: default_ingest_rate_per_minute(),
            summary_rate_per_minute: default_summary_rate_per_minute(),
            ingest_max_body_bytes: default_ingest_max_body_bytes(),
        }
    }
}

fn default_http_port() -> u16 {
    3000
}

fn default_clone_dir() -> String {
    std::env::temp_dir()
        .join("repoingest")
        .to_string_lossy()
        .into_owned()
}

fn default_clone_timeout_secs() -> u64 {
    120
}

fn default_ingest_rate_per_minute() -> u32 {
    5
}

fn default_summary_rate_per_minute() -> u32 {
    10
}

fn default_ingest_max_body_bytes() -> usize {
    1024 * 1024
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
