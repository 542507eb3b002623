/// CLI configuration
use crate::error::{CliError, Result};
use cadenza_queue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Queue state document
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Track library used by `add` and `fill` (JSON array of track records)
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Number of tracks appended by one random fill
    #[serde(default = "default_random_batch")]
    pub random_batch: usize,

    #[serde(default)]
    pub queue: QueueConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            library_path: default_library_path(),
            log_filter: default_log_filter(),
            random_batch: default_random_batch(),
            queue: QueueConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadenza.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (CADENZA_STATE_PATH, CADENZA_QUEUE__SHUFFLE, ...)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENZA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.state_path.as_os_str().is_empty() {
            return Err(CliError::Config("state_path must not be empty".to_string()));
        }

        if self.random_batch == 0 {
            return Err(CliError::Config(
                "random_batch must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_state_path() -> PathBuf {
    PathBuf::from("./data/queue.json")
}

fn default_library_path() -> PathBuf {
    PathBuf::from("./data/library.json")
}

fn default_log_filter() -> String {
    "cadenza=info".to_string()
}

fn default_random_batch() -> usize {
    5
}
