// runtime settings, filled in from the command line

use std::time::Duration;

use crate::core::Provider;

// what the relay core needs to know
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// reject messages whose text is longer than this many bytes
    pub max_text_bytes: Option<usize>,
    /// how long a single classification attempt may take
    pub classify_timeout: Duration,
    /// extra attempts after the first failed classification
    pub classify_retries: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_text_bytes: None,
            classify_timeout: Duration::from_secs(30),
            classify_retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub relay: RelayConfig,
    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    // install the tracing subscriber for headless modes (serve, check)
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| self.log_level.parse::<tracing_subscriber::EnvFilter>())
            .unwrap_or_else(|e| {
                eprintln!(
                    "warn: log level '{}' is not a valid filter ({e}), using 'info'",
                    self.log_level
                );
                tracing_subscriber::EnvFilter::new("info")
            });

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);

        // try_init so a second call (tests, embedding) is harmless
        if self.log_json {
            subscriber.json().try_init().ok();
        } else {
            subscriber.try_init().ok();
        }
    }
}
