use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:1.5b";
const DEFAULT_LOG_FILE: &str = "logs/pdfchat.log";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the pdfchat server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama-compatible generative-text backend.
    pub ollama_url: String,
    /// Model identifier sent with every generation request.
    pub ollama_model: String,
    /// Upper bound for a single summarization call.
    pub summary_timeout: Duration,
    /// Upper bound for a single question-answering call.
    pub query_timeout: Duration,
    /// Upper bound for the backend reachability probe.
    pub health_timeout: Duration,
    /// Word budget requested from the backend for each summary.
    pub summary_max_words: usize,
    /// Number of leading characters of extracted text sent for summarization.
    pub summary_input_chars: usize,
    /// Maximum accepted upload body size in bytes.
    pub max_upload_bytes: usize,
    /// Optional JSON snapshot backing the document store.
    pub document_store_path: Option<PathBuf>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Append-only log file written next to stdout logging.
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            summary_timeout: Duration::from_secs(120),
            query_timeout: Duration::from_secs(120),
            health_timeout: Duration::from_secs(10),
            summary_max_words: 50,
            summary_input_chars: 4000,
            max_upload_bytes: 20 * 1024 * 1024,
            document_store_path: None,
            server_port: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            ollama_url: load_env_optional("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: load_env_optional("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            summary_timeout: parse_optional::<u64>("SUMMARY_TIMEOUT_SECS")?
                .map_or(defaults.summary_timeout, Duration::from_secs),
            query_timeout: parse_optional::<u64>("QUERY_TIMEOUT_SECS")?
                .map_or(defaults.query_timeout, Duration::from_secs),
            health_timeout: parse_optional::<u64>("HEALTH_TIMEOUT_SECS")?
                .map_or(defaults.health_timeout, Duration::from_secs),
            summary_max_words: parse_optional("SUMMARY_MAX_WORDS")?
                .unwrap_or(defaults.summary_max_words),
            summary_input_chars: parse_optional("SUMMARY_INPUT_CHARS")?
                .unwrap_or(defaults.summary_input_chars),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
            document_store_path: load_env_optional("DOCUMENT_STORE_PATH").map(PathBuf::from),
            server_port: parse_optional("SERVER_PORT")?,
            log_file: load_env_optional("PDFCHAT_LOG_FILE")
                .map_or(defaults.log_file, PathBuf::from),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Reads a `.env` file first when present. A second call returns the already cached value.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let config = Config::default();
        assert_eq!(config.summary_timeout, Duration::from_secs(120));
        assert_eq!(config.query_timeout, Duration::from_secs(120));
        assert_eq!(config.health_timeout, Duration::from_secs(10));
        assert_eq!(config.summary_max_words, 50);
        assert!(config.document_store_path.is_none());
        assert_eq!(config.log_file, PathBuf::from("logs/pdfchat.log"));
    }

    #[test]
    fn invalid_numeric_value_is_rejected() {
        // SAFETY: this key is only touched by this test.
        unsafe { env::set_var("PDFCHAT_TEST_BAD_NUMBER", "twelve") };
        let error = parse_optional::<u64>("PDFCHAT_TEST_BAD_NUMBER").expect_err("invalid");
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "PDFCHAT_TEST_BAD_NUMBER"));
    }

    #[test]
    fn init_config_reports_invalid_value_instead_of_panicking() {
        // SAFETY: no other test reads this variable.
        unsafe { env::set_var("SUMMARY_INPUT_CHARS", "lots") };
        let result = init_config();
        unsafe { env::remove_var("SUMMARY_INPUT_CHARS") };

        let error = result.expect_err("invalid value");
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SUMMARY_INPUT_CHARS"));
        assert!(CONFIG.get().is_none());
    }

    #[test]
    fn blank_value_counts_as_unset() {
        // SAFETY: this key is only touched by this test.
        unsafe { env::set_var("PDFCHAT_TEST_BLANK", "   ") };
        assert_eq!(parse_optional::<u64>("PDFCHAT_TEST_BLANK").unwrap(), None);
    }
}
