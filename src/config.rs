use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Default base URL of the memory service HTTP API.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
/// Default bound on a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);
/// Phrase a migrated workflow document is expected to contain.
pub const DEFAULT_WORKFLOW_PHRASE: &str = "MCP Memory Service";
/// Phrase that marks a workflow document as still pointing at the previous memory store.
pub const DEFAULT_LEGACY_PHRASE: &str = "OpenMemory";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Runtime configuration for a probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the memory service.
    pub service_url: String,
    /// Optional bearer token for the memory service.
    pub api_key: Option<String>,
    /// Upper bound for each probe.
    pub probe_timeout: Duration,
    /// Workflow document checked for the migration phrase.
    pub workflow_file: Option<PathBuf>,
    /// Phrase the workflow document must contain.
    pub workflow_phrase: String,
    /// Phrase reported when the workflow document still references the old store.
    pub legacy_phrase: Option<String>,
    /// Directory holding `*.md` command definitions.
    pub commands_dir: Option<PathBuf>,
    /// Raw value of `MCP_CONSOLIDATION_ENABLED`.
    pub consolidation_enabled: Option<String>,
    /// Raw value of `MCP_HTTP_ENABLED`.
    pub http_enabled: Option<String>,
    /// Raw value of `MCP_HTTP_HOST`.
    pub http_host: Option<String>,
    /// Raw value of `MCP_HTTP_PORT`.
    pub http_port: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.into(),
            api_key: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            workflow_file: None,
            workflow_phrase: DEFAULT_WORKFLOW_PHRASE.into(),
            legacy_phrase: Some(DEFAULT_LEGACY_PHRASE.into()),
            commands_dir: None,
            consolidation_enabled: None,
            http_enabled: None,
            http_host: None,
            http_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let probe_timeout = get("MEMPROBE_TIMEOUT_SECS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::InvalidValue {
                        key: "MEMPROBE_TIMEOUT_SECS".into(),
                        value,
                    })
            })
            .transpose()?
            .unwrap_or(defaults.probe_timeout);

        Ok(Self {
            service_url: get("MCP_MEMORY_URL").unwrap_or(defaults.service_url),
            api_key: get("MCP_API_KEY"),
            probe_timeout,
            workflow_file: get("MEMPROBE_WORKFLOW_FILE").map(PathBuf::from),
            workflow_phrase: get("MEMPROBE_WORKFLOW_PHRASE").unwrap_or(defaults.workflow_phrase),
            legacy_phrase: get("MEMPROBE_LEGACY_PHRASE").or(defaults.legacy_phrase),
            commands_dir: get("MEMPROBE_COMMANDS_DIR").map(PathBuf::from),
            consolidation_enabled: lookup("MCP_CONSOLIDATION_ENABLED"),
            http_enabled: lookup("MCP_HTTP_ENABLED"),
            http_host: get("MCP_HTTP_HOST"),
            http_port: get("MCP_HTTP_PORT"),
        })
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load `.env` and the environment, then install the result in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        service_url = %config.service_url,
        timeout_secs = config.probe_timeout.as_secs(),
        workflow_file = ?config.workflow_file,
        commands_dir = ?config.commands_dir,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
