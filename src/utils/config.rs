//! Court configuration
//!
//! Resolution order, lowest to highest precedence:
//! 1. Built-in defaults (every field has one)
//! 2. `court.toml` (or the file passed with `--config`)
//! 3. Environment variables, after `.env` is loaded
//! 4. Command-line flags (applied by the binary)

use crate::llm::{ClientOptions, Provider, ToolCallingConfig};
use crate::tools::WikipediaConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "court.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourtConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub court: CourtSettings,

    #[serde(default)]
    pub tools: ToolSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAI,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAI),
            other => Err(ConfigError::ValidationError(format!(
                "unknown provider '{}' (expected 'ollama' or 'openai')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    /// Endpoint; the provider's usual address when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    /// Per-agent model overrides, keyed by agent name.
    #[serde(default)]
    pub agent_models: BTreeMap<String, String>,

    /// Endpoints taken from `OLLAMA_URL` and `OPENAI_API_BASE`. Which one
    /// applies depends on the provider in effect when a client is built.
    #[serde(skip)]
    pub env_endpoints: EnvEndpoints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvEndpoints {
    pub ollama: Option<String>,
    pub openai: Option<String>,
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_max_tool_iterations() -> usize {
    10
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            max_tool_iterations: default_max_tool_iterations(),
            env_endpoints: EnvEndpoints::default(),
            agent_models: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtSettings {
    /// Cap on research-and-audit passes.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Entries required on each side before the judge may end the loop
    /// (0 disables the guard).
    #[serde(default)]
    pub min_evidence_per_side: usize,

    /// Directory, relative to `output_root`, the verdict is saved into.
    #[serde(default = "default_report_directory")]
    pub report_directory: String,

    /// Root that `write_file` may not escape.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

fn default_max_iterations() -> usize {
    3
}

fn default_report_directory() -> String {
    "court_reports".to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for CourtSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_evidence_per_side: 0,
            report_directory: default_report_directory(),
            output_root: default_output_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    #[serde(default = "default_search_results")]
    pub search_results: usize,

    #[serde(default = "default_search_max_chars")]
    pub search_max_chars: usize,

    #[serde(default = "default_search_retries")]
    pub search_retries: u32,
}

fn default_tool_timeout() -> u64 {
    30
}

fn default_search_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_search_results() -> usize {
    3
}

fn default_search_max_chars() -> usize {
    4000
}

fn default_search_retries() -> u32 {
    2
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout(),
            search_url: default_search_url(),
            search_results: default_search_results(),
            search_max_chars: default_search_max_chars(),
            search_retries: default_search_retries(),
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("Environment variable '{0}' has an invalid value: {1}")]
    InvalidEnvVar(String, String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(e: ConfigError) -> Self {
        crate::types::AppError::Configuration(e.to_string())
    }
}

impl CourtConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: CourtConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` when given, else `court.toml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("LLM_PROVIDER".to_string(), provider))?;
        }
        if let Some(model) = lookup("MODEL") {
            self.llm.model = model;
        }

        if let Some(url) = lookup("OLLAMA_URL") {
            self.llm.env_endpoints.ollama = Some(url);
        }
        if let Some(url) = lookup("OPENAI_API_BASE") {
            self.llm.env_endpoints.openai = Some(url);
        }

        if let Some(raw) = lookup("COURT_MAX_ITERATIONS") {
            self.court.max_iterations = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("COURT_MAX_ITERATIONS".to_string(), raw))?;
        }
        if let Some(dir) = lookup("COURT_OUTPUT_DIR") {
            self.court.output_root = PathBuf::from(dir);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }
        if self.court.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "court.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.llm.request_timeout_secs == 0 || self.tools.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.llm.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tool_iterations must be at least 1".to_string(),
            ));
        }

        let report_dir = Path::new(&self.court.report_directory);
        if report_dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ConfigError::ValidationError(format!(
                "court.report_directory '{}' must be a relative path inside output_root",
                self.court.report_directory
            )));
        }

        if self.llm.provider == ProviderKind::OpenAI {
            self.api_key()?;
        }

        Ok(())
    }

    fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(self.llm.api_key_env.clone()))
    }

    /// Endpoint actually used: the provider's environment variable, then
    /// `llm.base_url`, then the provider's usual address.
    pub fn base_url(&self) -> String {
        let from_env = match self.llm.provider {
            ProviderKind::Ollama => &self.llm.env_endpoints.ollama,
            ProviderKind::OpenAI => &self.llm.env_endpoints.openai,
        };
        match (from_env.as_ref().or(self.llm.base_url.as_ref()), self.llm.provider) {
            (Some(url), _) => url.clone(),
            (None, ProviderKind::Ollama) => "http://localhost:11434".to_string(),
            (None, ProviderKind::OpenAI) => "https://api.openai.com/v1".to_string(),
        }
    }

    /// The default provider for every agent.
    pub fn provider(&self) -> Result<Provider, ConfigError> {
        Ok(match self.llm.provider {
            ProviderKind::Ollama => Provider::Ollama {
                base_url: self.base_url(),
                model: self.llm.model.clone(),
            },
            ProviderKind::OpenAI => Provider::OpenAI {
                api_key: self.api_key()?,
                api_base: self.base_url(),
                model: self.llm.model.clone(),
            },
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            temperature: self.llm.temperature,
            request_timeout: Duration::from_secs(self.llm.request_timeout_secs),
        }
    }

    pub fn tool_calling(&self) -> ToolCallingConfig {
        ToolCallingConfig {
            max_iterations: self.llm.max_tool_iterations,
            tool_timeout: Duration::from_secs(self.tools.tool_timeout_secs),
            max_retries: self.llm.max_retries,
            retry_backoff: Duration::from_millis(self.llm.retry_backoff_ms),
        }
    }

    pub fn wikipedia(&self) -> WikipediaConfig {
        WikipediaConfig {
            base_url: self.tools.search_url.clone(),
            top_k: self.tools.search_results,
            max_chars: self.tools.search_max_chars,
            max_retries: self.tools.search_retries,
            retry_backoff: Duration::from_millis(self.llm.retry_backoff_ms),
            timeout: Duration::from_secs(self.tools.tool_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CourtConfig::default();
        assert_eq!(config.court.max_iterations, 3);
        assert_eq!(config.court.report_directory, "court_reports");
        assert_eq!(config.tools.search_results, 3);
        assert_eq!(config.tools.search_max_chars, 4000);
        assert_eq!(config.base_url(), "http://localhost:11434");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CourtConfig = toml::from_str(
            r#"
            [llm]
            model = "qwen2.5:14b"

            [llm.agent_models]
            judge = "llama3.1:70b"

            [court]
            max_iterations = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "qwen2.5:14b");
        assert_eq!(config.llm.agent_models.get("judge").map(String::as_str), Some("llama3.1:70b"));
        assert_eq!(config.court.max_iterations, 5);
        assert_eq!(config.court.min_evidence_per_side, 0);
        assert_eq!(config.tools.tool_timeout_secs, 30);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tools]\nsearch_results = 5").unwrap();

        let config = CourtConfig::load(file.path()).unwrap();
        assert_eq!(config.tools.search_results, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CourtConfig::load("/definitely/not/here/court.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[court\nmax_iterations = ").unwrap();
        assert!(matches!(
            CourtConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CourtConfig::default();
        config
            .apply_env_from(env(&[
                ("MODEL", "mistral-nemo"),
                ("OLLAMA_URL", "http://gpu:11434"),
                ("COURT_MAX_ITERATIONS", "4"),
                ("COURT_OUTPUT_DIR", "/srv/court"),
            ]))
            .unwrap();

        assert_eq!(config.llm.model, "mistral-nemo");
        assert_eq!(config.base_url(), "http://gpu:11434");
        assert_eq!(config.court.max_iterations, 4);
        assert_eq!(config.court.output_root, PathBuf::from("/srv/court"));
    }

    #[test]
    fn test_openai_env_uses_api_base() {
        let mut config = CourtConfig::default();
        config
            .apply_env_from(env(&[
                ("LLM_PROVIDER", "OpenAI"),
                ("OLLAMA_URL", "http://ignored:11434"),
                ("OPENAI_API_BASE", "https://gateway.example/v1"),
            ]))
            .unwrap();

        assert_eq!(config.llm.provider, ProviderKind::OpenAI);
        assert_eq!(config.base_url(), "https://gateway.example/v1");
    }

    #[test]
    fn test_endpoint_follows_provider_switched_after_env() {
        let mut config = CourtConfig::default();
        config
            .apply_env_from(env(&[
                ("OLLAMA_URL", "http://gpu:11434"),
                ("OPENAI_API_BASE", "https://gateway.example/v1"),
            ]))
            .unwrap();
        assert_eq!(config.base_url(), "http://gpu:11434");

        config.llm.provider = ProviderKind::OpenAI;
        assert_eq!(config.base_url(), "https://gateway.example/v1");
    }

    #[test]
    fn test_file_base_url_used_without_env_endpoint() {
        let mut config = CourtConfig::default();
        config.llm.base_url = Some("http://file:11434".to_string());
        config
            .apply_env_from(env(&[("OPENAI_API_BASE", "https://gateway.example/v1")]))
            .unwrap();

        assert_eq!(config.base_url(), "http://file:11434");
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = CourtConfig::default();
        assert!(matches!(
            config.apply_env_from(env(&[("COURT_MAX_ITERATIONS", "three")])),
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "COURT_MAX_ITERATIONS"
        ));
        assert!(config
            .apply_env_from(env(&[("LLM_PROVIDER", "anthropic")]))
            .is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = CourtConfig::default();
        config.court.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = CourtConfig::default();
        config.llm.model = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = CourtConfig::default();
        config.tools.tool_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = CourtConfig::default();
        config.court.report_directory = "../elsewhere".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_openai_requires_key() {
        let mut config = CourtConfig::default();
        config.llm.provider = ProviderKind::OpenAI;
        config.llm.api_key_env = "COURT_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "COURT_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn test_derived_settings() {
        let config = CourtConfig::default();
        assert_eq!(config.tool_calling().tool_timeout, Duration::from_secs(30));
        assert_eq!(config.wikipedia().top_k, 3);
        assert_eq!(config.client_options().request_timeout, Duration::from_secs(120));
        assert_eq!(config.provider().unwrap().model(), "llama3.1");
    }
}
