//! Configuration management for quizfolio
//!
//! TOML configuration with defaults and validation.
//! Location: ~/.quizfolio/config.toml
//!
//! Secrets are never read from the file; see [`Secrets`].

use crate::errors::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for quizfolio
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub paasa: PaasaConfig,
    pub market: MarketConfig,
    pub report: ReportConfig,
    pub chat: ChatConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
    pub vector: VectorConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

/// Generative-AI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Portfolio-data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaasaConfig {
    /// Overridden by `PAASA_API_BASE`
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Market-data configuration (S&P 500 benchmark, fund expense ratios)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Fill gaps in the portfolio payload from the market-data service
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Report generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
    /// Directory holding `portfolio_template.html` and `styles.css`
    pub template_dir: Option<String>,
    /// HTML to PDF converter binary; `None` disables PDF output
    pub pdf_converter: Option<String>,
    pub pdf_timeout_secs: u64,
    /// Ask the model for methodology copy
    pub enhance: bool,
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub history_dir: String,
    pub collection: String,
    pub max_messages: usize,
    pub system_prompt: String,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

/// Tool backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub search_url: String,
    pub weather_url: String,
    pub timeout_secs: u64,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub dimension: u64,
    pub chunk_size: usize,
    pub score_threshold: f32,
}

/// Generation proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

/// Logging and terminal output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_progress_bars: bool,
    pub color_output: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            temperature: None,
            timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

impl Default for PaasaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 15,
            max_attempts: 2,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            template_dir: None,
            pdf_converter: Some("wkhtmltopdf".to_string()),
            pdf_timeout_secs: 120,
            enhance: true,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_dir: "~/.quizfolio/chat_history".to_string(),
            collection: "chat_history".to_string(),
            max_messages: 100,
            system_prompt: "You are a helpful AI assistant.".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_url: "https://google.serper.dev/search".to_string(),
            weather_url: "https://wttr.in".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "documents".to_string(),
            dimension: 768,
            chunk_size: 1000,
            score_threshold: 0.3,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_progress_bars: true,
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FolioError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| FolioError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".quizfolio").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.gemini.model.trim().is_empty() {
            return Err(FolioError::ConfigError("gemini.model must not be empty".to_string()));
        }

        if self.gemini.embedding_model.trim().is_empty() {
            return Err(FolioError::ConfigError(
                "gemini.embedding_model must not be empty".to_string(),
            ));
        }

        if let Some(t) = self.gemini.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(FolioError::ConfigError(
                    "gemini.temperature must be between 0.0 and 2.0".to_string(),
                ));
            }
        }

        if self.gemini.timeout_secs == 0
            || self.paasa.timeout_secs == 0
            || self.market.timeout_secs == 0
            || self.tools.timeout_secs == 0
        {
            return Err(FolioError::ConfigError("timeouts must be greater than 0".to_string()));
        }

        if self.gemini.max_attempts == 0 || self.paasa.max_attempts == 0 || self.market.max_attempts == 0 {
            return Err(FolioError::ConfigError("max_attempts must be at least 1".to_string()));
        }

        if self.agent.max_iterations == 0 {
            return Err(FolioError::ConfigError(
                "agent.max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.chat.max_messages < 2 {
            return Err(FolioError::ConfigError(
                "chat.max_messages must be at least 2".to_string(),
            ));
        }

        if self.vector.chunk_size < 100 {
            return Err(FolioError::ConfigError(
                "vector.chunk_size must be at least 100 characters".to_string(),
            ));
        }

        if self.vector.dimension == 0 {
            return Err(FolioError::ConfigError("vector.dimension must be greater than 0".to_string()));
        }

        match self.telemetry.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(FolioError::ConfigError(format!("Invalid log level: {}", other)))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FolioError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FolioError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FolioError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Report output root
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.report.output_dir)
    }

    /// Chat history root
    pub fn history_dir(&self) -> PathBuf {
        Self::expand_path(&self.chat.history_dir)
    }

    /// Portfolio-data API base, environment first
    pub fn paasa_base_url(&self, secrets: &Secrets) -> Option<String> {
        secrets
            .paasa_api_base
            .clone()
            .or_else(|| self.paasa.base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string())
    }
}

/// Secrets read from the environment (after `.env` is loaded)
#[derive(Clone, Default)]
pub struct Secrets {
    pub gemini_api_key: Option<String>,
    pub paasa_bearer_token: Option<String>,
    pub paasa_api_base: Option<String>,
    pub serper_api_key: Option<String>,
}

impl Secrets {
    /// Load `.env` (if any) and read the known variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            paasa_bearer_token: get("PAASA_BEARER_TOKEN"),
            paasa_api_base: get("PAASA_API_BASE"),
            serper_api_key: get("SERPER_API_KEY"),
        }
    }

    /// Gemini key or a `MissingSecret` error
    pub fn require_gemini_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or(FolioError::MissingSecret("GEMINI_API_KEY"))
    }

    /// Masked view for display
    pub fn masked(value: &Option<String>) -> String {
        match value {
            Some(v) if v.chars().count() > 4 => format!("{}…", v.chars().take(4).collect::<String>()),
            Some(_) => "****".to_string(),
            None => "(not set)".to_string(),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &Self::masked(&self.gemini_api_key))
            .field("paasa_bearer_token", &Self::masked(&self.paasa_bearer_token))
            .field("paasa_api_base", &self.paasa_api_base)
            .field("serper_api_key", &Self::masked(&self.serper_api_key))
            .finish()
    }
}
