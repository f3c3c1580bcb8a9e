//! Error types for quizfolio
//!
//! One error enum shared by the pipeline, the model clients and the
//! command handlers. The binary wraps it in `anyhow` at the top level.

use thiserror::Error;

/// Main error type for quizfolio
#[derive(Error, Debug)]
pub enum FolioError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A required secret (API key, bearer token) is not set
    #[error("Missing secret: {0} is not set (add it to the environment or .env)")]
    MissingSecret(&'static str),

    /// Generative-AI API returned a non-success status
    #[error("Gemini API error (HTTP {status}): {message}")]
    GeminiApiError { status: u16, message: String },

    /// Model answered without any usable text
    #[error("Empty response from model: {0}")]
    EmptyResponse(String),

    /// Portfolio-data API errors
    #[error("Portfolio API error (HTTP {status}): {message}")]
    PortfolioApiError { status: u16, message: String },

    /// Market-data (benchmark, fund profile) errors
    #[error("Market data error (HTTP {status}): {message}")]
    MarketDataError { status: u16, message: String },

    /// Web search / weather tool backend errors
    #[error("Tool error: {0}")]
    ToolError(String),

    /// Calculator evaluation errors
    #[error("Calculation error: {0}")]
    CalcError(String),

    /// Prompt template errors
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Report rendering errors
    #[error("Render error: {0}")]
    RenderError(String),

    /// HTML to PDF conversion errors
    #[error("PDF conversion failed: {0}")]
    PdfError(String),

    /// Vector store errors
    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    /// Input validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl FolioError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FolioError::Timeout { .. } => true,
            FolioError::HttpError(e) => e.is_timeout() || e.is_connect(),
            FolioError::GeminiApiError { status, .. }
            | FolioError::PortfolioApiError { status, .. }
            | FolioError::MarketDataError { status, .. } => {
                matches!(status, 408 | 429 | 500..=599)
            }
            _ => false,
        }
    }
}

/// Result type alias for quizfolio operations
pub type Result<T> = std::result::Result<T, FolioError>;

/// Convert anyhow errors to FolioError
impl From<anyhow::Error> for FolioError {
    fn from(err: anyhow::Error) -> Self {
        FolioError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::GeminiApiError {
            status: 429,
            message: "quota".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn test_missing_secret_names_variable() {
        let err = FolioError::MissingSecret("GEMINI_API_KEY");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_transient_classification() {
        let rate_limited = FolioError::GeminiApiError {
            status: 429,
            message: String::new(),
        };
        let unavailable = FolioError::PortfolioApiError {
            status: 503,
            message: String::new(),
        };
        let unauthorized = FolioError::PortfolioApiError {
            status: 401,
            message: String::new(),
        };

        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(FolioError::Timeout { duration_ms: 10 }.is_transient());
        assert!(!FolioError::ConfigError("x".into()).is_transient());
    }
}
