use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Review source error: {message}")]
    SourceError { message: String },

    #[error("Scoring error: {message}")]
    ScoreError { message: String },

    #[error("History persistence error: {message}")]
    PersistenceError { message: String },

    #[error("{operation} timed out after {timeout:?}")]
    TimeoutError { operation: String, timeout: Duration },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Scoring,
    Persistence,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RecommenderError {
    pub fn source(message: impl Into<String>) -> Self {
        Self::SourceError {
            message: message.into(),
        }
    }

    pub fn score(message: impl Into<String>) -> Self {
        Self::ScoreError {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceError { .. } | Self::TimeoutError { .. } => {
                ErrorCategory::Source
            }
            Self::ScoreError { .. } => ErrorCategory::Scoring,
            Self::PersistenceError { .. } | Self::CsvError(_) => ErrorCategory::Persistence,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單筆評論失敗只影響該評論
            ErrorCategory::Scoring => ErrorSeverity::Low,
            ErrorCategory::Source | ErrorCategory::Persistence => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::SourceError { .. } | Self::TimeoutError { .. } => {
                "No results: the restaurant data source could not be reached.".to_string()
            }
            Self::ScoreError { .. } => "A review could not be scored and was skipped.".to_string(),
            Self::PersistenceError { .. } | Self::CsvError(_) => {
                "The recommendation could not be saved to history.".to_string()
            }
            Self::ConfigValidationError { field, .. }
            | Self::InvalidConfigValueError { field, .. }
            | Self::MissingConfigError { field } => {
                format!("Configuration problem with '{}': {}", field, self)
            }
            Self::ValidationError { message } => format!("Invalid input: {}", message),
            Self::IoError(e) => format!("File system error: {}", e),
            Self::SerializationError(e) => format!("Data format error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Source => {
                "Check the API token and network connection, then try a different query"
            }
            ErrorCategory::Scoring => "Check the scorer endpoint or switch to the lexicon scorer",
            ErrorCategory::Persistence => "Check that the history file is writable",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Io => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
