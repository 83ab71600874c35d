use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MossError {
    #[error("Submission already sent; cannot {action}")]
    LockedSubmission { action: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid argument '{field}' ({value}): {reason}")]
    InvalidArgument {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Submission,
    Connection,
    Argument,
    Filesystem,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MossError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn locked(action: impl Into<String>) -> Self {
        Self::LockedSubmission {
            action: action.into(),
        }
    }

    pub fn invalid_argument(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 將 IO 錯誤附上發生的路徑
    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::LockedSubmission { .. } => ErrorCategory::Submission,
            Self::Connection { .. } | Self::HttpError(_) => ErrorCategory::Connection,
            Self::InvalidArgument { .. } => ErrorCategory::Argument,
            Self::Filesystem { .. } | Self::IoError(_) | Self::ZipError(_) => {
                ErrorCategory::Filesystem
            }
            Self::ConfigError { .. } | Self::MissingConfigError { .. } => {
                ErrorCategory::Configuration
            }
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Connection => ErrorSeverity::Medium,
            ErrorCategory::Submission | ErrorCategory::Argument | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration | ErrorCategory::Filesystem => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::LockedSubmission { .. } => {
                "Create a new submission; a sent submission cannot be modified or re-sent".to_string()
            }
            Self::Connection { .. } | Self::HttpError(_) => {
                "Check network access to the detection service and that the account id is valid"
                    .to_string()
            }
            Self::InvalidArgument { field, .. } => {
                format!("Correct the value of '{}' and try again", field)
            }
            Self::Filesystem { path, .. } => format!(
                "Make sure {} is writable and that no report directory with the same name exists",
                path.display()
            ),
            Self::IoError(_) | Self::ZipError(_) => {
                "Check free disk space and permissions of the output directory".to_string()
            }
            Self::CsvError(_) => "Check the partner file format".to_string(),
            Self::SerializationError(_) => "Re-run with --verbose to inspect the report data".to_string(),
            Self::ConfigError { .. } => "Fix the configuration file syntax".to_string(),
            Self::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::LockedSubmission { action } => {
                format!("The submission was already sent, so it is not possible to {}", action)
            }
            Self::Connection { message } => {
                format!("Could not talk to the detection service: {}", message)
            }
            Self::HttpError(e) => match e.url() {
                Some(url) => format!("Request to {} failed: {}", url, e),
                None => format!("Request failed: {}", e),
            },
            Self::InvalidArgument {
                field,
                value,
                reason,
            } => format!("Invalid {} '{}': {}", field, value, reason),
            Self::Filesystem { path, source } => {
                format!("Could not write {}: {}", path.display(), source)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MossError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_error_names_path() {
        let err = MossError::filesystem(
            "/tmp/out/moss_report__1",
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists"),
        );
        assert_eq!(err.category(), ErrorCategory::Filesystem);
        assert!(err.to_string().contains("/tmp/out/moss_report__1"));
        assert!(err.user_friendly_message().contains("/tmp/out/moss_report__1"));
    }

    #[test]
    fn test_severity_by_category() {
        assert_eq!(MossError::locked("add files").severity(), ErrorSeverity::High);
        assert_eq!(MossError::connection("refused").severity(), ErrorSeverity::Medium);
        assert_eq!(
            MossError::MissingConfigError {
                field: "moss.account".to_string()
            }
            .severity(),
            ErrorSeverity::Critical
        );
    }
}
