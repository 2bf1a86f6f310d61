use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaucetError {
    #[error("Invalid wallet address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Issuance to {address} failed: {message}")]
    IssuanceError { address: String, message: String },

    #[error("Issuance to {address} timed out after {timeout:?}")]
    IssuanceTimeout { address: String, timeout: Duration },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Intake,
    Issuance,
    Network,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FaucetError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FaucetError::InvalidAddress { .. } => ErrorCategory::Intake,
            FaucetError::IssuanceError { .. } | FaucetError::IssuanceTimeout { .. } => {
                ErrorCategory::Issuance
            }
            FaucetError::HttpError(_) => ErrorCategory::Network,
            FaucetError::ConfigError { .. }
            | FaucetError::ConfigValidationError { .. }
            | FaucetError::InvalidConfigValueError { .. }
            | FaucetError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FaucetError::IoError(_)
            | FaucetError::SerializationError(_)
            | FaucetError::ServerError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Intake => ErrorSeverity::Low,
            ErrorCategory::Issuance | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 重試是否有意義 (僅供日誌判斷，結算本身不重試)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FaucetError::IssuanceTimeout { .. } | FaucetError::HttpError(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FaucetError::InvalidAddress { .. } => {
                "Submit a 0x-prefixed address with 40 hexadecimal characters"
            }
            FaucetError::IssuanceError { .. } => {
                "Check the relayer logs and the faucet wallet balance"
            }
            FaucetError::IssuanceTimeout { .. } => {
                "Check relayer connectivity or raise schedule.issue_timeout_seconds"
            }
            FaucetError::HttpError(_) => "Check network connectivity to the relayer endpoint",
            FaucetError::IoError(_) => "Check file paths and permissions",
            FaucetError::SerializationError(_) => "Check the relayer response format",
            FaucetError::ConfigError { .. }
            | FaucetError::ConfigValidationError { .. }
            | FaucetError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run with --check-config"
            }
            FaucetError::MissingConfigError { .. } => {
                "Set the missing value in the configuration file or the environment"
            }
            FaucetError::ServerError { .. } => "Check that the bind address is free",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FaucetError::InvalidAddress { .. } => "Invalid wallet address".to_string(),
            FaucetError::IssuanceError { address, .. }
            | FaucetError::IssuanceTimeout { address, .. } => {
                format!("Token transfer to {} could not be completed", address)
            }
            FaucetError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FaucetError>;
