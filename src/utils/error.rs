use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Invalid input for {field}: '{value}' ({reason})")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Store unavailable for region {region}: {message}")]
    StoreUnavailable { region: String, message: String },

    #[error("Worker for region {region} exited without reporting")]
    WorkerLost { region: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Store,
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

impl SignalError {
    pub fn invalid_input(field: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        SignalError::InvalidInput {
            field: field.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn store_unavailable(region: &str, message: impl Into<String>) -> Self {
        SignalError::StoreUnavailable {
            region: region.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SignalError::InvalidInput { .. } => ErrorCategory::Input,
            SignalError::StoreUnavailable { .. } => ErrorCategory::Store,
            SignalError::ConfigError { .. }
            | SignalError::InvalidConfigValueError { .. }
            | SignalError::MissingConfigError { .. }
            | SignalError::TomlError(_) => ErrorCategory::Configuration,
            SignalError::WorkerLost { .. }
            | SignalError::IoError(_)
            | SignalError::CsvError(_)
            | SignalError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Store => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SignalError::InvalidInput { field, .. } if field == "date" => {
                "Use an ISO calendar date such as 2022-01-03".to_string()
            }
            SignalError::InvalidInput { field, .. } => {
                format!("Check the value passed for '{}'", field)
            }
            SignalError::StoreUnavailable { .. } => {
                "Check that the case and facility data sources are reachable".to_string()
            }
            SignalError::WorkerLost { .. } => {
                "Check the logs for a panic in the store implementation".to_string()
            }
            SignalError::IoError(_) => "Check that the file exists and is readable".to_string(),
            SignalError::CsvError(_) => {
                "Check the CSV headers (date,region,count / region,count)".to_string()
            }
            SignalError::TomlError(_) => "Fix the TOML syntax in the config file".to_string(),
            SignalError::MissingConfigError { field } => {
                format!("Add '{}' to the config file or pass it on the command line", field)
            }
            SignalError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration", field)
            }
            SignalError::ConfigError { .. } | SignalError::SerializationError(_) => {
                "Review the configuration and input data".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SignalError::InvalidInput {
                field,
                value,
                reason,
            } => format!("Invalid {} '{}': {}", field, value, reason),
            SignalError::StoreUnavailable { region, .. } => {
                format!("Data for {} could not be read", region)
            }
            SignalError::IoError(e) => format!("Could not read a file: {}", e),
            SignalError::CsvError(e) => format!("Could not parse CSV data: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
