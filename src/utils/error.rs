use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Unexpected response from server: {message}")]
    InvalidResponse { message: String },

    #[error("No ZIP download link available")]
    MissingLink,

    #[error("Downloaded file is empty")]
    EmptyArtifact,

    #[error("Extraction service is offline")]
    ApiOffline,

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unknown document type: {value}")]
    InvalidDocumentType { value: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
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

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ClientError::InvalidResponse {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            ClientError::ConfigError {
                message: format!("invalid request: {}", err),
            }
        } else if let Some(status) = err.status() {
            ClientError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            // is_connect / is_request / is_body：傳輸層失敗
            ClientError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Http,
    Artifact,
    Data,
    Config,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::NetworkError { .. } | ClientError::Timeout { .. } | ClientError::ApiOffline => {
                ErrorCategory::Network
            }
            ClientError::HttpError { .. } => ErrorCategory::Http,
            ClientError::MissingLink | ClientError::EmptyArtifact | ClientError::ZipError(_) => {
                ErrorCategory::Artifact
            }
            ClientError::CsvError(_)
            | ClientError::SerializationError(_)
            | ClientError::InvalidResponse { .. }
            | ClientError::ValidationError { .. }
            | ClientError::SubmissionInProgress => ErrorCategory::Data,
            ClientError::InvalidDocumentType { .. }
            | ClientError::ConfigError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. } => ErrorCategory::Config,
            ClientError::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClientError::SubmissionInProgress | ClientError::MissingLink => ErrorSeverity::Low,
            ClientError::NetworkError { .. }
            | ClientError::Timeout { .. }
            | ClientError::ApiOffline
            | ClientError::HttpError { .. } => ErrorSeverity::Medium,
            ClientError::EmptyArtifact
            | ClientError::ZipError(_)
            | ClientError::CsvError(_)
            | ClientError::SerializationError(_)
            | ClientError::InvalidResponse { .. }
            | ClientError::ValidationError { .. }
            | ClientError::InvalidDocumentType { .. }
            | ClientError::ConfigError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. } => ErrorSeverity::High,
            ClientError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 可自動重試的錯誤：連線失敗與 404（檔案尚未產生）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkError { .. } | ClientError::HttpError { status: 404, .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ClientError::NetworkError { .. } => {
                "Check your internet connection and try again later"
            }
            ClientError::Timeout { .. } => "Try again or submit fewer / smaller files",
            ClientError::HttpError { status: 404, .. } => {
                "The server has not produced the file yet; wait a moment and retry"
            }
            ClientError::HttpError { status, .. } if *status >= 500 => {
                "The extraction service failed; try again later"
            }
            ClientError::HttpError { .. } => "Check the submitted files and document type",
            ClientError::MissingLink => "Enable file renaming and process the files again",
            ClientError::EmptyArtifact => "Process the files again to regenerate the archive",
            ClientError::ApiOffline => "Wait until the extraction service is back online",
            ClientError::SubmissionInProgress => "Wait for the current submission to finish",
            ClientError::ZipError(_) => "The downloaded archive is corrupted; download it again",
            ClientError::CsvError(_)
            | ClientError::SerializationError(_)
            | ClientError::InvalidResponse { .. } => {
                "The server returned data in an unexpected format; check the API URL or try again later"
            }
            ClientError::IoError(_) => "Check file permissions and available disk space",
            ClientError::InvalidDocumentType { .. } => {
                "Use one of: SKTT, EVLN, ITAS, ITK, Notifikasi, DKPTKA"
            }
            ClientError::ConfigError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. } => "Review the command line flags and config file",
            ClientError::ValidationError { .. } => "Select at least one PDF file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ClientError::NetworkError { .. } => {
                "Could not connect to the API server. Please check your connection and try again."
                    .to_string()
            }
            ClientError::Timeout { .. } => {
                "The request took too long to complete. Please try again.".to_string()
            }
            ClientError::HttpError { status, message } => {
                format!("Server responded with status {}: {}", status, message)
            }
            ClientError::MissingLink => {
                "No ZIP download link available. Please try processing the files again."
                    .to_string()
            }
            ClientError::InvalidResponse { .. } => {
                "The server returned a response that could not be read.".to_string()
            }
            ClientError::EmptyArtifact => "Downloaded file is empty.".to_string(),
            ClientError::ApiOffline => {
                "The API server appears to be offline. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
