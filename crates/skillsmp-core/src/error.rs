//! Error taxonomy shared by every SkillsMP operation.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkillsmpError>;

/// Error codes carried in the API error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCode {
    MissingApiKey,
    InvalidApiKey,
    MissingQuery,
    InternalError,
    Unknown(String),
}

impl ApiErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "MISSING_API_KEY" => Self::MissingApiKey,
            "INVALID_API_KEY" => Self::InvalidApiKey,
            "MISSING_QUERY" => Self::MissingQuery,
            "INTERNAL_ERROR" => Self::InternalError,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::MissingQuery => "MISSING_QUERY",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification used when rendering errors to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Credential,
    Validation,
    Transport,
    Server,
    Archive,
    NotFound,
    Io,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Server => "server",
            Self::Archive => "archive",
            Self::NotFound => "not_found",
            Self::Io => "io",
        }
    }
}

#[derive(Debug, Error)]
pub enum SkillsmpError {
    #[error(
        "No valid API key found.\n\n\
         Please configure your API key using one of these methods:\n\
         1. Pass --api-key <KEY>\n\
         2. Set environment variable SKILLSMP_API_KEY (recommended)\n\
         3. Set api_key in the config file\n\
         4. Create file: {dev_file}\n\
         5. Edit file: {template_file}"
    )]
    MissingCredential {
        dev_file: String,
        template_file: String,
    },

    #[error("API error {code} (HTTP {status}): {message}")]
    Api {
        code: ApiErrorCode,
        status: u16,
        message: String,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid API response: {0}")]
    Decode(String),

    #[error("Invalid skill archive: {0}")]
    Archive(String),

    #[error("Invalid skill descriptor at {path}: {reason}")]
    Descriptor { path: String, reason: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkillsmpError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredential { .. } => ErrorCategory::Credential,
            Self::Api { code, status, .. } => match code {
                ApiErrorCode::MissingApiKey | ApiErrorCode::InvalidApiKey => {
                    ErrorCategory::Credential
                }
                ApiErrorCode::MissingQuery => ErrorCategory::Validation,
                ApiErrorCode::InternalError => ErrorCategory::Server,
                ApiErrorCode::Unknown(_) => match status {
                    401 | 403 => ErrorCategory::Credential,
                    404 => ErrorCategory::NotFound,
                    400..=499 => ErrorCategory::Validation,
                    _ => ErrorCategory::Server,
                },
            },
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Decode(_) => ErrorCategory::Server,
            Self::Archive(_) | Self::Descriptor { .. } => ErrorCategory::Archive,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Machine-readable code for JSON error output.
    pub fn code(&self) -> String {
        match self {
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL".to_string(),
            Self::Api { code, .. } => code.as_str().to_string(),
            Self::Transport(_) => "TRANSPORT_ERROR".to_string(),
            Self::Decode(_) => "DECODE_ERROR".to_string(),
            Self::Archive(_) => "ARCHIVE_ERROR".to_string(),
            Self::Descriptor { .. } => "DESCRIPTOR_ERROR".to_string(),
            Self::NotFound(_) => "NOT_FOUND".to_string(),
            Self::Validation(_) => "VALIDATION_ERROR".to_string(),
            Self::Io(_) => "IO_ERROR".to_string(),
        }
    }

    /// Failures that would repeat for every remaining remote call in a run.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Credential | ErrorCategory::Transport
        )
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
