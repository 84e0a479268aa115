//! Error types for the Parlor core library.
//!
//! Every fallible operation in the core returns [`ParlorResult`]. Errors carry a
//! stable code so the CLI, the TUI and log output can refer to the same failure.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Backend | Document requests, realtime connection, rate limits |
//! | E2001-E2099 | Config | Environment, config file, and validation errors |
//! | E3001-E3099 | Auth | Identity provider sign-in and session errors |
//! | E4001-E4099 | Storage | Media upload and file deletion errors |
//! | E5001-E5099 | Assistant | Generative-text API errors |
//! | E9001-E9099 | General | Internal, IO, serialization, and validation errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// The main error type for the Parlor core library.
#[derive(Debug, Error)]
pub enum ParlorError {
    // ========================================================================
    // Backend Errors (E1001-E1099)
    // ========================================================================
    /// A document or storage request returned a non-success status
    #[error("[E1001] Backend request failed: {0}")]
    BackendRequestFailed(String),

    /// The backend answered with a body we could not decode
    #[error("[E1002] Failed to parse backend response: {0}")]
    BackendParseError(String),

    /// Document lookup by id found nothing
    #[error("[E1003] Document '{id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    /// Backend unreachable
    #[error("[E1004] Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Request rejected by collection or bucket permissions
    #[error("[E1005] Permission denied by {service}: {message}")]
    PermissionDenied { service: String, message: String },

    /// Gave up after the client's configured request timeout
    #[error("[E1006] Request timed out")]
    RequestTimeout,

    #[error("[E1007] Rate limit exceeded for {service}, retry after {retry_after_secs} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: u64,
    },

    /// Realtime websocket could not be opened or dropped unexpectedly
    #[error("[E1008] Realtime connection failed: {0}")]
    RealtimeConnectionFailed(String),

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Required environment variable is missing
    #[error("[E2001] Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid value
    #[error("[E2002] Invalid environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Configuration file parse error
    #[error("[E2003] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2004] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Authentication Errors (E3001-E3099)
    // ========================================================================
    #[error("[E3001] Not signed in")]
    NotSignedIn,

    /// Provider rejected the sign-in; carries the provider's error codes
    #[error("[E3002] Sign-in failed: {}", codes.join(", "))]
    AuthenticationFailed { codes: Vec<String> },

    /// The sign-in attempt has not been completed in the browser yet
    #[error("[E3003] Sign-in not completed (status: {0})")]
    SignInIncomplete(String),

    /// Strategy recognised but not usable from this client
    #[error("[E3004] {0} not available")]
    StrategyUnavailable(String),

    #[error("[E3005] Invalid publishable key: {0}")]
    InvalidPublishableKey(String),

    // ========================================================================
    // Storage Errors (E4001-E4099)
    // ========================================================================
    #[error("[E4001] Upload failed: {0}")]
    UploadFailed(String),

    /// Local media file missing before upload
    #[error("[E4002] Media file not found: {0}")]
    MediaFileNotFound(String),

    #[error("[E4003] Failed to delete stored file '{file_id}': {message}")]
    FileDeleteFailed { file_id: String, message: String },

    // ========================================================================
    // Assistant Errors (E5001-E5099)
    // ========================================================================
    #[error("[E5001] Assistant API key is not configured")]
    AssistantKeyMissing,

    #[error("[E5002] {0}")]
    AssistantRequestFailed(String),

    #[error("[E5003] Gemini returned no text")]
    AssistantEmptyResponse,

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Operation not supported
    #[error("[E9002] Operation not supported: {0}")]
    NotSupported(String),

    /// Validation error
    #[error("[E9003] Validation error: {0}")]
    ValidationError(String),

    /// IO error
    #[error("[E9004] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9005] Serialization error: {0}")]
    SerializationError(String),

    /// The viewer tried to act on something they do not own
    #[error("[E9006] Not allowed: {0}")]
    NotOwner(String),
}

/// Result type alias for Parlor operations.
pub type ParlorResult<T> = Result<T, ParlorError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

fn service_of(err: &reqwest::Error) -> String {
    err.url()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<reqwest::Error> for ParlorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ParlorError::RequestTimeout
        } else if err.is_connect() {
            ParlorError::BackendUnavailable(err.to_string())
        } else if err.is_status() {
            match err.status().map(|s| s.as_u16()) {
                Some(429) => ParlorError::RateLimited {
                    service: service_of(&err),
                    retry_after_secs: 60,
                },
                Some(401) | Some(403) => ParlorError::PermissionDenied {
                    service: service_of(&err),
                    message: err
                        .status()
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                },
                _ => ParlorError::BackendRequestFailed(err.to_string()),
            }
        } else if err.is_decode() {
            ParlorError::BackendParseError(err.to_string())
        } else {
            ParlorError::BackendRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ParlorError {
    fn from(err: serde_json::Error) -> Self {
        ParlorError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ParlorError {
    fn from(err: std::io::Error) -> Self {
        ParlorError::IoError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ParlorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ParlorError::RealtimeConnectionFailed(err.to_string())
    }
}

impl From<config::ConfigError> for ParlorError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ParlorError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => ParlorError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => ParlorError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => ParlorError::ConfigParseError(err.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for ParlorError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        match err {
            crate::config::ConfigLoadError::Config(e) => e.into(),
            crate::config::ConfigLoadError::MissingRequired(name) => {
                ParlorError::MissingEnvVar(name)
            }
            crate::config::ConfigLoadError::InvalidValue { key, message } => {
                ParlorError::InvalidConfigValue { key, message }
            }
            crate::config::ConfigLoadError::Io(e) => e.into(),
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl ParlorError {
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            ParlorError::BackendRequestFailed(_)
                | ParlorError::BackendParseError(_)
                | ParlorError::DocumentNotFound { .. }
                | ParlorError::BackendUnavailable(_)
                | ParlorError::PermissionDenied { .. }
                | ParlorError::RequestTimeout
                | ParlorError::RateLimited { .. }
                | ParlorError::RealtimeConnectionFailed(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ParlorError::MissingEnvVar(_)
                | ParlorError::InvalidEnvVar { .. }
                | ParlorError::ConfigParseError(_)
                | ParlorError::InvalidConfigValue { .. }
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ParlorError::NotSignedIn
                | ParlorError::AuthenticationFailed { .. }
                | ParlorError::SignInIncomplete(_)
                | ParlorError::StrategyUnavailable(_)
                | ParlorError::InvalidPublishableKey(_)
        )
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            ParlorError::UploadFailed(_)
                | ParlorError::MediaFileNotFound(_)
                | ParlorError::FileDeleteFailed { .. }
        )
    }

    pub fn is_assistant_error(&self) -> bool {
        matches!(
            self,
            ParlorError::AssistantKeyMissing
                | ParlorError::AssistantRequestFailed(_)
                | ParlorError::AssistantEmptyResponse
        )
    }

    /// Returns true if the failure is likely to clear up if the user tries again.
    ///
    /// Nothing in the core retries on its own; this only shapes the message shown.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ParlorError::BackendUnavailable(_)
                | ParlorError::RequestTimeout
                | ParlorError::RateLimited { .. }
                | ParlorError::RealtimeConnectionFailed(_)
        )
    }

    /// Provider error codes for a failed sign-in, empty for every other error.
    pub fn auth_codes(&self) -> Vec<String> {
        match self {
            ParlorError::AuthenticationFailed { codes } => codes.clone(),
            other if other.is_auth_error() => vec![other.error_code().to_string()],
            _ => Vec::new(),
        }
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            ParlorError::BackendRequestFailed(_) => "E1001",
            ParlorError::BackendParseError(_) => "E1002",
            ParlorError::DocumentNotFound { .. } => "E1003",
            ParlorError::BackendUnavailable(_) => "E1004",
            ParlorError::PermissionDenied { .. } => "E1005",
            ParlorError::RequestTimeout => "E1006",
            ParlorError::RateLimited { .. } => "E1007",
            ParlorError::RealtimeConnectionFailed(_) => "E1008",
            ParlorError::MissingEnvVar(_) => "E2001",
            ParlorError::InvalidEnvVar { .. } => "E2002",
            ParlorError::ConfigParseError(_) => "E2003",
            ParlorError::InvalidConfigValue { .. } => "E2004",
            ParlorError::NotSignedIn => "E3001",
            ParlorError::AuthenticationFailed { .. } => "E3002",
            ParlorError::SignInIncomplete(_) => "E3003",
            ParlorError::StrategyUnavailable(_) => "E3004",
            ParlorError::InvalidPublishableKey(_) => "E3005",
            ParlorError::UploadFailed(_) => "E4001",
            ParlorError::MediaFileNotFound(_) => "E4002",
            ParlorError::FileDeleteFailed { .. } => "E4003",
            ParlorError::AssistantKeyMissing => "E5001",
            ParlorError::AssistantRequestFailed(_) => "E5002",
            ParlorError::AssistantEmptyResponse => "E5003",
            ParlorError::Internal(_) => "E9001",
            ParlorError::NotSupported(_) => "E9002",
            ParlorError::ValidationError(_) => "E9003",
            ParlorError::IoError(_) => "E9004",
            ParlorError::SerializationError(_) => "E9005",
            ParlorError::NotOwner(_) => "E9006",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            ParlorError::MissingEnvVar(_) => {
                Some("Create a .env file or set the environment variable")
            }
            ParlorError::NotSignedIn => Some("Run 'parlor auth login' to sign in"),
            ParlorError::SignInIncomplete(_) => {
                Some("Finish signing in in your browser, then run 'parlor auth complete'")
            }
            ParlorError::InvalidPublishableKey(_) => {
                Some("Copy the publishable key from the identity provider dashboard")
            }
            ParlorError::AssistantKeyMissing => {
                Some("Set GEMINI_API_KEY to enable @ai replies")
            }
            ParlorError::PermissionDenied { .. } => {
                Some("Check the collection and bucket permissions in the backend console")
            }
            ParlorError::RateLimited { .. } => Some("Wait for the rate limit to reset"),
            ParlorError::BackendUnavailable(_) => {
                Some("Check your network connection and the backend endpoint")
            }
            ParlorError::MediaFileNotFound(_) => Some("Check the file path and try again"),
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transient() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Transient error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with its suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a ParlorError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a ParlorError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        let codes = match self.error {
            ParlorError::AuthenticationFailed { codes } => codes.as_slice(),
            _ => &[],
        };
        for code in codes {
            writeln!(f, "  - {}", code)?;
        }

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        if self.error.is_transient() {
            writeln!(f)?;
            writeln!(f, "  This error may be temporary. Try again shortly.")?;
        }

        Ok(())
    }
}
