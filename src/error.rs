//! Error types for ghstars.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=sync, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

/// Result type alias for ghstars operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    DatabaseIsNotInitialized,
    SchemaCreationFailed,
    InitializationFailed,
    DatabaseSaveFailed,
    DatabaseError,

    // Sync (exit 3)
    ImportFailed,
    DeserializationFailed,
    RemoveUnstarredRepositoriesFailed,

    // Validation (exit 4)
    InvalidArgument,

    // Busy (exit 5)
    Locked,

    // Remote (exit 6)
    RequestFailed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DatabaseIsNotInitialized => "DATABASE_IS_NOT_INITIALIZED",
            Self::SchemaCreationFailed => "SCHEMA_CREATION_FAILED",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
            Self::DatabaseSaveFailed => "DATABASE_SAVE_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ImportFailed => "IMPORT_FAILED",
            Self::DeserializationFailed => "DESERIALIZATION_FAILED",
            Self::RemoveUnstarredRepositoriesFailed => "REMOVE_UNSTARRED_REPOSITORIES_FAILED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Locked => "LOCKED",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::DatabaseIsNotInitialized
            | Self::SchemaCreationFailed
            | Self::InitializationFailed
            | Self::DatabaseSaveFailed
            | Self::DatabaseError => 2,
            Self::ImportFailed
            | Self::DeserializationFailed
            | Self::RemoveUnstarredRepositoriesFailed => 3,
            Self::InvalidArgument => 4,
            Self::Locked => 5,
            Self::RequestFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether running the same command again may succeed without changes.
    ///
    /// True for transport failures and lock contention. False for
    /// data-integrity, configuration and internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailed | Self::Locked)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in ghstars operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub GraphQL request failed: {0}")]
    RequestFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Import to storage failed: {0}")]
    ImportFailed(String),

    #[error("Unable to save database file: {0}")]
    DatabaseSaveFailed(String),

    #[error("Database schema creation failed: {0}")]
    SchemaCreationFailed(String),

    #[error("Storage initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Remove unstarred repositories failed: {0}")]
    RemoveUnstarredRepositoriesFailed(String),

    #[error("Database is not initialized")]
    DatabaseIsNotInitialized,

    #[error("Another operation is already in progress")]
    Locked,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::RequestFailed(_) => ErrorCode::RequestFailed,
            Self::DeserializationFailed(_) => ErrorCode::DeserializationFailed,
            Self::ImportFailed(_) => ErrorCode::ImportFailed,
            Self::DatabaseSaveFailed(_) => ErrorCode::DatabaseSaveFailed,
            Self::SchemaCreationFailed(_) => ErrorCode::SchemaCreationFailed,
            Self::InitializationFailed(_) => ErrorCode::InitializationFailed,
            Self::RemoveUnstarredRepositoriesFailed(_) => {
                ErrorCode::RemoveUnstarredRepositoriesFailed
            }
            Self::DatabaseIsNotInitialized => ErrorCode::DatabaseIsNotInitialized,
            Self::Locked => ErrorCode::Locked,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::DatabaseIsNotInitialized => {
                Some("Run `ghstars init` to create the stars database".to_string())
            }
            Self::RequestFailed(msg) if msg.contains("401") => Some(
                "GitHub rejected the access token. Set `access_token` in the config \
                 file or export GITHUB_TOKEN."
                    .to_string(),
            ),
            Self::RequestFailed(_) => Some(
                "Check your network connection and GitHub rate limits, then retry.".to_string(),
            ),
            Self::Locked => Some(
                "Another sync or prune is running. Wait for it to finish and retry.".to_string(),
            ),
            Self::DeserializationFailed(_) => Some(
                "Stored or received data is malformed. Run `ghstars sync --full` to rebuild it."
                    .to_string(),
            ),
            Self::InvalidArgument(msg) if msg.contains("page size") => {
                Some("Page size must be between 1 and 100".to_string())
            }
            Self::Config(_) => Some(
                "Check ~/.ghstars/config.json (or the file named by GHSTARS_CONFIG)".to_string(),
            ),
            Self::ImportFailed(_)
            | Self::DatabaseSaveFailed(_)
            | Self::SchemaCreationFailed(_)
            | Self::InitializationFailed(_)
            | Self::RemoveUnstarredRepositoriesFailed(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
