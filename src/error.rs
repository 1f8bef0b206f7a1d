//! Error types for the stockroom library.
//!
//! Every fallible operation in the library returns [`Result`], so callers get a
//! typed reason instead of a sentinel value or a silently defaulted field.

use thiserror::Error;

/// Errors that can occur while working with the inventory store.
#[derive(Error, Debug)]
pub enum StockroomError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Could not obtain a pooled connection
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No account with this user id
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Registration attempted with an email that already has an account
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// The inventory table derived from a display name belongs to someone else
    #[error("Inventory table {0} is already assigned to another user")]
    TableConflict(String),

    /// No item with this name in the user's inventory
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// An item with this name is already in the user's inventory
    #[error("Item already exists: {0}")]
    DuplicateItem(String),

    /// Every generated user id candidate collided with an existing account
    #[error("Could not allocate a unique user id after {0} attempts")]
    IdExhausted(u32),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Convenience type alias for Result with StockroomError
pub type Result<T> = std::result::Result<T, StockroomError>;

impl From<config::ConfigError> for StockroomError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
