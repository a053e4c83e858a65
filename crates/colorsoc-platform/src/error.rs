//! Error types for platform catalog operations.

use std::path::PathBuf;

/// Errors that can occur while looking up or loading board platforms.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing board files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board file not found.
    #[error("board file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// No board with this variant name is known.
    #[error("unknown board '{board}' (known boards: {})", known.join(", "))]
    UnknownBoard {
        board: String,
        known: Vec<String>,
    },

    /// The board is known but the revision is not.
    #[error(
        "board '{board}' has no revision '{revision}' (supported: {})",
        supported.join(", ")
    )]
    UnsupportedRevision {
        board: String,
        revision: String,
        supported: Vec<String>,
    },

    /// A board name that cannot be used as a file stem or HDL identifier.
    #[error("invalid board name '{name}': use only ASCII letters, digits and '_'")]
    InvalidName { name: String },

    /// Validation error in a board definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
