//! Error types for Rekha

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rekha error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Sensor or actuator failure (not recoverable)
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Expected tile boundary was not reached within the configured retry budget
    #[error("Tile not reached after {attempts} recovery attempts")]
    TileNotReached {
        /// Recovery attempts made before giving up
        attempts: u32,
    },

    /// Run interrupted by an external stop request
    #[error("Interrupted")]
    Interrupted,

    /// Background thread could not be spawned
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
