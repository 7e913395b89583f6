//! Error types for ShankhaLink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ShankhaLink error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No serial port present on the system
    #[error("No serial port found")]
    NoPortFound,

    /// Malformed or out-of-range drive frame
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Joystick device error
    #[error("Joystick error: {0}")]
    Joystick(String),

    /// Joystick device disconnected mid-session
    #[error("Joystick disconnected")]
    Disconnected,

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
