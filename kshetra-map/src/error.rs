//! Error types for KshetraMap

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// KshetraMap error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Layout file error
    #[error("Layout error: {0}")]
    Layout(String),

    /// Marker registry is at capacity
    #[error("Marker limit reached ({0})")]
    MarkerLimit(usize),

    /// Marker already placed on that cell
    #[error("Marker already present at ({x:.0}, {y:.0})")]
    DuplicateMarker { x: f32, y: f32 },

    /// Point outside the field frame
    #[error("Point ({x:.0}, {y:.0}) is outside the field")]
    OutOfField { x: f32, y: f32 },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Layout(e.to_string())
    }
}
