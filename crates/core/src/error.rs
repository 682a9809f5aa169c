/// Result alias that carries the custom [`BeamError`] type.
pub type Result<T> = std::result::Result<T, BeamError>;

/// Common error type for the core crate.
///
/// The animation path itself never fails: frames that cannot be drawn are
/// skipped. Errors only surface from configuration loading and frame export.
#[derive(Debug, thiserror::Error)]
pub enum BeamError {
    /// Free-form message for failures without a more specific category.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration documents that fail to parse.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The drawing surface could not provide a backing store.
    #[error("surface unavailable: {0}")]
    Surface(String),
    /// A rendered frame could not be encoded for export.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl BeamError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
