//! Error types for raytrace-scene.
//!
//! The synchronization core never returns these: missing scenes, cameras,
//! materials and texture paths fall back to sentinels instead. Errors only
//! come from the ambient edges (files, images, settings, GPU setup).

use thiserror::Error;

/// Main error type for raytrace-scene operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be opened or decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Settings file could not be parsed or written
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Decoded texture does not match the atlas layer size
    #[error("Texture size mismatch: expected {expected} bytes, got {actual}")]
    TextureSize { expected: usize, actual: usize },

    /// Compute kernel could not be loaded or created
    #[error("Kernel error: {0}")]
    Kernel(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a kernel error from a string.
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }
}

/// Result type alias for raytrace-scene operations.
pub type Result<T> = std::result::Result<T, Error>;
