// ============================================================================
// ERRORS — everything the editor can surface to its caller
// ============================================================================

use thiserror::Error;

/// Error type for session, compositing, and file operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The file could not be decoded into pixels (corrupt or unknown format).
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The file is not an image at all (MIME type outside `image/*`).
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    /// The output drawing surface could not be created.
    #[error("canvas context unavailable: {0}")]
    CanvasContext(String),

    /// A coordinate invariant was violated. Indicates a bug upstream.
    #[error("geometry invariant violated: {0}")]
    Geometry(String),

    /// A save was requested while another one was still running.
    #[error("an export is already in progress")]
    ExportInProgress,

    /// A command-line value could not be understood.
    #[error("{0}")]
    InvalidArgument(String),

    /// An operation needed a loaded image but none is present.
    #[error("no image loaded")]
    NoImage,

    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid edit file: {0}")]
    EditFile(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
