use thiserror::Error;

use crate::export::ExportFormat;

/// Errors raised by the card rendering core.
///
/// Every variant is scoped to a single QR recompute, mount, or export; none of
/// them leaves the mounted surface or the card inputs in a changed state.
#[derive(Debug, Error)]
pub enum CardError {
    /// The QR adapter could not encode the request (capacity, color, worker).
    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    /// Rasterizing the surface failed.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The surface could not be serialized as a vector document.
    #[error("vector serialization failed: {0}")]
    VectorSerialization(String),

    #[error("failed to load image {location}: {reason}")]
    ImageLoad { location: String, reason: String },

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("unsupported dpi {0} (expected 1..=1200)")]
    InvalidDpi(u32),

    #[error("no card surface is mounted")]
    NoSurface,

    #[error("{0} export already in progress")]
    Busy(ExportFormat),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CardError> = std::result::Result<T, E>;
