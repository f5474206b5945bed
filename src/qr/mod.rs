use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

use crate::data::ImageRef;
use crate::error::Result;
use crate::model::{ErrorCorrectionLevel, QrCodeSettings};

mod cache;
mod encoder;

pub use cache::{QrOutcome, QrRenderer};
pub use encoder::{DEFAULT_QR_MARGIN, DEFAULT_QR_SIZE, QrCodeEncoder};

/// A PNG-encoded bitmap with its pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub png: Vec<u8>,
}

impl Bitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.png.is_empty()
    }

    pub fn to_image_ref(&self) -> ImageRef {
        ImageRef::from_png(&self.png)
    }
}

/// The (text, color, level) tuple a QR bitmap is memoized by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QrRequest {
    pub text: String,
    pub color: String,
    pub level: ErrorCorrectionLevel,
}

impl QrRequest {
    pub fn new(text: impl Into<String>, color: impl Into<String>, level: ErrorCorrectionLevel) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
            level,
        }
    }

    /// `None` unless the QR slot is enabled and has text to encode.
    pub fn from_settings(settings: &QrCodeSettings) -> Option<Self> {
        if !settings.enabled || settings.text.is_empty() {
            return None;
        }
        Some(Self::new(
            settings.text.clone(),
            settings.color.clone(),
            settings.error_correction_level,
        ))
    }
}

pub type QrFuture = Pin<Box<dyn Future<Output = Result<Bitmap>> + Send>>;

/// Turns a QR request into a bitmap, possibly off the calling task.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, request: QrRequest) -> QrFuture;
}
