use image::{DynamicImage, ImageFormat, Rgba as Pixel, RgbaImage};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use tracing::debug;

use super::{Bitmap, QrEncoder, QrFuture, QrRequest};
use crate::color::Rgba;
use crate::error::{CardError, Result};
use crate::model::ErrorCorrectionLevel;

/// Output edge length in pixels, independent of the on-card display size.
pub const DEFAULT_QR_SIZE: u32 = 200;
/// Quiet zone in modules.
pub const DEFAULT_QR_MARGIN: u32 = 1;

/// Encodes QR codes with the `qrcode` crate and paints them into a transparent PNG.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeEncoder {
    size: u32,
    margin: u32,
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_QR_SIZE, DEFAULT_QR_MARGIN)
    }
}

impl QrCodeEncoder {
    pub fn new(size: u32, margin: u32) -> Self {
        Self {
            size: size.max(1),
            margin,
        }
    }

    /// Synchronous encode; the async [`QrEncoder`] impl runs this on the blocking pool.
    pub fn encode_now(&self, request: &QrRequest) -> Result<Bitmap> {
        let dark = Rgba::parse_hex(&request.color)
            .map_err(|_| CardError::QrEncoding(format!("invalid QR color '{}'", request.color)))?;
        let code = QrCode::with_error_correction_level(request.text.as_bytes(), ec_level(request.level))
            .map_err(|err| CardError::QrEncoding(err.to_string()))?;

        let modules = code.width() as u32;
        let total = modules + self.margin * 2;
        let size = self.size.max(total);
        let scale = size as f32 / total as f32;
        let dark_pixel = Pixel([dark.r, dark.g, dark.b, dark.a]);
        let clear = Pixel([0, 0, 0, 0]);

        let image = RgbaImage::from_fn(size, size, |px, py| {
            let mx = (px as f32 / scale).floor() as i64 - self.margin as i64;
            let my = (py as f32 / scale).floor() as i64 - self.margin as i64;
            let inside = mx >= 0 && my >= 0 && mx < modules as i64 && my < modules as i64;
            if inside && code[(mx as usize, my as usize)] == qrcode::Color::Dark {
                dark_pixel
            } else {
                clear
            }
        });

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| CardError::QrEncoding(format!("failed to encode QR bitmap: {}", err)))?;
        debug!(
            "qr: encoded {} modules at level {:?} into {}px",
            modules, request.level, size
        );
        Ok(Bitmap {
            width: size,
            height: size,
            png,
        })
    }
}

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, request: QrRequest) -> QrFuture {
        let encoder = *self;
        Box::pin(async move {
            tokio::task::spawn_blocking(move || encoder.encode_now(&request))
                .await
                .map_err(|err| CardError::QrEncoding(format!("encoder task failed: {}", err)))?
        })
    }
}

fn ec_level(level: ErrorCorrectionLevel) -> EcLevel {
    match level {
        ErrorCorrectionLevel::L => EcLevel::L,
        ErrorCorrectionLevel::M => EcLevel::M,
        ErrorCorrectionLevel::Q => EcLevel::Q,
        ErrorCorrectionLevel::H => EcLevel::H,
    }
}
