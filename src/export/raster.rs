use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::render;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::debug;
use usvg::{Options, Tree, fontdb};

use super::svg::{MissingImage, render_svg};
use super::{Artifact, CSS_DPI, ExportFormat, MAX_DPI, capture_scale, pixel_size};
use crate::data::PNG_MIME;
use crate::error::{CardError, Result};
use crate::surface::Surface;

/// Captures surfaces into pixels. Holds the font database so it is only
/// scanned once per process.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl Rasterizer {
    /// System fonts plus an optional extra font file.
    pub fn new(font_path: Option<&Path>) -> Result<Self> {
        let mut db = system_fonts();
        if let Some(path) = font_path {
            db.load_font_file(path)?;
        }
        debug!("raster: font database holds {} faces", db.len());
        Ok(Self {
            fontdb: Arc::new(db),
        })
    }

    /// Renders the surface at `dpi`, returning straight-alpha RGBA pixels.
    pub(crate) fn capture(&self, surface: &Surface, dpi: u32) -> Result<RgbaImage> {
        let svg = render_svg(surface, MissingImage::Skip)
            .map_err(|err| CardError::Capture(err.to_string()))?;
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&svg, &options)
            .map_err(|err| CardError::Capture(format!("failed to parse card markup: {}", err)))?;

        let (width, height) = pixel_size(dpi);
        let scale = capture_scale(dpi);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| CardError::Capture(format!("empty capture size {}x{}", width, height)))?;
        render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        let mut raw = Vec::with_capacity(pixmap.pixels().len() * 4);
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| CardError::Capture("failed to build image buffer".to_string()))
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self {
            fontdb: Arc::new(system_fonts()),
        }
    }
}

fn system_fonts() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    db
}

/// A lossless PNG capture of the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub dpi: u32,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Artifact for RasterImage {
    fn format(&self) -> ExportFormat {
        ExportFormat::Raster
    }

    fn file_name(&self) -> String {
        format!("business-card-{}dpi.png", self.dpi)
    }

    fn mime(&self) -> &'static str {
        PNG_MIME
    }

    fn bytes(&self) -> &[u8] {
        &self.png
    }
}

pub fn export_raster(surface: &Surface, dpi: u32, rasterizer: &Rasterizer) -> Result<RasterImage> {
    if dpi == 0 || dpi > MAX_DPI {
        return Err(CardError::InvalidDpi(dpi));
    }
    let image = rasterizer.capture(surface, dpi)?;
    let (width, height) = image.dimensions();
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| CardError::Capture(format!("failed to encode png: {}", err)))?;
    debug!(
        "raster: {}x{} at {}dpi (scale {:.4} of {}dpi)",
        width,
        height,
        dpi,
        capture_scale(dpi),
        CSS_DPI
    );
    Ok(RasterImage {
        dpi,
        width,
        height,
        png,
    })
}
