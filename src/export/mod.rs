//! Exporters that capture the mounted surface into files.

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::layout::{CARD_HEIGHT, CARD_WIDTH};

mod print;
mod raster;
pub(crate) mod svg;
mod vector;

pub use print::{PRINT_DPI, PrintDocument, export_print};
pub use raster::{RasterImage, Rasterizer, export_raster};
pub use vector::{VectorDocument, export_vector};

/// CSS reference resolution the card geometry is expressed in.
pub const CSS_DPI: u32 = 96;
pub const MAX_DPI: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Raster,
    Print,
    Vector,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Raster, ExportFormat::Print, ExportFormat::Vector];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Raster => "png",
            ExportFormat::Print => "pdf",
            ExportFormat::Vector => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished export, ready to be written out.
pub trait Artifact {
    fn format(&self) -> ExportFormat;
    fn file_name(&self) -> String;
    fn mime(&self) -> &'static str;
    fn bytes(&self) -> &[u8];
}

pub(crate) fn capture_scale(dpi: u32) -> f32 {
    dpi as f32 / CSS_DPI as f32
}

/// Pixel size of a capture at `dpi`, floored.
pub fn pixel_size(dpi: u32) -> (u32, u32) {
    let width = CARD_WIDTH as u64 * dpi as u64 / CSS_DPI as u64;
    let height = CARD_HEIGHT as u64 * dpi as u64 / CSS_DPI as u64;
    (width as u32, height as u32)
}

/// Writes `artifact` into `dir` through a temp file and rename, so a failure
/// never leaves a partial file behind.
pub fn write_artifact(artifact: &dyn Artifact, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(artifact.file_name());
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(artifact.bytes())?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|err| err.error)?;
    info!(
        "export: wrote {} {} ({}, {} bytes)",
        artifact.format(),
        target.display(),
        artifact.mime(),
        artifact.bytes().len()
    );
    Ok(target)
}
