use tracing::debug;

use super::svg::{MissingImage, render_svg};
use super::{Artifact, ExportFormat};
use crate::data::SVG_MIME;
use crate::error::{CardError, Result};
use crate::surface::Surface;

/// The card as SVG: text stays text, images are embedded inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    pub svg: String,
}

impl Artifact for VectorDocument {
    fn format(&self) -> ExportFormat {
        ExportFormat::Vector
    }

    fn file_name(&self) -> String {
        "business-card.svg".to_string()
    }

    fn mime(&self) -> &'static str {
        SVG_MIME
    }

    fn bytes(&self) -> &[u8] {
        self.svg.as_bytes()
    }
}

/// Fails when any image could not be embedded, so no partial document escapes.
pub fn export_vector(surface: &Surface) -> Result<VectorDocument> {
    let svg = render_svg(surface, MissingImage::Abort)
        .map_err(|err| CardError::VectorSerialization(err.to_string()))?;
    debug!("vector: serialized {} bytes", svg.len());
    Ok(VectorDocument { svg })
}
