use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;

pub mod color;
pub mod data;
pub mod error;
pub mod export;
pub mod layout;
pub mod logging;
pub mod model;
pub mod qr;
pub mod settings;
pub mod studio;
pub mod surface;
#[cfg(test)]
mod test_util;

pub use error::CardError;
pub use export::{
    Artifact, ExportFormat, PrintDocument, RasterImage, Rasterizer, VectorDocument, write_artifact,
};
pub use layout::{CardDocument, LayoutInput, layout};
pub use model::{CardData, CardSpec, ColorSuggestion, QrCodeSettings, StyleSettings, TemplateId};
pub use qr::{QrCodeEncoder, QrOutcome};
pub use studio::CardStudio;
pub use surface::{DefaultImageLoader, Surface};

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub formats: Vec<ExportFormat>,
    /// Overrides `[export] dpi`.
    pub dpi: Option<u32>,
    /// Overrides `[export] output_dir`.
    pub output_dir: Option<PathBuf>,
    /// Logo preview that wins over the card's persisted logo.
    pub logo: Option<String>,
    pub settings_path: Option<PathBuf>,
}

/// Per-format results of one run. Every requested format is attempted.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<(ExportFormat, PathBuf)>,
    pub failed: Vec<(ExportFormat, CardError)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub async fn run(config: Config) -> Result<ExportReport> {
    let settings = settings::load_settings(config.settings_path.as_deref())?;
    let mut spec = CardSpec::load(&config.input)?;
    if let Some(logo) = config.logo {
        spec.logo_preview = Some(logo);
    }

    let rasterizer = Rasterizer::new(settings.font_path.as_deref()).with_context(|| {
        format!(
            "failed to load font: {}",
            settings
                .font_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        )
    })?;
    let loader = DefaultImageLoader::new(settings.fetch_timeout)
        .with_context(|| "failed to build http client")?;
    let encoder = QrCodeEncoder::new(settings.qr_size, settings.qr_margin);
    let studio = CardStudio::new(spec, encoder, loader, rasterizer);

    let refresh = studio.refresh().await;
    if let QrOutcome::Failed(err) = &refresh.qr {
        warn!("rendering without QR code: {}", err);
    }
    if let Some(surface) = refresh.surface() {
        for (source, reason) in surface.failed_images() {
            warn!("image {} could not be loaded: {}", source.location(), reason);
        }
    }

    let dpi = config.dpi.unwrap_or(settings.export_dpi);
    let output_dir = config.output_dir.unwrap_or(settings.output_dir);
    let mut report = ExportReport::default();
    for format in unique_formats(&config.formats) {
        let written = match format {
            ExportFormat::Raster => studio
                .export_raster(dpi)
                .await
                .and_then(|artifact| write_artifact(&artifact, &output_dir)),
            ExportFormat::Print => studio
                .export_print()
                .await
                .and_then(|artifact| write_artifact(&artifact, &output_dir)),
            ExportFormat::Vector => studio
                .export_vector()
                .await
                .and_then(|artifact| write_artifact(&artifact, &output_dir)),
        };
        match written {
            Ok(path) => report.written.push((format, path)),
            Err(err) => {
                warn!("{} export failed: {}", format, err);
                report.failed.push((format, err));
            }
        }
    }
    Ok(report)
}

/// Requested formats in first-seen order, each at most once.
fn unique_formats(requested: &[ExportFormat]) -> Vec<ExportFormat> {
    let mut formats = Vec::with_capacity(requested.len());
    for format in requested {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }
    formats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_formats_run_once_in_request_order() {
        let requested = [
            ExportFormat::Vector,
            ExportFormat::Raster,
            ExportFormat::Vector,
            ExportFormat::Print,
            ExportFormat::Raster,
        ];
        assert_eq!(
            unique_formats(&requested),
            [ExportFormat::Vector, ExportFormat::Raster, ExportFormat::Print]
        );
        assert!(unique_formats(&[]).is_empty());
    }
}
