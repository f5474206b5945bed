//! Ties the card inputs, QR cache, surface provider and exporters together.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{CardError, Result};
use crate::export::{
    self, ExportFormat, PrintDocument, RasterImage, Rasterizer, VectorDocument,
};
use crate::layout::{LayoutInput, layout, resolve_logo};
use crate::model::{CardSpec, ColorSuggestion};
use crate::qr::{QrEncoder, QrOutcome, QrRenderer};
use crate::surface::{ImageLoader, MountOutcome, Surface, SurfaceProvider};

/// What one [`CardStudio::refresh`] did.
#[derive(Debug)]
pub struct Refresh {
    pub qr: QrOutcome,
    pub mount: MountOutcome,
}

impl Refresh {
    pub fn surface(&self) -> Option<&Arc<Surface>> {
        match &self.mount {
            MountOutcome::Mounted(surface) => Some(surface),
            MountOutcome::Superseded => None,
        }
    }
}

/// Owns the card inputs and everything derived from them.
///
/// Any change to the inputs is followed by [`refresh`](Self::refresh), which
/// regenerates the whole document and remounts it. Exports always capture
/// whichever surface is mounted when they start.
pub struct CardStudio<E, L> {
    spec: Mutex<CardSpec>,
    qr: QrRenderer<E>,
    surfaces: SurfaceProvider<L>,
    rasterizer: Rasterizer,
    busy: Mutex<HashSet<ExportFormat>>,
}

struct BusyGuard<'a> {
    busy: &'a Mutex<HashSet<ExportFormat>>,
    format: ExportFormat,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        lock(self.busy).remove(&self.format);
    }
}

impl<E: QrEncoder, L: ImageLoader> CardStudio<E, L> {
    pub fn new(spec: CardSpec, encoder: E, loader: L, rasterizer: Rasterizer) -> Self {
        Self {
            spec: Mutex::new(spec),
            qr: QrRenderer::new(encoder),
            surfaces: SurfaceProvider::new(loader),
            rasterizer,
            busy: Mutex::new(HashSet::new()),
        }
    }

    pub fn spec(&self) -> CardSpec {
        lock(&self.spec).clone()
    }

    /// Edits the inputs in place. Call [`refresh`](Self::refresh) afterwards.
    pub fn update(&self, edit: impl FnOnce(&mut CardSpec)) {
        edit(&mut lock(&self.spec));
    }

    /// Writes the suggested colors into the style settings verbatim.
    pub fn apply_color_suggestion(&self, suggestion: &ColorSuggestion) {
        if !suggestion.is_well_formed() {
            debug!("studio: applying color suggestion with non-hex values");
        }
        self.update(|spec| spec.style.apply_suggestion(suggestion));
    }

    pub async fn refresh(&self) -> Refresh {
        let ticket = self.surfaces.reserve();
        let spec = self.spec();

        let qr = self.qr.refresh(&spec.qr_code).await;
        if matches!(qr, QrOutcome::Superseded) {
            return Refresh {
                qr,
                mount: MountOutcome::Superseded,
            };
        }

        let logo = resolve_logo(spec.logo_preview.as_deref(), spec.card.logo.as_deref());
        let document = layout(&LayoutInput {
            data: &spec.card,
            style: &spec.style,
            logo: logo.as_ref(),
            qr: qr.bitmap(),
            template: spec.template,
        });
        info!(
            "studio: laid out {} template with {} element(s)",
            spec.template,
            document.elements.len()
        );
        let mount = self.surfaces.mount(ticket, document).await;
        Refresh { qr, mount }
    }

    pub fn current_surface(&self) -> Result<Arc<Surface>> {
        self.surfaces.current_surface()
    }

    pub async fn export_raster(&self, dpi: u32) -> Result<RasterImage> {
        let _guard = self.begin(ExportFormat::Raster)?;
        let surface = self.surfaces.current_surface()?;
        let rasterizer = self.rasterizer.clone();
        run_blocking(ExportFormat::Raster, move || {
            export::export_raster(&surface, dpi, &rasterizer)
        })
        .await
    }

    pub async fn export_print(&self) -> Result<PrintDocument> {
        let _guard = self.begin(ExportFormat::Print)?;
        let surface = self.surfaces.current_surface()?;
        let rasterizer = self.rasterizer.clone();
        run_blocking(ExportFormat::Print, move || {
            export::export_print(&surface, &rasterizer)
        })
        .await
    }

    pub async fn export_vector(&self) -> Result<VectorDocument> {
        let _guard = self.begin(ExportFormat::Vector)?;
        let surface = self.surfaces.current_surface()?;
        run_blocking(ExportFormat::Vector, move || export::export_vector(&surface)).await
    }

    fn begin(&self, format: ExportFormat) -> Result<BusyGuard<'_>> {
        if !lock(&self.busy).insert(format) {
            return Err(CardError::Busy(format));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            format,
        })
    }
}

async fn run_blocking<T, F>(format: ExportFormat, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(|err| {
        let reason = format!("{} export task failed: {}", format, err);
        match format {
            ExportFormat::Vector => CardError::VectorSerialization(reason),
            ExportFormat::Raster | ExportFormat::Print => CardError::Capture(reason),
        }
    })?
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
