//! The single mounted card surface exporters capture from.
//!
//! Mounting resolves every image a [`CardDocument`] references before the
//! surface becomes visible, so a capture never observes a half-loaded card.

use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::data::{ImageData, ImageRef, SVG_MIME, decode_data_url, detect_image_mime};
use crate::error::{CardError, Result};
use crate::layout::CardDocument;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<ImageData>> + Send + 'a>>;

/// Fetches the bytes behind an [`ImageRef`].
pub trait ImageLoader: Send + Sync {
    fn load<'a>(&'a self, source: &'a ImageRef) -> LoadFuture<'a>;
}

/// Decodes `data:` URLs, fetches remote URLs over HTTP and reads local files.
#[derive(Debug, Clone)]
pub struct DefaultImageLoader {
    client: reqwest::Client,
}

impl DefaultImageLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<ImageData> {
        let fail = |reason: String| CardError::ImageLoad {
            location: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| fail(err.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("status {}", response.status())));
        }
        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| fail(err.to_string()))?
            .to_vec();
        let mime = detect_image_mime(&bytes, declared.as_deref(), None)
            .ok_or_else(|| fail("response is not an image".to_string()))?;
        Ok(ImageData { mime, bytes })
    }

    async fn read_file(&self, path: &std::path::Path) -> Result<ImageData> {
        let fail = |reason: String| CardError::ImageLoad {
            location: path.display().to_string(),
            reason,
        };
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| fail(err.to_string()))?;
        let mime = detect_image_mime(&bytes, None, Some(path))
            .ok_or_else(|| fail("file is not an image".to_string()))?;
        Ok(ImageData { mime, bytes })
    }
}

impl ImageLoader for DefaultImageLoader {
    fn load<'a>(&'a self, source: &'a ImageRef) -> LoadFuture<'a> {
        Box::pin(async move {
            let data = match source {
                ImageRef::Data(url) => decode_data_url(url),
                ImageRef::Remote(url) => self.fetch(url).await,
                ImageRef::File(path) => self.read_file(path).await,
            }?;
            ensure_decodable(source, data).await
        })
    }
}

/// Fully decodes raster payloads so a truncated or corrupt image fails here
/// instead of silently dropping out of a capture.
async fn ensure_decodable(source: &ImageRef, data: ImageData) -> Result<ImageData> {
    if data.mime == SVG_MIME {
        return Ok(data);
    }
    let location = source.location();
    tokio::task::spawn_blocking(move || match image::load_from_memory(&data.bytes) {
        Ok(_) => Ok(data),
        Err(err) => Err(CardError::ImageLoad {
            location,
            reason: format!("cannot decode {}: {}", data.mime, err),
        }),
    })
    .await
    .map_err(|err| CardError::ImageLoad {
        location: source.location(),
        reason: format!("decode task failed: {}", err),
    })?
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loaded(ImageData),
    /// The reason the image could not be loaded.
    Failed(String),
}

/// A laid-out document together with every image it references.
#[derive(Debug)]
pub struct Surface {
    generation: u64,
    document: CardDocument,
    images: BTreeMap<ImageRef, ImageState>,
}

impl Surface {
    /// A surface outside any provider, with generation 0.
    pub fn new(document: CardDocument, images: BTreeMap<ImageRef, ImageState>) -> Self {
        Self {
            generation: 0,
            document,
            images,
        }
    }

    pub fn document(&self) -> &CardDocument {
        &self.document
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self, source: &ImageRef) -> Option<&ImageState> {
        self.images.get(source)
    }

    pub fn loaded(&self, source: &ImageRef) -> Option<&ImageData> {
        match self.images.get(source) {
            Some(ImageState::Loaded(data)) => Some(data),
            _ => None,
        }
    }

    pub fn failed_images(&self) -> impl Iterator<Item = (&ImageRef, &str)> {
        self.images.iter().filter_map(|(source, state)| match state {
            ImageState::Failed(reason) => Some((source, reason.as_str())),
            ImageState::Loaded(_) => None,
        })
    }
}

/// Reserved at the start of a refresh; only the newest ticket may mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MountTicket(u64);

#[derive(Debug)]
pub enum MountOutcome {
    Mounted(Arc<Surface>),
    /// A newer ticket was reserved while this mount was loading images.
    Superseded,
}

#[derive(Default)]
struct ProviderState {
    latest: u64,
    mounted: Option<Arc<Surface>>,
}

/// Owns the one mounted [`Surface`] and replaces it wholesale on each mount.
pub struct SurfaceProvider<L> {
    loader: L,
    state: Mutex<ProviderState>,
}

impl<L: ImageLoader> SurfaceProvider<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            state: Mutex::new(ProviderState::default()),
        }
    }

    pub fn reserve(&self) -> MountTicket {
        let mut state = self.lock();
        state.latest += 1;
        MountTicket(state.latest)
    }

    pub async fn mount(&self, ticket: MountTicket, document: CardDocument) -> MountOutcome {
        let sources: BTreeSet<ImageRef> = document.images().cloned().collect();
        let loads = sources.into_iter().map(|source| async move {
            let state = match self.loader.load(&source).await {
                Ok(data) => ImageState::Loaded(data),
                Err(err) => {
                    warn!("surface: {}", err);
                    ImageState::Failed(err.to_string())
                }
            };
            (source, state)
        });
        let images: BTreeMap<ImageRef, ImageState> = join_all(loads).await.into_iter().collect();

        let mut state = self.lock();
        if ticket.0 != state.latest {
            debug!(
                "surface: dropping mount {} (latest is {})",
                ticket.0, state.latest
            );
            return MountOutcome::Superseded;
        }
        let surface = Arc::new(Surface {
            generation: ticket.0,
            document,
            images,
        });
        info!(
            "surface: mounted generation {} with {} image(s)",
            surface.generation,
            surface.images.len()
        );
        state.mounted = Some(surface.clone());
        MountOutcome::Mounted(surface)
    }

    /// Snapshot of the mounted surface. The returned `Arc` stays valid even if
    /// a later mount replaces it.
    pub fn current_surface(&self) -> Result<Arc<Surface>> {
        self.lock().mounted.clone().ok_or(CardError::NoSurface)
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
