use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::{Bitmap, QrEncoder, QrRequest};
use crate::error::CardError;
use crate::model::QrCodeSettings;

/// What a [`QrRenderer::refresh`] call ended up applying.
#[derive(Debug)]
pub enum QrOutcome {
    /// QR slot disabled or text empty; nothing is applied.
    Disabled,
    /// The single cache entry matched; the encoder was not invoked.
    Cached(Bitmap),
    Encoded(Bitmap),
    /// Encoding failed; the card renders without a QR slot.
    Failed(CardError),
    /// A newer request was made while this one was in flight; its result was dropped.
    Superseded,
}

impl QrOutcome {
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match self {
            QrOutcome::Cached(bitmap) | QrOutcome::Encoded(bitmap) => Some(bitmap),
            _ => None,
        }
    }
}

#[derive(Default)]
struct QrState {
    latest: Option<QrRequest>,
    cached: Option<(QrRequest, Bitmap)>,
    applied: Option<Bitmap>,
}

/// Memoizes the active QR bitmap and applies encoder results only when they
/// still match the latest requested key.
pub struct QrRenderer<E> {
    encoder: E,
    state: Mutex<QrState>,
}

impl<E: QrEncoder> QrRenderer<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            state: Mutex::new(QrState::default()),
        }
    }

    /// The bitmap currently applied to the card, if any.
    pub fn current(&self) -> Option<Bitmap> {
        self.lock().applied.clone()
    }

    pub async fn refresh(&self, settings: &QrCodeSettings) -> QrOutcome {
        let Some(request) = QrRequest::from_settings(settings) else {
            let mut state = self.lock();
            state.latest = None;
            state.applied = None;
            return QrOutcome::Disabled;
        };

        {
            let mut state = self.lock();
            state.latest = Some(request.clone());
            let hit = state
                .cached
                .as_ref()
                .filter(|(key, _)| *key == request)
                .map(|(_, bitmap)| bitmap.clone());
            if let Some(bitmap) = hit {
                debug!("qr: cache hit for level {:?}", request.level);
                state.applied = Some(bitmap.clone());
                return QrOutcome::Cached(bitmap);
            }
        }

        let result = self.encoder.encode(request.clone()).await;

        let mut state = self.lock();
        if state.latest.as_ref() != Some(&request) {
            debug!("qr: discarding stale result for superseded request");
            return QrOutcome::Superseded;
        }
        match result {
            Ok(bitmap) => {
                state.cached = Some((request, bitmap.clone()));
                state.applied = Some(bitmap.clone());
                QrOutcome::Encoded(bitmap)
            }
            Err(err) => {
                warn!("qr: {}; rendering without QR code", err);
                state.applied = None;
                QrOutcome::Failed(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, QrState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
