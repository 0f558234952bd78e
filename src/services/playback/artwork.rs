use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::PlaybackError;

/// Fetched artwork bytes, cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artwork {
    bytes: Arc<Vec<u8>>,
}

impl Artwork {
    /// Wrap raw image bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    /// The raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Callback invoked when a deferred artwork fetch completes.
pub type ArtworkCallback = Arc<dyn Fn(Artwork) + Send + Sync>;

/// Resolves an artwork URL into image bytes.
#[async_trait]
pub trait ArtworkFetcher: Send + Sync {
    /// Fetch the image at `url`.
    ///
    /// # Errors
    /// Returns error if the image cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<Artwork, PlaybackError>;
}

/// HTTP artwork fetcher.
#[derive(Default)]
pub struct HttpArtworkFetcher {
    client: reqwest::Client,
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, url: &str) -> Result<Artwork, PlaybackError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PlaybackError::FetchFailed {
                url: url.to_string(),
                details: e.to_string(),
            })?;

        let bytes = response.bytes().await.map_err(|e| PlaybackError::FetchFailed {
            url: url.to_string(),
            details: e.to_string(),
        })?;

        Ok(Artwork::new(bytes.to_vec()))
    }
}

#[derive(Default)]
struct Slot {
    url: Option<String>,
    artwork: Option<Artwork>,
    in_flight: bool,
    callback: Option<ArtworkCallback>,
}

/// Single-slot artwork cache keyed by the last requested URL.
///
/// Not a general cache: at most one remembered result, no eviction policy,
/// no bounded concurrency. A request for a different URL while a fetch is
/// pending overwrites the slot target; the stale fetch is not cancelled, its
/// result is discarded by an identity check against the then-current URL.
pub struct ArtworkCache {
    fetcher: Arc<dyn ArtworkFetcher>,
    slot: Arc<Mutex<Slot>>,
}

impl ArtworkCache {
    /// Create a cache backed by the given fetcher.
    pub fn new(fetcher: Arc<dyn ArtworkFetcher>) -> Self {
        Self {
            fetcher,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Resolve artwork for `url`.
    ///
    /// Returns the cached artwork synchronously when `url` matches the last
    /// request and its fetch has completed. Otherwise returns `None`: if a
    /// fetch for the same URL is already pending, only the remembered
    /// callback is replaced; for a new URL a fetch is started and `on_ready`
    /// is invoked once it completes. A failed fetch yields no artwork and no
    /// retry.
    pub fn resolve(&self, url: Option<&str>, on_ready: ArtworkCallback) -> Option<Artwork> {
        let Ok(mut slot) = self.slot.lock() else {
            return None;
        };

        let Some(url) = url else {
            *slot = Slot::default();
            return None;
        };

        if slot.url.as_deref() == Some(url) {
            if let Some(artwork) = &slot.artwork {
                return Some(artwork.clone());
            }
            if slot.in_flight {
                slot.callback = Some(on_ready);
                return None;
            }
        }

        slot.url = Some(url.to_string());
        slot.artwork = None;
        slot.in_flight = true;
        slot.callback = Some(on_ready);
        drop(slot);

        let fetcher = Arc::clone(&self.fetcher);
        let slot_handle = Arc::clone(&self.slot);
        let target = url.to_string();
        tokio::spawn(async move {
            let result = fetcher.fetch(&target).await;

            let Ok(mut slot) = slot_handle.lock() else {
                return;
            };
            if slot.url.as_deref() != Some(target.as_str()) {
                debug!("Discarding stale artwork result for {target}");
                return;
            }

            slot.in_flight = false;
            match result {
                Ok(artwork) => {
                    slot.artwork = Some(artwork.clone());
                    let callback = slot.callback.take();
                    drop(slot);
                    if let Some(callback) = callback {
                        callback(artwork);
                    }
                }
                Err(e) => {
                    slot.callback = None;
                    warn!("Artwork fetch failed for {target}: {e}");
                }
            }
        });

        None
    }
}
