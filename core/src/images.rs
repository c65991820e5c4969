//! Image lookup for the slide editor.
//!
//! Candidates come from an [`ImageSearch`] collaborator. Each candidate is
//! then probed concurrently, every probe bounded by its own timeout, and
//! only the ones that load are offered. Results are revealed together once
//! every probe has settled.

use anyhow::Result;
use async_trait::async_trait;
use bioslide_common::ImageCandidate;
use bioslide_image_search::{HttpImageProbe, SerperClient};
use bioslide_protocol::ImageSearchRequest;
use futures::future::join_all;
use std::time::Duration;

use crate::deck::ImagePicker;

#[async_trait]
pub trait ImageSearch {
    async fn search(&self, term: &str) -> Result<Vec<ImageCandidate>>;
}

#[async_trait]
pub trait ImageProbe {
    /// Whether the image at `url` loads.
    async fn loads(&self, url: &str) -> bool;
}

pub struct SerperAdapter {
    inner: SerperClient,
}

impl SerperAdapter {
    pub fn new(inner: SerperClient) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ImageSearch for SerperAdapter {
    async fn search(&self, term: &str) -> Result<Vec<ImageCandidate>> {
        let request = ImageSearchRequest { search_term: term.to_string() };
        Ok(self.inner.search(&request).await?.images)
    }
}

/// Used when no image search key is configured.
pub struct NoImageSearch;

#[async_trait]
impl ImageSearch for NoImageSearch {
    async fn search(&self, _term: &str) -> Result<Vec<ImageCandidate>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn loads(&self, url: &str) -> bool {
        HttpImageProbe::loads(self, url).await
    }
}

/// Keep the candidates whose probe reports success within `timeout`.
/// Order is preserved.
pub async fn validate_candidates(
    probe: &(dyn ImageProbe + Send + Sync),
    candidates: Vec<ImageCandidate>,
    timeout: Duration,
) -> Vec<ImageCandidate> {
    let checks = candidates.iter().map(|c| async move {
        match tokio::time::timeout(timeout, probe.loads(&c.url)).await {
            Ok(loaded) => loaded,
            Err(_) => {
                tracing::debug!("image probe timed out for {}", c.url);
                false
            }
        }
    });
    let results = join_all(checks).await;

    candidates
        .into_iter()
        .zip(results)
        .filter_map(|(candidate, ok)| ok.then_some(candidate))
        .collect()
}

/// Search for `term` and validate the results. Search failures count as
/// "no candidates".
pub async fn lookup_images(
    search: &(dyn ImageSearch + Send + Sync),
    probe: &(dyn ImageProbe + Send + Sync),
    term: &str,
    timeout: Duration,
) -> ImagePicker {
    let candidates = match search.search(term).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!("image search for {term:?} failed: {e}");
            Vec::new()
        }
    };
    if candidates.is_empty() {
        return ImagePicker::NoImages;
    }
    let total = candidates.len();
    let valid = validate_candidates(probe, candidates, timeout).await;
    tracing::info!("{} of {total} images for {term:?} loaded", valid.len());
    ImagePicker::from_candidates(valid)
}
