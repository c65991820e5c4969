use anyhow::{anyhow, Result};
use bioslide_common::ImageCandidate;
use bioslide_protocol::{ImageSearchRequest, ImageSearchResponse};
use serde::Deserialize;

const SERPER_IMAGES_URL: &str = "https://google.serper.dev/images";
const RESULTS_PER_QUERY: u32 = 10;

/// Client for the Serper image search API.
pub struct SerperClient {
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    images: Option<Vec<SerperImage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperImage {
    image_url: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

impl SerperClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: SERPER_IMAGES_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the client at a different endpoint (a proxy or a local mock).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, request: &ImageSearchRequest) -> Result<ImageSearchResponse> {
        let term = request.search_term.trim();
        if term.is_empty() {
            return Err(anyhow!("Search term is required"));
        }

        let body = serde_json::json!({ "q": term, "num": RESULTS_PER_QUERY });
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("serper http {status}: {text}"));
        }

        let raw: SerperResponse = resp.json().await?;
        let images = convert(raw);
        tracing::debug!("serper returned {} images for {term:?}", images.len());
        Ok(ImageSearchResponse { images })
    }
}

fn convert(raw: SerperResponse) -> Vec<ImageCandidate> {
    raw.images
        .unwrap_or_default()
        .into_iter()
        .filter_map(|img| {
            let url = img.image_url.filter(|u| !u.is_empty())?;
            Some(ImageCandidate { url, title: img.title, source: img.link })
        })
        .collect()
}
