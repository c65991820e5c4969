use std::time::Duration;

/// Checks whether an image URL actually loads.
///
/// A candidate loads when the server answers with a success status and an
/// `image/*` content type. Callers bound the whole check with their own
/// timeout; the client-level timeout here only keeps sockets from lingering.
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    pub async fn loads(&self, url: &str) -> bool {
        let resp = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("image probe failed for {url}: {e}");
                return false;
            }
        };
        if !resp.status().is_success() {
            return false;
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        is_image_content_type(content_type)
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn is_image_content_type(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_content_types_count() {
        assert!(is_image_content_type(Some("image/jpeg")));
        assert!(is_image_content_type(Some("Image/PNG; charset=binary")));
        assert!(!is_image_content_type(Some("text/html")));
        assert!(!is_image_content_type(None));
    }

    #[tokio::test]
    async fn unreachable_host_does_not_load() {
        let probe = HttpImageProbe::new();
        assert!(!probe.loads("http://127.0.0.1:9/missing.png").await);
    }
}
