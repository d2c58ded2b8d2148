use std::time::Duration;

use admission::{FetchError, FetchRequest, FetchTicket};
use bytes::Bytes;
use catalog::FeedError;
use foundation::CameraId;
use tokio::sync::mpsc;
use tracing::debug;

/// Fetch outcome delivered back to the loop that owns the overlay.
pub type FetchCompletion = (FetchTicket, Result<Bytes, FetchError>);

/// Reads a document from an `http(s)://` URL or a local path.
pub async fn load_text(client: &reqwest::Client, source: &str) -> Result<String, FeedError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let resp = client
            .get(source)
            .send()
            .await
            .map_err(|e| FeedError::Io(format!("GET {source} failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(FeedError::Io(format!(
                "GET {source} failed: HTTP {}",
                resp.status()
            )));
        }
        resp.text()
            .await
            .map_err(|e| FeedError::Io(format!("reading {source} failed: {e}")))
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| FeedError::Io(format!("reading {source} failed: {e}")))
    }
}

/// Camera still images behind a `{camera_id}` URL template.
#[derive(Clone)]
pub struct ImageSource {
    url_template: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageSource {
    pub fn new(url_template: impl Into<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            url_template: url_template.into(),
            client,
            timeout,
        }
    }

    pub fn image_url(&self, camera_id: &CameraId) -> String {
        self.url_template.replace("{camera_id}", camera_id.as_str())
    }

    /// Starts one fetch per request; each completion is sent on `tx`.
    pub fn spawn_all(&self, requests: Vec<FetchRequest>, tx: &mpsc::Sender<FetchCompletion>) {
        for req in requests {
            let url = self.image_url(&req.camera_id);
            let client = self.client.clone();
            let timeout = self.timeout;
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = fetch_image(&client, &url, timeout).await;
                debug!(camera = %req.camera_id, ok = result.is_ok(), "image fetch finished");
                // The receiver is gone only when the overlay shut down.
                let _ = tx.send((req.ticket, result)).await;
            });
        }
    }
}

async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Bytes, FetchError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }

    resp.bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))
}
