//! HTTP chunk transport adapter

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::ports::{ChunkTransport, TransportError};
use crate::domain::recording::{Chunk, Duration, SessionFilename, OUTPUT_MIME_TYPE};

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessVideoRequest<'a> {
    filename: &'a str,
    user_id: &'a str,
}

/// Streams chunks to the processing server over HTTP.
///
/// Connectivity is tracked in a watch channel: a failed request marks the
/// transport disconnected and the health monitor marks it connected again.
pub struct HttpChunkTransport {
    client: reqwest::Client,
    base: Url,
    connected: watch::Sender<bool>,
}

impl HttpChunkTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        let base = Url::parse(server_url.trim_end_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", server_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(server_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let (connected, _) = watch::channel(true);
        Ok(Self {
            client,
            base,
            connected,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Observe connectivity changes
    pub fn watch_connection(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    fn set_connected(&self, connected: bool) {
        let changed = self.connected.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });

        if changed {
            if connected {
                info!(server = %self.base, "transport connected");
            } else {
                warn!(server = %self.base, "transport disconnected");
            }
        }
    }

    /// Hit `/health` once and record the result
    pub async fn probe(&self) -> bool {
        let healthy = match self.client.get(self.endpoint("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "health probe failed");
                false
            }
        };
        self.set_connected(healthy);
        healthy
    }

    /// Probe every `every` until the returned task is aborted
    pub fn spawn_health_monitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let transport = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every.as_std());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                transport.probe().await;
            }
        })
    }

    fn request_failed(&self, e: reqwest::Error) -> TransportError {
        if e.is_connect() || e.is_timeout() {
            self.set_connected(false);
        }
        TransportError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl ChunkTransport for HttpChunkTransport {
    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    async fn send_chunk(&self, chunk: &Chunk) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Unavailable);
        }

        let response = self
            .client
            .post(self.endpoint("video-chunks"))
            .header("x-filename", chunk.filename.as_str())
            .header("x-chunk-sequence", chunk.sequence.to_string())
            .header(reqwest::header::CONTENT_TYPE, OUTPUT_MIME_TYPE)
            .body(chunk.payload.clone())
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected(status.as_u16()));
        }
        Ok(())
    }

    async fn finalize(
        &self,
        filename: &SessionFilename,
        owner: &str,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint("process-video"))
            .json(&ProcessVideoRequest {
                filename: filename.as_str(),
                user_id: owner,
            })
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected(status.as_u16()));
        }

        info!(filename = %filename, "processing requested");
        Ok(())
    }
}
