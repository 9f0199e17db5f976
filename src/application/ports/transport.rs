//! Chunk transport port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::{Chunk, SessionFilename};

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport unavailable")]
    Unavailable,

    #[error("Remote rejected request with status {0}")]
    Rejected(u16),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Port for shipping recorder output to the remote service.
///
/// The connection outlives sessions. Nothing is buffered: a chunk sent while
/// disconnected is dropped and reported as `Unavailable`.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Whether the remote endpoint is currently reachable
    fn is_connected(&self) -> bool;

    /// Send one chunk.
    ///
    /// # Arguments
    /// * `chunk` - Payload tagged with its session filename and sequence
    ///
    /// # Returns
    /// Ok(()) once the endpoint accepted the chunk. Nothing is buffered, so
    /// an error means the chunk is lost.
    async fn send_chunk(&self, chunk: &Chunk) -> Result<(), TransportError>;

    /// Signal that all chunks of a session were sent.
    ///
    /// # Arguments
    /// * `filename` - The session file to close
    /// * `owner` - Session id the file belongs to
    async fn finalize(&self, filename: &SessionFilename, owner: &str)
        -> Result<(), TransportError>;
}
