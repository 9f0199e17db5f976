//! Control socket for driving a running recorder
//!
//! Requests are [`Message`]s serialized one per line; every request gets one
//! [`IpcResponse`] line back.

#[cfg(unix)]
mod unix_socket;

#[cfg(unix)]
pub use unix_socket::{SocketPath, UnixSocketClient, UnixSocketServer};

use serde::{Deserialize, Serialize};

use crate::application::BusError;
use crate::domain::message::{Message, Reply};

/// One reply line on the control socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IpcResponse {
    Ok { reply: Reply },
    Error { message: String },
}

impl IpcResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Bus errors and error replies both become `status: error`
    pub fn from_bus(result: Result<Reply, BusError>) -> Self {
        match result {
            Ok(Reply::Error(message)) => Self::Error { message },
            Ok(reply) => Self::Ok { reply },
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn into_result(self) -> Result<Reply, String> {
        match self {
            Self::Ok { reply } => Ok(reply),
            Self::Error { message } => Err(message),
        }
    }
}

/// Decode one request line
pub fn parse_request(line: &str) -> Result<Message, IpcResponse> {
    serde_json::from_str(line.trim())
        .map_err(|e| IpcResponse::error(format!("Invalid message: {}", e)))
}
