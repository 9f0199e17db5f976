//! Session filename and chunk value objects

use std::fmt;

use uuid::Uuid;

/// Container extension of recorder output
pub const OUTPUT_EXTENSION: &str = "webm";

/// MIME type of recorder output
pub const OUTPUT_MIME_TYPE: &str = "video/webm";

/// Number of session-id characters kept in a filename
const SESSION_ID_PREFIX_LEN: usize = 8;

/// Remote filename for one recording session.
/// Derived once per session as `<uuid-v4>-<session id prefix>.webm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionFilename(String);

impl SessionFilename {
    /// Generate a fresh filename for a session
    pub fn generate(session_id: &str) -> Self {
        Self::with_uuid(Uuid::new_v4(), session_id)
    }

    /// Build a filename from a known random id
    pub fn with_uuid(id: Uuid, session_id: &str) -> Self {
        let prefix: String = session_id.chars().take(SESSION_ID_PREFIX_LEN).collect();
        Self(format!("{}-{}.{}", id, prefix, OUTPUT_EXTENSION))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One time-sliced unit of recorder output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub filename: SessionFilename,
    /// Zero-based production order within the session
    pub sequence: u64,
    pub payload: Vec<u8>,
}

impl Chunk {
    pub fn new(filename: SessionFilename, sequence: u64, payload: Vec<u8>) -> Self {
        Self {
            filename,
            sequence,
            payload,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
