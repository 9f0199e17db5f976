//! Chunk transport adapters

mod http;

pub use http::HttpChunkTransport;
