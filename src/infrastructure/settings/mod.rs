//! Settings service adapters

mod http;

pub use http::HttpSettingsSync;
