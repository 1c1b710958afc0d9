//! DramaBox client - thin async client for the DramaBox streaming API
//!
//! Obtains a short-lived bearer token, builds the vendor request headers,
//! and forwards three JSON operations (latest, stream, search) to the
//! upstream host, retrying once on authentication failure. Upstream
//! responses are passed through verbatim, status included.
//!
//! # Modules
//!
//! - `models` - Token, request bodies, upstream passthrough response
//! - `config` - Environment-backed settings with documented defaults
//! - `api` - The DramaBox client itself

pub mod api;
pub mod config;
pub mod models;

// Re-export commonly used types
pub use api::{DramaBoxClient, DramaBoxError};
pub use config::Config;
pub use models::{LatestRequest, SearchRequest, StreamRequest, Token, UpstreamResponse};
