//! API clients for external services
//!
//! - DramaBox: token issuing plus the upstream content endpoints

pub mod dramabox;

pub use dramabox::{DramaBoxClient, DramaBoxError};
