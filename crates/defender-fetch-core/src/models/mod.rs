//! Data models for defender-fetch

mod credentials;
mod window;

pub use credentials::*;
pub use window::*;
