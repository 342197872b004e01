//! Fetch module - token acquisition, alert query and persistence
//!
//! A run authenticates against the identity provider, queries the alerts API
//! for the configured time window, and appends the result to the dated file.

mod alerts;
mod auth;
mod pipeline;
mod writer;

pub use alerts::AlertFetcher;
pub use auth::Authenticator;
pub use pipeline::{Pipeline, RunReport};
pub use writer::{output_file_name, AlertWriter, WriteOutcome};

use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the HTTP client shared by the authenticator and the fetcher
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!("defender-fetch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))
}
