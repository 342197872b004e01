//! # defender-fetch
//!
//! Pulls new security alerts from the Microsoft Defender for Endpoint API
//! and appends them to a dated local file.
//!
//! ## Architecture
//!
//! - **Authenticator**: OAuth2 client-credentials grant against the tenant
//! - **AlertFetcher**: `GET /api/alerts` filtered on alert creation time
//! - **AlertWriter**: one JSON alert per line in `alerts-{D_Month_YYYY}.txt`
//!
//! The three run in sequence inside a [`fetch::Pipeline`]; each invocation is
//! independent and keeps no state between runs.
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch alerts created in the configured window
//! defender-fetch --config config.yaml
//!
//! # Check the configuration without touching the network
//! defender-fetch validate
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fetch::{AlertFetcher, AlertWriter, Authenticator, Pipeline, RunReport};
    pub use crate::models::*;
}
