//! One fetch run: authenticate, query, persist
//!
//! Each step consumes the previous step's output, so an authentication or
//! query failure returns before anything touches the output file.

use std::path::PathBuf;

use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::TimeWindow;

use super::alerts::AlertFetcher;
use super::auth::Authenticator;
use super::http_client;
use super::writer::AlertWriter;

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Window the alerts were selected from
    pub window: TimeWindow,
    /// Number of alerts appended to the output file
    pub alerts_written: usize,
    /// File appended to, if any alerts were found
    pub output_file: Option<PathBuf>,
}

/// The authenticate → fetch → write sequence
#[derive(Debug, Clone)]
pub struct Pipeline {
    authenticator: Authenticator,
    fetcher: AlertFetcher,
    writer: AlertWriter,
}

impl Pipeline {
    /// Build all three stages from the configuration, sharing one HTTP client
    pub fn new(config: &Config) -> Result<Self> {
        let client: Client = http_client(&config.http)?;

        Ok(Self {
            authenticator: Authenticator::from_config(client.clone(), config)?,
            fetcher: AlertFetcher::from_config(client, config)?,
            writer: AlertWriter::from_config(config),
        })
    }

    /// Authentication stage
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Fetch stage
    pub fn fetcher(&self) -> &AlertFetcher {
        &self.fetcher
    }

    /// Write stage
    pub fn writer(&self) -> &AlertWriter {
        &self.writer
    }

    /// Run the pipeline once
    pub async fn run(&self) -> Result<RunReport> {
        info!(output_dir = %self.writer.output_dir().display(), "Starting alert fetch");

        let token = self.authenticator.fetch_token().await?;

        let window = TimeWindow::from_now(self.fetcher.time_range())?;
        let raw = self.fetcher.fetch_since(&token, &window).await?;

        let outcome = self.writer.write(&raw)?;

        Ok(RunReport {
            window,
            alerts_written: outcome.alerts,
            output_file: outcome.path,
        })
    }
}
