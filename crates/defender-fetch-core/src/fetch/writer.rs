//! Appends fetched alerts to the dated output file

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Body some API versions return when there is nothing to report
const EMPTY_MARKER: &str = "[]";

/// Name of the output file for a calendar date, e.g. `alerts-2_January_2024.txt`
pub fn output_file_name(date: NaiveDate) -> String {
    format!("alerts-{}.txt", date.format("%-d_%B_%Y"))
}

/// Outcome of a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Number of alerts appended
    pub alerts: usize,
    /// File appended to; `None` when there was nothing to write
    pub path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(borrow, default)]
    value: Option<&'a RawValue>,
}

/// Writes one alert per line into `{output_dir}/alerts-{date}.txt`
#[derive(Debug, Clone)]
pub struct AlertWriter {
    output_dir: PathBuf,
}

impl AlertWriter {
    /// Create a writer for a directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create a writer from the run configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir())
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output file for a date
    pub fn output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(output_file_name(date))
    }

    /// Append the alerts in `raw` to today's file
    pub fn write(&self, raw: &str) -> Result<WriteOutcome> {
        self.write_for_date(raw, Local::now().date_naive())
    }

    /// Append the alerts in `raw` to the file for `date`.
    ///
    /// The whole batch goes out in a single append; a response that cannot be
    /// parsed leaves the file untouched.
    pub fn write_for_date(&self, raw: &str, date: NaiveDate) -> Result<WriteOutcome> {
        let alerts = extract_alerts(raw)?;

        if alerts.is_empty() {
            info!("Successful execution, found 0 new alerts");
            return Ok(WriteOutcome {
                alerts: 0,
                path: None,
            });
        }

        let mut batch = String::with_capacity(raw.len());
        for alert in &alerts {
            push_line(&mut batch, alert.get());
        }

        let path = self.output_path(date);
        append(&path, batch.as_bytes())?;

        debug!(path = %path.display(), bytes = batch.len(), "Appended alert batch");
        info!(path = %path.display(), "Successful execution, found {} new alerts", alerts.len());

        Ok(WriteOutcome {
            alerts: alerts.len(),
            path: Some(path),
        })
    }
}

/// Locate the `value` array of an alerts response
fn extract_alerts(raw: &str) -> Result<Vec<&RawValue>> {
    if raw.trim() == EMPTY_MARKER {
        return Ok(Vec::new());
    }

    let envelope: Envelope<'_> = serde_json::from_str(raw)
        .map_err(|e| Error::malformed(format!("response is not a JSON object: {e}")))?;

    let value = envelope
        .value
        .ok_or_else(|| Error::malformed("response has no `value` field"))?;

    serde_json::from_str(value.get())
        .map_err(|_| Error::malformed("`value` is not an array"))
}

/// Append one alert's raw text as a single line.
///
/// JSON strings cannot hold raw line breaks, so any found here sit between
/// tokens and can be dropped without changing the value.
fn push_line(batch: &mut String, alert: &str) {
    batch.extend(alert.chars().filter(|c| !matches!(c, '\n' | '\r')));
    batch.push('\n');
}

fn append(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| Error::file_write(path, e))?;
    file.write_all(bytes).map_err(|e| Error::file_write(path, e))?;
    file.flush().map_err(|e| Error::file_write(path, e))
}
