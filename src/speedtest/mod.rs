//! Network speed measurement via the external `speedtest` tool
//!
//! - [`report`] - pure parsing of the tool's JSON into a [`Measurement`]
//! - [`runner`] - child-process invocation with a bounded wait

pub mod report;
pub mod runner;

pub use report::{Latency, Measurement, SpeedtestReport};
pub use runner::SpeedtestCli;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Reasons a measurement produced no result
#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("speedtest exited with status {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },
    #[error("speedtest did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Failed to parse speedtest JSON output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl MeasurementError {
    /// Emit the log line for this failure
    pub fn log(&self) {
        match self {
            MeasurementError::ToolFailed { code, stderr } => {
                error!(exit_code = ?code, "Speedtest failed: {}", stderr);
            }
            MeasurementError::Timeout(limit) => {
                error!(timeout_secs = limit.as_secs(), "Speedtest command timed out");
            }
            MeasurementError::Parse(e) => {
                error!("Failed to parse speedtest JSON output: {}", e);
            }
            MeasurementError::Spawn { .. } => {
                error!("Error running speedtest: {}", self);
            }
        }
    }
}

/// Source of measurements
///
/// Implemented by [`SpeedtestCli`] in production and by mocks in tests.
#[async_trait]
pub trait SpeedTester: Send + Sync {
    async fn measure(&self) -> Result<Measurement, MeasurementError>;
}
