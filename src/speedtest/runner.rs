//! Impure invocation of the external speedtest tool

use super::report::{Measurement, SpeedtestReport};
use super::{MeasurementError, SpeedTester};
use crate::config::SpeedtestSection;
use crate::error::sanitize_error_message;
use async_trait::async_trait;
use chrono::Local;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Argument requesting machine-readable output
pub const JSON_FORMAT_ARG: &str = "--format=json";

/// Upper bound on a single tool run
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the speedtest CLI as a child process
#[derive(Debug, Clone)]
pub struct SpeedtestCli {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SpeedtestCli {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn from_config(section: &SpeedtestSection) -> Self {
        Self::new(section.program.clone(), section.args.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl SpeedTester for SpeedtestCli {
    async fn measure(&self) -> Result<Measurement, MeasurementError> {
        debug!(program = %self.program, args = ?self.args, "Spawning speedtest");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(JSON_FORMAT_ARG)
            // reaps the child when the timeout drops the output future
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| MeasurementError::Timeout(self.timeout))?
            .map_err(|source| MeasurementError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MeasurementError::ToolFailed {
                code: output.status.code(),
                stderr: sanitize_error_message(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        let report = SpeedtestReport::parse(&output.stdout)?;
        Ok(Measurement::from_report(&report, Local::now()))
    }
}
