//! Pure parsing of `speedtest --format=json` output into a [`Measurement`]
//!
//! Every field of the tool's output is optional. Missing numbers become zero
//! and missing labels become `Unknown`, so a parseable document always yields a
//! complete record.
//!
//! Latencies keep the shape the tool reported them in: a whole JSON number is
//! published without a fractional part (`8`), a fractional one is rounded to two
//! decimals (`12.35`). Throughput is always fractional.

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Number;

/// Timestamp format of [`Measurement::start`] (`ddMMyyyyHHmmss`)
pub const START_FORMAT: &str = "%d%m%Y%H%M%S";

const UNKNOWN: &str = "Unknown";

/// Subset of the speedtest JSON document that the monitor reads
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeedtestReport {
    pub ping: Option<PingReport>,
    pub download: Option<BandwidthReport>,
    pub upload: Option<BandwidthReport>,
    pub server: Option<ServerReport>,
    pub isp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PingReport {
    /// Milliseconds
    pub latency: Option<Number>,
    /// Milliseconds
    pub jitter: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BandwidthReport {
    /// Bytes per second
    pub bandwidth: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerReport {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl SpeedtestReport {
    pub fn parse(stdout: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(stdout)
    }
}

/// One completed speed measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub start: String,
    pub ping: Latency,
    pub jitter: Latency,
    /// Megabits per second
    pub down: f64,
    /// Megabits per second
    pub up: f64,
    pub server_name: String,
    pub server_location: String,
    pub isp: String,
}

impl Measurement {
    /// Build a measurement from a parsed report, stamped with `completed_at`
    pub fn from_report(report: &SpeedtestReport, completed_at: DateTime<Local>) -> Self {
        let ping = report.ping.as_ref();
        let server = report.server.as_ref();
        let bandwidth = |b: Option<&BandwidthReport>| b.and_then(|b| b.bandwidth).unwrap_or(0.0);
        let label = |s: Option<&String>| s.cloned().unwrap_or_else(|| UNKNOWN.to_string());

        Measurement {
            start: completed_at.format(START_FORMAT).to_string(),
            ping: Latency::from_number(ping.and_then(|p| p.latency.as_ref())),
            jitter: Latency::from_number(ping.and_then(|p| p.jitter.as_ref())),
            down: round2(bytes_to_mbps(bandwidth(report.download.as_ref()))),
            up: round2(bytes_to_mbps(bandwidth(report.upload.as_ref()))),
            server_name: label(server.and_then(|s| s.name.as_ref())),
            server_location: label(server.and_then(|s| s.location.as_ref())),
            isp: label(report.isp.as_ref()),
        }
    }

    /// Field name and text payload of every metric, in publish order
    pub fn fields(&self) -> [(&'static str, String); 8] {
        [
            ("start", self.start.clone()),
            ("ping", self.ping.payload()),
            ("down", format_float(self.down)),
            ("up", format_float(self.up)),
            ("jitter", self.jitter.payload()),
            ("server_name", self.server_name.clone()),
            ("server_location", self.server_location.clone()),
            ("isp", self.isp.clone()),
        ]
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Down={}Mbps, Up={}Mbps, Ping={}ms",
            format_float(self.down),
            format_float(self.up),
            self.ping.payload()
        )
    }
}

/// A latency reading in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latency {
    /// Reported as a whole number, or absent
    Whole(i64),
    /// Reported with a fractional part, already rounded to two decimals
    Fractional(f64),
}

impl Latency {
    fn from_number(number: Option<&Number>) -> Self {
        let Some(number) = number else {
            return Latency::Whole(0);
        };
        match number.as_i64() {
            Some(whole) => Latency::Whole(whole),
            None => Latency::Fractional(round2(number.as_f64().unwrap_or(0.0))),
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Latency::Whole(whole) => whole as f64,
            Latency::Fractional(value) => value,
        }
    }

    /// Text published for this reading
    pub fn payload(self) -> String {
        match self {
            Latency::Whole(whole) => whole.to_string(),
            Latency::Fractional(value) => format_float(value),
        }
    }
}

impl PartialEq<f64> for Latency {
    fn eq(&self, other: &f64) -> bool {
        self.value() == *other
    }
}

/// Convert bytes per second to megabits per second
pub fn bytes_to_mbps(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0 / 1_000_000.0
}

/// Round to two decimals
///
/// Rounds the exact binary value, with exact ties going to the even digit, so
/// `2.675` (stored just below the tie) becomes `2.67` and `0.125` becomes `0.12`.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Render a float with at least one fractional digit (`100.0`, `12.35`)
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}
