//! Speedtest MQTT - Rust Implementation
//!
//! A small daemon that periodically runs the `speedtest` CLI and publishes the
//! results to an MQTT broker as retained messages.
//!
//! # Overview
//!
//! - [`config`] - environment configuration with defaults
//! - [`speedtest`] - tool invocation and JSON parsing
//! - [`transport`] - per-cycle MQTT publishing
//! - [`monitor`] - the poll / publish / sleep loop
//!
//! # Quick Start
//!
//! ```rust
//! use speedtest_mqtt::speedtest::{Measurement, SpeedtestReport};
//!
//! let stdout = br#"{"ping":{"latency":12.345,"jitter":1.2},"download":{"bandwidth":12500000}}"#;
//! let report = SpeedtestReport::parse(stdout).unwrap();
//! let measurement = Measurement::from_report(&report, chrono::Local::now());
//!
//! assert_eq!(measurement.ping, 12.35);
//! assert_eq!(measurement.down, 100.0);
//! assert_eq!(measurement.isp, "Unknown");
//! ```

pub mod config;
pub mod error;
pub mod monitor;
pub mod observability;
pub mod speedtest;
pub mod testing;
pub mod transport;

pub use config::{ConfigError, MonitorConfig};
pub use error::{MonitorError, MonitorResult};
pub use monitor::Monitor;
pub use speedtest::{Measurement, SpeedTester, SpeedtestCli};
pub use transport::{mqtt::MqttPublisher, MetricsPublisher};
