//! MQTT publisher for speedtest metrics
//!
//! The module separates pure functions from I/O operations:
//!
//! - [`connection`] - Pure option construction, topic naming and errors
//! - [`message_handler`] - Pure routing of event loop events
//! - [`client`] - Impure per-cycle broker sessions
//!
//! # Usage
//!
//! ```rust,no_run
//! use speedtest_mqtt::config::MqttSection;
//! use speedtest_mqtt::speedtest::{Measurement, SpeedtestReport};
//! use speedtest_mqtt::transport::{mqtt::MqttPublisher, MetricsPublisher};
//!
//! # tokio_test::block_on(async {
//! let config = MqttSection {
//!     host: "localhost".to_string(),
//!     port: 1883,
//!     username: "client".to_string(),
//!     password: "client".to_string(),
//!     base_topic: "internet/".to_string(),
//! };
//!
//! let measurement = Measurement::from_report(&SpeedtestReport::default(), chrono::Local::now());
//! let publisher = MqttPublisher::new(config);
//! publisher.publish(&measurement).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod client;
pub mod connection;
pub mod message_handler;

// Re-export public types for convenience
pub use client::{MqttPublisher, MqttSession};
pub use connection::{MqttError, TopicBuilder, HANDSHAKE_TIMEOUT};
pub use message_handler::{EventRoute, MessageHandler};
