//! Pure connection configuration for the MQTT publisher
//!
//! This module contains pure functions for option construction, client id
//! generation and topic naming, plus the transport error type.

use crate::config::MqttSection;
use rumqttc::{ClientError, ConnectReturnCode, ConnectionError, MqttOptions, NetworkOptions};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Keep-alive negotiated with the broker
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Upper bound on the CONNECT/CONNACK handshake and on the final flush
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(60);

/// Request channel capacity; must hold one cycle's publishes plus the disconnect
/// because nothing polls the event loop while they are queued
pub const REQUEST_CAPACITY: usize = 16;

const CLIENT_ID_PREFIX: &str = "speedtest-monitor";

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Broker refused connection with code {0:?}")]
    ConnectionRefused(ConnectReturnCode),
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] ConnectionError),
    #[error("No CONNACK within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("Publishing to {topic} failed: {source}")]
    PublishFailed {
        topic: String,
        #[source]
        source: ClientError,
    },
    #[error("Disconnect failed: {0}")]
    DisconnectFailed(#[source] ClientError),
    #[error("Outgoing messages not flushed within {0:?}")]
    FlushTimeout(Duration),
}

/// Generate a unique client id so overlapping monitors never take over each other's session
pub fn generate_client_id() -> String {
    format!("{CLIENT_ID_PREFIX}-{}", Uuid::new_v4().simple())
}

/// Pure function to configure MQTT options from config
pub fn configure_mqtt_options(config: &MqttSection, client_id: &str) -> MqttOptions {
    let mut mqtt_options = MqttOptions::new(client_id, config.host.clone(), config.port);
    mqtt_options.set_credentials(config.username.clone(), config.password.clone());
    mqtt_options.set_keep_alive(KEEP_ALIVE);
    mqtt_options.set_clean_session(true);
    mqtt_options
}

/// Network options bounding TCP connect and CONNACK by `timeout`
///
/// rumqttc counts whole seconds, so the bound is rounded up and never zero.
pub fn configure_network_options(timeout: Duration) -> NetworkOptions {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    let mut network_options = NetworkOptions::new();
    network_options.set_connection_timeout(secs.max(1));
    network_options
}

/// Topic naming for published metrics
pub struct TopicBuilder;

impl TopicBuilder {
    /// Build metric topic: `{base_topic}{metric}`
    ///
    /// The prefix is used verbatim; `internet/` + `down` gives `internet/down`.
    pub fn metric_topic(base_topic: &str, metric: &str) -> String {
        format!("{base_topic}{metric}")
    }
}
