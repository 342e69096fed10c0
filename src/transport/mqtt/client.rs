//! Impure I/O operations for the MQTT publisher
//!
//! Each publish cycle opens its own [`MqttSession`], sends the eight metrics,
//! disconnects and drops the session. Nothing outlives the cycle, so a broker
//! restart between cycles needs no reconnection logic.

use super::connection::{
    configure_mqtt_options, configure_network_options, generate_client_id, MqttError,
    TopicBuilder, HANDSHAKE_TIMEOUT, REQUEST_CAPACITY,
};
use super::message_handler::{EventRoute, MessageHandler};
use crate::config::MqttSection;
use crate::speedtest::Measurement;
use crate::transport::MetricsPublisher;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, EventLoop, QoS};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Publishes measurements as retained QoS 0 messages, one connection per call
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    config: MqttSection,
    handshake_timeout: Duration,
}

impl MqttPublisher {
    pub fn new(config: MqttSection) -> Self {
        Self {
            config,
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

#[async_trait]
impl MetricsPublisher for MqttPublisher {
    async fn publish(&self, measurement: &Measurement) -> Result<usize, MqttError> {
        let mut session = MqttSession::open(&self.config, self.handshake_timeout).await?;

        // Close even when a publish failed; the session drop covers the rest
        let published = session
            .publish_measurement(&self.config.base_topic, measurement)
            .await;
        let closed = session.close().await;

        let count = published?;
        closed?;
        Ok(count)
    }
}

/// A single connected broker session
///
/// Dropping the session drops the event loop, which closes the socket, so
/// every exit path releases the connection.
pub struct MqttSession {
    client: AsyncClient,
    event_loop: EventLoop,
    timeout: Duration,
    graceful: bool,
}

impl MqttSession {
    /// Connect and wait for CONNACK
    pub async fn open(config: &MqttSection, timeout: Duration) -> Result<Self, MqttError> {
        let client_id = generate_client_id();
        let options = configure_mqtt_options(config, &client_id);
        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        event_loop.set_network_options(configure_network_options(timeout));

        debug!(
            host = %config.host,
            port = config.port,
            client_id = %client_id,
            "Connecting to MQTT broker"
        );

        let handshake = tokio::time::timeout(timeout, Self::await_connack(&mut event_loop)).await;
        match handshake {
            Ok(Ok(())) => {
                info!("Connected to MQTT broker successfully");
                Ok(Self {
                    client,
                    event_loop,
                    timeout,
                    graceful: false,
                })
            }
            Ok(Err(MqttError::ConnectionRefused(code))) => {
                error!("Failed to connect to MQTT broker with code {:?}", code);
                Err(MqttError::ConnectionRefused(code))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MqttError::HandshakeTimeout(timeout)),
        }
    }

    async fn await_connack(event_loop: &mut EventLoop) -> Result<(), MqttError> {
        loop {
            match event_loop.poll().await {
                Ok(event) => match MessageHandler::route_event(&event) {
                    EventRoute::ConnectionAcknowledged => return Ok(()),
                    EventRoute::ConnectionRefused(code) => {
                        return Err(MqttError::ConnectionRefused(code))
                    }
                    route => debug!(target: "mqtt_transport", "Handshake event: {:?}", route),
                },
                Err(ConnectionError::ConnectionRefused(code)) => {
                    return Err(MqttError::ConnectionRefused(code))
                }
                Err(e) => return Err(MqttError::ConnectionFailed(e)),
            }
        }
    }

    /// Queue one retained QoS 0 publish per metric
    pub async fn publish_measurement(
        &mut self,
        base_topic: &str,
        measurement: &Measurement,
    ) -> Result<usize, MqttError> {
        let fields = measurement.fields();
        for (name, value) in &fields {
            let topic = TopicBuilder::metric_topic(base_topic, name);
            self.client
                .publish(topic.as_str(), QoS::AtMostOnce, true, value.as_bytes().to_vec())
                .await
                .map_err(|source| MqttError::PublishFailed {
                    topic: topic.clone(),
                    source,
                })?;
            info!("Published {}: {} to {}", name, value, topic);
        }
        Ok(fields.len())
    }

    /// Send DISCONNECT and drive the event loop until it has been written
    pub async fn close(mut self) -> Result<(), MqttError> {
        self.client
            .disconnect()
            .await
            .map_err(MqttError::DisconnectFailed)?;

        let timeout = self.timeout;
        let flushed = tokio::time::timeout(timeout, self.flush_until_disconnect()).await;
        match flushed {
            Ok(Ok(())) => {
                self.graceful = true;
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MqttError::FlushTimeout(timeout)),
        }
    }

    async fn flush_until_disconnect(&mut self) -> Result<(), MqttError> {
        loop {
            let event = self
                .event_loop
                .poll()
                .await
                .map_err(MqttError::ConnectionFailed)?;
            match MessageHandler::route_event(&event) {
                EventRoute::DisconnectSent => return Ok(()),
                EventRoute::PublishSent => {
                    debug!(target: "mqtt_transport", "Publish written to socket")
                }
                route => debug!(target: "mqtt_transport", "MQTT event: {:?}", route),
            }
        }
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        if self.graceful {
            info!("Disconnected from MQTT broker");
        } else {
            warn!("Disconnected from MQTT broker without a clean shutdown");
        }
    }
}
