//! Transport layer for publishing measurements
//!
//! This module provides the publisher abstraction and its MQTT implementation.

use crate::speedtest::Measurement;

pub mod mqtt;

/// Destination for completed measurements
///
/// This trait decouples the monitor loop from the broker client so the loop
/// can be driven by mocks in tests.
#[async_trait::async_trait]
pub trait MetricsPublisher: Send + Sync {
    /// Publish every metric of `measurement`, returning how many messages were sent
    async fn publish(&self, measurement: &Measurement) -> Result<usize, mqtt::MqttError>;
}
