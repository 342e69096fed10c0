//! The measurement loop
//!
//! One cycle is `POLLING -> (PUBLISHING | SKIPPING)`, followed by `SLEEPING`.
//! Each cycle runs behind an error boundary that turns panics into
//! [`MonitorError::Unexpected`]; the sleep that follows is chosen by
//! [`next_delay`] from the cycle's result alone.

use crate::config::MonitorConfig;
use crate::error::{sanitize_error_message, ErrorClass, MonitorError, MonitorResult};
use crate::observability::metrics;
use crate::speedtest::{SpeedTester, SpeedtestCli};
use crate::transport::mqtt::MqttPublisher;
use crate::transport::MetricsPublisher;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, Instrument};

/// Fixed pause after an unexpected failure, independent of the configured interval
pub const RECOVERY_DELAY: Duration = Duration::from_secs(60);

/// Pick the pause before the next cycle
///
/// Skipped measurements and failed publishes keep the normal schedule; only
/// unexpected failures switch to [`RECOVERY_DELAY`].
pub fn next_delay(result: &MonitorResult<usize>, interval: Duration) -> Duration {
    match result {
        Ok(_) => interval,
        Err(e) => match e.class() {
            ErrorClass::Skip | ErrorClass::Logged => interval,
            ErrorClass::Backoff => RECOVERY_DELAY,
        },
    }
}

/// Periodic speedtest monitor
pub struct Monitor<T, P> {
    config: MonitorConfig,
    tester: T,
    publisher: P,
}

impl Monitor<SpeedtestCli, MqttPublisher> {
    /// Build a monitor backed by the speedtest CLI and an MQTT broker
    pub fn from_config(config: MonitorConfig) -> Self {
        let tester = SpeedtestCli::from_config(&config.speedtest);
        let publisher = MqttPublisher::new(config.mqtt.clone());
        Self::new(config, tester, publisher)
    }
}

impl<T, P> Monitor<T, P>
where
    T: SpeedTester,
    P: MetricsPublisher,
{
    pub fn new(config: MonitorConfig, tester: T, publisher: P) -> Self {
        Self {
            config,
            tester,
            publisher,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run cycles until `shutdown` resolves
    ///
    /// Shutdown interrupts both the sleep and an in-flight cycle; dropping the
    /// cycle kills the speedtest child and closes any broker socket.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.log_startup();

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let result = tokio::select! {
                _ = &mut shutdown => break,
                result = self.guarded_cycle().instrument(crate::cycle_span!(cycle)) => result,
            };

            Self::report(&result);
            let delay = next_delay(&result, self.config.sleep_interval());
            let snapshot = metrics().snapshot();
            info!(
                cycles = snapshot.cycles_started,
                skipped = snapshot.cycles_skipped,
                publish_failures = snapshot.publish_failures,
                "Sleeping for {} seconds...",
                delay.as_secs()
            );

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(delay) => {}
            }
        }

        info!("Received interrupt signal, stopping...");
    }

    fn log_startup(&self) {
        let mqtt = &self.config.mqtt;
        info!("Starting speedtest monitor...");
        info!("MQTT Host: {}:{}", mqtt.host, mqtt.port);
        info!("Base Topic: {}", mqtt.base_topic);
        info!("Sleep Interval: {} seconds", self.config.sleep_interval_secs);
    }

    /// Run one cycle, converting a panic anywhere inside it into an error
    pub async fn guarded_cycle(&self) -> MonitorResult<usize> {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(MonitorError::unexpected(panic_message(panic.as_ref()))),
        }
    }

    /// POLLING then PUBLISHING; a measurement error means SKIPPING
    pub async fn run_cycle(&self) -> MonitorResult<usize> {
        metrics().cycle_started();
        info!("Running speedtest...");

        let measurement = self.tester.measure().await?;
        metrics().measurement_succeeded();
        info!("Speedtest results: {}", measurement.summary());

        Ok(self.publisher.publish(&measurement).await?)
    }

    fn report(result: &MonitorResult<usize>) {
        match result {
            Ok(count) => {
                metrics().messages_published(*count);
                info!("Results published to MQTT");
            }
            Err(MonitorError::Measurement(e)) => {
                metrics().cycle_skipped();
                e.log();
                error!("Failed to get speedtest results");
            }
            Err(MonitorError::Publish(e)) => {
                metrics().publish_failed();
                error!(
                    "Error publishing to MQTT: {}",
                    sanitize_error_message(&e.to_string())
                );
            }
            Err(e) => {
                metrics().recovery_triggered();
                error!("Unexpected error in main loop: {}", e);
                info!("Retrying in {} seconds...", RECOVERY_DELAY.as_secs());
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("cycle panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("cycle panicked: {message}")
    } else {
        "cycle panicked".to_string()
    }
}
