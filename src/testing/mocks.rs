//! Mock implementations for testing
//!
//! Provides a scripted [`SpeedTester`] and a recording [`MetricsPublisher`] so
//! the monitor loop can be exercised without the speedtest binary or a broker.

use crate::speedtest::{Measurement, MeasurementError, SpeedTester, SpeedtestReport};
use crate::transport::mqtt::{MqttError, TopicBuilder};
use crate::transport::MetricsPublisher;
use async_trait::async_trait;
use chrono::Local;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Message captured by [`MockPublisher`]: topic, payload
pub type PublishedMessage = (String, String);

/// Scripted response of [`MockSpeedTester`]
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(Measurement),
    ToolFailed(String),
    Timeout,
    Panic(&'static str),
}

/// Mock speed tester replaying scripted responses
///
/// Once the script runs out the last response repeats. Every call records the
/// tokio clock so tests can check the spacing between polls.
#[derive(Debug, Clone)]
pub struct MockSpeedTester {
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    last: Arc<Mutex<MockResponse>>,
    calls: Arc<Mutex<Vec<Instant>>>,
    duration: Duration,
}

impl MockSpeedTester {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        let fallback = responses
            .last()
            .cloned()
            .unwrap_or_else(|| MockResponse::Success(sample_measurement()));
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            last: Arc::new(Mutex::new(fallback)),
            calls: Arc::new(Mutex::new(Vec::new())),
            duration: Duration::ZERO,
        }
    }

    pub fn succeeding() -> Self {
        Self::new(vec![MockResponse::Success(sample_measurement())])
    }

    /// Simulated time each measurement takes
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self) -> MockResponse {
        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(response) => {
                *self.last.lock().unwrap() = response.clone();
                response
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl SpeedTester for MockSpeedTester {
    async fn measure(&self) -> Result<Measurement, MeasurementError> {
        self.calls.lock().unwrap().push(Instant::now());
        let response = self.next_response();

        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }

        match response {
            MockResponse::Success(measurement) => Ok(measurement),
            MockResponse::ToolFailed(stderr) => Err(MeasurementError::ToolFailed {
                code: Some(1),
                stderr,
            }),
            MockResponse::Timeout => Err(MeasurementError::Timeout(Duration::from_secs(120))),
            MockResponse::Panic(message) => panic!("{}", message),
        }
    }
}

/// Mock publisher recording every message it would send
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    base_topic: String,
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    attempts: Arc<Mutex<usize>>,
    should_fail: Arc<AtomicBool>,
}

impl MockPublisher {
    pub fn new(base_topic: &str) -> Self {
        Self {
            base_topic: base_topic.to_string(),
            ..Default::default()
        }
    }

    pub fn with_failure(base_topic: &str) -> Self {
        let publisher = Self::new(base_topic);
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MetricsPublisher for MockPublisher {
    async fn publish(&self, measurement: &Measurement) -> Result<usize, MqttError> {
        *self.attempts.lock().unwrap() += 1;
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(MqttError::HandshakeTimeout(Duration::from_secs(60)));
        }

        let mut published = self.published.lock().unwrap();
        let fields = measurement.fields();
        for (name, value) in &fields {
            published.push((
                TopicBuilder::metric_topic(&self.base_topic, name),
                value.clone(),
            ));
        }
        Ok(fields.len())
    }
}

/// Measurement built from the reference speedtest document
pub fn sample_measurement() -> Measurement {
    let report = SpeedtestReport::parse(SAMPLE_REPORT.as_bytes())
        .expect("sample report should parse");
    Measurement::from_report(&report, Local::now())
}

/// Reference speedtest output
pub const SAMPLE_REPORT: &str = r#"{"ping":{"latency":12.345,"jitter":1.2},"download":{"bandwidth":12500000},"upload":{"bandwidth":1250000},"server":{"name":"ServerA","location":"CityX"},"isp":"ISP1"}"#;
