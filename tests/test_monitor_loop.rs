//! Monitor loop scheduling tests
//!
//! All tests run on tokio's paused clock, so hours of simulated sleeping take
//! no wall time. Shutdown is a plain sleep future resolving at a chosen instant.

use speedtest_mqtt::config::MonitorConfig;
use speedtest_mqtt::monitor::{Monitor, RECOVERY_DELAY};
use speedtest_mqtt::testing::{MockPublisher, MockResponse, MockSpeedTester, sample_measurement};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn config_with_interval(secs: u64) -> MonitorConfig {
    let interval = secs.to_string();
    MonitorConfig::from_lookup(|name| match name {
        "SLEEP_INTERVAL" => Some(interval.clone()),
        _ => None,
    })
    .unwrap()
}

fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|w| w[1] - w[0]).collect()
}

fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_secs(1),
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_successful_cycles_follow_configured_interval() {
    let tester = MockSpeedTester::succeeding();
    let publisher = MockPublisher::new("internet/");
    let monitor = Monitor::new(config_with_interval(100), tester.clone(), publisher.clone());

    monitor.run(sleep(Duration::from_secs(250))).await;

    let calls = tester.call_times();
    assert_eq!(calls.len(), 3);
    for gap in gaps(&calls) {
        assert_close(gap, Duration::from_secs(100));
    }
    assert_eq!(publisher.published().len(), 3 * 8);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_publishes_every_metric() {
    let tester = MockSpeedTester::succeeding();
    let publisher = MockPublisher::new("internet/");
    let monitor = Monitor::new(config_with_interval(100), tester, publisher.clone());

    let count = monitor.run_cycle().await.unwrap();
    assert_eq!(count, 8);

    let published = publisher.published();
    let topics: HashSet<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
    let expected: HashSet<&str> = [
        "internet/ping",
        "internet/jitter",
        "internet/down",
        "internet/up",
        "internet/server_name",
        "internet/server_location",
        "internet/isp",
        "internet/start",
    ]
    .into_iter()
    .collect();
    assert_eq!(topics, expected);

    let payload = |topic: &str| {
        published
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .unwrap()
    };
    assert_eq!(payload("internet/ping"), "12.35");
    assert_eq!(payload("internet/jitter"), "1.2");
    assert_eq!(payload("internet/down"), "100.0");
    assert_eq!(payload("internet/up"), "10.0");
    assert_eq!(payload("internet/server_name"), "ServerA");
    assert_eq!(payload("internet/server_location"), "CityX");
    assert_eq!(payload("internet/isp"), "ISP1");
}

#[tokio::test(start_paused = true)]
async fn test_publish_failure_keeps_schedule() {
    let tester = MockSpeedTester::succeeding();
    let publisher = MockPublisher::with_failure("internet/");
    let monitor = Monitor::new(config_with_interval(100), tester.clone(), publisher.clone());

    monitor.run(sleep(Duration::from_secs(250))).await;

    let calls = tester.call_times();
    assert_eq!(calls.len(), 3);
    for gap in gaps(&calls) {
        assert_close(gap, Duration::from_secs(100));
    }
    assert_eq!(publisher.attempts(), 3);
    assert!(publisher.published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_measurements_skip_publishing() {
    let tester = MockSpeedTester::new(vec![
        MockResponse::ToolFailed("No servers".to_string()),
        MockResponse::Timeout,
        MockResponse::Success(sample_measurement()),
    ]);
    let publisher = MockPublisher::new("internet/");
    let monitor = Monitor::new(config_with_interval(100), tester.clone(), publisher.clone());

    monitor.run(sleep(Duration::from_secs(250))).await;

    let calls = tester.call_times();
    assert_eq!(calls.len(), 3);
    for gap in gaps(&calls) {
        assert_close(gap, Duration::from_secs(100));
    }
    // Only the third cycle measured successfully
    assert_eq!(publisher.attempts(), 1);
    assert_eq!(publisher.published().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_failure_waits_recovery_delay() {
    let tester = MockSpeedTester::new(vec![
        MockResponse::Panic("measurement exploded"),
        MockResponse::Success(sample_measurement()),
    ]);
    let publisher = MockPublisher::new("internet/");
    let monitor = Monitor::new(config_with_interval(1000), tester.clone(), publisher.clone());

    monitor.run(sleep(Duration::from_secs(100))).await;

    let calls = tester.call_times();
    assert_eq!(calls.len(), 2, "loop must survive the panic and poll again");
    assert_close(calls[1] - calls[0], RECOVERY_DELAY);
    assert_eq!(publisher.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_delay_ignores_short_interval() {
    let tester = MockSpeedTester::new(vec![
        MockResponse::Panic("first"),
        MockResponse::Success(sample_measurement()),
    ]);
    let monitor = Monitor::new(
        config_with_interval(5),
        tester.clone(),
        MockPublisher::new("internet/"),
    );

    monitor.run(sleep(Duration::from_secs(63))).await;

    let calls = tester.call_times();
    assert_eq!(calls.len(), 2);
    assert_close(calls[1] - calls[0], Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_sleeping_exits_promptly() {
    let tester = MockSpeedTester::succeeding();
    let monitor = Monitor::new(
        config_with_interval(21600),
        tester.clone(),
        MockPublisher::new("internet/"),
    );

    let started = Instant::now();
    monitor.run(sleep(Duration::from_secs(50))).await;

    assert_close(started.elapsed(), Duration::from_secs(50));
    assert_eq!(tester.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_measurement_stops_cycle() {
    let tester = MockSpeedTester::succeeding().with_duration(Duration::from_secs(90));
    let publisher = MockPublisher::new("internet/");
    let monitor = Monitor::new(config_with_interval(100), tester.clone(), publisher.clone());

    let started = Instant::now();
    monitor.run(sleep(Duration::from_secs(10))).await;

    assert_close(started.elapsed(), Duration::from_secs(10));
    assert_eq!(tester.call_count(), 1);
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_guarded_cycle_converts_panic_to_error() {
    let tester = MockSpeedTester::new(vec![MockResponse::Panic("bad state")]);
    let monitor = Monitor::new(config_with_interval(100), tester, MockPublisher::new("x/"));

    let error = monitor.guarded_cycle().await.unwrap_err();
    assert!(error.to_string().contains("bad state"));
}
