//! Integration tests for Monitor
//!
//! These tests run the monitor on a paused tokio clock, so interval ticks
//! fire as soon as the runtime is idle.

use airco2_hardware::mock::{Dialect, MockByteSource, MockDiscovery};
use airco2_hardware::{Monitor, MonitorConfig, PollConfig, PollingEngine, RoundOutcome};

fn config() -> MonitorConfig {
    MonitorConfig {
        interval_secs: 20,
        poll: PollConfig::default(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_monitor_publishes_each_round() {
    let (discovery, discovery_handle) = MockDiscovery::simulated(Dialect::Obfuscated);
    let engine = PollingEngine::new(discovery, config().poll);
    let mut handle = Monitor::new(engine, config()).start();

    let first = handle.recv().await.unwrap();
    assert!(first.snapshot.available);
    assert_eq!(first.snapshot.co2, Some(642));
    assert_eq!(first.snapshot.humidity, Some(45.12));
    assert_eq!(first.report.unwrap().outcome, RoundOutcome::Completed);
    assert!(first.device.is_some());

    let second = handle.recv().await.unwrap();
    assert!(second.snapshot.available);
    assert_eq!(handle.latest(), second);

    // The connection is reused between rounds.
    assert_eq!(discovery_handle.open_calls(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_monitor_recovers_after_unplug() {
    let (discovery, discovery_handle) = MockDiscovery::new();
    let (source, sensor) = MockByteSource::new(Dialect::Clear);
    sensor.push_sample(0x50, 800);
    sensor.set_looping(true);
    discovery_handle.add_source(source);

    let engine = PollingEngine::new(discovery, config().poll);
    let mut handle = Monitor::new(engine, config()).start();

    let update = handle.recv().await.unwrap();
    assert_eq!(update.snapshot.co2, Some(800));

    sensor.disconnect();
    let update = handle.recv().await.unwrap();
    assert!(!update.snapshot.available);
    assert_eq!(update.snapshot.co2, Some(800));
    assert_eq!(
        update.report.unwrap().outcome,
        RoundOutcome::ConnectionLost
    );
    assert!(update.device.is_none());
    assert_eq!(update.device_id.as_deref(), Some("04D9:A052"));

    let (replacement, replacement_sensor) = MockByteSource::new(Dialect::Clear);
    replacement_sensor.push_sample(0x50, 950);
    replacement_sensor.set_looping(true);
    discovery_handle.add_source(replacement);

    let update = handle.recv().await.unwrap();
    assert!(update.snapshot.available);
    assert_eq!(update.snapshot.co2, Some(950));
    assert!(update.last_error.is_none());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_updates() {
    let (discovery, _discovery_handle) = MockDiscovery::simulated(Dialect::Clear);
    let engine = PollingEngine::new(discovery, config().poll);
    let mut handle = Monitor::new(engine, config()).start();
    let mut subscriber = handle.subscribe();

    let update = handle.recv().await.unwrap();
    subscriber.changed().await.unwrap();
    assert_eq!(*subscriber.borrow(), update);

    handle.shutdown().await.unwrap();
}
