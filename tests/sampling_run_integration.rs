//! Integration tests for complete sampling runs
//!
//! These tests validate the whole workflow against a simulated network:
//! - Discovery outcomes (timeout, match)
//! - Capability validation before the sink is opened
//! - Output file layout, ordering and truncation on mid-run failures

mod common;

use common::builders::ConfigBuilder;
use common::mock_helpers::{create_test_network, other_node, target_node, TARGET_NAME};
use common::{read_csv, single_output_file, test_timeout};
use properties_exporter::backend::{SimulatedNode, ValuePattern};
use properties_exporter::pipeline::Application;
use properties_exporter::{
    ConfigSettings, ExporterError, NetworkFilter, NodeHandle, RunSettings, SimulatedNetwork,
    Transport,
};
use serial_test::serial;
use std::sync::{Arc, Mutex};

fn temp_config() -> ConfigSettings {
    ConfigBuilder::new()
        .target("sys/HardwareName", TARGET_NAME)
        .dump_as("temp", "Temperature")
        .build()
}

fn settings(dir: &std::path::Path, samples: u64, period_ms: u64) -> RunSettings {
    RunSettings::new()
        .with_samples_count(samples)
        .with_period_ms(period_ms)
        .with_wait_device_timeout_ms(test_timeout().as_millis() as u64)
        .with_output_dir(dir)
}

#[test]
fn test_zero_timeout_on_empty_network() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::new(
        create_test_network(vec![]),
        temp_config(),
        settings(dir.path(), 3, 10).with_wait_device_timeout_ms(0),
    );

    let err = app.run().unwrap_err();
    assert!(matches!(err, ExporterError::DiscoveryTimeout { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
#[serial]
fn test_three_samples_at_ten_ms() {
    let dir = tempfile::tempdir().unwrap();
    let network = create_test_network(vec![other_node(1), target_node(2)]);

    let summary = Application::new(network, temp_config(), settings(dir.path(), 3, 10))
        .run()
        .unwrap();
    assert_eq!(summary.node, NodeHandle::new(2));

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec!["Timestamp", "ElapsedTime_ms", "Temperature"]);

    let elapsed: Vec<u64> = rows[1..].iter().map(|r| r[1].parse().unwrap()).collect();
    assert_eq!(elapsed[0], 0);
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]), "{:?}", elapsed);

    // Validation consumed the counter's first value (20)
    let temps: Vec<&str> = rows[1..].iter().map(|r| r[2].as_str()).collect();
    assert_eq!(temps, vec!["21", "22", "23"]);
}

#[test]
#[serial]
fn test_mid_run_read_failure_truncates_file() {
    let dir = tempfile::tempdir().unwrap();
    // One read for validation, one for tick 1, then tick 2 fails
    let network = create_test_network(vec![target_node(1).failing_after("temp", 2)]);

    let err = Application::new(network, temp_config(), settings(dir.path(), 5, 5))
        .run()
        .unwrap_err();
    assert!(matches!(err.root(), ExporterError::Property { key, .. } if key == "temp"));

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert_eq!(rows.len(), 2, "header plus the first sample: {:?}", rows);
    assert_eq!(rows[0][2], "Temperature");
}

#[test]
#[serial]
fn test_node_vanishing_mid_run() {
    let dir = tempfile::tempdir().unwrap();
    let network = create_test_network(vec![target_node(1)]);
    let remote = network.clone();

    let removed = Arc::new(Mutex::new(false));
    let flag = removed.clone();
    let app = Application::new(network, temp_config(), settings(dir.path(), 50, 10)).with_progress(
        Box::new(move |written, _| {
            if written == 2 {
                remote.remove_node(NodeHandle::new(1));
                *flag.lock().unwrap() = true;
            }
        }),
    );

    let err = app.run().unwrap_err();
    assert!(*removed.lock().unwrap());
    assert!(matches!(err.root(), ExporterError::NodeUnavailable(_)));

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert!(rows.len() >= 3 && rows.len() < 51, "{} rows", rows.len());
}

#[test]
fn test_empty_alias_uses_property_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new()
        .target("sys/HardwareName", TARGET_NAME)
        .dump_as("temp", "")
        .dump_as("sys/HardwareName", "Name")
        .build();
    let network = create_test_network(vec![target_node(1)]);

    Application::new(network, config, settings(dir.path(), 1, 1))
        .run()
        .unwrap();

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert_eq!(rows[0], vec!["Timestamp", "ElapsedTime_ms", "temp", "Name"]);
    assert_eq!(rows[1][3], TARGET_NAME);
}

#[test]
fn test_columns_follow_dump_order() {
    let dir = tempfile::tempdir().unwrap();
    let node = SimulatedNode::new(1)
        .with_property("sys/HardwareName", TARGET_NAME)
        .with_property("a", "A")
        .with_property("b", "B")
        .with_property("c", "C");
    let config = ConfigBuilder::new()
        .target("sys/HardwareName", TARGET_NAME)
        .dump("c")
        .dump("a")
        .dump("b")
        .build();

    Application::new(create_test_network(vec![node]), config, settings(dir.path(), 4, 1))
        .run()
        .unwrap();

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert_eq!(rows.len(), 5);
    for row in &rows[1..] {
        assert_eq!(row.len(), 5);
        assert_eq!(&row[2..], &["C", "A", "B"]);
    }
}

#[test]
fn test_rows_written_in_capture_order() {
    let dir = tempfile::tempdir().unwrap();
    let node = SimulatedNode::new(1)
        .with_property("sys/HardwareName", TARGET_NAME)
        .with_property("seq", ValuePattern::Counter { start: 0, step: 1 });
    let config = ConfigBuilder::new()
        .target("sys/HardwareName", TARGET_NAME)
        .dump("seq")
        .build();

    Application::new(create_test_network(vec![node]), config, settings(dir.path(), 200, 0))
        .run()
        .unwrap();

    let rows = read_csv(&single_output_file(dir.path()), b',');
    let seq: Vec<u64> = rows[1..].iter().map(|r| r[2].parse().unwrap()).collect();
    // Validation read 0; samples are 1..=200
    assert_eq!(seq, (1..=200).collect::<Vec<_>>());
}

#[test]
fn test_capability_mismatch_aborts_before_sink() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new()
        .target("sys/HardwareName", TARGET_NAME)
        .dump("temp")
        .dump("humidity")
        .build();

    let err = Application::new(
        create_test_network(vec![target_node(1)]),
        config,
        settings(dir.path(), 3, 1),
    )
    .run()
    .unwrap_err();
    assert!(matches!(err.root(), ExporterError::CapabilityMismatch { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_sink_failure_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does/not/exist");

    let err = Application::new(
        create_test_network(vec![target_node(1)]),
        temp_config(),
        settings(&missing, 3, 1),
    )
    .run()
    .unwrap_err();
    assert!(matches!(err, ExporterError::Sink(_)));
}

#[test]
fn test_ip_devices_require_filter() {
    let ip_target = || target_node(1).with_transport(Transport::Ip);
    let config = temp_config();

    let dir = tempfile::tempdir().unwrap();
    let usb_only = SimulatedNetwork::new(NetworkFilter::usb_only());
    usb_only.add_node(ip_target()).unwrap();
    let err = Application::new(
        usb_only,
        config.clone(),
        settings(dir.path(), 1, 1).with_wait_device_timeout_ms(30),
    )
    .run()
    .unwrap_err();
    assert!(matches!(err, ExporterError::DiscoveryTimeout { .. }));

    let mut with_ip_settings = settings(dir.path(), 1, 1);
    with_ip_settings.enable_ip_devices = true;
    let with_ip = SimulatedNetwork::new(NetworkFilter::from_settings(&with_ip_settings));
    with_ip.add_node(ip_target()).unwrap();
    let summary = Application::new(with_ip, config, with_ip_settings)
        .run()
        .unwrap();
    assert_eq!(summary.node, NodeHandle::new(1));
}

#[test]
fn test_zero_samples_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let summary = Application::new(
        create_test_network(vec![target_node(1)]),
        temp_config(),
        settings(dir.path(), 0, 1),
    )
    .run()
    .unwrap();
    assert_eq!(summary.export.rows_written, 0);

    let rows = read_csv(&single_output_file(dir.path()), b',');
    assert_eq!(rows, vec![vec!["Timestamp", "ElapsedTime_ms", "Temperature"]]);
}

#[test]
fn test_custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let mut run_settings = settings(dir.path(), 2, 1);
    run_settings.delimiter = b'\t';

    Application::new(create_test_network(vec![target_node(1)]), temp_config(), run_settings)
        .run()
        .unwrap();

    let path = single_output_file(dir.path());
    assert!(path.extension().is_some_and(|e| e == "csv"));
    let rows = read_csv(&path, b'\t');
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].len(), 3);
}
