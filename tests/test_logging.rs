//! Tests for logging configuration and format parsing

use speedtest_mqtt::observability::logging::{parse_level, LogFormat, TIMESTAMP_FORMAT};
use tracing::Level;

#[test]
fn test_log_format_parse_json() {
    assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
}

#[test]
fn test_log_format_parse_pretty() {
    assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
    assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
}

#[test]
fn test_log_format_parse_whitespace() {
    assert_eq!(LogFormat::parse("  json  "), LogFormat::Json);
    assert_eq!(LogFormat::parse("compact\n"), LogFormat::Compact);
}

#[test]
fn test_log_format_unknown_defaults_to_compact() {
    assert_eq!(LogFormat::parse("yaml"), LogFormat::Compact);
    assert_eq!(LogFormat::parse("123"), LogFormat::Compact);
}

#[test]
fn test_log_level_defaults_to_info() {
    assert_eq!(parse_level("nonsense"), Level::INFO);
    assert_eq!(parse_level("  debug "), Level::DEBUG);
}

#[test]
fn test_timestamp_format_renders_seconds() {
    let rendered = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
        .format(TIMESTAMP_FORMAT)
        .to_string();
    assert_eq!(rendered, "2024-01-02 03:04:05");
}
