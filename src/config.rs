//! Environment-driven configuration for the speedtest monitor
//!
//! Every setting is optional and falls back to a default. Numeric settings are
//! parsed eagerly so a malformed value stops the process before the first
//! measurement cycle.

use std::time::Duration;
use thiserror::Error;

pub const ENV_MQTT_HOST: &str = "MQTT_HOST";
pub const ENV_MQTT_PORT: &str = "MQTT_PORT";
pub const ENV_MQTT_USERNAME: &str = "MQTT_USERNAME";
pub const ENV_MQTT_PASSWORD: &str = "MQTT_PASSWORD";
pub const ENV_MQTT_BASE_TOPIC: &str = "MQTT_BASE_TOPIC";
pub const ENV_SLEEP_INTERVAL: &str = "SLEEP_INTERVAL";
pub const ENV_SPEEDTEST_COMMAND: &str = "SPEEDTEST_COMMAND";

const DEFAULT_MQTT_HOST: &str = "localhost";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_MQTT_CREDENTIAL: &str = "client";
const DEFAULT_BASE_TOPIC: &str = "internet/";
const DEFAULT_SLEEP_INTERVAL_SECS: u64 = 21600; // 12 hours
const DEFAULT_SPEEDTEST_COMMAND: &str = "speedtest";

/// Complete monitor configuration, loaded once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub mqtt: MqttSection,
    pub speedtest: SpeedtestSection,
    /// Seconds to wait between measurement cycles
    pub sleep_interval_secs: u64,
}

/// Broker connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct MqttSection {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Prefix prepended verbatim to every metric name
    pub base_topic: String,
}

/// Measurement tool settings
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedtestSection {
    /// Program to run, e.g. `speedtest`
    pub program: String,
    /// Arguments placed before `--format=json`
    pub args: Vec<String>,
}

/// Configuration loading errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' is not a valid integer")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MonitorConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Unset variables take their defaults. A variable that is set but empty is
    /// treated as a value, so an empty `MQTT_PORT` is an error rather than 1883.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port = parse_number(ENV_MQTT_PORT, lookup(ENV_MQTT_PORT), DEFAULT_MQTT_PORT)?;
        let sleep_interval_secs = parse_number(
            ENV_SLEEP_INTERVAL,
            lookup(ENV_SLEEP_INTERVAL),
            DEFAULT_SLEEP_INTERVAL_SECS,
        )?;
        let speedtest = SpeedtestSection::parse(&string_or(
            ENV_SPEEDTEST_COMMAND,
            DEFAULT_SPEEDTEST_COMMAND,
        ))?;

        Ok(MonitorConfig {
            mqtt: MqttSection {
                host: string_or(ENV_MQTT_HOST, DEFAULT_MQTT_HOST),
                port,
                username: string_or(ENV_MQTT_USERNAME, DEFAULT_MQTT_CREDENTIAL),
                password: string_or(ENV_MQTT_PASSWORD, DEFAULT_MQTT_CREDENTIAL),
                base_topic: string_or(ENV_MQTT_BASE_TOPIC, DEFAULT_BASE_TOPIC),
            },
            speedtest,
            sleep_interval_secs,
        })
    }

    /// Configured pause between cycles
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval_secs)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self::from_lookup(|_| None).expect("defaults should always load")
    }
}

impl SpeedtestSection {
    /// Split a command line such as `speedtest --accept-license` into program and args
    pub fn parse(command_line: &str) -> Result<Self, ConfigError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            ConfigError::InvalidConfig(format!("{ENV_SPEEDTEST_COMMAND} must name a program"))
        })?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Default for SpeedtestSection {
    fn default() -> Self {
        Self {
            program: DEFAULT_SPEEDTEST_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = MonitorConfig::test_config();

        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.username, "client");
        assert_eq!(config.mqtt.password, "client");
        assert_eq!(config.mqtt.base_topic, "internet/");
        assert_eq!(config.sleep_interval_secs, 21600);
        assert_eq!(config.speedtest, SpeedtestSection::default());
    }

    #[test]
    fn test_numbers_are_trimmed() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("MQTT_PORT", " 8883 "),
            ("SLEEP_INTERVAL", "100\n"),
        ]))
        .unwrap();
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.sleep_interval(), Duration::from_secs(100));
    }

    #[test]
    fn test_empty_port_is_an_error() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("MQTT_PORT", "")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidNumber {
                name: "MQTT_PORT",
                value: String::new()
            })
        );
    }

    #[test]
    fn test_port_out_of_range() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("MQTT_PORT", "70000")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                name: "MQTT_PORT",
                ..
            })
        ));
    }

    #[test]
    fn test_speedtest_command_split() {
        let section = SpeedtestSection::parse("speedtest --accept-license  --accept-gdpr").unwrap();
        assert_eq!(section.program, "speedtest");
        assert_eq!(section.args, vec!["--accept-license", "--accept-gdpr"]);
    }

    #[test]
    fn test_blank_speedtest_command_rejected() {
        assert!(matches!(
            SpeedtestSection::parse("   "),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}
