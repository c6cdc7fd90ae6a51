use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::simulator::Credentials;

/// Root configuration for smppsim
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listening socket
    #[serde(default)]
    pub listen: ListenConfig,

    /// Delivery receipt simulation
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Accepted ESME credentials
    #[serde(default = "default_auth")]
    pub auth: Vec<Credentials>,

    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Shutdown configuration
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            delivery: DeliveryConfig::default(),
            auth: default_auth(),
            telemetry: TelemetryConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl Config {
    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen.address, self.listen.port)
    }
}

fn default_auth() -> Vec<Credentials> {
    vec![Credentials::new("user", "pass")]
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Bind address
    #[serde(default = "default_address")]
    pub address: IpAddr,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// system_id reported in bind responses
    #[serde(default = "default_system_id")]
    pub system_id: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            system_id: default_system_id(),
        }
    }
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    2775
}

fn default_system_id() -> String {
    "smppsim".to_string()
}

/// Delivery receipt configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Lower bound of the submit_sm to deliver_sm delay
    #[serde(default, with = "humantime_serde")]
    pub min_delay: Duration,

    /// Upper bound of the submit_sm to deliver_sm delay
    #[serde(default, with = "humantime_serde")]
    pub max_delay: Duration,

    /// Outcome names, cycled in order
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            statuses: default_statuses(),
        }
    }
}

fn default_statuses() -> Vec<String> {
    vec!["delivered".to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable structured JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Additional log file sink
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Shutdown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// How long to wait for sessions to close after a signal
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
        }
    }
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Humantime serde support module
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
