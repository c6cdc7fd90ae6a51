//! Command-line and environment overrides layered over the file config.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;
use super::types::Config;
use crate::simulator::Credentials;

/// Settings supplied outside the config file. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
    /// Seconds, fractional allowed
    pub min_delay_secs: Option<f64>,
    /// Seconds, fractional allowed
    pub max_delay_secs: Option<f64>,
    /// Comma separated outcome names
    pub statuses: Option<String>,
    /// Comma separated `system_id:password` table
    pub auth: Option<String>,
    pub system_id: Option<String>,
    pub password: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: bool,
    pub log_file: Option<PathBuf>,
}

impl Overrides {
    /// Apply overrides on top of `config`.
    ///
    /// A credential table replaces the configured one; a single
    /// system_id/password pair is added to whatever table results.
    pub fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(address) = self.address {
            config.listen.address = address;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(secs) = self.min_delay_secs {
            config.delivery.min_delay = seconds(secs)?;
        }
        if let Some(secs) = self.max_delay_secs {
            config.delivery.max_delay = seconds(secs)?;
        }
        if let Some(statuses) = &self.statuses {
            config.delivery.statuses = statuses
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(table) = &self.auth {
            config.auth = Credentials::parse_table(table)?;
        }
        match (&self.system_id, &self.password) {
            (Some(system_id), password) => {
                let password = password.clone().unwrap_or_default();
                config.auth.retain(|c| &c.system_id != system_id);
                config.auth.push(Credentials::new(system_id.clone(), password));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MalformedCredential(
                    "password given without system_id".to_string(),
                ));
            }
            (None, None) => {}
        }
        if let Some(level) = &self.log_level {
            config.telemetry.log_level = level.clone();
        }
        if self.json_logs {
            config.telemetry.json_logs = true;
        }
        if let Some(path) = &self.log_file {
            config.telemetry.log_file = Some(path.clone());
        }
        Ok(())
    }
}

fn seconds(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidDelay(format!("{}: {}", secs, e)))
}
