use anyhow::{Context, Result};
use rusmpp::types::COctetString;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::ConfigError;
use super::types::Config;
use crate::simulator::{DelaySampler, StatusSelector};

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML string.
    ///
    /// Not validated: command-line overrides are applied first.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).context("failed to parse YAML configuration")?;
        Ok(config)
    }

    /// The configured system_id as sent in bind responses.
    ///
    /// At most 15 ASCII characters.
    pub fn smsc_system_id(&self) -> Result<COctetString<1, 16>, ConfigError> {
        self.listen
            .system_id
            .parse()
            .map_err(|_| ConfigError::InvalidSystemId(self.listen.system_id.clone()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        DelaySampler::new(self.delivery.min_delay, self.delivery.max_delay)?;
        StatusSelector::from_names(&self.delivery.statuses)?;
        self.smsc_system_id()?;

        if self.auth.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        for creds in &self.auth {
            if creds.system_id.is_empty() {
                return Err(ConfigError::MalformedCredential(format!(":{}", creds.password)));
            }
        }

        Ok(())
    }
}
