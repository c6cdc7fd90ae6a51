//! Delivery receipt delay sampling.

use std::time::Duration;

use rand::Rng;

use crate::config::ConfigError;

/// Produces the wait between a submit_sm_resp and its deliver_sm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySampler {
    min: Duration,
    max: Duration,
}

impl DelaySampler {
    /// `min > max` is a configuration error.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidDelayRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Always the same delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Fixed value when `min == max`, otherwise uniform in `[min, max)`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..self.max)
    }
}

impl Default for DelaySampler {
    fn default() -> Self {
        Self::fixed(Duration::ZERO)
    }
}
