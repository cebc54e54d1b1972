//! Realtime delivery tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::realtime::SessionSettings;

const MAX_OUTBOUND_BUFFER: usize = 10_000;
const MAX_WRITE_TIMEOUT_MS: u64 = 60_000;

/// Per-connection limits applied by every session.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Events queued for one client before new ones are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Upper bound on a single socket write, in milliseconds
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            outbound_buffer: self.outbound_buffer,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_buffer == 0 || self.outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(ValidationError::InvalidOutboundBuffer(MAX_OUTBOUND_BUFFER));
        }
        if self.write_timeout_ms == 0 || self.write_timeout_ms > MAX_WRITE_TIMEOUT_MS {
            return Err(ValidationError::InvalidWriteTimeout(MAX_WRITE_TIMEOUT_MS));
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_write_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_defaults() {
        let settings = DeliveryConfig::default().session_settings();
        let expected = SessionSettings::default();
        assert_eq!(settings.outbound_buffer, expected.outbound_buffer);
        assert_eq!(settings.write_timeout, expected.write_timeout);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let config = DeliveryConfig {
            outbound_buffer: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn write_timeout_bounds() {
        let config = DeliveryConfig {
            write_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DeliveryConfig {
            write_timeout_ms: 250,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.session_settings().write_timeout,
            Duration::from_millis(250)
        );
    }
}
