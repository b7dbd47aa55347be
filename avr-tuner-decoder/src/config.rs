//! Decoder configuration types
//!
//! The decoder needs very little configuration: which zone to tag tuner records
//! with, and how the AM step calibration follow-up is requested.

use crate::types::Zone;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tuner decoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Zone attached to tuner records (the tuner is shared by all zones)
    #[serde(default)]
    pub default_zone: Zone,

    /// Settle time before probing the AM channel step (default: 2s)
    #[serde(default = "default_probe_delay")]
    pub am_step_probe_delay_secs: u64,

    /// Whether AM frequency notifications request step calibration when unknown
    #[serde(default = "default_true")]
    pub request_am_step_calibration: bool,
}

fn default_true() -> bool {
    true
}

fn default_probe_delay() -> u64 {
    2
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            default_zone: Zone::default(),
            am_step_probe_delay_secs: default_probe_delay(),
            request_am_step_calibration: default_true(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the zone attached to tuner records
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.default_zone = zone;
        self
    }

    /// Builder method: set the AM step probe delay
    pub fn with_probe_delay(mut self, secs: u64) -> Self {
        self.am_step_probe_delay_secs = secs;
        self
    }

    /// Builder method: enable or disable AM step calibration requests
    pub fn with_am_step_calibration(mut self, enabled: bool) -> Self {
        self.request_am_step_calibration = enabled;
        self
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_secs(self.am_step_probe_delay_secs)
    }
}
