//! System parameter store
//!
//! Receiver-wide constants that are discovered at runtime rather than
//! configured, keyed by name. The correlator only reads from the store; records
//! targeting [`crate::types::SYSTEM_PARAMS_PROPERTY`] are written back by whoever
//! consumes them.

use crate::types::UpdateRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Calibrated AM channel step in kHz (absent until the receiver has been probed)
pub const PARAM_TUNER_AM_FREQ_STEP: &str = "tuner_am_frequency_step";

/// Keyed store of system parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemParams {
    values: HashMap<String, Value>,
}

impl SystemParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Write a system parameter record into the store
    ///
    /// Returns false (and leaves the store untouched) if the record does not
    /// target a system parameter, or if its value has no JSON form. A record
    /// without a value removes the key.
    pub fn apply(&mut self, record: &UpdateRecord) -> bool {
        if !record.is_system_param() {
            return false;
        }
        let Some(key) = record.property_name.as_deref() else {
            return false;
        };

        match &record.value {
            Some(value) => {
                let Some(json) = value.to_json() else {
                    log::warn!("System parameter {}: cannot store {:?}, keeping previous value", key, value);
                    return false;
                };
                log::debug!("System parameter {} = {}", key, json);
                self.values.insert(key.to_string(), json);
            }
            None => {
                log::debug!("System parameter {} cleared", key);
                self.values.remove(key);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
