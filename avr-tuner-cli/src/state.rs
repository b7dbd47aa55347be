//! Property tracking and state management
//!
//! Applies decoded records to a per-zone view of receiver state and reports
//! property changes (old→new). System parameter records are also written to
//! the [`SystemParams`] store the decoder reads from.

use avr_tuner_decoder::{PropertyValue, SystemParams, UpdateRecord, Zone};
use std::collections::HashMap;

/// A tracked property whose value changed
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub zone: Zone,
    pub property: String,
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

/// Latest value of every property seen so far, keyed by zone and property path
#[derive(Debug, Default)]
pub struct PropertyTracker {
    values: HashMap<(Zone, String), Option<PropertyValue>>,
    params: SystemParams,
}

impl PropertyTracker {
    pub fn new(params: SystemParams) -> Self {
        Self {
            values: HashMap::new(),
            params,
        }
    }

    pub fn params(&self) -> &SystemParams {
        &self.params
    }

    /// Apply a record, returning the change it caused (if any)
    ///
    /// Trigger records without a property path change nothing.
    pub fn apply(&mut self, record: &UpdateRecord) -> Option<PropertyChange> {
        if record.is_system_param() {
            return self.apply_system_param(record);
        }

        let property = record.property_path()?;
        let old = self
            .values
            .insert((record.zone, property.clone()), record.value.clone())
            .flatten();

        if old == record.value {
            return None;
        }
        log::debug!("{} [{}]: {:?} -> {:?}", property, record.zone, old, record.value);
        Some(PropertyChange {
            zone: record.zone,
            property,
            old,
            new: record.value.clone(),
        })
    }

    /// Write a system parameter record to the store, reading the old value from it
    fn apply_system_param(&mut self, record: &UpdateRecord) -> Option<PropertyChange> {
        let key = record.property_name.as_deref()?;
        let property = record.property_path()?;
        let before = self.params.get(key).cloned();
        if !self.params.apply(record) || self.params.get(key) == before.as_ref() {
            return None;
        }
        log::info!("System parameter {} updated from {:?}", key, record.raw);

        let old = match (&record.value, &before) {
            (Some(new), Some(before)) => new.same_kind_from_json(before),
            _ => None,
        };
        Some(PropertyChange {
            zone: record.zone,
            property,
            old,
            new: record.value.clone(),
        })
    }
}
