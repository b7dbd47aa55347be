//! Update record construction
//!
//! Every handler builds its output through [`ResponseBuilder`]; it performs no
//! validation and never fails.

use crate::types::{PropertyValue, QueuedCommand, UpdateRecord, Zone, TUNER_PROPERTY};

/// Builder for a single [`UpdateRecord`]
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    record: UpdateRecord,
}

impl ResponseBuilder {
    /// Start a record for `raw` as produced by response `command` in `zone`
    pub fn new(raw: impl Into<String>, command: impl Into<String>, zone: Zone) -> Self {
        Self {
            record: UpdateRecord {
                raw: raw.into(),
                response_command: command.into(),
                base_property: None,
                property_name: None,
                zone,
                value: None,
                queue_commands: Vec::new(),
            },
        }
    }

    /// Builder method: set the property path
    pub fn property(mut self, base_property: impl Into<String>, property_name: impl Into<String>) -> Self {
        self.record.base_property = Some(base_property.into());
        self.record.property_name = Some(property_name.into());
        self
    }

    /// Builder method: shorthand for a `tuner.<name>` property
    pub fn tuner(self, property_name: impl Into<String>) -> Self {
        self.property(TUNER_PROPERTY, property_name)
    }

    /// Builder method: set the decoded value
    pub fn value(mut self, value: PropertyValue) -> Self {
        self.record.value = Some(value);
        self
    }

    /// Builder method: attach follow-up commands
    pub fn queue_commands(mut self, commands: Vec<QueuedCommand>) -> Self {
        self.record.queue_commands = commands;
        self
    }

    pub fn build(self) -> UpdateRecord {
        self.record
    }
}
