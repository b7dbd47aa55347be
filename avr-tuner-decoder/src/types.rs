//! Core types for the AVR tuner decoder library
//!
//! This module defines the records the decoder emits when processing tuner
//! response lines. Records are plain values: the decoder never applies them to
//! device state, it only describes what changed and what to ask the receiver next.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Response code for tuner frequency notifications (`FRF08750`, `FRA00531`)
pub const FREQUENCY_COMMAND: &str = "FR";

/// Response code for tuner preset notifications (`PRA05`)
pub const PRESET_COMMAND: &str = "PR";

/// Response code for the AM frequency step query (`SUQ0`)
pub const AM_STEP_COMMAND: &str = "SUQ";

/// Base property for all tuner state updates
pub const TUNER_PROPERTY: &str = "tuner";

/// Base property marking a record as a global system parameter update
pub const SYSTEM_PARAMS_PROPERTY: &str = "_system_params";

/// Follow-up command asking the receiver to report its tuner frequency
pub const QUERY_TUNER_FREQUENCY: &str = "query_tuner_frequency";

/// Follow-up computation that probes the receiver for its AM channel step
pub const CALCULATE_AM_FREQUENCY_STEP: &str = "calculate_am_frequency_step";

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed {command} notification {raw:?}: {reason}")]
    MalformedNotification {
        command: String,
        raw: String,
        reason: String,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl DecoderError {
    pub(crate) fn malformed(command: &str, raw: &str, reason: impl Into<String>) -> Self {
        DecoderError::MalformedNotification {
            command: command.to_string(),
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// An independently controllable audio output on the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Main,
    Zone2,
    Zone3,
    HdZone,
    /// Sentinel for updates that apply to the receiver as a whole
    #[default]
    All,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Main => write!(f, "1"),
            Zone::Zone2 => write!(f, "2"),
            Zone::Zone3 => write!(f, "3"),
            Zone::HdZone => write!(f, "Z"),
            Zone::All => write!(f, "ALL"),
        }
    }
}

/// Tuner reception mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TunerBand {
    Am,
    Fm,
}

impl fmt::Display for TunerBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunerBand::Am => write!(f, "AM"),
            TunerBand::Fm => write!(f, "FM"),
        }
    }
}

/// Decoded value carried by an [`UpdateRecord`]
///
/// Serialized externally tagged (`{"preset": 5}`) since several variants share
/// a JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Band(TunerBand),
    /// FM in MHz, AM in kHz
    Frequency(f64),
    Preset(u32),
    Class(char),
    /// AM channel step in kHz
    Step(u32),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Band(band) => write!(f, "{}", band),
            PropertyValue::Frequency(v) => write!(f, "{:.2}", v),
            PropertyValue::Preset(v) => write!(f, "{}", v),
            PropertyValue::Class(c) => write!(f, "{}", c),
            PropertyValue::Step(v) => write!(f, "{}", v),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl PropertyValue {
    /// Plain JSON form used by the system parameter store
    ///
    /// Returns None for a frequency that has no JSON representation (NaN/inf).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value;
        match self {
            PropertyValue::Band(band) => Some(Value::from(band.to_string())),
            PropertyValue::Frequency(v) => serde_json::Number::from_f64(*v).map(Value::Number),
            PropertyValue::Preset(v) | PropertyValue::Step(v) => Some(Value::from(*v)),
            PropertyValue::Class(c) => Some(Value::from(c.to_string())),
            PropertyValue::Text(s) => Some(Value::from(s.as_str())),
        }
    }

    /// Read a plain JSON value back as the same variant as `self`
    pub fn same_kind_from_json(&self, value: &serde_json::Value) -> Option<PropertyValue> {
        match self {
            PropertyValue::Band(_) => match value.as_str()? {
                "AM" => Some(PropertyValue::Band(TunerBand::Am)),
                "FM" => Some(PropertyValue::Band(TunerBand::Fm)),
                _ => None,
            },
            PropertyValue::Frequency(_) => value.as_f64().map(PropertyValue::Frequency),
            PropertyValue::Preset(_) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(PropertyValue::Preset),
            PropertyValue::Step(_) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(PropertyValue::Step),
            PropertyValue::Class(_) => {
                let mut chars = value.as_str()?.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(PropertyValue::Class(c)),
                    _ => None,
                }
            }
            PropertyValue::Text(_) => value.as_str().map(|s| PropertyValue::Text(s.to_string())),
        }
    }
}

/// Follow-up work a record asks the command dispatcher to perform
///
/// The decoder only describes these; submitting them to the receiver,
/// waiting, and retrying are the dispatcher's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuedCommand {
    /// Re-issue a named command to the receiver
    Requery(String),
    /// Wait for `delay`, then run a named computation against the receiver
    DelayThen { delay: Duration, computation: String },
}

impl QueuedCommand {
    pub fn requery(name: impl Into<String>) -> Self {
        QueuedCommand::Requery(name.into())
    }

    pub fn delay_then(delay: Duration, computation: impl Into<String>) -> Self {
        QueuedCommand::DelayThen {
            delay,
            computation: computation.into(),
        }
    }
}

impl fmt::Display for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueuedCommand::Requery(name) => write!(f, "{}", name),
            QueuedCommand::DelayThen { delay, computation } => {
                write!(f, "sleep({}s) -> {}", delay.as_secs_f64(), computation)
            }
        }
    }
}

/// A normalized property update - the primary output of the decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// The unparsed notification payload (kept for diagnostics/replay)
    pub raw: String,
    /// Short code of the response that produced this record (e.g. "FR")
    pub response_command: String,
    /// First segment of the property path (None for trigger-only records)
    pub base_property: Option<String>,
    /// Second segment of the property path
    pub property_name: Option<String>,
    pub zone: Zone,
    /// Decoded value (None clears the property)
    pub value: Option<PropertyValue>,
    /// Follow-up commands, in submission order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue_commands: Vec<QueuedCommand>,
}

impl UpdateRecord {
    /// Dotted property path, e.g. `tuner.frequency`
    pub fn property_path(&self) -> Option<String> {
        match (&self.base_property, &self.property_name) {
            (Some(base), Some(name)) => Some(format!("{}.{}", base, name)),
            (Some(base), None) => Some(base.clone()),
            (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }

    /// True if this record updates a global system parameter rather than zone state
    pub fn is_system_param(&self) -> bool {
        self.base_property.as_deref() == Some(SYSTEM_PARAMS_PROPERTY)
    }
}
