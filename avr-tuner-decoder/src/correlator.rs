//! Tuner notification correlator
//!
//! The receiver reports band/frequency (`FR`) and preset (`PR`) as two
//! independent notifications with no ordering guarantee, but a preset number only
//! means something once it is paired with the frequency that was active when it
//! was selected. The correlator holds the last unresolved preset and the last FM
//! frequency, and decides per notification whether to emit, clear or keep the
//! cached preset and which follow-up commands to queue.
//!
//! One correlator belongs to one receiver session. Handlers take `&mut self`, so
//! sessions running on different threads each own their own instance.

use crate::config::DecoderConfig;
use crate::params::{SystemParams, PARAM_TUNER_AM_FREQ_STEP};
use crate::response::ResponseBuilder;
use crate::types::{
    DecoderError, PropertyValue, QueuedCommand, Result, TunerBand, UpdateRecord, Zone,
    CALCULATE_AM_FREQUENCY_STEP, PRESET_COMMAND, QUERY_TUNER_FREQUENCY, SYSTEM_PARAMS_PROPERTY,
};
use std::time::Duration;

/// A preset notification waiting for its frequency context
#[derive(Debug, Clone, PartialEq)]
struct CachedPreset {
    raw: String,
    class: char,
    number: u32,
}

/// Per-session correlator for tuner notifications
#[derive(Debug, Clone)]
pub struct TunerCorrelator {
    cached_preset: Option<CachedPreset>,
    cached_frequency: Option<f64>,
    probe_delay: Duration,
    request_am_step_calibration: bool,
}

impl TunerCorrelator {
    /// Create a correlator with default settings and empty caches
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default())
    }

    pub fn with_config(config: &DecoderConfig) -> Self {
        Self {
            cached_preset: None,
            cached_frequency: None,
            probe_delay: config.probe_delay(),
            request_am_step_calibration: config.request_am_step_calibration,
        }
    }

    /// Raw preset notification still waiting to be resolved, if any
    pub fn cached_preset_raw(&self) -> Option<&str> {
        self.cached_preset.as_ref().map(|p| p.raw.as_str())
    }

    /// FM frequency seen by the last FM frequency notification, if any
    pub fn cached_frequency(&self) -> Option<f64> {
        self.cached_frequency
    }

    /// Handle an FM frequency notification (`raw` is frequency x 100, e.g. `08750`)
    ///
    /// Emits band and frequency, then either resolves a pending preset or, if
    /// the frequency moved since the last FM notification, clears the preset.
    pub fn frequency_fm(
        &mut self,
        raw: &str,
        _params: &SystemParams,
        zone: Zone,
        command: &str,
    ) -> Result<Vec<UpdateRecord>> {
        let frequency = f64::from(parse_digits(raw, command)?) / 100.0;

        let mut parsed = vec![
            ResponseBuilder::new(raw, command, zone)
                .tuner("band")
                .value(PropertyValue::Band(TunerBand::Fm))
                .build(),
            ResponseBuilder::new(raw, command, zone)
                .tuner("frequency")
                .value(PropertyValue::Frequency(frequency))
                .build(),
        ];

        if self.cached_preset.is_some() {
            parsed.extend(self.resolve_cached_preset(zone, PRESET_COMMAND));
        } else if self.cached_frequency != Some(frequency) {
            log::debug!(
                "FM frequency changed {:?} -> {}, clearing preset",
                self.cached_frequency,
                frequency
            );
            parsed.extend(Self::clear_preset(zone, PRESET_COMMAND));
        }
        self.cached_frequency = Some(frequency);

        Ok(parsed)
    }

    /// Handle an AM frequency notification (`raw` is the frequency in kHz)
    ///
    /// Requests AM step calibration if the step is not yet known, and always
    /// attempts to resolve a pending preset. The FM staleness cache is left alone.
    pub fn frequency_am(
        &mut self,
        raw: &str,
        params: &SystemParams,
        zone: Zone,
        command: &str,
    ) -> Result<Vec<UpdateRecord>> {
        let frequency = f64::from(parse_digits(raw, command)?);

        let mut queue_commands = Vec::new();
        if self.request_am_step_calibration && !params.contains(PARAM_TUNER_AM_FREQ_STEP) {
            log::debug!("AM frequency step unknown, queueing calibration");
            queue_commands.push(QueuedCommand::delay_then(
                self.probe_delay,
                CALCULATE_AM_FREQUENCY_STEP,
            ));
        }

        let mut parsed = vec![
            ResponseBuilder::new(raw, command, zone)
                .tuner("band")
                .value(PropertyValue::Band(TunerBand::Am))
                .queue_commands(queue_commands)
                .build(),
            ResponseBuilder::new(raw, command, zone)
                .tuner("frequency")
                .value(PropertyValue::Frequency(frequency))
                .build(),
        ];
        parsed.extend(self.resolve_cached_preset(zone, PRESET_COMMAND));

        Ok(parsed)
    }

    /// Handle a preset notification (`raw` is class letter + index, e.g. `A05`)
    ///
    /// The preset is cached until the next frequency notification, and a
    /// frequency query is queued so that notification arrives. A malformed code
    /// is rejected without touching the cache.
    pub fn preset(
        &mut self,
        raw: &str,
        _params: &SystemParams,
        zone: Zone,
        command: &str,
    ) -> Result<Vec<UpdateRecord>> {
        let mut chars = raw.chars();
        let class = chars
            .next()
            .ok_or_else(|| DecoderError::malformed(command, raw, "empty preset code"))?;
        let number = parse_digits(chars.as_str(), command)
            .map_err(|_| DecoderError::malformed(command, raw, "preset index is not a number"))?;

        if let Some(previous) = &self.cached_preset {
            log::debug!("Preset {} superseded by {} before resolution", previous.raw, raw);
        }
        self.cached_preset = Some(CachedPreset {
            raw: raw.to_string(),
            class,
            number,
        });

        Ok(vec![ResponseBuilder::new(raw, command, zone)
            .value(PropertyValue::Text(raw.to_string()))
            .queue_commands(vec![QueuedCommand::requery(QUERY_TUNER_FREQUENCY)])
            .build()])
    }

    /// Handle an AM frequency step response: `0` means 9 kHz, anything else 10 kHz
    pub fn am_frequency_step(
        &mut self,
        raw: &str,
        _params: &SystemParams,
        zone: Zone,
        command: &str,
    ) -> Result<Vec<UpdateRecord>> {
        let step = if raw == "0" { 9 } else { 10 };

        Ok(vec![ResponseBuilder::new(raw, command, zone)
            .property(SYSTEM_PARAMS_PROPERTY, PARAM_TUNER_AM_FREQ_STEP)
            .value(PropertyValue::Step(step))
            .build()])
    }

    /// Emit class and preset for the cached preset and clear the cache
    ///
    /// Returns nothing if no preset is pending.
    pub fn resolve_cached_preset(&mut self, zone: Zone, command: &str) -> Vec<UpdateRecord> {
        let Some(preset) = self.cached_preset.take() else {
            return Vec::new();
        };
        log::debug!("Resolved preset {}{}", preset.class, preset.number);

        vec![
            ResponseBuilder::new(preset.raw.as_str(), command, zone)
                .tuner("class")
                .value(PropertyValue::Class(preset.class))
                .build(),
            ResponseBuilder::new(preset.raw, command, zone)
                .tuner("preset")
                .value(PropertyValue::Preset(preset.number))
                .build(),
        ]
    }

    /// Records clearing class and preset, regardless of cache state
    pub fn clear_preset(zone: Zone, command: &str) -> Vec<UpdateRecord> {
        vec![
            ResponseBuilder::new("", command, zone).tuner("class").build(),
            ResponseBuilder::new("", command, zone).tuner("preset").build(),
        ]
    }
}

impl Default for TunerCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a non-empty run of ASCII digits
fn parse_digits(raw: &str, command: &str) -> Result<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecoderError::malformed(command, raw, "expected decimal digits"));
    }
    raw.parse::<u32>()
        .map_err(|e| DecoderError::malformed(command, raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AM_STEP_COMMAND, FREQUENCY_COMMAND};

    fn property_names(records: &[UpdateRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.property_name.as_deref().unwrap_or("-"))
            .collect()
    }

    #[test]
    fn test_fm_frequency_is_scaled() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        let records = correlator
            .frequency_fm("08750", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(records[0].value, Some(PropertyValue::Band(TunerBand::Fm)));
        assert_eq!(records[1].value, Some(PropertyValue::Frequency(87.5)));
        assert_eq!(correlator.cached_frequency(), Some(87.5));
    }

    #[test]
    fn test_am_frequency_is_not_scaled() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        let records = correlator
            .frequency_am("00531", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, Some(PropertyValue::Band(TunerBand::Am)));
        assert_eq!(records[1].value, Some(PropertyValue::Frequency(531.0)));
        assert_eq!(correlator.cached_frequency(), None);
    }

    #[test]
    fn test_preset_then_fm_resolves_preset() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        let trigger = correlator.preset("A05", &params, Zone::All, PRESET_COMMAND).unwrap();
        assert_eq!(trigger.len(), 1);
        assert_eq!(trigger[0].property_path(), None);
        assert_eq!(
            trigger[0].queue_commands,
            vec![QueuedCommand::requery(QUERY_TUNER_FREQUENCY)]
        );
        assert_eq!(correlator.cached_preset_raw(), Some("A05"));

        let records = correlator
            .frequency_fm("10110", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(property_names(&records), vec!["band", "frequency", "class", "preset"]);
        assert_eq!(records[2].value, Some(PropertyValue::Class('A')));
        assert_eq!(records[3].value, Some(PropertyValue::Preset(5)));
        assert_eq!(records[3].response_command, PRESET_COMMAND);
        assert_eq!(correlator.cached_preset_raw(), None);
    }

    #[test]
    fn test_same_fm_frequency_does_not_clear_preset() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        correlator.frequency_fm("08750", &params, Zone::All, FREQUENCY_COMMAND).unwrap();
        let records = correlator
            .frequency_fm("08750", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(property_names(&records), vec!["band", "frequency"]);
    }

    #[test]
    fn test_changed_fm_frequency_clears_preset() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        correlator.frequency_fm("08750", &params, Zone::All, FREQUENCY_COMMAND).unwrap();
        let records = correlator
            .frequency_fm("09810", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(property_names(&records), vec!["band", "frequency", "class", "preset"]);
        assert!(records[2].value.is_none());
        assert!(records[3].value.is_none());
        assert_eq!(records[2].raw, "");
    }

    #[test]
    fn test_first_fm_frequency_clears_preset() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        let records = correlator
            .frequency_fm("08750", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(records.len(), 4);
        assert!(records[3].value.is_none());
    }

    #[test]
    fn test_am_requests_step_calibration_when_unknown() {
        let mut correlator = TunerCorrelator::new();
        let mut params = SystemParams::new();

        let records = correlator
            .frequency_am("00531", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();
        assert_eq!(
            records[0].queue_commands,
            vec![QueuedCommand::delay_then(
                Duration::from_secs(2),
                CALCULATE_AM_FREQUENCY_STEP
            )]
        );
        assert!(records[1].queue_commands.is_empty());

        params.set(PARAM_TUNER_AM_FREQ_STEP, 9);
        let records = correlator
            .frequency_am("00531", &params, Zone::All, FREQUENCY_COMMAND)
            .unwrap();
        assert!(records[0].queue_commands.is_empty());
    }

    #[test]
    fn test_am_step_calibration_can_be_disabled() {
        let config = DecoderConfig::new().with_am_step_calibration(false);
        let mut correlator = TunerCorrelator::with_config(&config);

        let records = correlator
            .frequency_am("00531", &SystemParams::new(), Zone::All, FREQUENCY_COMMAND)
            .unwrap();
        assert!(records[0].queue_commands.is_empty());
    }

    #[test]
    fn test_am_resolves_pending_preset() {
        let mut correlator = TunerCorrelator::new();
        let mut params = SystemParams::new();
        params.set(PARAM_TUNER_AM_FREQ_STEP, 10);

        correlator.preset("B12", &params, Zone::Main, PRESET_COMMAND).unwrap();
        let records = correlator
            .frequency_am("01000", &params, Zone::Main, FREQUENCY_COMMAND)
            .unwrap();

        assert_eq!(property_names(&records), vec!["band", "frequency", "class", "preset"]);
        assert_eq!(records[2].value, Some(PropertyValue::Class('B')));
        assert_eq!(records[3].value, Some(PropertyValue::Preset(12)));
        assert!(records.iter().all(|r| r.zone == Zone::Main));
    }

    #[test]
    fn test_newer_preset_overwrites_pending_one() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        correlator.preset("A01", &params, Zone::All, PRESET_COMMAND).unwrap();
        correlator.preset("C07", &params, Zone::All, PRESET_COMMAND).unwrap();
        let records = correlator.resolve_cached_preset(Zone::All, PRESET_COMMAND);

        assert_eq!(records[0].value, Some(PropertyValue::Class('C')));
        assert_eq!(records[1].value, Some(PropertyValue::Preset(7)));
    }

    #[test]
    fn test_resolve_cached_preset_is_idempotent() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        correlator.preset("A05", &params, Zone::All, PRESET_COMMAND).unwrap();
        assert_eq!(correlator.resolve_cached_preset(Zone::All, PRESET_COMMAND).len(), 2);
        assert!(correlator.resolve_cached_preset(Zone::All, PRESET_COMMAND).is_empty());
    }

    #[test]
    fn test_am_step_decoding() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        let records = correlator.am_frequency_step("0", &params, Zone::All, AM_STEP_COMMAND).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Some(PropertyValue::Step(9)));
        assert!(records[0].is_system_param());
        assert_eq!(records[0].property_name.as_deref(), Some(PARAM_TUNER_AM_FREQ_STEP));

        let records = correlator.am_frequency_step("1", &params, Zone::All, AM_STEP_COMMAND).unwrap();
        assert_eq!(records[0].value, Some(PropertyValue::Step(10)));
    }

    #[test]
    fn test_malformed_frequency_is_rejected() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        for raw in ["", "87.5", "abc", "-100"] {
            let result = correlator.frequency_fm(raw, &params, Zone::All, FREQUENCY_COMMAND);
            assert!(matches!(result, Err(DecoderError::MalformedNotification { .. })), "{raw}");
        }
        assert_eq!(correlator.cached_frequency(), None);
    }

    #[test]
    fn test_malformed_preset_leaves_cache_untouched() {
        let mut correlator = TunerCorrelator::new();
        let params = SystemParams::new();

        correlator.preset("A05", &params, Zone::All, PRESET_COMMAND).unwrap();
        for raw in ["", "A", "AXY", "A+5"] {
            let result = correlator.preset(raw, &params, Zone::All, PRESET_COMMAND);
            assert!(matches!(result, Err(DecoderError::MalformedNotification { .. })), "{raw}");
        }
        assert_eq!(correlator.cached_preset_raw(), Some("A05"));
    }

    #[test]
    fn test_clear_preset_is_unconditional() {
        let records = TunerCorrelator::clear_preset(Zone::Zone2, PRESET_COMMAND);
        assert_eq!(property_names(&records), vec!["class", "preset"]);
        assert!(records.iter().all(|r| r.value.is_none() && r.zone == Zone::Zone2));
    }
}
