//! Main decoder API
//!
//! [`TunerDecoder`] is the entry point for decoding complete response lines as the
//! receiver emits them. It routes tuner responses to the matching
//! [`TunerCorrelator`] handler and ignores every other response class.

use crate::config::DecoderConfig;
use crate::correlator::TunerCorrelator;
use crate::params::SystemParams;
use crate::types::{
    DecoderError, Result, UpdateRecord, Zone, AM_STEP_COMMAND, FREQUENCY_COMMAND, PRESET_COMMAND,
};

/// Decoder for one receiver session
pub struct TunerDecoder {
    correlator: TunerCorrelator,
    config: DecoderConfig,
}

impl TunerDecoder {
    /// Create a new decoder instance with default configuration
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            correlator: TunerCorrelator::with_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn correlator(&self) -> &TunerCorrelator {
        &self.correlator
    }

    pub fn correlator_mut(&mut self) -> &mut TunerCorrelator {
        &mut self.correlator
    }

    /// Decode one response line using the configured zone
    ///
    /// # Example
    /// ```
    /// use avr_tuner_decoder::{PropertyValue, SystemParams, TunerDecoder};
    ///
    /// let mut decoder = TunerDecoder::new();
    /// let params = SystemParams::new();
    ///
    /// decoder.decode_line("PRA05", &params).unwrap();
    /// let records = decoder.decode_line("FRF08750", &params).unwrap();
    ///
    /// assert_eq!(records.len(), 4);
    /// assert_eq!(records[1].value, Some(PropertyValue::Frequency(87.5)));
    /// assert_eq!(records[3].value, Some(PropertyValue::Preset(5)));
    /// ```
    pub fn decode_line(&mut self, line: &str, params: &SystemParams) -> Result<Vec<UpdateRecord>> {
        let zone = self.config.default_zone;
        self.decode_line_for_zone(line, params, zone)
    }

    /// Decode one response line, tagging records with `zone`
    ///
    /// Lines that are not tuner responses produce no records.
    pub fn decode_line_for_zone(
        &mut self,
        line: &str,
        params: &SystemParams,
        zone: Zone,
    ) -> Result<Vec<UpdateRecord>> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix(FREQUENCY_COMMAND) {
            let mut chars = rest.chars();
            match chars.next() {
                Some('F') => {
                    self.correlator
                        .frequency_fm(chars.as_str(), params, zone, FREQUENCY_COMMAND)
                }
                Some('A') => {
                    self.correlator
                        .frequency_am(chars.as_str(), params, zone, FREQUENCY_COMMAND)
                }
                _ => Err(DecoderError::malformed(
                    FREQUENCY_COMMAND,
                    rest,
                    "unknown tuner band",
                )),
            }
        } else if let Some(rest) = line.strip_prefix(PRESET_COMMAND) {
            self.correlator.preset(rest, params, zone, PRESET_COMMAND)
        } else if let Some(rest) = line.strip_prefix(AM_STEP_COMMAND) {
            self.correlator
                .am_frequency_step(rest, params, Zone::All, AM_STEP_COMMAND)
        } else {
            log::trace!("Ignoring non-tuner response: {:?}", line);
            Ok(Vec::new())
        }
    }

    /// Decode a single payload for a known response code
    pub fn decode_response(
        &mut self,
        command: &str,
        raw: &str,
        params: &SystemParams,
        zone: Zone,
    ) -> Result<Vec<UpdateRecord>> {
        match command {
            FREQUENCY_COMMAND | PRESET_COMMAND | AM_STEP_COMMAND => {
                self.decode_line_for_zone(&format!("{}{}", command, raw), params, zone)
            }
            other => Err(DecoderError::UnknownCommand(other.to_string())),
        }
    }
}

impl Default for TunerDecoder {
    fn default() -> Self {
        Self::new()
    }
}
