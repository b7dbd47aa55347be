//! AVR Tuner Decoder Library
//!
//! Decodes the ASCII tuner notifications an AV receiver emits (frequency,
//! preset, AM channel step) into normalized property-update records, and
//! decides which follow-up commands must be sent back to the receiver.
//!
//! # Architecture
//!
//! - [`TunerDecoder`] routes response lines (`FRF08750`, `PRA05`, `SUQ0`)
//! - [`TunerCorrelator`] pairs preset notifications with the frequency that
//!   follows them, clears presets that went stale, and requests AM step
//!   calibration while the step is unknown
//! - [`UpdateRecord`] is the output unit, carrying optional [`QueuedCommand`]s
//!
//! The library does NOT:
//! - Talk to the receiver or execute queued commands
//! - Apply records to device state (apart from [`SystemParams::apply`])
//! - Decode non-tuner responses
//!
//! Each receiver session owns its own decoder; nothing is shared between them.
//!
//! # Example Usage
//!
//! ```
//! use avr_tuner_decoder::{DecoderConfig, SystemParams, TunerDecoder, Zone};
//!
//! let mut decoder = TunerDecoder::with_config(DecoderConfig::new().with_zone(Zone::Main));
//! let mut params = SystemParams::new();
//!
//! for line in ["FRA00531", "SUQ0", "PRB03", "FRA00540"] {
//!     match decoder.decode_line(line, &params) {
//!         Ok(records) => {
//!             for record in &records {
//!                 params.apply(record);
//!                 for command in &record.queue_commands {
//!                     println!("queue: {}", command);
//!                 }
//!             }
//!         }
//!         Err(e) => eprintln!("Skipping notification: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod correlator;
pub mod decoder;
pub mod params;
pub mod response;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use correlator::TunerCorrelator;
pub use decoder::TunerDecoder;
pub use params::{SystemParams, PARAM_TUNER_AM_FREQ_STEP};
pub use response::ResponseBuilder;
pub use types::{
    DecoderError, PropertyValue, QueuedCommand, Result, TunerBand, UpdateRecord, Zone,
    AM_STEP_COMMAND, CALCULATE_AM_FREQUENCY_STEP, FREQUENCY_COMMAND, PRESET_COMMAND,
    QUERY_TUNER_FREQUENCY, SYSTEM_PARAMS_PROPERTY, TUNER_PROPERTY,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
