//! Seek and tune request handling
//!
//! Tune and seek share one completion protocol:
//!
//! 1. Set the request bit (`TUNE` or `SEEK`) and flush
//! 2. Poll until `STC` rises (the chip finished, successfully or not)
//! 3. Clear the request bit and flush
//! 4. Poll until `STC` falls again
//!
//! [`TuneState`] tracks where the driver is in that sequence. The register
//! staging for each step lives here; the polling loop is in
//! [`Si4703Driver`](crate::Si4703Driver).

use crate::config::SeekMode;
use crate::registers::{BitField, RegisterImage, fields};

/// Position in the seek/tune completion protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TuneState {
    /// No request in flight
    #[default]
    Idle,
    /// Request bit staged, not yet flushed
    Requested,
    /// Request flushed, waiting for `STC` to rise
    AwaitingComplete,
    /// `STC` seen, clearing the request bit
    ClearingRequest,
    /// Request bit cleared, waiting for `STC` to fall
    AwaitingClear,
}

/// Seek direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SeekDirection {
    /// Towards higher frequencies
    Up,
    /// Towards lower frequencies
    Down,
}

/// Result of a completed seek
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeekOutcome {
    /// A valid station was found
    pub tuned: bool,
    /// The seek failed or stopped at the band edge (`SFBL`)
    pub band_limit_hit: bool,
    /// Channel code the chip ended on
    pub channel: u16,
    /// Frequency of `channel` in MHz
    pub frequency_mhz: f32,
}

/// A pending tune or seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request {
    Tune { channel: u16 },
    Seek { direction: SeekDirection, mode: SeekMode },
}

impl Request {
    /// Bit that starts the operation and must be cleared afterwards
    pub(crate) const fn request_bit(self) -> BitField {
        match self {
            Self::Tune { .. } => fields::TUNE,
            Self::Seek { .. } => fields::SEEK,
        }
    }

    /// Stage the request
    pub(crate) const fn stage(self, image: &mut RegisterImage) {
        match self {
            Self::Tune { channel } => {
                image.set_field(fields::CHAN, channel);
            }
            Self::Seek { direction, mode } => {
                image.set_flag(fields::SEEKUP, matches!(direction, SeekDirection::Up));
                image.set_flag(fields::SKMODE, matches!(mode, SeekMode::Stop));
            }
        }
        image.set_flag(self.request_bit(), true);
    }

    /// Stage clearing of the request bit
    pub(crate) const fn stage_clear(self, image: &mut RegisterImage) {
        image.set_flag(self.request_bit(), false);
    }
}
