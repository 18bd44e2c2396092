//! Power sequencing
//!
//! The Si4703 powers up in three stages:
//! - **Reset**: the reset line is pulsed low with SDIO held low, which selects
//!   the 2-wire bus mode
//! - **Oscillator**: `XOSCEN` is set and the crystal needs ~500 ms to settle
//! - **Enable**: `ENABLE` is set together with the feature configuration,
//!   followed by a ~110 ms power-up wait
//!
//! Skipping either wait leaves the chip unresponsive or misconfigured. The
//! functions here only stage register changes; bus traffic and waits are done
//! by [`Si4703Driver`](crate::Si4703Driver).

use crate::config::{DeEmphasis, TunerConfig};
use crate::registers::{OSCILLATOR_ENABLE, Register, RegisterImage, fields};

/// Power state of the chip as seen by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Not powered up, or powered down by [`Si4703Driver::power_down`](crate::Si4703Driver::power_down)
    #[default]
    Down,
    /// Oscillator running, `ENABLE` not yet set
    OscillatorRunning,
    /// Fully powered up
    Up,
}

impl PowerState {
    /// Derive the power state from a register snapshot
    #[must_use]
    pub const fn from_image(image: &RegisterImage) -> Self {
        let disabled = image.flag(fields::DISABLE);
        if image.flag(fields::ENABLE) && !disabled {
            Self::Up
        } else if image.flag(fields::XOSCEN) && !disabled {
            Self::OscillatorRunning
        } else {
            Self::Down
        }
    }
}

/// Stage the oscillator enable pattern
pub(crate) const fn stage_oscillator(image: &mut RegisterImage) {
    image.set(Register::Test1, OSCILLATOR_ENABLE);
}

/// Stage `ENABLE` and the configured features
pub(crate) fn stage_enable(image: &mut RegisterImage, config: &TunerConfig) {
    image.set_flag(fields::DMUTE, true);
    image.set_flag(fields::DISABLE, false);
    image.set_flag(fields::ENABLE, true);

    image.set_flag(fields::RDS, true);
    image.set_flag(fields::DE, config.de_emphasis == DeEmphasis::Us50);

    image.set_field(fields::BAND, config.band.bits());
    image.set_field(fields::SPACE, config.spacing.bits());
    image.set_field(fields::SEEKTH, u16::from(config.seek_thresholds.rssi));
    image.set_field(fields::SKSNR, u16::from(config.seek_thresholds.snr));
    image.set_field(fields::SKCNT, u16::from(config.seek_thresholds.impulse_count));

    image.set_field(fields::VOLUME, 0);
    image.set_field(fields::VOLUME, u16::from(config.initial_volume.min(crate::MAX_VOLUME)));
}

/// Stage power-down
///
/// `DISABLE` stays set until the next [`stage_enable`], which tells a
/// powered-down chip apart from one whose oscillator is still settling.
pub(crate) const fn stage_disable(image: &mut RegisterImage) {
    image.set_flag(fields::ENABLE, false);
    image.set_flag(fields::DISABLE, true);
}
