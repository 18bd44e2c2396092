//! Tuner configuration
//!
//! The Si4703 does not report which band plan it is tuned against, so the
//! band, channel spacing and the timing of the power-up and seek/tune
//! protocols are all explicit configuration. Nothing here is auto-detected.
//!
//! # Example
//!
//! ```
//! use si4703::{Band, ChannelSpacing, TunerConfig};
//!
//! // European broadcast: 87.5-108 MHz, 100 kHz raster, 50 µs de-emphasis
//! let config = TunerConfig::europe();
//! assert_eq!(config.band, Band::UsEurope);
//! assert_eq!(config.spacing, ChannelSpacing::Khz100);
//! ```

use crate::Error;

/// Frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Band {
    /// 87.5–108 MHz (default)
    #[default]
    UsEurope = 0,
    /// 76–108 MHz
    JapanWide = 1,
    /// 76–90 MHz
    Japan = 2,
}

impl Band {
    /// Lower band edge in units of 10 kHz
    #[must_use]
    pub const fn bottom_10khz(self) -> u32 {
        match self {
            Self::UsEurope => 8750,
            Self::JapanWide | Self::Japan => 7600,
        }
    }

    /// Upper band edge in units of 10 kHz
    #[must_use]
    pub const fn top_10khz(self) -> u32 {
        match self {
            Self::UsEurope | Self::JapanWide => 10800,
            Self::Japan => 9000,
        }
    }

    /// `BAND` field value
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Decode a `BAND` field value (the reserved value 3 yields `None`)
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(Self::UsEurope),
            1 => Some(Self::JapanWide),
            2 => Some(Self::Japan),
            _ => None,
        }
    }
}

/// Channel spacing, i.e. the step between consecutive channel codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelSpacing {
    /// 200 kHz (USA, Australia; chip default)
    #[default]
    Khz200 = 0,
    /// 100 kHz (Europe, Japan)
    Khz100 = 1,
    /// 50 kHz
    Khz50 = 2,
}

impl ChannelSpacing {
    /// Step per channel code in units of 10 kHz
    #[must_use]
    pub const fn step_10khz(self) -> u32 {
        match self {
            Self::Khz200 => 20,
            Self::Khz100 => 10,
            Self::Khz50 => 5,
        }
    }

    /// `SPACE` field value
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Decode a `SPACE` field value (the reserved value 3 yields `None`)
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(Self::Khz200),
            1 => Some(Self::Khz100),
            2 => Some(Self::Khz50),
            _ => None,
        }
    }
}

/// FM de-emphasis time constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeEmphasis {
    /// 75 µs (USA)
    #[default]
    Us75,
    /// 50 µs (Europe, Australia, Japan)
    Us50,
}

/// What a seek does when it reaches the band edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SeekMode {
    /// Continue from the opposite band edge
    #[default]
    Wrap,
    /// Stop and report a band-limit failure
    Stop,
}

/// Whether a volume change also lifts the hard mute
///
/// On some chip revisions a volume write leaves the output muted unless
/// `DMUTE` is set alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VolumePolicy {
    /// Set `DMUTE` together with every volume change (default)
    #[default]
    Unmute,
    /// Only touch the `VOLUME` field
    Preserve,
}

/// Seek sensitivity thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeekThresholds {
    /// Minimum RSSI for a valid channel (`SEEKTH`, 0–255)
    pub rssi: u8,
    /// Minimum SNR (`SKSNR`, 0 = disabled, 1–15)
    pub snr: u8,
    /// FM impulse detection count (`SKCNT`, 0 = disabled, 1–15)
    pub impulse_count: u8,
}

impl Default for SeekThresholds {
    fn default() -> Self {
        Self {
            rssi: 0x19,
            snr: 0,
            impulse_count: 0,
        }
    }
}

impl SeekThresholds {
    /// Create validated thresholds
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `snr` or `impulse_count` exceed 15.
    pub const fn new<E>(rssi: u8, snr: u8, impulse_count: u8) -> Result<Self, Error<E>> {
        if snr > 15 || impulse_count > 15 {
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            rssi,
            snr,
            impulse_count,
        })
    }
}

/// Bounds on the seek/tune completion polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    /// Delay between two status reads
    pub interval_ms: u32,
    /// Overall deadline for each wait on `STC`
    pub timeout_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        // Tune settles in 60 ms; a full-band seek can take several seconds
        Self {
            interval_ms: 10,
            timeout_ms: 5_000,
        }
    }
}

impl PollConfig {
    /// Create a validated poll configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the interval is zero or longer
    /// than the timeout.
    pub const fn new<E>(interval_ms: u32, timeout_ms: u32) -> Result<Self, Error<E>> {
        if interval_ms == 0 || interval_ms > timeout_ms {
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            interval_ms,
            timeout_ms,
        })
    }

    /// Number of status reads before a wait gives up
    #[must_use]
    pub const fn max_polls(&self) -> u32 {
        if self.interval_ms == 0 {
            return 1;
        }
        let polls = self.timeout_ms.div_ceil(self.interval_ms);
        if polls == 0 { 1 } else { polls }
    }
}

/// Timing of the power-up sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerTiming {
    /// Hold time for each level of the reset pulse
    pub reset_hold_ms: u32,
    /// Wait after enabling the crystal oscillator
    pub oscillator_settle_ms: u32,
    /// Wait after setting `ENABLE`
    pub power_up_ms: u32,
}

impl Default for PowerTiming {
    fn default() -> Self {
        Self {
            reset_hold_ms: 1_000,
            oscillator_settle_ms: 500,
            power_up_ms: 110,
        }
    }
}

/// Complete tuner configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunerConfig {
    /// Band plan
    pub band: Band,
    /// Channel raster
    pub spacing: ChannelSpacing,
    /// De-emphasis
    pub de_emphasis: DeEmphasis,
    /// Band-edge behaviour of seeks
    pub seek_mode: SeekMode,
    /// Seek sensitivity
    pub seek_thresholds: SeekThresholds,
    /// Volume/mute interaction
    pub volume_policy: VolumePolicy,
    /// Volume set during power-up (0–15)
    pub initial_volume: u8,
    /// Completion polling bounds
    pub poll: PollConfig,
    /// Power-up timing
    pub timing: PowerTiming,
}

impl TunerConfig {
    /// United States: 200 kHz raster, 75 µs de-emphasis
    #[must_use]
    pub fn us() -> Self {
        Self {
            initial_volume: 1,
            ..Self::default()
        }
    }

    /// Europe: 100 kHz raster, 50 µs de-emphasis
    #[must_use]
    pub fn europe() -> Self {
        Self {
            spacing: ChannelSpacing::Khz100,
            de_emphasis: DeEmphasis::Us50,
            ..Self::us()
        }
    }

    /// Japan wide band: 100 kHz raster, 50 µs de-emphasis
    #[must_use]
    pub fn japan() -> Self {
        Self {
            band: Band::JapanWide,
            ..Self::europe()
        }
    }

    /// Check the configuration for out-of-range values
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the initial volume exceeds 15, a
    /// seek threshold exceeds its field, or the poll bounds are inconsistent.
    pub const fn validate<E>(&self) -> Result<(), Error<E>> {
        if self.initial_volume > crate::MAX_VOLUME
            || self.seek_thresholds.snr > 15
            || self.seek_thresholds.impulse_count > 15
            || self.poll.interval_ms == 0
            || self.poll.interval_ms > self.poll.timeout_ms
        {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }

    /// Convert a frequency in MHz to a channel code
    ///
    /// The frequency is rounded to the nearest channel of the configured
    /// raster: `code = (f_10kHz - bottom_10kHz) / step_10kHz`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrequency`] if the frequency is not finite or
    /// lies outside the configured band.
    pub fn channel_for<E>(&self, frequency_mhz: f32) -> Result<u16, Error<E>> {
        if !frequency_mhz.is_finite() {
            return Err(Error::InvalidFrequency);
        }
        #[allow(clippy::cast_possible_truncation)]
        let frequency = libm::roundf(frequency_mhz * 100.0) as i32;
        let bottom = self.band.bottom_10khz();
        let top = self.band.top_10khz();
        let frequency = u32::try_from(frequency).map_err(|_| Error::InvalidFrequency)?;
        if frequency < bottom || frequency > top {
            return Err(Error::InvalidFrequency);
        }
        let offset = frequency - bottom;
        let step = self.spacing.step_10khz();
        let mut channel = (offset + step / 2) / step;
        // Rounding up may step past the top edge of the band
        if bottom + channel * step > top {
            channel -= 1;
        }
        u16::try_from(channel).map_err(|_| Error::InvalidFrequency)
    }

    /// Convert a channel code to a frequency in MHz
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frequency_for(&self, channel: u16) -> f32 {
        let frequency =
            self.band.bottom_10khz() + u32::from(channel) * self.spacing.step_10khz();
        frequency as f32 / 100.0
    }
}
