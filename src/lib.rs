#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod device;
pub mod interface;
pub mod power;
pub mod registers;
pub mod status;
pub mod tuning;

// Re-export main types
pub use config::{
    Band, ChannelSpacing, DeEmphasis, PollConfig, PowerTiming, SeekMode, SeekThresholds,
    TunerConfig, VolumePolicy,
};
pub use device::Si4703Driver;
#[cfg(feature = "async")]
pub use interface::AsyncRegisterBus;
pub use interface::{I2cInterface, RegisterBus};
pub use power::PowerState;
pub use registers::{BitField, Register, RegisterImage};
pub use status::{RdsBlocks, Signal, Status};
pub use tuning::{SeekDirection, SeekOutcome, TuneState};

/// Si4702/Si4703 I2C address (fixed by the chip)
pub const I2C_ADDRESS: u8 = 0x10;

/// Highest volume level
pub const MAX_VOLUME: u8 = 15;

/// Part number reported in `DEVICEID[15:12]`
pub const PART_NUMBER_SI4702_03: u8 = 0x01;

/// Manufacturer ID reported in `DEVICEID[11:0]`
pub const MANUFACTURER_ID: u16 = 0x242;

/// Driver errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// The reset line could not be driven
    ResetPin,
    /// `STC` did not reach the expected level before the poll deadline
    Timeout,
    /// A seek or tune was cancelled by the caller
    Cancelled,
    /// Frequency is not finite or outside the configured band
    InvalidFrequency,
    /// Invalid configuration parameter
    InvalidConfig,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
