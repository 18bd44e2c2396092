//! Readouts derived from a register snapshot
//!
//! Nothing in here touches the bus: every type is built from a
//! [`RegisterImage`] copy, usually obtained with
//! [`Si4703Driver::snapshot`](crate::Si4703Driver::snapshot).

use core::fmt;

use crate::config::{Band, ChannelSpacing};
use crate::registers::{Register, RegisterImage, fields};

/// Raw RDS blocks, available while `RDSR` is set
///
/// No decoding is done; group parsing is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RdsBlocks {
    /// Block A (PI code)
    pub a: u16,
    /// Block B (group type, flags)
    pub b: u16,
    /// Block C
    pub c: u16,
    /// Block D
    pub d: u16,
}

impl RdsBlocks {
    /// Extract the RDS blocks if the chip flagged a new group
    #[must_use]
    pub const fn from_image(image: &RegisterImage) -> Option<Self> {
        if !image.flag(fields::RDSR) {
            return None;
        }
        Some(Self {
            a: image.get(Register::RdsA),
            b: image.get(Register::RdsB),
            c: image.get(Register::RdsC),
            d: image.get(Register::RdsD),
        })
    }
}

/// Reception quality of the current channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Signal {
    /// Tuned channel code (`READCHAN`)
    pub channel: u16,
    /// Tuned frequency in MHz, if band and spacing fields are valid
    pub frequency_mhz: Option<f32>,
    /// Received signal strength in dBµV
    pub rssi: u8,
    /// Stereo pilot detected
    pub stereo: bool,
}

impl Signal {
    /// Build from a register snapshot
    #[must_use]
    pub fn from_image(image: &RegisterImage) -> Self {
        let channel = image.read_channel();
        Self {
            channel,
            frequency_mhz: channel_frequency(image, channel),
            rssi: image.rssi(),
            stereo: image.is_stereo(),
        }
    }
}

/// Frequency of `channel` using the band and spacing programmed in the image
fn channel_frequency(image: &RegisterImage, channel: u16) -> Option<f32> {
    let band = Band::from_bits(image.field(fields::BAND))?;
    let spacing = ChannelSpacing::from_bits(image.field(fields::SPACE))?;
    let frequency = band.bottom_10khz() + u32::from(channel) * spacing.step_10khz();
    #[allow(clippy::cast_precision_loss)]
    let frequency_mhz = frequency as f32 / 100.0;
    Some(frequency_mhz)
}

/// Human-readable dump of a register snapshot
///
/// ```ignore
/// let status = radio.status();
/// println!("{status}");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    image: RegisterImage,
}

impl Status {
    /// Wrap a register snapshot
    #[must_use]
    pub const fn new(image: RegisterImage) -> Self {
        Self { image }
    }

    /// The wrapped snapshot
    #[must_use]
    pub const fn image(&self) -> &RegisterImage {
        &self.image
    }

    /// Part number (`DEVICEID[15:12]`)
    #[must_use]
    pub const fn part_number(&self) -> u8 {
        (self.image.get(Register::DeviceId) >> 12) as u8
    }

    /// Manufacturer ID (`DEVICEID[11:0]`)
    #[must_use]
    pub const fn manufacturer(&self) -> u16 {
        self.image.get(Register::DeviceId) & 0x0FFF
    }

    /// Chip revision (`CHIPID[15:10]`)
    #[must_use]
    pub const fn revision(&self) -> u8 {
        (self.image.get(Register::ChipId) >> 10) as u8
    }

    /// Device code (`CHIPID[9:6]`)
    #[must_use]
    pub const fn device(&self) -> u8 {
        ((self.image.get(Register::ChipId) >> 6) & 0x0F) as u8
    }

    /// Firmware version (`CHIPID[5:0]`), zero while powered down
    #[must_use]
    pub const fn firmware(&self) -> u8 {
        (self.image.get(Register::ChipId) & 0x3F) as u8
    }
}

const fn part_name(part: u8) -> &'static str {
    match part {
        crate::PART_NUMBER_SI4702_03 => "Si4702/03",
        _ => "Unknown",
    }
}

const fn manufacturer_name(manufacturer: u16) -> &'static str {
    match manufacturer {
        crate::MANUFACTURER_ID => "Silicon Labs",
        _ => "Unknown",
    }
}

const fn revision_name(revision: u8) -> &'static str {
    match revision {
        0x04 => "Rev C",
        _ => "Unknown",
    }
}

const fn device_name(device: u8) -> &'static str {
    match device {
        0x0 => "Si4702 (off)",
        0x1 => "Si4702 (on)",
        0x8 => "Si4703 (off)",
        0x9 => "Si4703 (on)",
        _ => "Unknown",
    }
}

const fn on_off(flag: bool, on: &'static str, off: &'static str) -> &'static str {
    if flag { on } else { off }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str =
            "--------------------------------------------------------------------------------";
        let image = &self.image;

        writeln!(f, "{RULE}")?;
        writeln!(f, "Part Number: {}", part_name(self.part_number()))?;
        let manufacturer = self.manufacturer();
        writeln!(
            f,
            "Manufacturer: {} (0x{manufacturer:x})",
            manufacturer_name(manufacturer)
        )?;
        writeln!(f, "Chip Version: {}", revision_name(self.revision()))?;
        writeln!(f, "Device: {}", device_name(self.device()))?;
        match self.firmware() {
            0 => writeln!(f, "Firmware Version: Off")?,
            version => writeln!(f, "Firmware Version: {version}")?,
        }

        // POWERCFG bits are "disable" flags: 0 means the feature is active
        let mute = |field| on_off(image.flag(field), "Disabled", "Enabled");
        writeln!(f, "Soft Mute: {}", mute(fields::SMUTE))?;
        writeln!(f, "Mute: {}", mute(fields::DMUTE))?;
        writeln!(f, "Stereo/Mono: {}", on_off(image.flag(fields::MONO), "Mono", "Stereo"))?;
        writeln!(f, "RDS Mode: {}", on_off(image.flag(fields::RDSM), "Verbose", "Standard"))?;
        writeln!(f, "Seek Mode: {}", on_off(image.flag(fields::SKMODE), "Stop", "Wrap"))?;
        writeln!(f, "Seek Direction: {}", on_off(image.flag(fields::SEEKUP), "Up", "Down"))?;
        writeln!(f, "Seek: {}", on_off(image.seek_requested(), "Enabled", "Disabled"))?;
        writeln!(f, "Power-Up Disable: {}", on_off(image.flag(fields::DISABLE), "On", "Default"))?;
        writeln!(f, "Power-Up Enable: {}", on_off(image.flag(fields::ENABLE), "On", "Default"))?;
        writeln!(f, "Volume: {}", image.volume())?;

        writeln!(f, "Tune: {}", on_off(image.tune_requested(), "Enabled", "Disabled"))?;
        let channel = image.channel_select();
        match channel_frequency(image, channel) {
            Some(mhz) => writeln!(f, "Channel: {channel} ({mhz:.1} MHz)")?,
            None => writeln!(f, "Channel: {channel} (unknown band)")?,
        }

        let signal = Signal::from_image(image);
        writeln!(
            f,
            "RSSI: {} dBuV {}",
            signal.rssi,
            on_off(signal.stereo, "Stereo", "Mono")
        )?;
        writeln!(f, "{RULE}")
    }
}
