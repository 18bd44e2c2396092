//! Register definitions for the Si4702/Si4703
//!
//! The chip exposes sixteen 16-bit registers. The driver never addresses them
//! individually: every read returns the whole file and every write replaces
//! the writable window, so the driver keeps a [`RegisterImage`] shadow and
//! synchronizes it in bulk.
//!
//! ## Bus Layout
//! - **Reads** always start at `STATUSRSSI` (0x0A), run to 0x0F and then wrap
//!   around to 0x00..=0x09, 32 bytes in total.
//! - **Writes** always start at `POWERCFG` (0x02) and cover 0x02..=0x07,
//!   12 bytes in total.
//!
//! All words are big-endian on the wire.

/// Number of registers in the register file
pub const REGISTER_COUNT: usize = 16;

/// Register the chip starts from on every block read
pub const READ_START: usize = 0x0A;

/// Length in bytes of a full register block read
pub const READ_BLOCK_LEN: usize = REGISTER_COUNT * 2;

/// First writable register
pub const WRITE_START: usize = 0x02;

/// Number of writable registers (`POWERCFG` through `TEST1`)
pub const WRITE_WINDOW_WORDS: usize = 6;

/// Length in bytes of the writable window
pub const WRITE_WINDOW_LEN: usize = WRITE_WINDOW_WORDS * 2;

/// Value written to `TEST1` to start the crystal oscillator (XOSCEN + reserved bit 8)
pub const OSCILLATOR_ENABLE: u16 = 0x8100;

/// Named registers, in register-file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// DEVICEID - part number and manufacturer (0x00)
    DeviceId = 0x00,
    /// CHIPID - revision, device and firmware (0x01)
    ChipId = 0x01,
    /// POWERCFG - mute, seek and power control (0x02)
    PowerCfg = 0x02,
    /// CHANNEL - tune request and channel select (0x03)
    Channel = 0x03,
    /// SYSCONFIG1 - RDS, de-emphasis, GPIO and interrupts (0x04)
    SysConfig1 = 0x04,
    /// SYSCONFIG2 - seek threshold, band, spacing and volume (0x05)
    SysConfig2 = 0x05,
    /// SYSCONFIG3 - soft mute and seek quality settings (0x06)
    SysConfig3 = 0x06,
    /// TEST1 - crystal oscillator enable (0x07)
    Test1 = 0x07,
    /// TEST2 - reserved (0x08)
    Test2 = 0x08,
    /// BOOTCONFIG - reserved (0x09)
    BootConfig = 0x09,
    /// STATUSRSSI - seek/tune status and signal strength (0x0A)
    StatusRssi = 0x0A,
    /// READCHAN - currently tuned channel (0x0B)
    ReadChan = 0x0B,
    /// RDSA - RDS block A (0x0C)
    RdsA = 0x0C,
    /// RDSB - RDS block B (0x0D)
    RdsB = 0x0D,
    /// RDSC - RDS block C (0x0E)
    RdsC = 0x0E,
    /// RDSD - RDS block D (0x0F)
    RdsD = 0x0F,
}

impl Register {
    /// All registers in register-file order
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::DeviceId,
        Self::ChipId,
        Self::PowerCfg,
        Self::Channel,
        Self::SysConfig1,
        Self::SysConfig2,
        Self::SysConfig3,
        Self::Test1,
        Self::Test2,
        Self::BootConfig,
        Self::StatusRssi,
        Self::ReadChan,
        Self::RdsA,
        Self::RdsB,
        Self::RdsC,
        Self::RdsD,
    ];

    /// Position of the register in the register file
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the register lies inside the writable window
    #[must_use]
    pub const fn is_writable(self) -> bool {
        let index = self.index();
        index >= WRITE_START && index < WRITE_START + WRITE_WINDOW_WORDS
    }
}

/// A `width`-bit slice of a register starting at bit `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    /// Register holding the field
    pub register: Register,
    /// Least significant bit of the field
    pub position: u8,
    /// Width of the field in bits (1..=16)
    pub width: u8,
}

impl BitField {
    /// Describe a field
    #[must_use]
    pub const fn new(register: Register, position: u8, width: u8) -> Self {
        Self {
            register,
            position,
            width,
        }
    }

    /// Field mask, not shifted
    #[must_use]
    pub const fn mask(self) -> u16 {
        if self.width >= 16 {
            u16::MAX
        } else {
            (1u16 << self.width) - 1
        }
    }

    /// Field mask, shifted into place
    #[must_use]
    pub const fn shifted_mask(self) -> u16 {
        self.mask() << self.position
    }

    /// Extract the field from a register word
    #[must_use]
    pub const fn get(self, word: u16) -> u16 {
        (word >> self.position) & self.mask()
    }

    /// Return `word` with the field replaced by `value`
    ///
    /// Bits of `value` beyond the field width are discarded.
    #[must_use]
    pub const fn set(self, word: u16, value: u16) -> u16 {
        (word & !self.shifted_mask()) | ((value & self.mask()) << self.position)
    }
}

/// Bit fields used by the driver
pub mod fields {
    use super::{BitField, Register};

    // POWERCFG
    /// Power-up enable
    pub const ENABLE: BitField = BitField::new(Register::PowerCfg, 0, 1);
    /// Power-up disable
    pub const DISABLE: BitField = BitField::new(Register::PowerCfg, 6, 1);
    /// Seek request
    pub const SEEK: BitField = BitField::new(Register::PowerCfg, 8, 1);
    /// Seek direction (1 = up)
    pub const SEEKUP: BitField = BitField::new(Register::PowerCfg, 9, 1);
    /// Seek mode (1 = stop at band limit, 0 = wrap)
    pub const SKMODE: BitField = BitField::new(Register::PowerCfg, 10, 1);
    /// RDS mode (1 = verbose)
    pub const RDSM: BitField = BitField::new(Register::PowerCfg, 11, 1);
    /// Force mono
    pub const MONO: BitField = BitField::new(Register::PowerCfg, 13, 1);
    /// Mute disable
    pub const DMUTE: BitField = BitField::new(Register::PowerCfg, 14, 1);
    /// Soft mute disable
    pub const SMUTE: BitField = BitField::new(Register::PowerCfg, 15, 1);

    // CHANNEL
    /// Channel select
    pub const CHAN: BitField = BitField::new(Register::Channel, 0, 10);
    /// Tune request
    pub const TUNE: BitField = BitField::new(Register::Channel, 15, 1);

    // SYSCONFIG1
    /// De-emphasis (1 = 50 µs)
    pub const DE: BitField = BitField::new(Register::SysConfig1, 11, 1);
    /// RDS enable
    pub const RDS: BitField = BitField::new(Register::SysConfig1, 12, 1);

    // SYSCONFIG2
    /// Volume (0 = mute, 15 = max)
    pub const VOLUME: BitField = BitField::new(Register::SysConfig2, 0, 4);
    /// Channel spacing
    pub const SPACE: BitField = BitField::new(Register::SysConfig2, 4, 2);
    /// Band select
    pub const BAND: BitField = BitField::new(Register::SysConfig2, 6, 2);
    /// RSSI seek threshold
    pub const SEEKTH: BitField = BitField::new(Register::SysConfig2, 8, 8);

    // SYSCONFIG3
    /// Seek FM impulse detection threshold
    pub const SKCNT: BitField = BitField::new(Register::SysConfig3, 0, 4);
    /// Seek SNR threshold
    pub const SKSNR: BitField = BitField::new(Register::SysConfig3, 4, 4);

    // TEST1
    /// Crystal oscillator enable
    pub const XOSCEN: BitField = BitField::new(Register::Test1, 15, 1);

    // STATUSRSSI
    /// Received signal strength (dBµV)
    pub const RSSI: BitField = BitField::new(Register::StatusRssi, 0, 8);
    /// Stereo indicator
    pub const ST: BitField = BitField::new(Register::StatusRssi, 8, 1);
    /// Seek fail / band limit
    pub const SFBL: BitField = BitField::new(Register::StatusRssi, 13, 1);
    /// Seek/tune complete
    pub const STC: BitField = BitField::new(Register::StatusRssi, 14, 1);
    /// RDS ready
    pub const RDSR: BitField = BitField::new(Register::StatusRssi, 15, 1);

    // READCHAN
    /// Currently tuned channel
    pub const READCHAN: BitField = BitField::new(Register::ReadChan, 0, 10);
}

/// In-memory shadow of the chip's register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterImage {
    words: [u16; REGISTER_COUNT],
}

impl RegisterImage {
    /// An all-zero image
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; REGISTER_COUNT],
        }
    }

    /// Build an image from sixteen words in register-file order
    #[must_use]
    pub const fn from_words(words: [u16; REGISTER_COUNT]) -> Self {
        Self { words }
    }

    /// Decode a block read
    ///
    /// The chip emits registers starting at 0x0A and wraps back to 0x00, so
    /// word `k` of the stream lands in register `(0x0A + k) % 16`.
    #[must_use]
    pub fn from_read_block(block: &[u8; READ_BLOCK_LEN]) -> Self {
        let mut words = [0u16; REGISTER_COUNT];
        for (k, pair) in block.chunks_exact(2).enumerate() {
            words[(READ_START + k) % REGISTER_COUNT] = u16::from_be_bytes([pair[0], pair[1]]);
        }
        Self { words }
    }

    /// Encode the writable window (`POWERCFG`..=`TEST1`) in register order
    #[must_use]
    pub fn write_window(&self) -> [u8; WRITE_WINDOW_LEN] {
        let mut buffer = [0u8; WRITE_WINDOW_LEN];
        let window = &self.words[WRITE_START..WRITE_START + WRITE_WINDOW_WORDS];
        for (chunk, word) in buffer.chunks_exact_mut(2).zip(window) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        buffer
    }

    /// All sixteen words in register-file order
    #[must_use]
    pub const fn words(&self) -> &[u16; REGISTER_COUNT] {
        &self.words
    }

    /// Read a register
    #[must_use]
    pub const fn get(&self, register: Register) -> u16 {
        self.words[register.index()]
    }

    /// Overwrite a register
    pub const fn set(&mut self, register: Register, value: u16) {
        self.words[register.index()] = value;
    }

    /// Read a field
    #[must_use]
    pub const fn field(&self, field: BitField) -> u16 {
        field.get(self.get(field.register))
    }

    /// Read a single-bit field as a flag
    #[must_use]
    pub const fn flag(&self, field: BitField) -> bool {
        self.field(field) != 0
    }

    /// Write a field, leaving the rest of the register untouched
    pub const fn set_field(&mut self, field: BitField, value: u16) {
        let word = self.get(field.register);
        self.set(field.register, field.set(word, value));
    }

    /// Write a single-bit field from a flag
    pub const fn set_flag(&mut self, field: BitField, enabled: bool) {
        self.set_field(field, enabled as u16);
    }

    /// Current volume field
    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.field(fields::VOLUME) as u8
    }

    /// Whether a tune request is pending
    #[must_use]
    pub const fn tune_requested(&self) -> bool {
        self.flag(fields::TUNE)
    }

    /// Whether a seek request is pending
    #[must_use]
    pub const fn seek_requested(&self) -> bool {
        self.flag(fields::SEEK)
    }

    /// Seek/tune complete flag
    #[must_use]
    pub const fn seek_tune_complete(&self) -> bool {
        self.flag(fields::STC)
    }

    /// Seek fail / band limit flag
    #[must_use]
    pub const fn band_limit(&self) -> bool {
        self.flag(fields::SFBL)
    }

    /// Channel code written to `CHANNEL`
    #[must_use]
    pub const fn channel_select(&self) -> u16 {
        self.field(fields::CHAN)
    }

    /// Channel code the chip reports as tuned
    #[must_use]
    pub const fn read_channel(&self) -> u16 {
        self.field(fields::READCHAN)
    }

    /// Received signal strength in dBµV
    #[must_use]
    pub const fn rssi(&self) -> u8 {
        self.field(fields::RSSI) as u8
    }

    /// Whether the chip is receiving in stereo
    #[must_use]
    pub const fn is_stereo(&self) -> bool {
        self.flag(fields::ST)
    }
}
