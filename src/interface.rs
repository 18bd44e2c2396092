//! Bus interface for the Si4703
//!
//! The chip has no register pointer: a read always streams the register file
//! starting at `STATUSRSSI` and a write always starts at `POWERCFG`. The
//! transport therefore only needs to move whole blocks, which is what the
//! [`RegisterBus`] trait (and [`AsyncRegisterBus`] with the `async` feature)
//! describes.

use crate::I2C_ADDRESS;

/// Block transport to the register file
pub trait RegisterBus {
    /// Transport error
    type Error;

    /// Fill `read_data` with the register stream (starting at 0x0A)
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transfer fails.
    fn read_block(&mut self, read_data: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `write_data` to the register file (starting at 0x02)
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transfer fails.
    fn write_block(&mut self, write_data: &[u8]) -> Result<(), Self::Error>;
}

/// Async block transport to the register file
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncRegisterBus {
    /// Transport error
    type Error;

    /// Fill `read_data` with the register stream (starting at 0x0A)
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transfer fails.
    async fn read_block(&mut self, read_data: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `write_data` to the register file (starting at 0x02)
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transfer fails.
    async fn write_block(&mut self, write_data: &[u8]) -> Result<(), Self::Error>;
}

/// I2C interface for the Si4703
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface at the fixed chip address (0x10)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let radio = Si4703Driver::open(interface, reset, &mut delay, TunerConfig::us())?;
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS,
        }
    }

    /// Create a new I2C interface with a custom device address
    ///
    /// Useful behind address translators; the Si4703 itself always answers
    /// at 0x10.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address used for transfers
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterBus for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;

    fn read_block(&mut self, read_data: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(self.address, read_data)
    }

    fn write_block(&mut self, write_data: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, write_data)
    }
}

#[cfg(feature = "async")]
impl<I2C, E> AsyncRegisterBus for I2cInterface<I2C>
where
    I2C: embedded_hal_async::i2c::I2c<Error = E>,
{
    type Error = E;

    async fn read_block(&mut self, read_data: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(self.address, read_data).await
    }

    async fn write_block(&mut self, write_data: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, write_data).await
    }
}
