//! High-level driver API for the Si4703
//!
//! [`Si4703Driver`] is the session object: it owns the bus interface, the
//! reset line and the register shadow for as long as the radio is open.
//!
//! Every operation follows the same pattern:
//! 1. Read the whole register file into the shadow
//! 2. Modify a staged copy of the shadow
//! 3. Write the staged writable window back
//! 4. Read the register file again
//!
//! If the bus fails at any step the shadow keeps its last known-good
//! contents: it is only ever replaced by a successful read. There are no
//! automatic retries.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::OutputPin;

use crate::config::TunerConfig;
use crate::power::{self, PowerState};
use crate::registers::{READ_BLOCK_LEN, RegisterImage, fields};
use crate::status::{RdsBlocks, Signal, Status};
use crate::tuning::{Request, SeekDirection, SeekOutcome, TuneState};
use crate::{Error, MAX_VOLUME};

#[cfg(not(feature = "async"))]
use crate::interface::RegisterBus;

#[cfg(feature = "async")]
use crate::interface::AsyncRegisterBus;

/// Main driver for the Si4703
pub struct Si4703Driver<I, RST> {
    interface: I,
    reset: RST,
    image: RegisterImage,
    config: TunerConfig,
    state: TuneState,
}

impl<I, RST> Si4703Driver<I, RST> {
    const fn unopened(interface: I, reset: RST, config: TunerConfig) -> Self {
        Self {
            interface,
            reset,
            image: RegisterImage::new(),
            config,
            state: TuneState::Idle,
        }
    }

    /// Copy of the register shadow as of the last successful read
    #[must_use]
    pub const fn snapshot(&self) -> RegisterImage {
        self.image
    }

    /// Human-readable status of the last snapshot
    #[must_use]
    pub const fn status(&self) -> Status {
        Status::new(self.image)
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Position in the seek/tune protocol
    ///
    /// Always [`TuneState::Idle`] between calls.
    #[must_use]
    pub const fn tune_state(&self) -> TuneState {
        self.state
    }

    /// Power state derived from the last snapshot
    #[must_use]
    pub const fn power_state(&self) -> PowerState {
        PowerState::from_image(&self.image)
    }

    /// Frequency the last snapshot reports as tuned, in MHz
    #[must_use]
    pub fn frequency_mhz(&self) -> f32 {
        self.config.frequency_for(self.image.read_channel())
    }

    /// Give back the interface and reset line without powering down
    pub fn release(self) -> (I, RST) {
        (self.interface, self.reset)
    }

    fn seek_outcome(&self, band_limit_hit: bool) -> SeekOutcome {
        let channel = self.image.read_channel();
        SeekOutcome {
            tuned: !band_limit_hit,
            band_limit_hit,
            channel,
            frequency_mhz: self.config.frequency_for(channel),
        }
    }
}

/// Check a cancellation flag
fn cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Acquire))
}

#[cfg(not(feature = "async"))]
impl<I, RST> Si4703Driver<I, RST>
where
    I: RegisterBus,
    RST: OutputPin,
{
    /// Open a session: reset the chip and run the full power-up sequence
    ///
    /// This blocks for a little over 2.6 s with the default
    /// [`PowerTiming`](crate::PowerTiming).
    ///
    /// # Arguments
    ///
    /// * `interface` - Bus transport, usually an [`I2cInterface`](crate::I2cInterface)
    /// * `reset` - Output pin wired to the chip's RST line
    /// * `delay` - Delay provider implementing `embedded_hal::delay::DelayNs`
    /// * `config` - Band plan, polling bounds and power-up timing
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the reset line
    /// cannot be driven or any bus transfer fails. No session is returned
    /// in that case.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let mut radio = Si4703Driver::open(interface, rst, &mut delay, TunerConfig::europe())?;
    /// radio.tune(&mut delay, 101.1)?;
    /// radio.set_volume(8)?;
    /// ```
    pub fn open<D>(
        interface: I,
        reset: RST,
        delay: &mut D,
        config: TunerConfig,
    ) -> Result<Self, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        config.validate::<I::Error>()?;
        let mut driver = Self::unopened(interface, reset, config);
        driver.power_up(delay)?;
        Ok(driver)
    }

    /// Power down the chip and give back the interface and reset line
    ///
    /// # Errors
    ///
    /// Returns an error if the power-down transfer fails. The interface and
    /// reset line are dropped in that case.
    pub fn close(mut self) -> Result<(I, RST), Error<I::Error>> {
        self.power_down()?;
        Ok(self.release())
    }

    /// Read the full register file into the shadow
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails. The shadow
    /// is left unchanged.
    pub fn read_registers(&mut self) -> Result<(), Error<I::Error>> {
        let mut block = [0u8; READ_BLOCK_LEN];
        self.interface.read_block(&mut block)?;
        self.image = RegisterImage::from_read_block(&block);
        Ok(())
    }

    /// Write the shadow's writable window and read the register file back
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn update_registers(&mut self) -> Result<(), Error<I::Error>> {
        self.commit(self.image)
    }

    /// Read, apply `f` to a staged copy of the shadow, flush it and read back
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails. The shadow
    /// is left unchanged unless the read-back succeeds.
    pub fn modify<F>(&mut self, f: F) -> Result<(), Error<I::Error>>
    where
        F: FnOnce(&mut RegisterImage),
    {
        self.read_registers()?;
        let mut staged = self.image;
        f(&mut staged);
        self.commit(staged)
    }

    fn commit(&mut self, staged: RegisterImage) -> Result<(), Error<I::Error>> {
        self.interface.write_block(&staged.write_window())?;
        // The shadow only changes once the read-back confirms the write
        self.read_registers()
    }

    fn pulse_reset<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let hold_ms = self.config.timing.reset_hold_ms;
        self.reset.set_low().map_err(|_| Error::ResetPin)?;
        delay.delay_ms(hold_ms);
        self.reset.set_high().map_err(|_| Error::ResetPin)?;
        delay.delay_ms(hold_ms);
        Ok(())
    }

    /// Run the power-up sequence
    ///
    /// Called by [`open`](Self::open); call it again to wake the chip after
    /// [`power_down`](Self::power_down).
    ///
    /// # Errors
    ///
    /// Returns an error if the reset line cannot be driven or communication
    /// with the device fails.
    pub fn power_up<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let timing = self.config.timing;

        self.pulse_reset(delay)?;

        self.read_registers()?;
        let mut staged = self.image;
        power::stage_oscillator(&mut staged);
        self.commit(staged)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Oscillator enabled, settling for {} ms", timing.oscillator_settle_ms);
        delay.delay_ms(timing.oscillator_settle_ms);

        let config = self.config;
        self.modify(|image| power::stage_enable(image, &config))?;
        delay.delay_ms(timing.power_up_ms);

        #[cfg(feature = "defmt")]
        defmt::info!("Si4703 powered up (firmware {})", self.status().firmware());

        Ok(())
    }

    /// Clear `ENABLE` and set `DISABLE`
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn power_down(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(power::stage_disable)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Si4703 powered down");

        Ok(())
    }

    /// Set the volume, clamping to 0..=15
    ///
    /// With [`VolumePolicy::Unmute`](crate::VolumePolicy::Unmute) the hard
    /// mute is lifted as well.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_volume(&mut self, level: u8) -> Result<(), Error<I::Error>> {
        let level = level.min(MAX_VOLUME);
        let policy = self.config.volume_policy;
        self.modify(|image| {
            image.set_field(fields::VOLUME, u16::from(level));
            if policy == crate::VolumePolicy::Unmute {
                image.set_flag(fields::DMUTE, true);
            }
        })
    }

    /// Mute the audio output (clears `DMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn mute_enable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::DMUTE, false))
    }

    /// Unmute the audio output (sets `DMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn mute_disable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::DMUTE, true))
    }

    /// Enable soft mute on weak signals (clears `SMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn soft_mute_enable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::SMUTE, false))
    }

    /// Disable soft mute (sets `SMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn soft_mute_disable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::SMUTE, true))
    }

    /// Force mono reception
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_mono(&mut self, mono: bool) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::MONO, mono))
    }

    /// Tune to `frequency_mhz` and wait until the chip has settled
    ///
    /// The frequency is rounded to the nearest channel of the configured
    /// raster. Returns the channel code that was tuned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFrequency`] before any bus traffic if the frequency
    ///   is outside the configured band
    /// - [`Error::Timeout`] if `STC` does not rise or fall in time
    /// - [`Error::Bus`] if communication with the device fails
    pub fn tune<D>(&mut self, delay: &mut D, frequency_mhz: f32) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.tune_inner(delay, frequency_mhz, None)
    }

    /// [`tune`](Self::tune) that gives up with [`Error::Cancelled`] once
    /// `cancel` is set
    ///
    /// # Errors
    ///
    /// As [`tune`](Self::tune), plus [`Error::Cancelled`].
    pub fn tune_cancellable<D>(
        &mut self,
        delay: &mut D,
        frequency_mhz: f32,
        cancel: &AtomicBool,
    ) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.tune_inner(delay, frequency_mhz, Some(cancel))
    }

    fn tune_inner<D>(
        &mut self,
        delay: &mut D,
        frequency_mhz: f32,
        cancel: Option<&AtomicBool>,
    ) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let channel = self.config.channel_for::<I::Error>(frequency_mhz)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Tuning to {} MHz (channel {})", frequency_mhz, channel);

        self.run_request(delay, Request::Tune { channel }, cancel)?;
        Ok(channel)
    }

    /// Seek to the next station in `direction`
    ///
    /// Check [`SeekOutcome::band_limit_hit`] to tell a found station from a
    /// failed seek.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if `STC` does not rise or fall in time
    /// - [`Error::Bus`] if communication with the device fails
    pub fn seek<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.seek_inner(delay, direction, None)
    }

    /// [`seek`](Self::seek) that gives up with [`Error::Cancelled`] once
    /// `cancel` is set
    ///
    /// # Errors
    ///
    /// As [`seek`](Self::seek), plus [`Error::Cancelled`].
    pub fn seek_cancellable<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
        cancel: &AtomicBool,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.seek_inner(delay, direction, Some(cancel))
    }

    fn seek_inner<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
        cancel: Option<&AtomicBool>,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let request = Request::Seek {
            direction,
            mode: self.config.seek_mode,
        };
        let completed = self.run_request(delay, request, cancel)?;
        let outcome = self.seek_outcome(completed.band_limit());

        #[cfg(feature = "defmt")]
        defmt::debug!("Seek finished: {}", outcome);

        Ok(outcome)
    }

    /// Drive a request through the completion protocol
    ///
    /// Returns the snapshot taken when `STC` rose, which is the only point
    /// where `SFBL` is valid.
    fn run_request<D>(
        &mut self,
        delay: &mut D,
        request: Request,
        cancel: Option<&AtomicBool>,
    ) -> Result<RegisterImage, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let result = self.drive_request(delay, request, cancel);
        self.state = TuneState::Idle;
        result
    }

    fn drive_request<D>(
        &mut self,
        delay: &mut D,
        request: Request,
        cancel: Option<&AtomicBool>,
    ) -> Result<RegisterImage, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.state = TuneState::Requested;
        self.modify(|image| request.stage(image))?;

        self.state = TuneState::AwaitingComplete;
        if let Err(error) = self.wait_for_stc(delay, true, cancel) {
            if matches!(error, Error::Timeout | Error::Cancelled) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Seek/tune aborted, clearing request bit");
                self.modify(|image| request.stage_clear(image))?;
            }
            return Err(error);
        }
        let completed = self.image;

        self.state = TuneState::ClearingRequest;
        self.modify(|image| request.stage_clear(image))?;

        self.state = TuneState::AwaitingClear;
        self.wait_for_stc(delay, false, cancel)?;

        Ok(completed)
    }

    /// Poll until `STC` equals `complete`
    fn wait_for_stc<D>(
        &mut self,
        delay: &mut D,
        complete: bool,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let poll = self.config.poll;
        for _ in 0..poll.max_polls() {
            self.read_registers()?;
            if self.image.seek_tune_complete() == complete {
                #[cfg(feature = "defmt")]
                defmt::trace!("STC = {}", complete);
                return Ok(());
            }
            if cancelled(cancel) {
                return Err(Error::Cancelled);
            }
            delay.delay_ms(poll.interval_ms);
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Timed out waiting for STC = {}", complete);

        Err(Error::Timeout)
    }

    /// Read the current channel, signal strength and stereo indicator
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn signal(&mut self) -> Result<Signal, Error<I::Error>> {
        self.read_registers()?;
        Ok(Signal::from_image(&self.image))
    }

    /// Read the RDS blocks if the chip has a new group ready
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_rds(&mut self) -> Result<Option<RdsBlocks>, Error<I::Error>> {
        self.read_registers()?;
        Ok(RdsBlocks::from_image(&self.image))
    }
}

#[cfg(feature = "async")]
impl<I, RST> Si4703Driver<I, RST>
where
    I: AsyncRegisterBus,
    RST: OutputPin,
{
    /// Open a session: reset the chip and run the full power-up sequence
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the reset line
    /// cannot be driven or any bus transfer fails. No session is returned
    /// in that case.
    pub async fn open<D>(
        interface: I,
        reset: RST,
        delay: &mut D,
        config: TunerConfig,
    ) -> Result<Self, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        config.validate::<I::Error>()?;
        let mut driver = Self::unopened(interface, reset, config);
        driver.power_up(delay).await?;
        Ok(driver)
    }

    /// Power down the chip and give back the interface and reset line
    ///
    /// # Errors
    ///
    /// Returns an error if the power-down transfer fails.
    pub async fn close(mut self) -> Result<(I, RST), Error<I::Error>> {
        self.power_down().await?;
        Ok(self.release())
    }

    /// Read the full register file into the shadow
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails. The shadow
    /// is left unchanged.
    pub async fn read_registers(&mut self) -> Result<(), Error<I::Error>> {
        let mut block = [0u8; READ_BLOCK_LEN];
        self.interface.read_block(&mut block).await?;
        self.image = RegisterImage::from_read_block(&block);
        Ok(())
    }

    /// Write the shadow's writable window and read the register file back
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn update_registers(&mut self) -> Result<(), Error<I::Error>> {
        self.commit(self.image).await
    }

    /// Read, apply `f` to a staged copy of the shadow, flush it and read back
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails. The shadow
    /// is left unchanged unless the read-back succeeds.
    pub async fn modify<F>(&mut self, f: F) -> Result<(), Error<I::Error>>
    where
        F: FnOnce(&mut RegisterImage),
    {
        self.read_registers().await?;
        let mut staged = self.image;
        f(&mut staged);
        self.commit(staged).await
    }

    async fn commit(&mut self, staged: RegisterImage) -> Result<(), Error<I::Error>> {
        self.interface.write_block(&staged.write_window()).await?;
        self.read_registers().await
    }

    async fn pulse_reset<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let hold_ms = self.config.timing.reset_hold_ms;
        self.reset.set_low().map_err(|_| Error::ResetPin)?;
        delay.delay_ms(hold_ms).await;
        self.reset.set_high().map_err(|_| Error::ResetPin)?;
        delay.delay_ms(hold_ms).await;
        Ok(())
    }

    /// Run the power-up sequence
    ///
    /// # Errors
    ///
    /// Returns an error if the reset line cannot be driven or communication
    /// with the device fails.
    pub async fn power_up<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let timing = self.config.timing;

        self.pulse_reset(delay).await?;

        self.read_registers().await?;
        let mut staged = self.image;
        power::stage_oscillator(&mut staged);
        self.commit(staged).await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Oscillator enabled, settling for {} ms", timing.oscillator_settle_ms);
        delay.delay_ms(timing.oscillator_settle_ms).await;

        let config = self.config;
        self.modify(|image| power::stage_enable(image, &config)).await?;
        delay.delay_ms(timing.power_up_ms).await;

        #[cfg(feature = "defmt")]
        defmt::info!("Si4703 powered up (firmware {})", self.status().firmware());

        Ok(())
    }

    /// Clear `ENABLE` and set `DISABLE`
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn power_down(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(power::stage_disable).await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Si4703 powered down");

        Ok(())
    }

    /// Set the volume, clamping to 0..=15
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_volume(&mut self, level: u8) -> Result<(), Error<I::Error>> {
        let level = level.min(MAX_VOLUME);
        let policy = self.config.volume_policy;
        self.modify(|image| {
            image.set_field(fields::VOLUME, u16::from(level));
            if policy == crate::VolumePolicy::Unmute {
                image.set_flag(fields::DMUTE, true);
            }
        })
        .await
    }

    /// Mute the audio output (clears `DMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn mute_enable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::DMUTE, false)).await
    }

    /// Unmute the audio output (sets `DMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn mute_disable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::DMUTE, true)).await
    }

    /// Enable soft mute on weak signals (clears `SMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn soft_mute_enable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::SMUTE, false)).await
    }

    /// Disable soft mute (sets `SMUTE`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn soft_mute_disable(&mut self) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::SMUTE, true)).await
    }

    /// Force mono reception
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_mono(&mut self, mono: bool) -> Result<(), Error<I::Error>> {
        self.modify(|image| image.set_flag(fields::MONO, mono)).await
    }

    /// Tune to `frequency_mhz` and wait until the chip has settled
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFrequency`], [`Error::Timeout`] or [`Error::Bus`].
    pub async fn tune<D>(
        &mut self,
        delay: &mut D,
        frequency_mhz: f32,
    ) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.tune_inner(delay, frequency_mhz, None).await
    }

    /// [`tune`](Self::tune) that gives up with [`Error::Cancelled`] once
    /// `cancel` is set
    ///
    /// # Errors
    ///
    /// As [`tune`](Self::tune), plus [`Error::Cancelled`].
    pub async fn tune_cancellable<D>(
        &mut self,
        delay: &mut D,
        frequency_mhz: f32,
        cancel: &AtomicBool,
    ) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.tune_inner(delay, frequency_mhz, Some(cancel)).await
    }

    async fn tune_inner<D>(
        &mut self,
        delay: &mut D,
        frequency_mhz: f32,
        cancel: Option<&AtomicBool>,
    ) -> Result<u16, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let channel = self.config.channel_for::<I::Error>(frequency_mhz)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Tuning to {} MHz (channel {})", frequency_mhz, channel);

        self.run_request(delay, Request::Tune { channel }, cancel).await?;
        Ok(channel)
    }

    /// Seek to the next station in `direction`
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] or [`Error::Bus`].
    pub async fn seek<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.seek_inner(delay, direction, None).await
    }

    /// [`seek`](Self::seek) that gives up with [`Error::Cancelled`] once
    /// `cancel` is set
    ///
    /// # Errors
    ///
    /// As [`seek`](Self::seek), plus [`Error::Cancelled`].
    pub async fn seek_cancellable<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
        cancel: &AtomicBool,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.seek_inner(delay, direction, Some(cancel)).await
    }

    async fn seek_inner<D>(
        &mut self,
        delay: &mut D,
        direction: SeekDirection,
        cancel: Option<&AtomicBool>,
    ) -> Result<SeekOutcome, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let request = Request::Seek {
            direction,
            mode: self.config.seek_mode,
        };
        let completed = self.run_request(delay, request, cancel).await?;
        let outcome = self.seek_outcome(completed.band_limit());

        #[cfg(feature = "defmt")]
        defmt::debug!("Seek finished: {}", outcome);

        Ok(outcome)
    }

    async fn run_request<D>(
        &mut self,
        delay: &mut D,
        request: Request,
        cancel: Option<&AtomicBool>,
    ) -> Result<RegisterImage, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let result = self.drive_request(delay, request, cancel).await;
        self.state = TuneState::Idle;
        result
    }

    async fn drive_request<D>(
        &mut self,
        delay: &mut D,
        request: Request,
        cancel: Option<&AtomicBool>,
    ) -> Result<RegisterImage, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.state = TuneState::Requested;
        self.modify(|image| request.stage(image)).await?;

        self.state = TuneState::AwaitingComplete;
        if let Err(error) = self.wait_for_stc(delay, true, cancel).await {
            if matches!(error, Error::Timeout | Error::Cancelled) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Seek/tune aborted, clearing request bit");
                self.modify(|image| request.stage_clear(image)).await?;
            }
            return Err(error);
        }
        let completed = self.image;

        self.state = TuneState::ClearingRequest;
        self.modify(|image| request.stage_clear(image)).await?;

        self.state = TuneState::AwaitingClear;
        self.wait_for_stc(delay, false, cancel).await?;

        Ok(completed)
    }

    async fn wait_for_stc<D>(
        &mut self,
        delay: &mut D,
        complete: bool,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let poll = self.config.poll;
        for _ in 0..poll.max_polls() {
            self.read_registers().await?;
            if self.image.seek_tune_complete() == complete {
                #[cfg(feature = "defmt")]
                defmt::trace!("STC = {}", complete);
                return Ok(());
            }
            if cancelled(cancel) {
                return Err(Error::Cancelled);
            }
            delay.delay_ms(poll.interval_ms).await;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Timed out waiting for STC = {}", complete);

        Err(Error::Timeout)
    }

    /// Read the current channel, signal strength and stereo indicator
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn signal(&mut self) -> Result<Signal, Error<I::Error>> {
        self.read_registers().await?;
        Ok(Signal::from_image(&self.image))
    }

    /// Read the RDS blocks if the chip has a new group ready
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_rds(&mut self) -> Result<Option<RdsBlocks>, Error<I::Error>> {
        self.read_registers().await?;
        Ok(RdsBlocks::from_image(&self.image))
    }
}
