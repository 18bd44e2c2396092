//! Test utilities and helper functions

use crate::common::mock_interface::MockInterface;
use si4703::{PollConfig, Si4703Driver, TunerConfig};
use std::cell::RefCell;
use std::rc::Rc;

/// Driver type used throughout the tests
pub type MockDriver = Si4703Driver<MockInterface, MockPin>;

/// Mock delay implementation for testing
///
/// Does not sleep; it only accumulates the requested time so tests can check
/// the power-up waits and the poll deadline.
#[derive(Debug, Default)]
pub struct MockDelay {
    elapsed_ns: u64,
}

impl MockDelay {
    /// Total time requested so far, in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }

    /// Reset the accumulated time
    pub fn reset(&mut self) {
        self.elapsed_ns = 0;
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}

/// Mock pin error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Mock reset pin recording every level it is driven to
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    levels: Rc<RefCell<Vec<bool>>>,
    fail: Rc<RefCell<bool>>,
}

impl MockPin {
    /// Levels driven so far (`true` = high)
    pub fn levels(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }

    /// Make every following pin operation fail
    pub fn set_failing(&self, fail: bool) {
        *self.fail.borrow_mut() = fail;
    }

    fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
        if *self.fail.borrow() {
            return Err(MockPinError);
        }
        self.levels.borrow_mut().push(high);
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = MockPinError;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// US configuration with a short poll deadline so timeouts finish quickly
pub fn test_config() -> TunerConfig {
    TunerConfig {
        poll: PollConfig {
            interval_ms: 5,
            timeout_ms: 50,
        },
        ..TunerConfig::us()
    }
}

/// Open a mock driver with the given configuration
/// Returns (driver, interface) where interface is a clone that shares state with the driver
pub fn create_mock_driver_with(config: TunerConfig) -> (MockDriver, MockInterface) {
    let interface = MockInterface::new();
    let interface_clone = interface.clone();
    let mut delay = MockDelay::default();
    let driver = Si4703Driver::open(interface, MockPin::default(), &mut delay, config)
        .expect("Failed to open mock driver");
    (driver, interface_clone)
}

/// Open a mock driver with [`test_config`]
pub fn create_mock_driver() -> (MockDriver, MockInterface) {
    create_mock_driver_with(test_config())
}
