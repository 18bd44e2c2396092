//! Unit tests for seeking

use core::sync::atomic::AtomicBool;

use crate::common::{MockDelay, create_mock_driver, create_mock_driver_with, test_config};
use si4703::registers::fields;
use si4703::{Error, SeekDirection, SeekMode, TuneState, TunerConfig};

#[test]
fn test_seek_up_finds_station() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    interface.sim().seek_channel = 80;

    let outcome = driver.seek(&mut delay, SeekDirection::Up).unwrap();

    assert!(outcome.tuned);
    assert!(!outcome.band_limit_hit);
    assert_eq!(outcome.channel, 80);
    assert!((outcome.frequency_mhz - 103.5).abs() < 1e-3);
    assert_eq!(driver.tune_state(), TuneState::Idle);
}

#[test]
fn test_seek_reports_band_limit() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    {
        let mut sim = interface.sim();
        sim.seek_channel = 102;
        sim.seek_band_limit = true;
    }

    let outcome = driver.seek(&mut delay, SeekDirection::Up).unwrap();

    assert!(!outcome.tuned);
    assert!(outcome.band_limit_hit);
    assert_eq!(outcome.channel, 102);
    // SFBL is cleared along with STC once the request is acknowledged
    assert!(!driver.snapshot().band_limit());
}

#[test]
fn test_seek_up_write_sequence() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    interface.clear_operations();

    driver.seek(&mut delay, SeekDirection::Up).unwrap();

    let writes = interface.writes();
    assert_eq!(writes.len(), 2);
    // POWERCFG: DMUTE | SEEKUP | SEEK | ENABLE, then SEEK cleared
    assert_eq!(&writes[0][0..2], &[0x43, 0x01]);
    assert_eq!(&writes[1][0..2], &[0x42, 0x01]);
    assert_eq!(interface.get_register(0x02) & 0x0100, 0);
}

#[test]
fn test_seek_down_in_stop_mode() {
    let config = TunerConfig {
        seek_mode: SeekMode::Stop,
        ..test_config()
    };
    let (mut driver, interface) = create_mock_driver_with(config);
    let mut delay = MockDelay::default();
    interface.sim().seek_channel = 12;
    interface.clear_operations();

    let outcome = driver.seek(&mut delay, SeekDirection::Down).unwrap();

    assert_eq!(outcome.channel, 12);
    let writes = interface.writes();
    assert_eq!(&writes[0][0..2], &[0x45, 0x01]);
    let image = driver.snapshot();
    assert!(image.flag(fields::SKMODE));
    assert!(!image.flag(fields::SEEKUP));
    assert!(!image.seek_requested());
}

#[test]
fn test_seek_uses_configured_raster() {
    let config = TunerConfig {
        poll: test_config().poll,
        ..TunerConfig::europe()
    };
    let (mut driver, interface) = create_mock_driver_with(config);
    let mut delay = MockDelay::default();
    interface.sim().seek_channel = 136;

    let outcome = driver.seek(&mut delay, SeekDirection::Up).unwrap();

    assert!((outcome.frequency_mhz - 101.1).abs() < 1e-3);
}

#[test]
fn test_seek_times_out() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    interface.sim().stc_never_rises = true;

    let result = driver.seek(&mut delay, SeekDirection::Down);

    assert!(matches!(result, Err(Error::Timeout)));
    assert!(delay.elapsed_ms() <= 50);
    assert_eq!(driver.tune_state(), TuneState::Idle);
    assert_eq!(interface.get_register(0x02) & 0x0100, 0);
}

#[test]
fn test_seek_cancelled() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    let cancel = AtomicBool::new(true);

    let result = driver.seek_cancellable(&mut delay, SeekDirection::Up, &cancel);

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(driver.tune_state(), TuneState::Idle);
    assert_eq!(interface.get_register(0x02) & 0x0100, 0);
}

#[test]
fn test_tune_after_seek() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::default();
    interface.sim().seek_channel = 80;

    driver.seek(&mut delay, SeekDirection::Up).unwrap();
    let channel = driver.tune(&mut delay, 101.1).unwrap();

    assert_eq!(channel, 68);
    assert_eq!(driver.snapshot().read_channel(), 68);
}
