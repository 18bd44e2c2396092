//! Integration tests for a complete listening session

use crate::common::{MockDelay, MockInterface, MockPin, test_config};
use si4703::{PowerState, RdsBlocks, SeekDirection, Si4703Driver, TuneState};

#[test]
fn test_complete_session() {
    let interface = MockInterface::new();
    let sim = interface.clone();
    let pin = MockPin::default();
    let mut delay = MockDelay::default();

    // Open
    let mut radio = Si4703Driver::open(interface, pin.clone(), &mut delay, test_config()).unwrap();
    assert_eq!(radio.power_state(), PowerState::Up);
    delay.reset();

    // Volume and tune
    radio.set_volume(8).unwrap();
    assert_eq!(radio.tune(&mut delay, 101.1).unwrap(), 68);
    assert!((radio.frequency_mhz() - 101.1).abs() < 1e-3);

    // Seek to the next station
    sim.sim().seek_channel = 80;
    let outcome = radio.seek(&mut delay, SeekDirection::Up).unwrap();
    assert!(outcome.tuned);
    assert!((outcome.frequency_mhz - 103.5).abs() < 1e-3);
    assert_eq!(radio.tune_state(), TuneState::Idle);

    // Back to the first station
    radio.tune(&mut delay, 101.1).unwrap();

    // Station with stereo pilot and a fresh RDS group
    sim.set_register(0x0A, 0x8000 | 0x0100 | 42);
    for (index, word) in [(0x0C, 0x54A8), (0x0D, 0x0408), (0x0E, 0xE20D), (0x0F, 0x4142)] {
        sim.set_register(index, word);
    }

    let signal = radio.signal().unwrap();
    assert_eq!(signal.channel, 68);
    assert_eq!(signal.rssi, 42);
    assert!(signal.stereo);
    assert!(signal.frequency_mhz.is_some_and(|mhz| (mhz - 101.1).abs() < 1e-3));

    let rds = radio.read_rds().unwrap();
    assert_eq!(
        rds,
        Some(RdsBlocks {
            a: 0x54A8,
            b: 0x0408,
            c: 0xE20D,
            d: 0x4142,
        })
    );

    // Status dump of the last snapshot
    let text = radio.status().to_string();
    assert!(text.contains("Part Number: Si4702/03"));
    assert!(text.contains("Manufacturer: Silicon Labs (0x242)"));
    assert!(text.contains("Device: Si4703 (on)"));
    assert!(text.contains("Firmware Version: 19"));
    assert!(text.contains("Volume: 8"));
    assert!(text.contains("Channel: 68 (101.1 MHz)"));
    assert!(text.contains("RSSI: 42 dBuV Stereo"));

    // Close
    let (_interface, pin) = radio.close().unwrap();
    assert_eq!(sim.get_register(0x02) & 0x0001, 0);
    assert_eq!(pin.levels(), vec![false, true]);
}

#[test]
fn test_rds_absent_without_rdsr() {
    let interface = MockInterface::new();
    let mut delay = MockDelay::default();
    let mut radio =
        Si4703Driver::open(interface, MockPin::default(), &mut delay, test_config()).unwrap();

    assert_eq!(radio.read_rds().unwrap(), None);
}

#[test]
fn test_release_keeps_chip_powered() {
    let interface = MockInterface::new();
    let sim = interface.clone();
    let mut delay = MockDelay::default();
    let radio =
        Si4703Driver::open(interface, MockPin::default(), &mut delay, test_config()).unwrap();

    let (_interface, _pin) = radio.release();

    assert_eq!(sim.get_register(0x02) & 0x0001, 1);
}

#[test]
fn test_status_while_powered_down() {
    let interface = MockInterface::new();
    let mut delay = MockDelay::default();
    let mut radio =
        Si4703Driver::open(interface, MockPin::default(), &mut delay, test_config()).unwrap();

    radio.power_down().unwrap();
    let text = radio.status().to_string();

    assert!(text.contains("Device: Si4703 (off)"));
    assert!(text.contains("Firmware Version: Off"));
    assert!(text.contains("Power-Up Enable: Default"));
    assert!(text.contains("Power-Up Disable: On"));
    assert_eq!(radio.power_state(), PowerState::Down);
}
