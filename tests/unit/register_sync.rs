//! Unit tests for register shadow synchronization

use crate::common::{Operation, create_mock_driver};
use si4703::registers::{READ_BLOCK_LEN, WRITE_WINDOW_LEN};
use si4703::{Error, Register};

#[test]
fn test_read_registers_maps_wraparound() {
    let (mut driver, interface) = create_mock_driver();

    for index in 0..16 {
        interface.set_register(index, 0xA500 | index as u16);
    }
    driver.read_registers().unwrap();

    let image = driver.snapshot();
    for register in Register::ALL {
        assert_eq!(
            image.get(register),
            0xA500 | register.index() as u16,
            "{register:?} decoded from wrong stream position"
        );
    }
}

#[test]
fn test_read_registers_reads_full_block() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.read_registers().unwrap();

    assert_eq!(
        interface.operations(),
        vec![Operation::Read {
            len: READ_BLOCK_LEN
        }]
    );
}

#[test]
fn test_flush_writes_registers_2_to_7_in_order() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.set_volume(9).unwrap();

    let writes = interface.writes();
    assert_eq!(writes.len(), 1);
    let window = &writes[0];
    assert_eq!(window.len(), WRITE_WINDOW_LEN);

    let image = driver.snapshot();
    let expected: Vec<u8> = [
        Register::PowerCfg,
        Register::Channel,
        Register::SysConfig1,
        Register::SysConfig2,
        Register::SysConfig3,
        Register::Test1,
    ]
    .iter()
    .flat_map(|&register| image.get(register).to_be_bytes())
    .collect();
    assert_eq!(window, &expected);
}

#[test]
fn test_every_flush_is_followed_by_a_read() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.mute_enable().unwrap();

    let ops = interface.operations();
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[0], Operation::Read { .. }));
    assert!(matches!(ops[1], Operation::Write { .. }));
    assert!(matches!(ops[2], Operation::Read { .. }));
}

#[test]
fn test_flush_writes_twelve_bytes_for_any_change() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.soft_mute_disable().unwrap();
    driver.set_mono(true).unwrap();
    driver.update_registers().unwrap();

    let writes = interface.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|w| w.len() == WRITE_WINDOW_LEN));
}

#[test]
fn test_failed_write_leaves_shadow_unchanged() {
    let (mut driver, interface) = create_mock_driver();
    let before = driver.snapshot();

    interface.fail_next_write();
    let result = driver.set_volume(12);

    assert!(matches!(result, Err(Error::Bus(_))));
    assert_eq!(driver.snapshot(), before);
    // The device was not changed either
    assert_eq!(interface.get_register(0x05) & 0x000F, u16::from(before.volume()));
}

#[test]
fn test_failed_readback_leaves_shadow_unchanged() {
    let (mut driver, interface) = create_mock_driver();
    let before = driver.snapshot();

    // The read before the write succeeds, the read-back fails
    interface.sim().fail_read_after = Some(1);
    let result = driver.set_volume(12);

    assert!(matches!(result, Err(Error::Bus(_))));
    assert_eq!(driver.snapshot(), before);
    assert_eq!(driver.snapshot().volume(), 1);
    // The write itself reached the chip; the next read picks it up
    assert_eq!(interface.get_register(0x05) & 0x000F, 12);
    driver.read_registers().unwrap();
    assert_eq!(driver.snapshot().volume(), 12);
}

#[test]
fn test_failed_read_leaves_shadow_unchanged() {
    let (mut driver, interface) = create_mock_driver();
    let before = driver.snapshot();

    interface.set_register(0x0A, 0x4000);
    interface.fail_next_read();
    assert!(driver.read_registers().is_err());
    assert_eq!(driver.snapshot(), before);

    // Next read goes through
    driver.read_registers().unwrap();
    assert!(driver.snapshot().seek_tune_complete());
}

#[test]
fn test_modify_only_changes_staged_fields() {
    let (mut driver, interface) = create_mock_driver();
    let before = driver.snapshot();

    driver
        .modify(|image| image.set_field(si4703::registers::fields::SEEKTH, 0x0C))
        .unwrap();

    let after = driver.snapshot();
    assert_eq!(after.field(si4703::registers::fields::SEEKTH), 0x0C);
    assert_eq!(after.volume(), before.volume());
    assert_eq!(after.get(Register::PowerCfg), before.get(Register::PowerCfg));
    assert_eq!(interface.get_register(0x05) >> 8, 0x0C);
}
