#![cfg(not(feature = "async"))]

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use lm51772_rs::data_types::{
    BbMinTimeScale, CdcGain, DeviceProfile, DischargeStrength, Drv1Sequence, Drv1Supply, DvsSlewRate,
    FeedbackDivider, I2cAddress, InductorDerating, MinDeadTime, OscSyncMode, SlopeCompFactor,
    ThermalWarningThreshold, VoutStep,
};
use lm51772_rs::driver::{Lm51772, MAX_BURST_LEN};
use lm51772_rs::error::Error;
use lm51772_rs::registers::{MfrD1Bits, Register, StatusByteBits};

const ADDR: u8 = 0x6A;

type Driver = Lm51772<I2cMock>;
type BusResult = Result<(), Error<ErrorKind>>;

/// Register contents each read-modify-write starts from.
const START_BYTES: [u8; 4] = [0x00, 0xFF, 0xA5, 0x5A];

fn finish(driver: Driver) {
    let mut i2c = driver.free();
    i2c.done();
}

/// Set and clear a flag from every start byte; only `mask` may change.
fn check_flag(setter: fn(&mut Driver, bool) -> BusResult, reg: u8, mask: u8) {
    let mut expectations = Vec::new();
    for start in START_BYTES {
        expectations.push(I2cTrans::write_read(ADDR, vec![reg], vec![start]));
        expectations.push(I2cTrans::write(ADDR, vec![reg, start | mask]));
        expectations.push(I2cTrans::write_read(ADDR, vec![reg], vec![start]));
        expectations.push(I2cTrans::write(ADDR, vec![reg, start & !mask]));
    }
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    for _ in START_BYTES {
        setter(&mut driver, true).unwrap();
        setter(&mut driver, false).unwrap();
    }
    finish(driver);
}

/// Write every variant of a field from every start byte; `variants` is in code order.
fn check_field<F: Copy>(setter: fn(&mut Driver, F) -> BusResult, reg: u8, mask: u8, shift: u8, variants: &[F]) {
    assert_eq!(variants.len(), 1 << mask.count_ones());
    let mut expectations = Vec::new();
    for start in START_BYTES {
        for code in 0..variants.len() as u8 {
            expectations.push(I2cTrans::write_read(ADDR, vec![reg], vec![start]));
            expectations.push(I2cTrans::write(ADDR, vec![reg, (start & !mask) | (code << shift)]));
        }
    }
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    for _ in START_BYTES {
        for &value in variants {
            setter(&mut driver, value).unwrap();
        }
    }
    finish(driver);
}

#[test]
fn set_ilim_voltage_writes_code() {
    // 40.0 mV -> 80 (0x50)
    let expectations = [I2cTrans::write(ADDR, vec![0x0A, 0x50])];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_ilim_threshold_mv(40.0).unwrap();
    finish(driver);
}

#[test]
fn get_ilim_voltage_decodes_code() {
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x0A], vec![80]),
        I2cTrans::write_read(ADDR, vec![0x0A], vec![0x03]),
        I2cTrans::write_read(ADDR, vec![0x0A], vec![0xF0]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    assert_eq!(driver.ilim_threshold_mv().unwrap(), 40.0);
    assert_eq!(driver.ilim_threshold_mv().unwrap(), 5.0);
    assert_eq!(driver.ilim_threshold_mv().unwrap(), 70.0);
    finish(driver);
}

#[test]
fn out_of_range_values_never_touch_the_bus() {
    let expectations: [I2cTrans; 0] = [];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    assert_eq!(driver.set_ilim_threshold_mv(70.5), Err(Error::OutOfRange));
    assert_eq!(driver.set_ilim_threshold_mv(4.5), Err(Error::OutOfRange));
    assert_eq!(driver.set_ilim_threshold_ma(7_500), Err(Error::OutOfRange));
    assert_eq!(driver.set_vout_target(0x1000), Err(Error::OutOfRange));
    assert_eq!(driver.set_vdet_falling_mv(9_000), Err(Error::OutOfRange));
    assert_eq!(driver.set_vdet_rising_mv(2_700), Err(Error::OutOfRange));
    assert_eq!(driver.set_ovp2_threshold_mv(60_000), Err(Error::OutOfRange));
    assert_eq!(driver.set_ivp_threshold_mv(4_000), Err(Error::OutOfRange));
    assert_eq!(driver.set_pcm_lower_window(800), Err(Error::OutOfRange));
    assert_eq!(driver.set_pcm_lower_window_pct(80.0), Err(Error::OutOfRange));
    finish(driver);
}

#[test]
fn set_ilim_current_uses_profile_shunt() {
    // 4000 mA across 10 mOhm = 40 mV -> 0x50; across 20 mOhm = 80 mV -> rejected.
    let expectations = [I2cTrans::write(ADDR, vec![0x0A, 0x50])];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_ilim_threshold_ma(4_000).unwrap();
    finish(driver);

    let expectations = [I2cTrans::write_read(ADDR, vec![0x0A], vec![0x50])];
    let profile = DeviceProfile::new(FeedbackDivider::Div20, 20);
    let mut driver = Lm51772::with_profile(I2cMock::new(&expectations), I2cAddress::Addr0x6A, profile).unwrap();
    assert_eq!(driver.set_ilim_threshold_ma(4_000), Err(Error::OutOfRange));
    assert_eq!(driver.ilim_threshold_ma().unwrap(), 2_000);
    finish(driver);
}

#[test]
fn invalid_profile_is_rejected() {
    let expectations: [I2cTrans; 0] = [];
    let mut i2c = I2cMock::new(&expectations);
    let profile = DeviceProfile::new(FeedbackDivider::Div10, 0);
    match Lm51772::with_profile(i2c.clone(), I2cAddress::Addr0x6A, profile) {
        Err(Error::InvalidConfig) => {}
        _ => panic!("zero shunt accepted"),
    }
    i2c.done();
}

#[test]
fn vout_target_splits_and_reassembles() {
    let expectations = [
        I2cTrans::write(ADDR, vec![0x0C, 0x23]),
        I2cTrans::write(ADDR, vec![0x0D, 0x01]),
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0x23]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0x01]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_vout_target(0x123).unwrap();
    assert_eq!(driver.vout_target().unwrap(), 0x123);
    finish(driver);
}

#[test]
fn vout_mv_goes_through_divider() {
    // 5000 mV / 20 = 250 = 0x0FA
    let expectations = [
        I2cTrans::write(ADDR, vec![0x0C, 0xFA]),
        I2cTrans::write(ADDR, vec![0x0D, 0x00]),
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0xFA]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0xF0]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_vout_mv(5_000).unwrap();
    assert_eq!(driver.vout_mv().unwrap(), 5_000);
    finish(driver);
}

#[test]
fn increment_and_decrement_vout() {
    let expectations = [
        // 250 + 2 * 5 = 260 = 0x104
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0xFA]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0x00]),
        I2cTrans::write(ADDR, vec![0x0C, 0x04]),
        I2cTrans::write(ADDR, vec![0x0D, 0x01]),
        // 3 - 5 underflows: rejected after the reads, nothing written.
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0x03]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0x00]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.increment_vout(VoutStep::Mv100, 2).unwrap();
    assert_eq!(driver.decrement_vout(VoutStep::Mv100, 1), Err(Error::OutOfRange));
    finish(driver);
}

#[test]
fn ramp_vout_stops_exactly_on_target() {
    // 250 -> 252 in 100 mV steps (5 codes) is a single shortened step.
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0xFA]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0x00]),
        I2cTrans::write(ADDR, vec![0x0C, 0xFC]),
        I2cTrans::write(ADDR, vec![0x0D, 0x00]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    let mut delay = NoopDelay::new();
    driver.ramp_vout_mv(5_040, VoutStep::Mv100, 1, &mut delay).unwrap();
    finish(driver);

    // 252 -> 250 in 20 mV steps.
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x0C], vec![0xFC]),
        I2cTrans::write_read(ADDR, vec![0x0D], vec![0x00]),
        I2cTrans::write(ADDR, vec![0x0C, 0xFB]),
        I2cTrans::write(ADDR, vec![0x0D, 0x00]),
        I2cTrans::write(ADDR, vec![0x0C, 0xFA]),
        I2cTrans::write(ADDR, vec![0x0D, 0x00]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.ramp_vout_mv(5_000, VoutStep::Mv20, 1, &mut delay).unwrap();
    finish(driver);
}

#[test]
fn flag_set_preserves_other_bits_for_every_start_value() {
    let mut expectations = Vec::new();
    for initial in 0..=255u8 {
        expectations.push(I2cTrans::write_read(ADDR, vec![0xD0], vec![initial]));
        expectations.push(I2cTrans::write(ADDR, vec![0xD0, initial | 0x40]));
        expectations.push(I2cTrans::write_read(ADDR, vec![0xD0], vec![initial]));
        expectations.push(I2cTrans::write(ADDR, vec![0xD0, initial & !0x40]));
    }
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    for _ in 0..=255u8 {
        driver.set_spread_spectrum(true).unwrap();
        driver.set_spread_spectrum(false).unwrap();
    }
    finish(driver);
}

#[test]
fn flag_set_is_idempotent() {
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0xD1], vec![0b0110_0000]),
        I2cTrans::write(ADDR, vec![0xD1, 0b0110_0100]),
        I2cTrans::write_read(ADDR, vec![0xD1], vec![0b0110_0100]),
        I2cTrans::write(ADDR, vec![0xD1, 0b0110_0100]),
        I2cTrans::write_read(ADDR, vec![0xD1], vec![0b0110_0100]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_force_bias(true).unwrap();
    driver.set_force_bias(true).unwrap();
    let flags: MfrD1Bits = driver.read_flags().unwrap();
    assert!(flags.contains(MfrD1Bits::FORCE_BIAS));
    assert!(!flags.contains(MfrD1Bits::EN_THERMAL_WARNING));
    finish(driver);
}

#[test]
fn control_register_flags() {
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x81], vec![0x00]),
        I2cTrans::write(ADDR, vec![0x81, 0x02]),
        // restart: off, delay, on
        I2cTrans::write_read(ADDR, vec![0x81], vec![0x03]),
        I2cTrans::write(ADDR, vec![0x81, 0x02]),
        I2cTrans::write_read(ADDR, vec![0x81], vec![0x02]),
        I2cTrans::write(ADDR, vec![0x81, 0x03]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_output_discharge(true).unwrap();
    let mut delay = NoopDelay::new();
    driver.restart_converter(10, &mut delay).unwrap();
    finish(driver);
}

#[test]
fn enumerated_field_replaces_only_its_span() {
    let expectations = [
        // D1 = 0x9F, threshold -> 110 C (0b10 << 5)
        I2cTrans::write_read(ADDR, vec![0xD1], vec![0x9F]),
        I2cTrans::write(ADDR, vec![0xD1, 0xDF]),
        // D7 = 0xF0, slope factor -> 2.5 (code 10)
        I2cTrans::write_read(ADDR, vec![0xD7], vec![0xF0]),
        I2cTrans::write(ADDR, vec![0xD7, 0xFA]),
        I2cTrans::write_read(ADDR, vec![0xD7], vec![0xFA]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver
        .set_thermal_warning_threshold(ThermalWarningThreshold::C110)
        .unwrap();
    driver.set_slope_comp_factor(SlopeCompFactor::X2p5).unwrap();
    let factor: SlopeCompFactor = driver.read_field().unwrap();
    assert_eq!(factor, SlopeCompFactor::X2p5);
    finish(driver);
}

#[test]
fn failed_read_aborts_read_modify_write() {
    let expectations = [I2cTrans::write_read(ADDR, vec![0xD0], vec![0x00]).with_error(ErrorKind::Other)];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    assert_eq!(driver.set_hiccup_mode(true), Err(Error::I2c(ErrorKind::Other)));
    finish(driver);
}

#[test]
fn threshold_writes() {
    let expectations = [
        // VDET falling 3300 mV -> 3, enable bit kept
        I2cTrans::write_read(ADDR, vec![0xD3], vec![0x9F]),
        I2cTrans::write(ADDR, vec![0xD3, 0x83]),
        // VDET rising 3000 mV -> 1, full byte
        I2cTrans::write(ADDR, vec![0xD4, 0x01]),
        // OVP2 across the knee
        I2cTrans::write(ADDR, vec![0xD5, 23]),
        I2cTrans::write(ADDR, vec![0xD5, 24]),
        // IVP 24 V -> 151
        I2cTrans::write(ADDR, vec![0xDA, 151]),
        I2cTrans::write_read(ADDR, vec![0xDA], vec![151]),
        // PCM window 38.7 % (and 38.75 %) -> 15, ISET override bit kept
        I2cTrans::write_read(ADDR, vec![0xD9], vec![0x80]),
        I2cTrans::write(ADDR, vec![0xD9, 0x8F]),
        I2cTrans::write_read(ADDR, vec![0xD9], vec![0x8F]),
        I2cTrans::write(ADDR, vec![0xD9, 0x8F]),
        I2cTrans::write_read(ADDR, vec![0xD9], vec![0x8F]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.set_vdet_falling_mv(3_300).unwrap();
    driver.set_vdet_rising_mv(3_000).unwrap();
    driver.set_ovp2_threshold_mv(15_999).unwrap();
    driver.set_ovp2_threshold_mv(16_000).unwrap();
    driver.set_ivp_threshold_mv(24_000).unwrap();
    assert_eq!(driver.ivp_threshold_mv().unwrap(), 24_000);
    driver.set_pcm_lower_window(387).unwrap();
    driver.set_pcm_lower_window_pct(38.75).unwrap();
    assert_eq!(driver.pcm_lower_window().unwrap(), 375);
    finish(driver);
}

#[test]
fn status_and_fault_clearing() {
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x78], vec![0b0011_0000]),
        I2cTrans::write(ADDR, vec![0x78, 0b0011_0000]),
        I2cTrans::write(ADDR, vec![0x03, 0x00]),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    let status = driver.read_status().unwrap();
    assert_eq!(status, StatusByteBits::VOUT_OV | StatusByteBits::IOUT_OC);
    driver.clear_status(status).unwrap();
    driver.clear_faults().unwrap();
    finish(driver);
}

#[test]
fn alternate_address_is_used() {
    let expectations = [I2cTrans::write(0x6B, vec![0x0A, 0x14])];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.select_alt_address();
    assert_eq!(driver.address(), 0x6B);
    driver.set_ilim_threshold_mv(10.0).unwrap();
    finish(driver);
}

#[test]
fn address_presets() {
    let expectations = [
        I2cTrans::write(0x6B, vec![0x03, 0x00]),
        I2cTrans::write(0x6A, vec![0x03, 0x00]),
    ];
    let mut driver = Lm51772::with_address(I2cMock::new(&expectations), I2cAddress::Addr0x6B);
    assert_eq!(driver.address(), 0x6B);
    driver.clear_faults().unwrap();
    driver.set_address(I2cAddress::Addr0x6A);
    driver.clear_faults().unwrap();
    finish(driver);
}

#[test]
fn every_flag_setter_touches_only_its_bit() {
    let rows: [(fn(&mut Driver, bool) -> BusResult, u8, u8); 21] = [
        (Lm51772::set_sleep_mode, 0xD0, 0x80),
        (Lm51772::set_spread_spectrum, 0xD0, 0x40),
        (Lm51772::set_hiccup_mode, 0xD0, 0x20),
        (Lm51772::set_constant_current_limit, 0xD0, 0x10),
        (Lm51772::set_vcc1_ldo, 0xD0, 0x08),
        (Lm51772::set_negative_current_limit, 0xD0, 0x04),
        (Lm51772::set_thermal_warning, 0xD1, 0x80),
        (Lm51772::set_nflt_as_interrupt, 0xD1, 0x10),
        (Lm51772::set_direct_startup, 0xD1, 0x08),
        (Lm51772::set_force_bias, 0xD1, 0x04),
        (Lm51772::set_fpwm_two_phase_bb, 0xD1, 0x02),
        (Lm51772::set_psm_two_phase_bb, 0xD1, 0x01),
        (Lm51772::set_ivp, 0xD2, 0x80),
        (Lm51772::set_fb_divider_select, 0xD2, 0x40),
        (Lm51772::set_vdet, 0xD3, 0x80),
        (Lm51772::set_force_constant_dead_time, 0xD6, 0x20),
        (Lm51772::set_dead_time_scaling, 0xD6, 0x10),
        (Lm51772::set_cdc, 0xD8, 0x04),
        (Lm51772::set_iset_over_ilim, 0xD9, 0x80),
        (Lm51772::set_output_discharge, 0x81, 0x02),
        (Lm51772::set_converter_enabled, 0x81, 0x01),
    ];
    for (setter, reg, mask) in rows {
        check_flag(setter, reg, mask);
    }
}

#[test]
fn every_field_setter_writes_only_its_span() {
    check_field(Lm51772::set_discharge_strength, 0xD0, 0x03, 0, DischargeStrength::VARIANTS);
    check_field(Lm51772::set_thermal_warning_threshold, 0xD1, 0x60, 5, ThermalWarningThreshold::VARIANTS);
    check_field(Lm51772::set_dvs_slew_rate, 0xD2, 0x03, 0, DvsSlewRate::VARIANTS);
    check_field(Lm51772::set_bb_min_time_scale, 0xD6, 0x03, 0, BbMinTimeScale::VARIANTS);
    check_field(Lm51772::set_min_dead_time, 0xD6, 0x0C, 2, MinDeadTime::VARIANTS);
    check_field(Lm51772::set_osc_sync_mode, 0xD6, 0xC0, 6, OscSyncMode::VARIANTS);
    check_field(Lm51772::set_slope_comp_factor, 0xD7, 0x0F, 0, SlopeCompFactor::VARIANTS);
    check_field(Lm51772::set_inductor_derating, 0xD7, 0x30, 4, InductorDerating::VARIANTS);
    check_field(Lm51772::set_cdc_gain, 0xD8, 0x03, 0, CdcGain::VARIANTS);
    check_field(Lm51772::set_drv1_supply, 0xD8, 0x08, 3, Drv1Supply::VARIANTS);
    check_field(Lm51772::set_drv1_sequence, 0xD8, 0x30, 4, Drv1Sequence::VARIANTS);
}

#[test]
fn burst_write_and_read() {
    let block: Vec<u8> = (1..=MAX_BURST_LEN as u8).collect();
    let mut frame = vec![0xD0];
    frame.extend_from_slice(&block);
    let expectations = [
        I2cTrans::write(ADDR, vec![0xD0, 0x11, 0x22, 0x33]),
        I2cTrans::write_read(ADDR, vec![0xD0], vec![0x11, 0x22, 0x33]),
        I2cTrans::write(ADDR, frame),
    ];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    driver.write_regs(Register::MfrSpecificD0, &[0x11, 0x22, 0x33]).unwrap();
    let mut buf = [0u8; 3];
    driver.read_regs(Register::MfrSpecificD0, &mut buf).unwrap();
    assert_eq!(buf, [0x11, 0x22, 0x33]);
    // The full D0..D9 block fits in one transfer.
    driver.write_regs(Register::MfrSpecificD0, &block).unwrap();
    finish(driver);
}

#[test]
fn oversized_burst_is_rejected_without_bus_traffic() {
    let expectations: [I2cTrans; 0] = [];
    let mut driver = Lm51772::new(I2cMock::new(&expectations));
    let data = [0u8; MAX_BURST_LEN + 1];
    assert_eq!(driver.write_regs(Register::MfrSpecificD0, &data), Err(Error::InvalidConfig));
    finish(driver);
}
