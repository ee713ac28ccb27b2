//! Driver for LM51772.
//! Blocking I2C by default; the `async` feature builds the same API over `embedded-hal-async`.
//!
//! Every field setter is a single read-modify-write (or a plain write for whole-byte fields)
//! issued while holding `&mut self`, so the driver value is the unit of exclusive access.
//! Share one between contexts by wrapping it in a mutex, not by sharing the bus.

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::data_types::{
    BbMinTimeScale, CdcGain, DeviceProfile, DischargeStrength, Drv1Sequence, Drv1Supply, DvsSlewRate, I2cAddress,
    InductorDerating, MinDeadTime, OscSyncMode, SlopeCompFactor, ThermalWarningThreshold, VoutStep,
};
use crate::error::Error;
use crate::registers::{
    CLEAR_FAULTS_COMMAND, DEFAULT_I2C_ADDRESS, Field, MfrD0Bits, MfrD1Bits, MfrD2Bits,
    MfrD3Bits, MfrD6Bits, MfrD8Bits, MfrD9Bits, Register, RegisterBits, StatusByteBits, UsbPdControl0Bits,
    UsbPdStatus0Bits, VOUT_TARGET_MAX, code_to_ilim_ma, code_to_ilim_mv, code_to_ivp_mv, code_to_ovp2_mv,
    code_to_pcm_window, code_to_vdet_falling_mv, code_to_vdet_rising_mv, code_to_vout_mv, ilim_ma_to_code,
    ilim_mv_to_code, ivp_mv_to_code, join_vout_target, ovp2_mv_to_code, pcm_window_pct_to_code,
    pcm_window_to_code, split_vout_target, vdet_falling_mv_to_code, vdet_rising_mv_to_code, vout_mv_to_code,
};

/// Longest burst `write_regs` accepts: the whole MFR_SPECIFIC_D0..D9 block.
pub const MAX_BURST_LEN: usize = 10;

/// LM51772 driver.
pub struct Lm51772<I2C> {
    i2c: I2C,
    address: u8,
    profile: DeviceProfile,
}

impl<I2C> Lm51772<I2C> {
    /// Create a new driver instance with the default I2C address (0x6A) and default profile.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEFAULT_I2C_ADDRESS,
            profile: DeviceProfile::default(),
        }
    }

    /// Create a new driver instance at the address selected by the ADDR pin.
    pub fn with_address(i2c: I2C, address: I2cAddress) -> Self {
        Self {
            i2c,
            address: address.addr(),
            profile: DeviceProfile::default(),
        }
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Retarget the driver at another ADDR-pin strapping.
    pub fn set_address(&mut self, address: I2cAddress) {
        self.address = address.addr();
    }

    /// Quick helper: select default address (0x6A).
    pub fn select_default_address(&mut self) {
        self.set_address(I2cAddress::Addr0x6A);
    }

    /// Quick helper: select alternate address (0x6B).
    pub fn select_alt_address(&mut self) {
        self.set_address(I2cAddress::Addr0x6B);
    }

    /// Board profile the unit conversions use.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Release the bus.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Lm51772<I2C>
where
    I2C: embedded_hal::i2c::ErrorType,
{
    /// Create a driver with an explicit board profile. The profile is validated once here.
    pub fn with_profile(i2c: I2C, address: I2cAddress, profile: DeviceProfile) -> Result<Self, Error<I2C::Error>> {
        if !profile.is_valid() {
            #[cfg(feature = "defmt")]
            defmt::warn!("rejected profile: sense resistor {} mOhm", profile.sense_resistor_mohm);
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            i2c,
            address: address.addr(),
            profile,
        })
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Lm51772",),
    async(feature = "async", keep_self)
)]
impl<I2C> Lm51772<I2C>
where
    I2C: I2c,
{
    /// Write a single register.
    pub async fn write_reg(&mut self, reg: Register, value: u8) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("write {:?} <- 0x{:02X}", reg, value);
        self.i2c
            .write(self.address, &[reg.addr(), value])
            .await
            .map_err(Error::I2c)
    }

    /// Read a single register.
    pub async fn read_reg(&mut self, reg: Register) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buf)
            .await
            .map_err(Error::I2c)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("read {:?} -> 0x{:02X}", reg, buf[0]);
        Ok(buf[0])
    }

    /// Update masked bits in a register (read-modify-write).
    /// A failed read aborts before anything is written.
    pub async fn update_reg(&mut self, reg: Register, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(reg).await?;
        let new = (cur & !mask) | (value & mask);
        #[cfg(feature = "defmt")]
        defmt::debug!("update {:?}: 0x{:02X} -> 0x{:02X}", reg, cur, new);
        self.write_reg(reg, new).await
    }

    /// Write a burst starting at a register (up to `MAX_BURST_LEN` bytes).
    /// Longer bursts are rejected with `InvalidConfig` before any bus traffic.
    pub async fn write_regs(&mut self, start_reg: Register, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        if data.len() > MAX_BURST_LEN {
            return Err(Error::InvalidConfig);
        }
        let mut buf = [0u8; MAX_BURST_LEN + 1];
        buf[0] = start_reg.addr();
        buf[1..=data.len()].copy_from_slice(data);
        #[cfg(feature = "defmt")]
        defmt::trace!("burst write {:?} <- {}", start_reg, data);
        self.i2c
            .write(self.address, &buf[..=data.len()])
            .await
            .map_err(Error::I2c)
    }

    /// Read a burst starting at a register.
    pub async fn read_regs(&mut self, start_reg: Register, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write_read(self.address, &[start_reg.addr()], data)
            .await
            .map_err(Error::I2c)
    }

    /// Set `mask` bits, preserving the rest of the register.
    pub async fn set_bits(&mut self, reg: Register, mask: u8) -> Result<(), Error<I2C::Error>> {
        self.update_reg(reg, mask, mask).await
    }

    /// Clear `mask` bits, preserving the rest of the register.
    pub async fn clear_bits(&mut self, reg: Register, mask: u8) -> Result<(), Error<I2C::Error>> {
        self.update_reg(reg, mask, 0).await
    }

    async fn write_flag(&mut self, reg: Register, mask: u8, enable: bool) -> Result<(), Error<I2C::Error>> {
        if enable {
            self.set_bits(reg, mask).await
        } else {
            self.clear_bits(reg, mask).await
        }
    }

    /// Write one enumerated field, leaving the rest of its register untouched.
    pub async fn write_field<F: Field>(&mut self, value: F) -> Result<(), Error<I2C::Error>> {
        self.update_reg(F::REGISTER, F::MASK, value.to_bits()).await
    }

    /// Read one enumerated field.
    pub async fn read_field<F: Field>(&mut self) -> Result<F, Error<I2C::Error>> {
        let raw = self.read_reg(F::REGISTER).await?;
        Ok(F::from_bits(raw))
    }

    /// Read a whole register as its bitflags view (e.g. `MfrD1Bits`).
    pub async fn read_flags<B: RegisterBits>(&mut self) -> Result<B, Error<I2C::Error>> {
        let raw = self.read_reg(B::REGISTER).await?;
        Ok(B::from_register(raw))
    }

    // --- Status and faults -------------------------------------------------

    /// Clear all latched faults.
    pub async fn clear_faults(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(Register::ClearFaults, CLEAR_FAULTS_COMMAND).await
    }

    /// Read STATUS_BYTE.
    pub async fn read_status(&mut self) -> Result<StatusByteBits, Error<I2C::Error>> {
        self.read_flags().await
    }

    /// Clear the given STATUS_BYTE flags (write-1-to-clear, no read step).
    pub async fn clear_status(&mut self, flags: StatusByteBits) -> Result<(), Error<I2C::Error>> {
        self.write_reg(Register::StatusByte, flags.bits()).await
    }

    /// Read USB_PD_STATUS_0 (power good, thermal, short-circuit and CC flags).
    pub async fn read_usb_pd_status(&mut self) -> Result<UsbPdStatus0Bits, Error<I2C::Error>> {
        self.read_flags().await
    }

    // --- ILIM threshold ----------------------------------------------------

    /// Set the current-limit sense threshold in mV (5.0..=70.0, 0.5 mV resolution).
    pub async fn set_ilim_threshold_mv(&mut self, mv: f32) -> Result<(), Error<I2C::Error>> {
        let code = match ilim_mv_to_code(mv) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("ILIM threshold {} mV out of range", mv);
                return Err(Error::OutOfRange);
            }
        };
        self.write_reg(Register::IlimThreshold, code).await
    }

    /// Read the current-limit sense threshold in mV.
    pub async fn ilim_threshold_mv(&mut self) -> Result<f32, Error<I2C::Error>> {
        let code = self.read_reg(Register::IlimThreshold).await?;
        Ok(code_to_ilim_mv(code))
    }

    /// Set the current limit in mA (500..=7000) across the profile's sense resistor.
    pub async fn set_ilim_threshold_ma(&mut self, ma: u16) -> Result<(), Error<I2C::Error>> {
        let code = match ilim_ma_to_code(ma, self.profile.sense_resistor_mohm) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("ILIM current {} mA out of range", ma);
                return Err(Error::OutOfRange);
            }
        };
        self.write_reg(Register::IlimThreshold, code).await
    }

    /// Read the current limit in mA across the profile's sense resistor.
    pub async fn ilim_threshold_ma(&mut self) -> Result<u16, Error<I2C::Error>> {
        let code = self.read_reg(Register::IlimThreshold).await?;
        code_to_ilim_ma(code, self.profile.sense_resistor_mohm).ok_or(Error::InvalidConfig)
    }

    // --- VOUT target -------------------------------------------------------

    /// Write the raw 12-bit VOUT target (LSB register first, then MSB).
    pub async fn set_vout_target(&mut self, code: u16) -> Result<(), Error<I2C::Error>> {
        if code > VOUT_TARGET_MAX {
            #[cfg(feature = "defmt")]
            defmt::warn!("VOUT target 0x{:04X} exceeds 12 bits", code);
            return Err(Error::OutOfRange);
        }
        let (lsb, msb) = split_vout_target(code);
        self.write_reg(Register::VoutTarget1Lsb, lsb).await?;
        self.write_reg(Register::VoutTarget1Msb, msb).await
    }

    /// Read the raw 12-bit VOUT target. No divider is applied.
    pub async fn vout_target(&mut self) -> Result<u16, Error<I2C::Error>> {
        let lsb = self.read_reg(Register::VoutTarget1Lsb).await?;
        let msb = self.read_reg(Register::VoutTarget1Msb).await?;
        Ok(join_vout_target(lsb, msb))
    }

    /// Set output voltage (mV) through the profile's feedback divider.
    pub async fn set_vout_mv(&mut self, mv: u32) -> Result<(), Error<I2C::Error>> {
        let code = vout_mv_to_code(mv, self.profile.feedback_divider).ok_or(Error::OutOfRange)?;
        self.set_vout_target(code).await
    }

    /// Read output voltage setpoint (mV) through the profile's feedback divider.
    pub async fn vout_mv(&mut self) -> Result<u32, Error<I2C::Error>> {
        let code = self.vout_target().await?;
        Ok(code_to_vout_mv(code, self.profile.feedback_divider))
    }

    /// Raise the VOUT target by `count` steps. Rejected without writing if it would pass 0xFFF.
    pub async fn increment_vout(&mut self, step: VoutStep, count: u16) -> Result<(), Error<I2C::Error>> {
        let current = self.vout_target().await?;
        let delta = u32::from(step.codes(self.profile.feedback_divider)) * u32::from(count);
        let next = u32::from(current) + delta;
        if next > u32::from(VOUT_TARGET_MAX) {
            return Err(Error::OutOfRange);
        }
        self.set_vout_target(next as u16).await
    }

    /// Lower the VOUT target by `count` steps. Rejected without writing if it would go below 0.
    pub async fn decrement_vout(&mut self, step: VoutStep, count: u16) -> Result<(), Error<I2C::Error>> {
        let current = self.vout_target().await?;
        let delta = u32::from(step.codes(self.profile.feedback_divider)) * u32::from(count);
        let next = u32::from(current).checked_sub(delta).ok_or(Error::OutOfRange)?;
        self.set_vout_target(next as u16).await
    }

    /// Walk the VOUT setpoint to `target_mv` one `step` at a time, waiting `dwell_ms` after each
    /// write. The last step is shortened so the target is hit exactly.
    pub async fn ramp_vout_mv<D: DelayNs>(
        &mut self,
        target_mv: u32,
        step: VoutStep,
        dwell_ms: u32,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        let target = vout_mv_to_code(target_mv, self.profile.feedback_divider).ok_or(Error::OutOfRange)?;
        let stride = step.codes(self.profile.feedback_divider).max(1);
        let mut current = self.vout_target().await?;
        while current != target {
            current = if current < target {
                current.saturating_add(stride).min(target)
            } else {
                current.saturating_sub(stride).max(target)
            };
            self.set_vout_target(current).await?;
            delay.delay_ms(dwell_ms).await;
        }
        Ok(())
    }

    // --- USB_PD_CONTROL_0 --------------------------------------------------

    /// Enable or disable the power stage.
    pub async fn set_converter_enabled(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::UsbPdControl0, UsbPdControl0Bits::EN_CONV.bits(), enable)
            .await
    }

    /// Enable or disable the output discharge path.
    pub async fn set_output_discharge(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::UsbPdControl0, UsbPdControl0Bits::DISCHARGE.bits(), enable)
            .await
    }

    /// Switch the power stage off, wait `off_ms`, and switch it back on.
    pub async fn restart_converter<D: DelayNs>(&mut self, off_ms: u32, delay: &mut D) -> Result<(), Error<I2C::Error>> {
        self.set_converter_enabled(false).await?;
        delay.delay_ms(off_ms).await;
        self.set_converter_enabled(true).await
    }

    // --- MFR_SPECIFIC_D0 ---------------------------------------------------

    /// Enable sleep mode.
    pub async fn set_sleep_mode(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::SLEEP.bits(), enable).await
    }

    /// Enable spread-spectrum frequency dithering.
    pub async fn set_spread_spectrum(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::SPREAD_SPECTRUM.bits(), enable)
            .await
    }

    /// Enable hiccup overcurrent protection.
    pub async fn set_hiccup_mode(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::HICCUP.bits(), enable).await
    }

    /// Select constant-current limiting (set) or cycle-by-cycle limiting (clear).
    pub async fn set_constant_current_limit(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::CC_LIMIT.bits(), enable).await
    }

    /// Enable the VCC1 LDO.
    pub async fn set_vcc1_ldo(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::EN_VCC1.bits(), enable).await
    }

    /// Enable negative current limiting.
    pub async fn set_negative_current_limit(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD0, MfrD0Bits::NEG_CURRENT_LIMIT.bits(), enable)
            .await
    }

    /// Select the output discharge strength.
    pub async fn set_discharge_strength(&mut self, strength: DischargeStrength) -> Result<(), Error<I2C::Error>> {
        self.write_field(strength).await
    }

    // --- MFR_SPECIFIC_D1 ---------------------------------------------------

    /// Two-phase buck-boost operation in power-save mode.
    pub async fn set_psm_two_phase_bb(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::PSM_2PHASE_BB.bits(), enable)
            .await
    }

    /// Two-phase buck-boost operation in forced PWM.
    pub async fn set_fpwm_two_phase_bb(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::FPWM_2PHASE_BB.bits(), enable)
            .await
    }

    /// Keep the internal bias on.
    pub async fn set_force_bias(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::FORCE_BIAS.bits(), enable).await
    }

    /// Start up directly at the DTRK target instead of soft-starting.
    pub async fn set_direct_startup(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::DIRECT_STARTUP.bits(), enable)
            .await
    }

    /// Use the nFLT pin as an interrupt output.
    pub async fn set_nflt_as_interrupt(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::NFLT_AS_INT.bits(), enable).await
    }

    /// Enable the thermal warning.
    pub async fn set_thermal_warning(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD1, MfrD1Bits::EN_THERMAL_WARNING.bits(), enable)
            .await
    }

    /// Select the die temperature at which the thermal warning asserts.
    pub async fn set_thermal_warning_threshold(
        &mut self,
        threshold: ThermalWarningThreshold,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_field(threshold).await
    }

    // --- MFR_SPECIFIC_D2 ---------------------------------------------------

    /// Select the VOUT slew rate used for dynamic voltage scaling.
    pub async fn set_dvs_slew_rate(&mut self, rate: DvsSlewRate) -> Result<(), Error<I2C::Error>> {
        self.write_field(rate).await
    }

    /// Select the internal /10 feedback divider (set) or /20 (clear).
    pub async fn set_fb_divider_select(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD2, MfrD2Bits::FB_DIV_SEL.bits(), enable).await
    }

    /// Enable input voltage protection.
    pub async fn set_ivp(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD2, MfrD2Bits::EN_IVP.bits(), enable).await
    }

    // --- VDET (D3/D4) ------------------------------------------------------

    /// Enable the VDET comparator.
    pub async fn set_vdet(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD3, MfrD3Bits::EN_VDET.bits(), enable).await
    }

    /// Set the VDET falling threshold (2700..=8900 mV, 200 mV steps). Bits 7-5 are preserved.
    pub async fn set_vdet_falling_mv(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = match vdet_falling_mv_to_code(mv) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("VDET falling {} mV out of range", mv);
                return Err(Error::OutOfRange);
            }
        };
        self.update_reg(Register::MfrSpecificD3, MfrD3Bits::VDET_FALLING.bits(), code)
            .await
    }

    /// Read the VDET falling threshold in mV.
    pub async fn vdet_falling_mv(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_reg(Register::MfrSpecificD3).await?;
        Ok(code_to_vdet_falling_mv(raw))
    }

    /// Set the VDET rising threshold (2800..=9000 mV, 200 mV steps). Writes the whole register.
    pub async fn set_vdet_rising_mv(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = match vdet_rising_mv_to_code(mv) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("VDET rising {} mV out of range", mv);
                return Err(Error::OutOfRange);
            }
        };
        self.write_reg(Register::MfrSpecificD4, code).await
    }

    /// Read the VDET rising threshold in mV.
    pub async fn vdet_rising_mv(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_reg(Register::MfrSpecificD4).await?;
        Ok(code_to_vdet_rising_mv(raw))
    }

    // --- OVP2 (D5) ---------------------------------------------------------

    /// Set the secondary overvoltage threshold (4000..=55000 mV).
    pub async fn set_ovp2_threshold_mv(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = match ovp2_mv_to_code(mv) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("OVP2 {} mV out of range", mv);
                return Err(Error::OutOfRange);
            }
        };
        self.write_reg(Register::MfrSpecificD5, code).await
    }

    /// Read the secondary overvoltage threshold in mV.
    pub async fn ovp2_threshold_mv(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_reg(Register::MfrSpecificD5).await?;
        Ok(code_to_ovp2_mv(raw))
    }

    // --- MFR_SPECIFIC_D6 ---------------------------------------------------

    /// Select the buck-boost minimum on/off time scale.
    pub async fn set_bb_min_time_scale(&mut self, scale: BbMinTimeScale) -> Result<(), Error<I2C::Error>> {
        self.write_field(scale).await
    }

    /// Select the gate-driver minimum dead time.
    pub async fn set_min_dead_time(&mut self, dead_time: MinDeadTime) -> Result<(), Error<I2C::Error>> {
        self.write_field(dead_time).await
    }

    /// Enable dead-time scaling.
    pub async fn set_dead_time_scaling(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD6, MfrD6Bits::DEAD_TIME_SCALING.bits(), enable)
            .await
    }

    /// Force a constant dead time.
    pub async fn set_force_constant_dead_time(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD6, MfrD6Bits::FORCE_CONST_DEAD_TIME.bits(), enable)
            .await
    }

    /// Select SYNC pin direction and edge.
    pub async fn set_osc_sync_mode(&mut self, mode: OscSyncMode) -> Result<(), Error<I2C::Error>> {
        self.write_field(mode).await
    }

    // --- MFR_SPECIFIC_D7 ---------------------------------------------------

    /// Select the slope compensation correction factor.
    pub async fn set_slope_comp_factor(&mut self, factor: SlopeCompFactor) -> Result<(), Error<I2C::Error>> {
        self.write_field(factor).await
    }

    /// Select the inductance derating assumed by slope compensation.
    pub async fn set_inductor_derating(&mut self, derating: InductorDerating) -> Result<(), Error<I2C::Error>> {
        self.write_field(derating).await
    }

    // --- MFR_SPECIFIC_D8 ---------------------------------------------------

    /// Select the cable drop compensation gain.
    pub async fn set_cdc_gain(&mut self, gain: CdcGain) -> Result<(), Error<I2C::Error>> {
        self.write_field(gain).await
    }

    /// Enable cable drop compensation.
    pub async fn set_cdc(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD8, MfrD8Bits::EN_CDC.bits(), enable).await
    }

    /// Select the DRV1 gate-driver supply rail.
    pub async fn set_drv1_supply(&mut self, supply: Drv1Supply) -> Result<(), Error<I2C::Error>> {
        self.write_field(supply).await
    }

    /// Select when DRV1 switches on.
    pub async fn set_drv1_sequence(&mut self, sequence: Drv1Sequence) -> Result<(), Error<I2C::Error>> {
        self.write_field(sequence).await
    }

    // --- MFR_SPECIFIC_D9 ---------------------------------------------------

    /// Set the PCM lower window in tenths of a percent (0..=775, 2.5 % steps).
    pub async fn set_pcm_lower_window(&mut self, tenths: u16) -> Result<(), Error<I2C::Error>> {
        let code = match pcm_window_to_code(tenths) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("PCM window {} out of range", tenths);
                return Err(Error::OutOfRange);
            }
        };
        self.update_reg(Register::MfrSpecificD9, MfrD9Bits::PCM_LOWER_WINDOW.bits(), code)
            .await
    }

    /// Set the PCM lower window in percent (0.0..=77.5).
    pub async fn set_pcm_lower_window_pct(&mut self, pct: f32) -> Result<(), Error<I2C::Error>> {
        let code = match pcm_window_pct_to_code(pct) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("PCM window {}% out of range", pct);
                return Err(Error::OutOfRange);
            }
        };
        self.update_reg(Register::MfrSpecificD9, MfrD9Bits::PCM_LOWER_WINDOW.bits(), code)
            .await
    }

    /// Read the PCM lower window in tenths of a percent.
    pub async fn pcm_lower_window(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_reg(Register::MfrSpecificD9).await?;
        Ok(code_to_pcm_window(raw))
    }

    /// Let the ISET pin override the ILIM threshold for overcurrent protection.
    pub async fn set_iset_over_ilim(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.write_flag(Register::MfrSpecificD9, MfrD9Bits::ISET_OVER_ILIM.bits(), enable)
            .await
    }

    // --- IVP_VOLTAGE -------------------------------------------------------

    /// Set the input voltage protection threshold (4750..=55000 mV).
    pub async fn set_ivp_threshold_mv(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = match ivp_mv_to_code(mv) {
            Some(code) => code,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("IVP {} mV out of range", mv);
                return Err(Error::OutOfRange);
            }
        };
        self.write_reg(Register::IvpVoltage, code).await
    }

    /// Read the input voltage protection threshold in mV.
    pub async fn ivp_threshold_mv(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_reg(Register::IvpVoltage).await?;
        Ok(code_to_ivp_mv(raw))
    }
}
