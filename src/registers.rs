//! Register map, field layouts and unit conversions for LM51772.
//! Conversion helpers are pure; out-of-range inputs yield `None` so the driver can
//! reject the write before touching the bus.

use crate::data_types::FeedbackDivider;

/// Default I2C address (ADDR pin strapped low).
pub const DEFAULT_I2C_ADDRESS: u8 = 0x6A;
/// Alternate I2C address (ADDR pin strapped high).
pub const ALT_I2C_ADDRESS: u8 = 0x6B;

/// Register addresses.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Register {
    /// Write-only command; any write clears latched faults.
    ClearFaults = 0x03,
    /// Current-limit sense threshold (0.5 mV LSB).
    IlimThreshold = 0x0A,
    /// VOUT target bits 7:0.
    VoutTarget1Lsb = 0x0C,
    /// VOUT target bits 11:8 (in bits 3:0).
    VoutTarget1Msb = 0x0D,
    UsbPdStatus0 = 0x21,
    /// Summary status (write-1-to-clear).
    StatusByte = 0x78,
    /// Converter enable and output discharge.
    UsbPdControl0 = 0x81,
    MfrSpecificD0 = 0xD0,
    MfrSpecificD1 = 0xD1,
    MfrSpecificD2 = 0xD2,
    MfrSpecificD3 = 0xD3,
    MfrSpecificD4 = 0xD4,
    MfrSpecificD5 = 0xD5,
    MfrSpecificD6 = 0xD6,
    MfrSpecificD7 = 0xD7,
    MfrSpecificD8 = 0xD8,
    MfrSpecificD9 = 0xD9,
    /// Input voltage protection threshold.
    IvpVoltage = 0xDA,
}

impl Register {
    /// Bus address of the register.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Byte written to CLEAR_FAULTS; the device only cares that a write happened.
pub const CLEAR_FAULTS_COMMAND: u8 = 0x00;

bitflags::bitflags! {
    /// STATUS_BYTE register bits (0x78).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatusByteBits: u8 {
        const BUSY              = 1 << 7;
        const OFF               = 1 << 6;
        const VOUT_OV           = 1 << 5;
        const IOUT_OC           = 1 << 4;
        const VIN_UV            = 1 << 3;
        const TEMPERATURE       = 1 << 2;
        /// Communication/memory/logic fault.
        const CML               = 1 << 1;
        const NONE_OF_THE_ABOVE = 1 << 0;
    }

    /// USB_PD_STATUS_0 register bits (0x21). Read-only.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct UsbPdStatus0Bits: u8 {
        const POWER_GOOD       = 1 << 7;
        // Bits 6-5 reserved.
        const THERMAL_SHUTDOWN = 1 << 4;
        const THERMAL_WARNING  = 1 << 3;
        const SHORT_CIRCUIT    = 1 << 2;
        const OVER_VOLTAGE     = 1 << 1;
        /// Constant-current loop is regulating.
        const CC_ACTIVE        = 1 << 0;
    }

    /// USB_PD_CONTROL_0 register bits (0x81).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct UsbPdControl0Bits: u8 {
        /// Bit 1: Output discharge enable.
        const DISCHARGE = 1 << 1;
        /// Bit 0: Power stage enable.
        const EN_CONV   = 1 << 0;
    }

    /// MFR_SPECIFIC_D0 register bits (0xD0).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD0Bits: u8 {
        const SLEEP              = 1 << 7;
        const SPREAD_SPECTRUM    = 1 << 6;
        const HICCUP             = 1 << 5;
        /// Current limiter regulates (constant current) instead of cycle-by-cycle limiting.
        const CC_LIMIT           = 1 << 4;
        const EN_VCC1            = 1 << 3;
        const NEG_CURRENT_LIMIT  = 1 << 2;
        /// Bits 1-0: Discharge strength.
        const DISCHARGE_STRENGTH = 0b0000_0011;
    }

    /// MFR_SPECIFIC_D1 register bits (0xD1).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD1Bits: u8 {
        const EN_THERMAL_WARNING  = 1 << 7;
        /// Bits 6-5: Thermal warning threshold.
        const THERMAL_WARNING_SEL = 0b0110_0000;
        /// nFLT pin reports interrupts instead of faults.
        const NFLT_AS_INT         = 1 << 4;
        const DIRECT_STARTUP      = 1 << 3;
        const FORCE_BIAS          = 1 << 2;
        const FPWM_2PHASE_BB      = 1 << 1;
        const PSM_2PHASE_BB       = 1 << 0;
    }

    /// MFR_SPECIFIC_D2 register bits (0xD2).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD2Bits: u8 {
        const EN_IVP        = 1 << 7;
        /// Bit 6: Internal feedback divider (0 = /20, 1 = /10).
        const FB_DIV_SEL    = 1 << 6;
        // Bits 5-2 reserved.
        /// Bits 1-0: DVS slew rate.
        const DVS_SLEW_RATE = 0b0000_0011;
    }

    /// MFR_SPECIFIC_D3 register bits (0xD3).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD3Bits: u8 {
        const EN_VDET      = 1 << 7;
        /// Bits 4-0: VDET falling threshold.
        const VDET_FALLING = 0b0001_1111;
    }

    /// MFR_SPECIFIC_D6 register bits (0xD6).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD6Bits: u8 {
        /// Bits 7-6: Oscillator sync mode.
        const OSC_SYNC              = 0b1100_0000;
        const FORCE_CONST_DEAD_TIME = 1 << 5;
        const DEAD_TIME_SCALING     = 1 << 4;
        /// Bits 3-2: Gate-driver minimum dead time.
        const MIN_DEAD_TIME         = 0b0000_1100;
        /// Bits 1-0: Buck-boost minimum on/off time scale.
        const BB_MIN_TIME_SCALE     = 0b0000_0011;
    }

    /// MFR_SPECIFIC_D7 register bits (0xD7).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD7Bits: u8 {
        // Bits 7-6 reserved.
        /// Bits 5-4: Inductor derating.
        const INDUCTOR_DERATING = 0b0011_0000;
        /// Bits 3-0: Slope compensation correction factor.
        const SLOPE_CORRECTION  = 0b0000_1111;
    }

    /// MFR_SPECIFIC_D8 register bits (0xD8).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD8Bits: u8 {
        // Bits 7-6 reserved.
        /// Bits 5-4: DRV1 sequencing.
        const DRV1_SEQUENCE = 0b0011_0000;
        /// Bit 3: DRV1 supply (0 = VCC2, 1 = VOUT).
        const DRV1_SUPPLY   = 1 << 3;
        const EN_CDC        = 1 << 2;
        /// Bits 1-0: Cable drop compensation gain.
        const CDC_GAIN      = 0b0000_0011;
    }

    /// MFR_SPECIFIC_D9 register bits (0xD9).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MfrD9Bits: u8 {
        /// ISET pin overrides the ILIM threshold for OCP.
        const ISET_OVER_ILIM   = 1 << 7;
        // Bits 6-5 reserved.
        /// Bits 4-0: PCM lower voltage window.
        const PCM_LOWER_WINDOW = 0b0001_1111;
    }
}

/// Bitflags view of a whole register.
pub trait RegisterBits: Sized {
    const REGISTER: Register;

    fn from_register(raw: u8) -> Self;
}

macro_rules! register_bits {
    ($($bits:ty => $reg:ident),+ $(,)?) => {
        $(
            impl RegisterBits for $bits {
                const REGISTER: Register = Register::$reg;

                fn from_register(raw: u8) -> Self {
                    Self::from_bits_retain(raw)
                }
            }
        )+
    };
}

register_bits! {
    StatusByteBits => StatusByte,
    UsbPdStatus0Bits => UsbPdStatus0,
    UsbPdControl0Bits => UsbPdControl0,
    MfrD0Bits => MfrSpecificD0,
    MfrD1Bits => MfrSpecificD1,
    MfrD2Bits => MfrSpecificD2,
    MfrD3Bits => MfrSpecificD3,
    MfrD6Bits => MfrSpecificD6,
    MfrD7Bits => MfrSpecificD7,
    MfrD8Bits => MfrSpecificD8,
    MfrD9Bits => MfrSpecificD9,
}

/// Enumerated sub-field of a register.
///
/// `to_bits` returns the value already shifted into position and confined to `MASK`,
/// so writing a field can never disturb its neighbours.
pub trait Field: Sized + Copy {
    const REGISTER: Register;
    const MASK: u8;

    fn to_bits(self) -> u8;

    /// Decode from a full register byte; bits outside `MASK` are ignored.
    /// Every code the mask can hold maps to a value, so decoding cannot fail.
    fn from_bits(raw: u8) -> Self;
}

/// ILIM threshold characteristics (sense voltage).
pub const ILIM_LSB_MV: f32 = 0.5;
pub const ILIM_MIN_MV: f32 = 5.0;
pub const ILIM_MAX_MV: f32 = 70.0;
/// Codes below this read back as `ILIM_MIN_MV`.
pub const ILIM_CODE_MIN: u8 = 0x0A;
/// Codes above this read back as `ILIM_MAX_MV`.
pub const ILIM_CODE_MAX: u8 = 0x8C;
/// ILIM threshold expressed as inductor current.
pub const ILIM_MIN_MA: u16 = 500;
pub const ILIM_MAX_MA: u16 = 7_000;

/// VOUT target is a 12-bit value split across two registers.
pub const VOUT_TARGET_MAX: u16 = 0x0FFF;
pub const VOUT_MSB_MASK: u8 = 0x0F;

/// VDET comparator thresholds (5-bit, 200 mV LSB).
pub const VDET_STEP_MV: u16 = 200;
pub const VDET_FALLING_MIN_MV: u16 = 2_700;
pub const VDET_FALLING_MAX_MV: u16 = 8_900;
pub const VDET_RISING_MIN_MV: u16 = 2_800;
pub const VDET_RISING_MAX_MV: u16 = 9_000;
pub const VDET_CODE_MAX: u8 = 0x1F;

/// OVP2 threshold: 500 mV steps below the knee, 1 V steps above it.
pub const OVP2_MIN_MV: u16 = 4_000;
pub const OVP2_MAX_MV: u16 = 55_000;
pub const OVP2_KNEE_MV: u16 = 16_000;
pub const OVP2_KNEE_CODE: u8 = 24;
pub const OVP2_FINE_STEP_MV: u16 = 500;
pub const OVP2_COARSE_STEP_MV: u16 = 1_000;
pub const OVP2_CODE_MAX: u8 = 63;

/// IVP threshold: 125 mV steps below the knee, 250 mV steps above it.
pub const IVP_MIN_MV: u16 = 4_750;
pub const IVP_MAX_MV: u16 = 55_000;
pub const IVP_KNEE_MV: u16 = 24_000;
pub const IVP_KNEE_CODE: u8 = 151;
pub const IVP_FINE_STEP_MV: u16 = 125;
pub const IVP_COARSE_STEP_MV: u16 = 250;

/// PCM lower voltage window, in tenths of a percent (25 = 2.5 %).
pub const PCM_WINDOW_STEP: u16 = 25;
pub const PCM_WINDOW_MAX: u16 = 775;
pub const PCM_WINDOW_MAX_PCT: f32 = 77.5;

/// Convert ILIM sense threshold (mV) to register code. Truncates toward zero.
pub fn ilim_mv_to_code(mv: f32) -> Option<u8> {
    // NaN fails `contains`, so it is rejected here too.
    if !(ILIM_MIN_MV..=ILIM_MAX_MV).contains(&mv) {
        return None;
    }
    Some((mv / ILIM_LSB_MV) as u8)
}

/// Convert ILIM register code to millivolts, saturating outside the linear span.
pub fn code_to_ilim_mv(code: u8) -> f32 {
    if code < ILIM_CODE_MIN {
        ILIM_MIN_MV
    } else if code > ILIM_CODE_MAX {
        ILIM_MAX_MV
    } else {
        code as f32 * ILIM_LSB_MV
    }
}

/// Convert an ILIM current (mA) across `sense_mohm` to register code.
///
/// The current must lie in `ILIM_MIN_MA..=ILIM_MAX_MA` and the resulting code must land in
/// the linear span, otherwise the device would silently saturate to a different threshold.
pub fn ilim_ma_to_code(ma: u16, sense_mohm: u16) -> Option<u8> {
    if !(ILIM_MIN_MA..=ILIM_MAX_MA).contains(&ma) {
        return None;
    }
    // mA * mΩ = µV; code = µV / 500.
    let code = u32::from(ma) * u32::from(sense_mohm) / 500;
    if code < u32::from(ILIM_CODE_MIN) || code > u32::from(ILIM_CODE_MAX) {
        return None;
    }
    Some(code as u8)
}

/// Convert ILIM register code to milliamps across `sense_mohm`. `None` for a zero resistor.
pub fn code_to_ilim_ma(code: u8, sense_mohm: u16) -> Option<u16> {
    let code = code.clamp(ILIM_CODE_MIN, ILIM_CODE_MAX);
    let ma = (u32::from(code) * 500).checked_div(u32::from(sense_mohm))?;
    Some(ma.min(u32::from(u16::MAX)) as u16)
}

/// Split a 12-bit VOUT target into (LSB, MSB) register bytes.
pub fn split_vout_target(code: u16) -> (u8, u8) {
    let lsb = (code & 0xFF) as u8;
    let msb = ((code >> 8) as u8) & VOUT_MSB_MASK;
    (lsb, msb)
}

/// Reassemble the 12-bit VOUT target from its register bytes.
pub fn join_vout_target(lsb: u8, msb: u8) -> u16 {
    (u16::from(msb & VOUT_MSB_MASK) << 8) | u16::from(lsb)
}

/// Convert VOUT (mV) to target code through the feedback divider. Truncates toward zero.
pub fn vout_mv_to_code(mv: u32, divider: FeedbackDivider) -> Option<u16> {
    let code = mv / u32::from(divider.ratio());
    if code > u32::from(VOUT_TARGET_MAX) {
        return None;
    }
    Some(code as u16)
}

/// Convert VOUT target code to millivolts through the feedback divider.
pub fn code_to_vout_mv(code: u16, divider: FeedbackDivider) -> u32 {
    u32::from(code & VOUT_TARGET_MAX) * u32::from(divider.ratio())
}

fn linear_to_code(mv: u16, min: u16, max: u16, step: u16) -> Option<u8> {
    if !(min..=max).contains(&mv) {
        return None;
    }
    u8::try_from((mv - min) / step).ok()
}

/// Convert VDET falling threshold (mV) to its 5-bit code.
pub fn vdet_falling_mv_to_code(mv: u16) -> Option<u8> {
    linear_to_code(mv, VDET_FALLING_MIN_MV, VDET_FALLING_MAX_MV, VDET_STEP_MV)
}

pub fn code_to_vdet_falling_mv(code: u8) -> u16 {
    VDET_FALLING_MIN_MV + u16::from(code & VDET_CODE_MAX) * VDET_STEP_MV
}

/// Convert VDET rising threshold (mV) to its code.
pub fn vdet_rising_mv_to_code(mv: u16) -> Option<u8> {
    linear_to_code(mv, VDET_RISING_MIN_MV, VDET_RISING_MAX_MV, VDET_STEP_MV)
}

pub fn code_to_vdet_rising_mv(code: u8) -> u16 {
    VDET_RISING_MIN_MV + u16::from(code.min(VDET_CODE_MAX)) * VDET_STEP_MV
}

/// Convert OVP2 threshold (mV) to code. The knee itself belongs to the coarse segment.
pub fn ovp2_mv_to_code(mv: u16) -> Option<u8> {
    if !(OVP2_MIN_MV..=OVP2_MAX_MV).contains(&mv) {
        return None;
    }
    let code = if mv < OVP2_KNEE_MV {
        (mv - OVP2_MIN_MV) / OVP2_FINE_STEP_MV
    } else {
        u16::from(OVP2_KNEE_CODE) + (mv - OVP2_KNEE_MV) / OVP2_COARSE_STEP_MV
    };
    u8::try_from(code).ok()
}

pub fn code_to_ovp2_mv(code: u8) -> u16 {
    let code = code.min(OVP2_CODE_MAX);
    if code < OVP2_KNEE_CODE {
        OVP2_MIN_MV + u16::from(code) * OVP2_FINE_STEP_MV
    } else {
        OVP2_KNEE_MV + u16::from(code - OVP2_KNEE_CODE) * OVP2_COARSE_STEP_MV
    }
}

/// Convert IVP threshold (mV) to code.
///
/// The upper end of the coarse segment runs past 0xFF; such thresholds are rejected.
pub fn ivp_mv_to_code(mv: u16) -> Option<u8> {
    if !(IVP_MIN_MV..=IVP_MAX_MV).contains(&mv) {
        return None;
    }
    let code = if mv < IVP_KNEE_MV {
        (mv - IVP_MIN_MV) / IVP_FINE_STEP_MV
    } else {
        u16::from(IVP_KNEE_CODE) + (mv - IVP_KNEE_MV) / IVP_COARSE_STEP_MV
    };
    u8::try_from(code).ok()
}

/// Convert IVP code to millivolts. Codes from `IVP_KNEE_CODE` up decode on the coarse segment.
pub fn code_to_ivp_mv(code: u8) -> u16 {
    if code < IVP_KNEE_CODE {
        IVP_MIN_MV + u16::from(code) * IVP_FINE_STEP_MV
    } else {
        IVP_KNEE_MV + u16::from(code - IVP_KNEE_CODE) * IVP_COARSE_STEP_MV
    }
}

/// Convert PCM lower window (tenths of a percent) to its 5-bit code.
pub fn pcm_window_to_code(tenths: u16) -> Option<u8> {
    if tenths > PCM_WINDOW_MAX {
        return None;
    }
    Some((tenths / PCM_WINDOW_STEP) as u8)
}

/// Convert PCM lower window (percent) to its 5-bit code.
pub fn pcm_window_pct_to_code(pct: f32) -> Option<u8> {
    if !(0.0..=PCM_WINDOW_MAX_PCT).contains(&pct) {
        return None;
    }
    Some((pct * 10.0 / PCM_WINDOW_STEP as f32) as u8)
}

/// Convert PCM window code to tenths of a percent.
pub fn code_to_pcm_window(code: u8) -> u16 {
    u16::from(code & MfrD9Bits::PCM_LOWER_WINDOW.bits()) * PCM_WINDOW_STEP
}
