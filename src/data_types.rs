//! Data types for LM51772 driver.
//! Every enumerated register field is a closed enum that encodes to its own pre-shifted bits.

use crate::registers::{
    ALT_I2C_ADDRESS, DEFAULT_I2C_ADDRESS, Field, MfrD0Bits, MfrD1Bits, MfrD2Bits, MfrD6Bits, MfrD7Bits,
    MfrD8Bits, Register,
};

/// I2C slave addresses selectable by the ADDR pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum I2cAddress {
    Addr0x6A,
    Addr0x6B,
}

impl I2cAddress {
    pub const fn addr(self) -> u8 {
        match self {
            I2cAddress::Addr0x6A => DEFAULT_I2C_ADDRESS,
            I2cAddress::Addr0x6B => ALT_I2C_ADDRESS,
        }
    }
}

/// Feedback divider between VOUT and the target DAC.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeedbackDivider {
    /// Internal divide-by-20 (20 mV of VOUT per code).
    Div20,
    /// Internal divide-by-10.
    Div10,
    /// External divider; the target is the feedback voltage itself.
    PassThrough,
}

impl FeedbackDivider {
    /// VOUT millivolts per target code.
    pub const fn ratio(self) -> u16 {
        match self {
            FeedbackDivider::Div20 => 20,
            FeedbackDivider::Div10 => 10,
            FeedbackDivider::PassThrough => 1,
        }
    }
}

/// Board-level parameters the unit conversions depend on.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceProfile {
    pub feedback_divider: FeedbackDivider,
    /// Current-sense shunt in milliohms.
    pub sense_resistor_mohm: u16,
}

impl DeviceProfile {
    pub const SENSE_RESISTOR_MIN_MOHM: u16 = 1;
    pub const SENSE_RESISTOR_MAX_MOHM: u16 = 100;

    pub const fn new(feedback_divider: FeedbackDivider, sense_resistor_mohm: u16) -> Self {
        Self {
            feedback_divider,
            sense_resistor_mohm,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.sense_resistor_mohm >= Self::SENSE_RESISTOR_MIN_MOHM
            && self.sense_resistor_mohm <= Self::SENSE_RESISTOR_MAX_MOHM
    }
}

impl Default for DeviceProfile {
    /// Divide-by-20 feedback and a 10 mΩ shunt (500 mA..7 A maps onto 5..70 mV).
    fn default() -> Self {
        Self::new(FeedbackDivider::Div20, 10)
    }
}

/// Increment size for stepping the VOUT target.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoutStep {
    Mv20,
    Mv100,
}

impl VoutStep {
    pub const fn millivolts(self) -> u16 {
        match self {
            VoutStep::Mv20 => 20,
            VoutStep::Mv100 => 100,
        }
    }

    /// Target codes covered by one step under `divider`.
    pub const fn codes(self, divider: FeedbackDivider) -> u16 {
        self.millivolts() / divider.ratio()
    }
}

macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $reg:ident, $mask:expr, shift $shift:literal {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code,)+
        }

        impl $name {
            /// All values, indexed by their code.
            pub const VARIANTS: &'static [$name] = &[$($name::$variant,)+];
        }

        // Variants must be listed in code order and fill the whole field.
        const _: () = {
            let variants = $name::VARIANTS;
            assert!(variants.len() == 1usize << (($mask) >> $shift).count_ones());
            let mut i = 0;
            while i < variants.len() {
                assert!(variants[i] as usize == i);
                i += 1;
            }
        };

        impl Field for $name {
            const REGISTER: Register = Register::$reg;
            const MASK: u8 = $mask;

            fn to_bits(self) -> u8 {
                ((self as u8) << $shift) & Self::MASK
            }

            fn from_bits(raw: u8) -> Self {
                Self::VARIANTS[usize::from((raw & Self::MASK) >> $shift)]
            }
        }
    };
}

field_enum! {
    /// Output discharge pull-down strength.
    pub enum DischargeStrength in MfrSpecificD0, MfrD0Bits::DISCHARGE_STRENGTH.bits(), shift 0 {
        Weak = 0,
        Normal = 1,
        Strong = 2,
        Strongest = 3,
    }
}

field_enum! {
    /// Die temperature at which the thermal warning asserts.
    pub enum ThermalWarningThreshold in MfrSpecificD1, MfrD1Bits::THERMAL_WARNING_SEL.bits(), shift 5 {
        C140 = 0,
        C125 = 1,
        C110 = 2,
        C95 = 3,
    }
}

field_enum! {
    /// VOUT slew rate during dynamic voltage scaling.
    pub enum DvsSlewRate in MfrSpecificD2, MfrD2Bits::DVS_SLEW_RATE.bits(), shift 0 {
        Sr0p5MvPerUs = 0,
        Sr1MvPerUs = 1,
        Sr2p5MvPerUs = 2,
        Sr5MvPerUs = 3,
    }
}

field_enum! {
    /// Scale applied to the buck-boost minimum on/off time.
    pub enum BbMinTimeScale in MfrSpecificD6, MfrD6Bits::BB_MIN_TIME_SCALE.bits(), shift 0 {
        X0p75 = 0,
        X1 = 1,
        X1p25 = 2,
        X1p5 = 3,
    }
}

field_enum! {
    /// Gate-driver minimum dead time.
    pub enum MinDeadTime in MfrSpecificD6, MfrD6Bits::MIN_DEAD_TIME.bits(), shift 2 {
        Ns10 = 0,
        Ns20 = 1,
        Ns40 = 2,
        Ns60 = 3,
    }
}

field_enum! {
    /// SYNC pin direction and active edge.
    pub enum OscSyncMode in MfrSpecificD6, MfrD6Bits::OSC_SYNC.bits(), shift 6 {
        InputRising = 0,
        InputFalling = 1,
        OutputRising = 2,
        OutputFalling = 3,
    }
}

field_enum! {
    /// Slope compensation correction factor.
    pub enum SlopeCompFactor in MfrSpecificD7, MfrD7Bits::SLOPE_CORRECTION.bits(), shift 0 {
        X0p125 = 0,
        X0p25 = 1,
        X0p375 = 2,
        X0p5 = 3,
        X0p625 = 4,
        X0p75 = 5,
        X0p875 = 6,
        X1p0 = 7,
        X1p5 = 8,
        X2p0 = 9,
        X2p5 = 10,
        X3p0 = 11,
        X3p5 = 12,
        X4p0 = 13,
        X4p5 = 14,
        X5p0 = 15,
    }
}

field_enum! {
    /// Inductance derating assumed by slope compensation.
    pub enum InductorDerating in MfrSpecificD7, MfrD7Bits::INDUCTOR_DERATING.bits(), shift 4 {
        Disabled = 0,
        Pct20 = 1,
        Pct30 = 2,
        Pct40 = 3,
    }
}

field_enum! {
    /// Cable drop compensation gain.
    pub enum CdcGain in MfrSpecificD8, MfrD8Bits::CDC_GAIN.bits(), shift 0 {
        X1 = 0,
        X2 = 1,
        X4 = 2,
        X8 = 3,
    }
}

field_enum! {
    /// Supply rail of the DRV1 gate driver.
    pub enum Drv1Supply in MfrSpecificD8, MfrD8Bits::DRV1_SUPPLY.bits(), shift 3 {
        Vcc2 = 0,
        Vout = 1,
    }
}

field_enum! {
    /// When DRV1 drives its external switch on.
    pub enum Drv1Sequence in MfrSpecificD8, MfrD8Bits::DRV1_SEQUENCE.bits(), shift 4 {
        Off = 0,
        On = 1,
        WithConverter = 2,
        AfterPowerGood = 3,
    }
}
