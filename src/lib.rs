//! LM51772 Rust Driver
//!
//! Register-level driver for the TI LM51772 four-switch buck-boost controller over I2C.
//! Every register field gets a typed setter; physical values (mV, mA, percent) are validated
//! and converted before any bus traffic, and enumerated fields are closed enums so an
//! invalid bit pattern cannot be written. no-std, optional async, optional defmt logging.

#![no_std]

pub mod data_types;
pub mod driver;
pub mod error;
pub mod registers;

pub use data_types::{DeviceProfile, FeedbackDivider, I2cAddress};
pub use driver::Lm51772;
pub use error::Error;
pub use registers::{ALT_I2C_ADDRESS, DEFAULT_I2C_ADDRESS, Register};
