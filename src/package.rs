//! Device packages
//!
//! The GD32VF103 ships in four packages that bond out different subsets of
//! the GPIO ports. A pin that is not bonded out cannot be driven externally
//! and is therefore not a wake-up source.

use crate::gpio::{Pin, Port};

/// GD32VF103 package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Package {
    /// QFN36, GD32VF103Tx
    Qfn36,
    /// LQFP48, GD32VF103Cx
    Lqfp48,
    /// LQFP64, GD32VF103Rx
    Lqfp64,
    /// LQFP100, GD32VF103Vx
    Lqfp100,
}

impl Package {
    /// Bit mask of the bonded-out pins of `port`
    pub const fn port_mask(self, port: Port) -> u16 {
        match (self, port) {
            (_, Port::A) => 0xffff,

            (Package::Qfn36, Port::B) => 0x00ff,
            (Package::Qfn36, Port::D) => 0b11,
            (Package::Qfn36, _) => 0,

            (Package::Lqfp48, Port::B) => 0xffff,
            (Package::Lqfp48, Port::C) => 0b111 << 13,
            (Package::Lqfp48, Port::D) => 0b11,
            (Package::Lqfp48, Port::E) => 0,

            (Package::Lqfp64, Port::B) | (Package::Lqfp64, Port::C) => 0xffff,
            (Package::Lqfp64, Port::D) => 0b111,
            (Package::Lqfp64, Port::E) => 0,

            (Package::Lqfp100, _) => 0xffff,
        }
    }

    /// Returns `true` if `pin` is bonded out on this package
    pub const fn has_pin(self, pin: Pin) -> bool {
        pin.index < Pin::PER_PORT && self.port_mask(pin.port) & (1 << pin.index) != 0
    }
}

impl Default for Package {
    fn default() -> Self {
        Package::Lqfp64
    }
}
