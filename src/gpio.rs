//! Pin identifiers
//!
//! Wake-up arming works on run-time pin identifiers rather than the typestate
//! pins of the HAL: the pin only has to exist on the package and be routable to
//! an EXTI line, its electrical mode is left to the application.

use core::fmt;

/// GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// GPIOA
    A,
    /// GPIOB
    B,
    /// GPIOC
    C,
    /// GPIOD
    D,
    /// GPIOE
    E,
}

impl Port {
    /// Value of the AFIO `EXTISSx` field that routes an EXTI line to this port
    pub const fn exti_source(self) -> u8 {
        match self {
            Port::A => 0b000,
            Port::B => 0b001,
            Port::C => 0b010,
            Port::D => 0b011,
            Port::E => 0b100,
        }
    }
}

/// A single GPIO pin, e.g. `PA0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    /// Port the pin belongs to
    pub port: Port,
    /// Pin number within the port, `0..=15`
    pub index: u8,
}

/// Dedicated WKUP pin, the only pin that can end standby
pub const WKUP: Pin = Pin::new(Port::A, 0);

impl Pin {
    /// Number of pins per port
    pub const PER_PORT: u8 = 16;

    /// Creates a pin identifier. The index is not checked here, see
    /// [`Package::has_pin`](crate::package::Package::has_pin)
    pub const fn new(port: Port, index: u8) -> Self {
        Pin { port, index }
    }

    /// EXTI line the pin is routed to, if the index is valid
    pub const fn exti_line(&self) -> Option<u8> {
        if self.index < Self::PER_PORT {
            Some(self.index)
        } else {
            None
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{:?}{}", self.port, self.index)
    }
}
