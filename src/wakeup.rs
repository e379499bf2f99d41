//! Wake-up sources
//!
//! Book-keeping for the pins armed to end a low-power state. Every GPIO pin is
//! wired to the EXTI line of the same number, one port per line, so at most 16
//! pins can be armed at a time. In deep-sleep any armed line wakes the core;
//! in standby only the dedicated [`WKUP`] pin on a rising edge does.
//!
//! RTC alarms are armed by the RTC driver and are not tracked here.

use core::fmt;

use crate::gpio::{Pin, WKUP};
use crate::package::Package;

/// Edge or level that triggers a wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerMode {
    /// Low to high transition
    RisingEdge,
    /// High to low transition
    FallingEdge,
    /// Any transition
    BothEdges,
    /// Level sensitive. The EXTI block only detects edges, so this is rejected
    Level,
}

impl TriggerMode {
    /// `(rising, falling)` edge detector enables for this mode
    pub const fn edges(self) -> Option<(bool, bool)> {
        match self {
            TriggerMode::RisingEdge => Some((true, false)),
            TriggerMode::FallingEdge => Some((false, true)),
            TriggerMode::BothEdges => Some((true, true)),
            TriggerMode::Level => None,
        }
    }
}

/// An armed wake-up source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum WakeSource {
    /// External pin routed through EXTI
    Pin {
        /// Pin
        pin: Pin,
        /// Trigger
        mode: TriggerMode,
    },
}

/// Reason a wake-up source was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidWakeSource {
    /// The pin does not exist on this package
    NotWakeCapable,
    /// The trigger mode can not be detected by the EXTI block
    UnsupportedTrigger,
    /// The EXTI line is already routed to a pin of another port
    LineInUse,
}

impl fmt::Display for InvalidWakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidWakeSource::NotWakeCapable => f.write_str("pin is not wake-up capable on this package"),
            InvalidWakeSource::UnsupportedTrigger => f.write_str("trigger mode is not supported"),
            InvalidWakeSource::LineInUse => f.write_str("EXTI line is armed for another port"),
        }
    }
}

const LINES: usize = Pin::PER_PORT as usize;

/// Set of armed wake-up pins
#[derive(Debug, Clone)]
pub struct WakeupPins {
    package: Package,
    lines: [Option<(Pin, TriggerMode)>; LINES],
}

impl WakeupPins {
    /// Creates an empty set for `package`
    pub const fn new(package: Package) -> Self {
        WakeupPins {
            package,
            lines: [None; LINES],
        }
    }

    /// Package the pins are validated against
    pub fn package(&self) -> Package {
        self.package
    }

    /// Checks that `pin` can be armed with `mode` and returns its EXTI line
    pub fn validate(&self, pin: Pin, mode: TriggerMode) -> Result<usize, InvalidWakeSource> {
        if !self.package.has_pin(pin) {
            return Err(InvalidWakeSource::NotWakeCapable);
        }
        if mode.edges().is_none() {
            return Err(InvalidWakeSource::UnsupportedTrigger);
        }
        let line = pin.exti_line().ok_or(InvalidWakeSource::NotWakeCapable)? as usize;
        match self.lines[line] {
            Some((armed, _)) if armed != pin => Err(InvalidWakeSource::LineInUse),
            _ => Ok(line),
        }
    }

    /// Arms `pin`, replacing the trigger mode if it is already armed.
    /// On error the set is left unchanged.
    pub fn arm(&mut self, pin: Pin, mode: TriggerMode) -> Result<(), InvalidWakeSource> {
        let line = self.validate(pin, mode)?;
        self.lines[line] = Some((pin, mode));
        Ok(())
    }

    /// Disarms `pin`. Returns `false` if it was not armed
    pub fn disarm(&mut self, pin: Pin) -> bool {
        match pin.exti_line().map(usize::from) {
            Some(line) if matches!(self.lines[line], Some((armed, _)) if armed == pin) => {
                self.lines[line] = None;
                true
            }
            _ => false,
        }
    }

    /// Trigger mode of `pin`, if armed
    pub fn mode_of(&self, pin: Pin) -> Option<TriggerMode> {
        let line = usize::from(pin.exti_line()?);
        match self.lines[line] {
            Some((armed, mode)) if armed == pin => Some(mode),
            _ => None,
        }
    }

    /// Iterates over the armed sources, lowest EXTI line first
    pub fn armed(&self) -> impl Iterator<Item = WakeSource> + '_ {
        self.lines
            .iter()
            .flatten()
            .map(|&(pin, mode)| WakeSource::Pin { pin, mode })
    }

    /// Iterates over the armed pins, lowest EXTI line first
    pub fn armed_pins(&self) -> impl Iterator<Item = Pin> + '_ {
        self.lines.iter().flatten().map(|&(pin, _)| pin)
    }

    /// Returns `true` if nothing is armed
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Option::is_none)
    }

    /// Returns `true` if the WKUP pin is armed on a rising edge, the only pin
    /// source that can end standby
    pub fn is_standby_wakeup_armed(&self) -> bool {
        matches!(self.mode_of(WKUP), Some(TriggerMode::RisingEdge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Port;

    const PA3: Pin = Pin::new(Port::A, 3);
    const PB3: Pin = Pin::new(Port::B, 3);

    #[test]
    fn rearming_replaces_mode() {
        let mut pins = WakeupPins::new(Package::Lqfp64);
        pins.arm(PA3, TriggerMode::RisingEdge).unwrap();
        pins.arm(PA3, TriggerMode::FallingEdge).unwrap();
        assert_eq!(pins.mode_of(PA3), Some(TriggerMode::FallingEdge));
        assert_eq!(pins.armed().count(), 1);
    }

    #[test]
    fn shared_line_is_rejected() {
        let mut pins = WakeupPins::new(Package::Lqfp64);
        pins.arm(PA3, TriggerMode::RisingEdge).unwrap();
        assert_eq!(pins.arm(PB3, TriggerMode::RisingEdge), Err(InvalidWakeSource::LineInUse));
        assert_eq!(pins.mode_of(PB3), None);
        assert!(pins.disarm(PA3));
        assert!(pins.arm(PB3, TriggerMode::RisingEdge).is_ok());
    }

    #[test]
    fn level_trigger_is_rejected() {
        let mut pins = WakeupPins::new(Package::Lqfp64);
        assert_eq!(pins.arm(PA3, TriggerMode::Level), Err(InvalidWakeSource::UnsupportedTrigger));
        assert!(pins.is_empty());
    }

    #[test]
    fn disarm_unknown_pin() {
        let mut pins = WakeupPins::new(Package::Lqfp64);
        pins.arm(PA3, TriggerMode::RisingEdge).unwrap();
        assert!(!pins.disarm(PB3));
        assert!(!pins.disarm(Pin::new(Port::A, 42)));
        assert_eq!(pins.mode_of(PA3), Some(TriggerMode::RisingEdge));
    }

    #[test]
    fn standby_needs_wkup_rising() {
        let mut pins = WakeupPins::new(Package::Qfn36);
        assert!(!pins.is_standby_wakeup_armed());
        pins.arm(WKUP, TriggerMode::FallingEdge).unwrap();
        assert!(!pins.is_standby_wakeup_armed());
        pins.arm(WKUP, TriggerMode::RisingEdge).unwrap();
        assert!(pins.is_standby_wakeup_armed());
    }

    #[test]
    fn armed_is_ordered_by_line() {
        let mut pins = WakeupPins::new(Package::Lqfp100);
        pins.arm(Pin::new(Port::E, 9), TriggerMode::BothEdges).unwrap();
        pins.arm(Pin::new(Port::C, 2), TriggerMode::RisingEdge).unwrap();
        let lines: Vec<_> = pins
            .armed()
            .map(|source| match source {
                WakeSource::Pin { pin, .. } => pin.index,
            })
            .collect();
        assert_eq!(lines, [2, 9]);
    }
}
