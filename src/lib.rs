//! Low-power mode control for the GD32VF103xx family
//!
//! Moves the device between run mode and the sleep, stop (deep-sleep), standby
//! and shutdown states, arms the pins that can wake it up, and hands control to
//! the application to rebuild its clock tree after a stop.
//!
//! ```no_run
//! use gd32vf103xx_lowpower::prelude::*;
//! use gd32vf103xx_lowpower::gpio::{Pin, Port};
//!
//! fn restore_pll() {
//!     // switch back from IRC8M to the PLL
//! }
//!
//! let dp = gd32vf103xx_lowpower::pac::Peripherals::take().unwrap();
//! let mut rcu = dp.RCU.constrain();
//! let pmu = dp.PMU.constrain(dp.EXTI, dp.AFIO, &mut rcu);
//!
//! let mut lp = LowPower::new(pmu, Config::default().package(Package::Lqfp48));
//! lp.init();
//! lp.set_clock_recovery_hook(restore_pll);
//! lp.enable_wakeup_pin(Pin::new(Port::A, 0), TriggerMode::RisingEdge).unwrap();
//! lp.stop();
//! let _woken_by = lp.woke_by();
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use gd32vf103_pac as pac;

#[macro_use]
mod fmt;

pub mod backup_domain;
pub mod gpio;
pub mod lowpower;
pub mod package;
pub mod pmu;
pub mod rcu;
pub mod wakeup;

/// Commonly used items
pub mod prelude {
    pub use crate::lowpower::{Config, LowPower, ModeEntryAborted, PowerState, ResetCause};
    pub use crate::package::Package;
    pub use crate::pmu::{PmuExt as _, PowerControl, RegulatorMode};
    pub use crate::rcu::RcuExt as _;
    pub use crate::wakeup::{InvalidWakeSource, TriggerMode, WakeSource};
}
