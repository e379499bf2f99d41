//! Reset and clock unit
//!
//! Only the parts needed around low-power modes: clock gating of the PMU,
//! BKP and AFIO interfaces, and RTC control in the backup domain. Rebuilding
//! the system clock after a stop is up to the application.

use crate::pac::{rcu, RCU};

/// Extension trait that constrains the `RCU` peripheral
pub trait RcuExt {
    /// Constrains the `RCU` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcu;
}

impl RcuExt for RCU {
    fn constrain(self) -> Rcu {
        Rcu {
            apb1: APB1 { _0: () },
            apb2: APB2 { _0: () },
        }
    }
}

/// Constrained RCU peripheral
pub struct Rcu {
    /// Advanced Peripheral Bus 1 (APB1) registers
    pub apb1: APB1,
    /// Advanced Peripheral Bus 2 (APB2) registers
    pub apb2: APB2,
}

/// Advanced Peripheral Bus 1 (APB1) registers
pub struct APB1 {
    _0: (),
}

impl APB1 {
    pub(crate) fn en(&mut self) -> &rcu::APB1EN {
        // NOTE(unsafe) this proxy grants exclusive access to this register
        unsafe { &(*RCU::ptr()).apb1en }
    }
}

/// Advanced Peripheral Bus 2 (APB2) registers
pub struct APB2 {
    _0: (),
}

impl APB2 {
    pub(crate) fn en(&mut self) -> &rcu::APB2EN {
        // NOTE(unsafe) this proxy grants exclusive access to this register
        unsafe { &(*RCU::ptr()).apb2en }
    }
}

/// Backup domain control register (`RCU_BDCTL`)
///
/// Lives in the backup domain: writes only take effect once `PMU_CTL.BKPWEN`
/// is set. Owned by [`Pmu`](crate::pmu::Pmu), which is the only writer of
/// backup domain state in this crate.
pub struct BDCTL {
    _0: (),
}

impl BDCTL {
    pub(crate) fn new() -> Self {
        BDCTL { _0: () }
    }

    fn bdctl(&self) -> &rcu::BDCTL {
        // NOTE(unsafe) this proxy grants exclusive access to this register
        unsafe { &(*RCU::ptr()).bdctl }
    }

    /// Returns `true` if the RTC clock is running
    pub fn rtc_enabled(&self) -> bool {
        self.bdctl().read().rtcen().bit_is_set()
    }

    /// Stops the RTC and the LXTAL oscillator feeding it.
    ///
    /// The RTC counter and the backup data registers are no longer maintained
    /// once the device goes to standby on V_DD only.
    pub fn power_down_rtc(&mut self) {
        self.bdctl().modify(|_, w| w.rtcen().clear_bit().lxtalen().clear_bit());
    }
}

/// Bus associated to peripheral
pub trait RcuBus {
    /// Bus type;
    type Bus;
}

/// Enable peripheral clock
pub(crate) trait Enable: RcuBus {
    fn enable(apb: &mut Self::Bus);
}

macro_rules! bus {
    ($($PER:ident => ($apbX:ty, $peren:ident),)+) => {
        $(
            impl RcuBus for crate::pac::$PER {
                type Bus = $apbX;
            }
            impl Enable for crate::pac::$PER {
                #[inline(always)]
                fn enable(apb: &mut Self::Bus) {
                    apb.en().modify(|_, w| w.$peren().set_bit());
                }
            }
        )+
    }
}

bus! {
    PMU => (APB1, pmuen),
    BKP => (APB1, bkpien),
    AFIO => (APB2, afen),
}
