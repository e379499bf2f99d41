//! Power management unit
//!
//! [`PowerControl`] is the set of primitives the low-power state machine
//! needs from the hardware. [`Pmu`] implements it on top of the `PMU`, `EXTI`,
//! `AFIO` and `RCU` registers of the GD32VF103.
//!
//! The Bumblebee core selects between sleep and deep-sleep with bit 0 of the
//! custom `sleepvalue` CSR (`0x811`), then enters the mode on `wfi`. A pending
//! interrupt that is enabled in the ECLIC ends the wait even while `mstatus.MIE`
//! is cleared, which is how the state machine wakes with interrupts masked.
//! Unmasking the EXTI interrupts in the ECLIC is left to the application.

use crate::backup_domain::BackupDomain;
use crate::gpio::{Pin, WKUP};
use crate::pac::{AFIO, BKP, EXTI, PMU};
use crate::rcu::{Enable, Rcu, BDCTL};
use crate::wakeup::TriggerMode;

/// Voltage regulator behaviour while the core is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorMode {
    /// LDO in normal mode: highest consumption, fastest wake-up
    Main,
    /// LDO in low-power mode
    LowPower,
}

/// Wake-up flags of the `PMU_CS` register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeupStatus {
    /// The device has been in standby since the flag was last cleared
    pub standby: bool,
    /// A wake-up event (WKUP pin or RTC alarm) was received
    pub wakeup: bool,
}

/// Hardware primitives for entering and leaving low-power modes.
///
/// Implementations perform the register accesses only; the ordering of a
/// transition (masking, flag clearing, clock recovery) belongs to
/// [`LowPower`](crate::lowpower::LowPower). Every primitive is assumed to
/// succeed.
pub trait PowerControl {
    /// Enables the PMU and backup interface clocks and write access to the
    /// backup domain
    fn enable_backup_access(&mut self);

    /// Reads the wake-up flags
    fn wakeup_status(&self) -> WakeupStatus;

    /// Clears the wake-up flags
    fn clear_wakeup_status(&mut self);

    /// Configures wake detection on `pin`. `pin` and `mode` have been
    /// validated by the caller
    fn configure_wakeup_pin(&mut self, pin: Pin, mode: TriggerMode);

    /// Stops wake detection on `pin`
    fn disable_wakeup_pin(&mut self, pin: Pin);

    /// Pending EXTI lines 0..15, bit `n` set when line `n` saw its edge
    fn pending_wakeup_lines(&self) -> u16;

    /// Clears the pending edge on the EXTI line of `pin`
    fn clear_pending(&mut self, pin: Pin);

    /// Masks interrupts globally and returns whether they were enabled
    fn mask_interrupts(&mut self) -> bool;

    /// Unmasks interrupts if `enabled` is `true`
    fn restore_interrupts(&mut self, enabled: bool);

    /// Sleep: only the core clock is stopped. Returns on any interrupt
    fn enter_sleep(&mut self, regulator: RegulatorMode);

    /// Stop: all clocks of the 1.2V domain are stopped, SRAM and registers
    /// are retained. Returns on wake-up, running from the internal oscillator
    fn enter_stop(&mut self, regulator: RegulatorMode);

    /// Standby: the 1.2V domain is powered off. A wake-up resets the device,
    /// so this only returns if the mode could not be entered
    fn enter_standby(&mut self);

    /// Stops the RTC and its oscillator
    fn power_down_rtc(&mut self);

    /// Shutdown: the deepest mode. Only returns if the mode could not be
    /// entered.
    ///
    /// Parts without a dedicated shutdown mode go to standby, powering down
    /// the RTC first unless `retain_rtc` is set.
    fn enter_shutdown(&mut self, retain_rtc: bool) {
        if !retain_rtc {
            self.power_down_rtc();
        }
        self.enter_standby();
    }
}

/// Extension trait that constrains the `PMU` peripheral
pub trait PmuExt {
    /// Takes the registers used for low-power control and enables the PMU,
    /// BKP and AFIO clocks. `rcu` is only borrowed for the call
    fn constrain(self, exti: EXTI, afio: AFIO, rcu: &mut Rcu) -> Pmu;
}

impl PmuExt for PMU {
    fn constrain(self, exti: EXTI, afio: AFIO, rcu: &mut Rcu) -> Pmu {
        PMU::enable(&mut rcu.apb1);
        BKP::enable(&mut rcu.apb1);
        AFIO::enable(&mut rcu.apb2);

        Pmu {
            pmu: self,
            exti,
            afio,
            bdctl: BDCTL::new(),
        }
    }
}

/// GD32VF103 power management unit
pub struct Pmu {
    pmu: PMU,
    exti: EXTI,
    afio: AFIO,
    bdctl: BDCTL,
}

impl Pmu {
    /// Enables write access to the backup domain and returns its data registers
    pub fn backup_domain(&mut self, bkp: BKP) -> BackupDomain {
        self.enable_backup_access();
        BackupDomain::new(bkp)
    }

    /// Backup domain control, for the RTC driver
    pub fn bdctl(&mut self) -> &mut BDCTL {
        &mut self.bdctl
    }

    /// Releases the registers
    pub fn free(self) -> (PMU, EXTI, AFIO) {
        (self.pmu, self.exti, self.afio)
    }

    fn route_line(&mut self, pin: Pin, line: u8) {
        let shift = u32::from(line % 4) * 4;
        let source = u32::from(pin.port.exti_source()) << shift;
        let mask = !(0xf << shift);

        // NOTE(unsafe) EXTISSx only holds 4-bit port selectors
        match line / 4 {
            0 => self.afio.extiss0.modify(|r, w| unsafe { w.bits((r.bits() & mask) | source) }),
            1 => self.afio.extiss1.modify(|r, w| unsafe { w.bits((r.bits() & mask) | source) }),
            2 => self.afio.extiss2.modify(|r, w| unsafe { w.bits((r.bits() & mask) | source) }),
            _ => self.afio.extiss3.modify(|r, w| unsafe { w.bits((r.bits() & mask) | source) }),
        }
    }
}

#[inline(always)]
fn set_deep_sleep(deep: bool) {
    // NOTE(unsafe) sleepvalue only selects the depth of the next `wfi`
    #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
    unsafe {
        if deep {
            core::arch::asm!("csrsi 0x811, 1");
        } else {
            core::arch::asm!("csrci 0x811, 1");
        }
    }
    #[cfg(not(any(target_arch = "riscv32", target_arch = "riscv64")))]
    let _ = deep;
}

#[inline(always)]
fn wait_for_interrupt() {
    #[allow(unused_unsafe)]
    unsafe {
        riscv::asm::wfi();
    }
}

impl PowerControl for Pmu {
    fn enable_backup_access(&mut self) {
        // PMU and BKP clocks are on since `constrain`
        self.pmu.ctl.modify(|_, w| w.bkpwen().set_bit());
    }

    fn wakeup_status(&self) -> WakeupStatus {
        let cs = self.pmu.cs.read();
        WakeupStatus {
            standby: cs.stbf().bit_is_set(),
            wakeup: cs.wuf().bit_is_set(),
        }
    }

    fn clear_wakeup_status(&mut self) {
        self.pmu.ctl.modify(|_, w| w.wurst().set_bit().stbrst().set_bit());
    }

    fn configure_wakeup_pin(&mut self, pin: Pin, mode: TriggerMode) {
        let (rising, falling) = match (pin.exti_line(), mode.edges()) {
            (Some(_), Some(edges)) => edges,
            _ => return,
        };
        let line = pin.index;
        let mask = 1u32 << line;

        // Disarm while the port and edges change
        self.exti.inten.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        self.route_line(pin, line);
        self.exti.rten.modify(|r, w| unsafe {
            w.bits(if rising { r.bits() | mask } else { r.bits() & !mask })
        });
        self.exti.ften.modify(|r, w| unsafe {
            w.bits(if falling { r.bits() | mask } else { r.bits() & !mask })
        });
        // PD is write-one-to-clear
        self.exti.pd.write(|w| unsafe { w.bits(mask) });
        self.exti.inten.modify(|r, w| unsafe { w.bits(r.bits() | mask) });

        if pin == WKUP {
            self.pmu.cs.modify(|_, w| w.wupen().bit(mode == TriggerMode::RisingEdge));
        }
    }

    fn disable_wakeup_pin(&mut self, pin: Pin) {
        let line = match pin.exti_line() {
            Some(line) => line,
            None => return,
        };
        let mask = 1u32 << line;

        self.exti.inten.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        self.exti.rten.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        self.exti.ften.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        self.exti.pd.write(|w| unsafe { w.bits(mask) });

        if pin == WKUP {
            self.pmu.cs.modify(|_, w| w.wupen().clear_bit());
        }
    }

    fn pending_wakeup_lines(&self) -> u16 {
        self.exti.pd.read().bits() as u16
    }

    fn clear_pending(&mut self, pin: Pin) {
        if let Some(line) = pin.exti_line() {
            // PD is write-one-to-clear
            self.exti.pd.write(|w| unsafe { w.bits(1u32 << line) });
        }
    }

    fn mask_interrupts(&mut self) -> bool {
        let enabled = riscv::register::mstatus::read().mie();
        unsafe { riscv::interrupt::disable() };
        enabled
    }

    fn restore_interrupts(&mut self, enabled: bool) {
        if enabled {
            unsafe { riscv::interrupt::enable() };
        }
    }

    fn enter_sleep(&mut self, _regulator: RegulatorMode) {
        // The LDO mode only applies to deep-sleep on this part
        set_deep_sleep(false);
        wait_for_interrupt();
    }

    fn enter_stop(&mut self, regulator: RegulatorMode) {
        self.pmu.ctl.modify(|_, w| {
            w.stbmod()
                .clear_bit()
                .ldolp()
                .bit(regulator == RegulatorMode::LowPower)
        });
        set_deep_sleep(true);
        wait_for_interrupt();
        set_deep_sleep(false);
    }

    fn enter_standby(&mut self) {
        // Standby is not entered while WUF is set
        self.pmu.ctl.modify(|_, w| w.stbmod().set_bit().wurst().set_bit());
        set_deep_sleep(true);
        wait_for_interrupt();
        set_deep_sleep(false);
    }

    fn power_down_rtc(&mut self) {
        self.bdctl.power_down_rtc();
    }
}
