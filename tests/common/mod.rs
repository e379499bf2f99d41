//! Host-side stand-in for the GD32VF103 power management unit

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use gd32vf103xx_lowpower::backup_domain::DATA_REGISTERS;
use gd32vf103xx_lowpower::gpio::{Pin, WKUP};
use gd32vf103xx_lowpower::pmu::{PowerControl, RegulatorMode, WakeupStatus};
use gd32vf103xx_lowpower::wakeup::TriggerMode;

/// Something the simulated hardware did, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    EnableBackupAccess,
    ClearStatus,
    Configure(Pin, TriggerMode),
    Disable(Pin),
    ClearPending(Pin),
    MaskInterrupts,
    RestoreInterrupts(bool),
    EnterSleep(RegulatorMode),
    EnterStop(RegulatorMode),
    EnterStandby,
    PowerDownRtc,
    ClockRecovery,
}

/// Interrupt or signal delivered while the core waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    Rising(Pin),
    Falling(Pin),
    RtcAlarm,
    /// Any other peripheral interrupt, e.g. a timer
    Peripheral,
}

/// Unwind payload: the device restarted from its reset vector
#[derive(Debug)]
pub struct DeviceReset;

/// Unwind payload: nothing could wake the device
#[derive(Debug)]
pub struct NeverWoke;

thread_local! {
    static EVENTS: RefCell<Vec<Event>> = RefCell::new(Vec::new());
    static HOOK_CALLS: Cell<u32> = Cell::new(0);
    static PENDING: Cell<Option<Stimulus>> = Cell::new(None);
}

/// Queues the next interrupt or signal the hardware will see
pub fn deliver(stimulus: Stimulus) {
    PENDING.with(|pending| pending.set(Some(stimulus)));
}

fn take_stimulus() -> Option<Stimulus> {
    PENDING.with(Cell::take)
}

pub fn record(event: Event) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

/// Drains the events recorded on this thread
pub fn take_events() -> Vec<Event> {
    EVENTS.with(|events| events.borrow_mut().drain(..).collect())
}

/// Clock recovery hook that counts its calls
pub fn counting_hook() {
    HOOK_CALLS.with(|calls| calls.set(calls.get() + 1));
    record(Event::ClockRecovery);
}

pub fn hook_calls() -> u32 {
    HOOK_CALLS.with(Cell::get)
}

/// State kept by the backup domain across a reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedDomain {
    pub data: [u16; DATA_REGISTERS],
    pub rtc_running: bool,
}

impl Default for RetainedDomain {
    fn default() -> Self {
        RetainedDomain {
            data: [0; DATA_REGISTERS],
            rtc_running: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct SimulatedPmu {
    pub backup: RetainedDomain,
    pub status: WakeupStatus,
    pub armed: BTreeMap<Pin, TriggerMode>,
    pub wkup_enabled: bool,
    /// EXTI pending bits of lines 0..15
    pub pending: u16,
    pub interrupts_enabled: bool,
    /// Standby/shutdown falls through, as with a pending wake-up flag
    pub refuse_standby: bool,
}

impl SimulatedPmu {
    pub fn new() -> Self {
        SimulatedPmu {
            interrupts_enabled: true,
            ..Default::default()
        }
    }

    /// Device state after a reset out of standby: only the backup domain
    /// and the standby flag survive
    pub fn after_reset(&self) -> Self {
        let mut backup = self.backup.clone();
        if !backup.rtc_running {
            // Without the LXTAL the domain is not kept alive
            backup.data = [0; DATA_REGISTERS];
        }
        SimulatedPmu {
            backup,
            status: WakeupStatus {
                standby: true,
                wakeup: true,
            },
            interrupts_enabled: true,
            ..Default::default()
        }
    }

    fn pin_fires(&self, pin: Pin, rising: bool) -> bool {
        match self.armed.get(&pin) {
            Some(TriggerMode::RisingEdge) => rising,
            Some(TriggerMode::FallingEdge) => !rising,
            Some(TriggerMode::BothEdges) => true,
            _ => false,
        }
    }

    /// Latches a pin edge in the pending register if its line is armed for it
    fn latch(&mut self, pin: Pin, rising: bool) -> bool {
        let fires = self.pin_fires(pin, rising);
        if fires {
            self.pending |= 1 << pin.index;
        }
        fires
    }

    fn armed_lines(&self) -> u16 {
        self.armed.keys().fold(0, |lines, pin| lines | 1 << pin.index)
    }

    fn exti_fires(&mut self, stimulus: Option<Stimulus>) -> bool {
        match stimulus {
            Some(Stimulus::Rising(pin)) => self.latch(pin, true),
            Some(Stimulus::Falling(pin)) => self.latch(pin, false),
            Some(Stimulus::RtcAlarm) => self.backup.rtc_running,
            Some(Stimulus::Peripheral) | None => false,
        }
    }
}

impl PowerControl for SimulatedPmu {
    fn enable_backup_access(&mut self) {
        record(Event::EnableBackupAccess);
    }

    fn wakeup_status(&self) -> WakeupStatus {
        self.status
    }

    fn clear_wakeup_status(&mut self) {
        record(Event::ClearStatus);
        self.status = WakeupStatus::default();
    }

    fn configure_wakeup_pin(&mut self, pin: Pin, mode: TriggerMode) {
        record(Event::Configure(pin, mode));
        self.armed.insert(pin, mode);
        self.pending &= !(1 << pin.index);
        if pin == WKUP {
            self.wkup_enabled = mode == TriggerMode::RisingEdge;
        }
    }

    fn disable_wakeup_pin(&mut self, pin: Pin) {
        record(Event::Disable(pin));
        self.armed.remove(&pin);
        self.pending &= !(1 << pin.index);
        if pin == WKUP {
            self.wkup_enabled = false;
        }
    }

    fn pending_wakeup_lines(&self) -> u16 {
        self.pending
    }

    fn clear_pending(&mut self, pin: Pin) {
        record(Event::ClearPending(pin));
        self.pending &= !(1 << pin.index);
    }

    fn mask_interrupts(&mut self) -> bool {
        record(Event::MaskInterrupts);
        std::mem::replace(&mut self.interrupts_enabled, false)
    }

    fn restore_interrupts(&mut self, enabled: bool) {
        record(Event::RestoreInterrupts(enabled));
        self.interrupts_enabled = enabled;
    }

    fn enter_sleep(&mut self, regulator: RegulatorMode) {
        record(Event::EnterSleep(regulator));
        if take_stimulus().is_none() {
            std::panic::panic_any(NeverWoke);
        }
    }

    fn enter_stop(&mut self, regulator: RegulatorMode) {
        record(Event::EnterStop(regulator));
        // A pending armed line ends the wait at once
        if self.pending & self.armed_lines() != 0 {
            return;
        }
        let stimulus = take_stimulus();
        if !self.exti_fires(stimulus) {
            std::panic::panic_any(NeverWoke);
        }
    }

    fn enter_standby(&mut self) {
        record(Event::EnterStandby);
        if self.refuse_standby {
            return;
        }
        let woke = match take_stimulus() {
            Some(Stimulus::Rising(pin)) => pin == WKUP && self.wkup_enabled,
            Some(Stimulus::RtcAlarm) => self.backup.rtc_running,
            _ => false,
        };
        if woke {
            std::panic::panic_any(DeviceReset);
        }
        std::panic::panic_any(NeverWoke);
    }

    fn power_down_rtc(&mut self) {
        record(Event::PowerDownRtc);
        self.backup.rtc_running = false;
    }
}
