//! # Low-power modes
//!
//! [`LowPower`] owns the current [`PowerState`] and sequences every transition
//! from run mode into one of the low-power modes and back.
//!
//! | Mode       | SRAM     | Clocks   | Resumes at    | Clock recovery hook |
//! |------------|----------|----------|---------------|---------------------|
//! | `Sleep`    | retained | running  | the call site | no                  |
//! | `Stop`     | retained | stopped  | the call site | yes                 |
//! | `Standby`  | lost     | stopped  | reset vector  | n/a                 |
//! | `Shutdown` | lost     | stopped  | reset vector  | n/a                 |
//!
//! A low-power mode is only left through an interrupt or a reset, so arm at
//! least one wake-up source (or an RTC alarm) before calling [`LowPower::sleep`]
//! or [`LowPower::stop`]. This is not checked: the controller does not know
//! about every interrupt source in the system.
//!
//! After a stop the core runs from the 8MHz internal oscillator. Install a
//! hook with [`LowPower::set_clock_recovery_hook`] to bring the PLL back up.

use core::fmt;

use void::Void;

use crate::gpio::Pin;
use crate::package::Package;
use crate::pmu::{PowerControl, RegulatorMode};
use crate::wakeup::{InvalidWakeSource, TriggerMode, WakeupPins};

/// Power state of the device, from the least to the most power saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Executing
    Run,
    /// Core halted, clocks running
    Sleep,
    /// Clocks stopped, SRAM retained
    Stop,
    /// Powered down except for the backup domain
    Standby,
    /// Deepest mode, optionally without RTC
    Shutdown,
}

impl PowerState {
    /// SRAM and registers survive this state
    pub fn retains_ram(self) -> bool {
        self <= PowerState::Stop
    }

    /// The high speed clocks are stopped in this state
    pub fn suspends_clocks(self) -> bool {
        self >= PowerState::Stop
    }

    /// Execution continues after the call that entered this state
    pub fn resumes_at_call_site(self) -> bool {
        match self {
            PowerState::Run | PowerState::Sleep | PowerState::Stop => true,
            PowerState::Standby | PowerState::Shutdown => false,
        }
    }
}

/// What the device was doing before the current boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
    /// Power-on or any reset other than a standby wake-up
    PowerOn,
    /// Woken up from standby (or shutdown)
    StandbyWakeup,
}

/// The hardware did not enter standby or shutdown.
///
/// Usually a wake-up event was already pending, or a debugger kept the core
/// powered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeEntryAborted;

impl fmt::Display for ModeEntryAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("low-power mode entry aborted")
    }
}

/// Low-power configuration
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Package, decides which pins can be armed
    pub package: Package,
    /// Regulator mode used by [`LowPower::stop`]
    pub stop_regulator: RegulatorMode,
}

impl Config {
    /// Sets the package
    pub fn package(mut self, package: Package) -> Self {
        self.package = package;
        self
    }

    /// Sets the regulator mode used in stop
    pub fn stop_regulator(mut self, regulator: RegulatorMode) -> Self {
        self.stop_regulator = regulator;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            package: Package::default(),
            stop_regulator: RegulatorMode::LowPower,
        }
    }
}

/// Default clock recovery hook, does nothing
pub fn no_clock_recovery() {}

/// Low-power mode controller
pub struct LowPower<P> {
    pmu: P,
    config: Config,
    wakeup: WakeupPins,
    state: PowerState,
    clock_recovery: fn(),
    reset_cause: ResetCause,
    woke_by: Option<Pin>,
    initialized: bool,
}

impl<P: PowerControl> LowPower<P> {
    /// Creates the controller. No register is touched until [`init`](Self::init)
    pub fn new(pmu: P, config: Config) -> Self {
        LowPower {
            pmu,
            config,
            wakeup: WakeupPins::new(config.package),
            state: PowerState::Run,
            clock_recovery: no_clock_recovery,
            reset_cause: ResetCause::PowerOn,
            woke_by: None,
            initialized: false,
        }
    }

    /// One-time setup, call before anything else.
    ///
    /// Enables access to the backup domain, records whether this boot is a
    /// wake-up from standby and clears the wake-up flags. Calling it again
    /// has no effect.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }

        self.pmu.enable_backup_access();
        if self.pmu.wakeup_status().standby {
            self.reset_cause = ResetCause::StandbyWakeup;
        }
        self.pmu.clear_wakeup_status();

        self.state = PowerState::Run;
        self.initialized = true;
        debug!("low-power init, reset cause {}", self.reset_cause);
    }

    /// Current power state. Always `Run` when observed from the application
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Cause of the current boot, as recorded by [`init`](Self::init)
    pub fn reset_cause(&self) -> ResetCause {
        self.reset_cause
    }

    /// Armed wake-up pins
    pub fn wakeup_pins(&self) -> &WakeupPins {
        &self.wakeup
    }

    /// Armed pin whose edge ended the last [`stop`](Self::stop), lowest EXTI
    /// line first if several fired. `None` if another interrupt woke the core
    pub fn woke_by(&self) -> Option<Pin> {
        self.woke_by
    }

    /// Replaces the function called after waking up from stop.
    ///
    /// It runs with interrupts masked, before [`stop`](Self::stop) returns,
    /// and should restore the clock tree the application runs on. May be
    /// called before [`init`](Self::init).
    pub fn set_clock_recovery_hook(&mut self, hook: fn()) {
        self.clock_recovery = hook;
    }

    /// Arms `pin` as a wake-up source, replacing its trigger mode if already armed.
    ///
    /// Fails if the pin is not bonded out on the package, if the mode is not
    /// detectable, or if another port's pin holds the same EXTI line. The
    /// armed set is left unchanged on failure.
    pub fn enable_wakeup_pin(&mut self, pin: Pin, mode: TriggerMode) -> Result<(), InvalidWakeSource> {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        if let Err(e) = self.wakeup.arm(pin, mode) {
            warn!("rejected wake-up pin {}: {}", pin, e);
            return Err(e);
        }
        self.pmu.configure_wakeup_pin(pin, mode);
        trace!("armed {} on {}", pin, mode);
        Ok(())
    }

    /// Disarms `pin`. Does nothing if it was not armed
    pub fn disable_wakeup_pin(&mut self, pin: Pin) {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        if self.wakeup.disarm(pin) {
            self.pmu.disable_wakeup_pin(pin);
            trace!("disarmed {}", pin);
        }
    }

    /// Halts the core until the next interrupt. Clocks and SRAM are kept, the
    /// clock recovery hook is not called.
    pub fn sleep(&mut self, regulator: RegulatorMode) {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        trace!("enter sleep");
        self.state = PowerState::Sleep;
        self.pmu.enter_sleep(regulator);
        self.state = PowerState::Run;
        trace!("exit sleep");
    }

    /// Stops all high speed clocks until an armed source wakes the device.
    ///
    /// Returns after the clock recovery hook has run exactly once. The pending
    /// edges of the armed pins are cleared before the interrupt mask is
    /// restored, so their EXTI interrupts do not fire and the next stop waits
    /// for a new edge; [`woke_by`](Self::woke_by) tells which pin it was. Any
    /// other interrupt that woke the device is serviced once the mask is
    /// restored.
    pub fn stop(&mut self) {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        let enabled = self.pmu.mask_interrupts();
        self.pmu.clear_wakeup_status();

        trace!("enter stop");
        self.state = PowerState::Stop;
        self.pmu.enter_stop(self.config.stop_regulator);
        self.state = PowerState::Run;

        let pending = self.pmu.pending_wakeup_lines();
        let fired = |pin: &Pin| pin.exti_line().map_or(false, |line| pending & (1 << line) != 0);
        self.woke_by = self.wakeup.armed_pins().find(fired);

        (self.clock_recovery)();

        for pin in self.wakeup.armed_pins().filter(fired) {
            self.pmu.clear_pending(pin);
        }
        self.pmu.restore_interrupts(enabled);
        trace!("exit stop, woken by {}", self.woke_by);
    }

    /// Enters standby. A wake-up restarts the device from reset, so this
    /// only returns when standby could not be entered.
    pub fn standby(&mut self) -> Result<Void, ModeEntryAborted> {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        self.power_down(PowerState::Standby, |pmu| pmu.enter_standby())
    }

    /// Enters shutdown. A wake-up restarts the device from reset, so this
    /// only returns when shutdown could not be entered.
    ///
    /// With `retain_rtc` the RTC keeps running and the backup data registers
    /// are kept; without it neither is guaranteed.
    pub fn shutdown(&mut self, retain_rtc: bool) -> Result<Void, ModeEntryAborted> {
        debug_assert!(self.initialized, "LowPower::init has not been called");

        self.power_down(PowerState::Shutdown, |pmu| pmu.enter_shutdown(retain_rtc))
    }

    fn power_down<F>(&mut self, state: PowerState, enter: F) -> Result<Void, ModeEntryAborted>
    where
        F: FnOnce(&mut P),
    {
        let enabled = self.pmu.mask_interrupts();
        self.pmu.clear_wakeup_status();

        debug!("enter {}", state);
        self.state = state;
        enter(&mut self.pmu);

        // Still running: the mode was not entered
        self.state = PowerState::Run;
        self.pmu.restore_interrupts(enabled);
        warn!("{} entry aborted", state);
        Err(ModeEntryAborted)
    }

    /// Releases the power control primitives
    pub fn free(self) -> P {
        self.pmu
    }
}
