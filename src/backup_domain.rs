/*!
  Registers that are not reset as long as Vbat or Vdd has power.

  The registers retain their values during wakes from standby mode or system resets. They also
  retain their value when Vdd is switched off as long as V_BAT is powered.
  Writes to the backup domain must be enabled first, which is done by
  `Pmu::backup_domain(bkp)`.

  After `LowPower::shutdown(false)` the RTC oscillator is stopped and the data
  registers should be treated as lost.
*/

use core::fmt;

use vcell::VolatileCell;

use crate::pac::BKP;

/// Number of 16-bit data registers (`BKP_DATA0` to `BKP_DATA41`)
pub const DATA_REGISTERS: usize = 42;

/// Data register index out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backup data register index out of range (0..{})", DATA_REGISTERS)
    }
}

/// Offset of `BKP_DATAx` from the start of the BKP block. The registers are
/// split in two banks around the RTC and tamper registers.
pub const fn data_offset(index: usize) -> Option<usize> {
    match index {
        0..=9 => Some(0x04 + 4 * index),
        10..=41 => Some(0x40 + 4 * (index - 10)),
        _ => None,
    }
}

/**
  The existence of this struct indicates that writing to the the backup
  domain has been enabled. It is acquired by calling `backup_domain` on `Pmu`
*/
pub struct BackupDomain {
    _regs: BKP,
}

impl BackupDomain {
    pub(crate) fn new(bkp: BKP) -> Self {
        BackupDomain { _regs: bkp }
    }

    fn register(&self, index: usize) -> Option<&VolatileCell<u32>> {
        let offset = data_offset(index)?;
        // NOTE(unsafe) the offset is inside the BKP block, owned by `self`
        unsafe { Some(&*((BKP::ptr() as *const u8).add(offset) as *const VolatileCell<u32>)) }
    }

    /// Reads data register `index`
    pub fn read_data(&self, index: usize) -> Option<u16> {
        self.register(index).map(|reg| reg.get() as u16)
    }

    /// Writes data register `index`
    pub fn write_data(&mut self, index: usize, value: u16) -> Result<(), OutOfRange> {
        let reg = self.register(index).ok_or(OutOfRange)?;
        reg.set(u32::from(value));
        Ok(())
    }

    /// Releases the BKP peripheral
    pub fn free(self) -> BKP {
        self._regs
    }
}
