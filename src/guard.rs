//! Scoped access to the write protected configuration registers.

use crate::interface::Interface;
use crate::reg;

/// Write access to the protected configuration registers.
///
/// The region layout, filter mask and related registers reject writes
/// unless CCCR.CCE is set. `ConfigGuard` keeps the bit set for exactly
/// as long as it lives: acquisition sets it and waits for the
/// peripheral to reflect it, dropping clears it. Validation failures
/// that return early through `?` therefore cannot leave the controller
/// stuck in configuration mode.
///
/// The peripheral must be in initialization mode (CCCR.INIT set) for
/// the acquisition to take effect; the hardware ignores CCE otherwise.
pub struct ConfigGuard<'a, I: Interface> {
    interface: &'a mut I,
}

impl<'a, I: Interface> ConfigGuard<'a, I> {
    /// Sets CCCR.CCE and waits until the peripheral reflects it.
    pub fn acquire(interface: &'a mut I) -> Self {
        let cccr = interface.read(reg::CCCR);
        interface.write(reg::CCCR, cccr | reg::cccr::CCE);
        while interface.read(reg::CCCR) & reg::cccr::CCE == 0 {}
        Self { interface }
    }

    /// Reads a register while the guard is held.
    pub fn read(&self, offset: u32) -> u32 {
        self.interface.read(offset)
    }

    /// Writes a protected register.
    pub fn write(&mut self, offset: u32, value: u32) {
        self.interface.write(offset, value)
    }

    /// Read-modify-write of a protected register.
    pub fn modify(&mut self, offset: u32, f: impl FnOnce(u32) -> u32) {
        let value = self.interface.read(offset);
        self.interface.write(offset, f(value));
    }
}

impl<I: Interface> Drop for ConfigGuard<'_, I> {
    fn drop(&mut self) {
        let cccr = self.interface.read(reg::CCCR);
        self.interface.write(reg::CCCR, cccr & !reg::cccr::CCE);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Regs([u32; 64]);

    impl Interface for Regs {
        fn read(&self, offset: u32) -> u32 {
            self.0[offset as usize / 4]
        }
        fn write(&mut self, offset: u32, value: u32) {
            self.0[offset as usize / 4] = value;
        }
        fn message_ram_base(&self) -> u32 {
            0
        }
        fn message_ram_size(&self) -> u32 {
            0
        }
    }

    #[test]
    fn guard_sets_and_clears_cce() {
        let mut regs = Regs([0; 64]);
        {
            let mut guard = ConfigGuard::acquire(&mut regs);
            assert_ne!(guard.read(reg::CCCR) & reg::cccr::CCE, 0);
            guard.write(reg::GFC, 0x3);
        }
        assert_eq!(regs.read(reg::CCCR) & reg::cccr::CCE, 0);
        assert_eq!(regs.read(reg::GFC), 0x3);
    }

    #[test]
    fn early_return_still_locks() {
        fn failing_sequence(interface: &mut Regs) -> Result<(), ()> {
            let mut guard = ConfigGuard::acquire(interface);
            guard.write(reg::XIDAM, 0xFF);
            let validation: Result<(), ()> = Err(());
            validation?;
            guard.write(reg::GFC, 0x1);
            Ok(())
        }

        let mut regs = Regs([0; 64]);
        assert!(failing_sequence(&mut regs).is_err());
        assert_eq!(regs.read(reg::CCCR) & reg::cccr::CCE, 0);
        assert_eq!(regs.read(reg::XIDAM), 0xFF);
        assert_eq!(regs.read(reg::GFC), 0);
    }

    #[test]
    fn other_cccr_bits_survive_the_guard() {
        let mut regs = Regs([0; 64]);
        regs.write(reg::CCCR, reg::cccr::INIT);
        drop(ConfigGuard::acquire(&mut regs));
        assert_eq!(regs.read(reg::CCCR), reg::cccr::INIT);
    }
}
