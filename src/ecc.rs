//! ECC aggregator access sequences.
//!
//! The aggregator guards the message RAM with single-error-correction /
//! double-error-detection codes. Its control and error status registers
//! are serialized: a read delivers stale data unless a load request for
//! the target register has completed first. [`load`] implements that
//! request sequence; the public surface wraps it together with the
//! status and control accesses.

use crate::interface::Interface;
use crate::reg;

/// Message RAM bank number within the aggregator.
const MSG_RAM_BANK: u32 = 1;

/// Issues a load request for the serialized register at `reg_offset`
/// and spins until the aggregator signals completion.
///
/// The spin is unbounded on purpose: completion is guaranteed by the
/// hardware, there is no bail-out path that would leave the aggregator
/// in a defined state, and the wait is a handful of bus cycles. If the
/// hardware never completes, this call never returns.
pub(crate) fn load<I: Interface>(interface: &mut I, reg_offset: u32) {
    let request = MSG_RAM_BANK << reg::ecc::VECTOR_BANK_SHIFT
        | (reg_offset & 0xff) << reg::ecc::RD_SVBUS_ADDRESS_SHIFT
        | reg::ecc::RD_SVBUS;
    interface.write(reg::ecc::VECTOR, request);
    while interface.read(reg::ecc::VECTOR) & reg::ecc::RD_SVBUS_DONE == 0 {}
}

/// ECC check behavior for the message RAM bank.
#[derive(Copy, Clone, Debug)]
pub struct EccConfig {
    /// Generate check bits on writes
    pub enable: bool,
    /// Verify check bits on reads
    pub check: bool,
    /// Read-modify-write support for sub-word writes
    pub read_modify_write: bool,
}

/// Pending ECC error flags for the message RAM bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EccErrorStatus {
    /// A single bit error was detected and corrected
    pub single_bit: bool,
    /// A double bit error was detected
    pub double_bit: bool,
}

/// Error class selector for [`clear_error_status`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EccErrorType {
    /// Single bit (corrected) errors
    SingleBit,
    /// Double bit (uncorrectable) errors
    DoubleBit,
}

pub(crate) fn configure<I: Interface>(interface: &mut I, config: EccConfig) {
    load(interface, reg::ecc::CONTROL);
    let mut control = interface.read(reg::ecc::CONTROL);
    control &= !(reg::ecc::CONTROL_ECC_ENABLE
        | reg::ecc::CONTROL_ECC_CHECK
        | reg::ecc::CONTROL_ENABLE_RMW);
    if config.enable {
        control |= reg::ecc::CONTROL_ECC_ENABLE;
    }
    if config.check {
        control |= reg::ecc::CONTROL_ECC_CHECK;
    }
    if config.read_modify_write {
        control |= reg::ecc::CONTROL_ENABLE_RMW;
    }
    interface.write(reg::ecc::CONTROL, control);
}

pub(crate) fn error_status<I: Interface>(interface: &I) -> EccErrorStatus {
    EccErrorStatus {
        single_bit: interface.read(reg::ecc::SEC_STATUS0) & reg::ecc::MSGMEM_PEND != 0,
        double_bit: interface.read(reg::ecc::DED_STATUS0) & reg::ecc::MSGMEM_PEND != 0,
    }
}

pub(crate) fn clear_error_status<I: Interface>(interface: &mut I, error_type: EccErrorType) {
    load(interface, reg::ecc::ERROR_STATUS1);
    let clear = match error_type {
        EccErrorType::SingleBit => reg::ecc::STATUS_CLR_SEC,
        EccErrorType::DoubleBit => reg::ecc::STATUS_CLR_DED,
    };
    interface.write(reg::ecc::ERROR_STATUS1, clear);
}

#[cfg(test)]
mod test {
    use super::*;

    struct Aggregator {
        regs: [u32; 0x480 / 4],
        loads: usize,
    }

    impl Aggregator {
        fn new() -> Self {
            Self {
                regs: [0; 0x480 / 4],
                loads: 0,
            }
        }
    }

    impl Interface for Aggregator {
        fn read(&self, offset: u32) -> u32 {
            self.regs[offset as usize / 4]
        }
        fn write(&mut self, offset: u32, value: u32) {
            if offset == reg::ecc::VECTOR {
                // The load request completes immediately.
                self.regs[offset as usize / 4] = value | reg::ecc::RD_SVBUS_DONE;
                self.loads += 1;
            } else {
                self.regs[offset as usize / 4] = value;
            }
        }
        fn message_ram_base(&self) -> u32 {
            0
        }
        fn message_ram_size(&self) -> u32 {
            0
        }
    }

    #[test]
    fn load_encodes_bank_offset_and_read_bit() {
        let mut aggr = Aggregator::new();
        load(&mut aggr, reg::ecc::CONTROL);
        let vector = aggr.read(reg::ecc::VECTOR);
        assert_eq!(vector & 0x7ff, MSG_RAM_BANK);
        assert_eq!(
            (vector >> reg::ecc::RD_SVBUS_ADDRESS_SHIFT) & 0xff,
            reg::ecc::CONTROL & 0xff
        );
        assert_ne!(vector & reg::ecc::RD_SVBUS, 0);
    }

    #[test]
    fn configure_loads_before_touching_control() {
        let mut aggr = Aggregator::new();
        configure(
            &mut aggr,
            EccConfig {
                enable: true,
                check: true,
                read_modify_write: false,
            },
        );
        assert_eq!(aggr.loads, 1);
        assert_eq!(
            aggr.read(reg::ecc::CONTROL),
            reg::ecc::CONTROL_ECC_ENABLE | reg::ecc::CONTROL_ECC_CHECK
        );
    }

    #[test]
    fn error_status_reflects_pending_flags() {
        let mut aggr = Aggregator::new();
        aggr.write(reg::ecc::SEC_STATUS0, reg::ecc::MSGMEM_PEND);
        assert_eq!(
            error_status(&aggr),
            EccErrorStatus {
                single_bit: true,
                double_bit: false,
            }
        );
    }

    #[test]
    fn clearing_writes_the_clear_bit_after_a_load() {
        let mut aggr = Aggregator::new();
        clear_error_status(&mut aggr, EccErrorType::DoubleBit);
        assert_eq!(aggr.loads, 1);
        assert_eq!(aggr.read(reg::ecc::ERROR_STATUS1), reg::ecc::STATUS_CLR_DED);
    }
}
