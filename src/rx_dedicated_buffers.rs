//! Dedicated receive buffer operations.
//!
//! Dedicated buffers are addressed by number instead of a hardware
//! index. Reception is signalled through the new-data flag registers;
//! a flag must be cleared by software before the buffer can signal
//! again.

use crate::bus::{Can, TransferError};
use crate::interface::Interface;
use crate::message::rx;
use crate::reg;
use core::fmt::{self, Debug};

/// New-data flags of the 64 dedicated receive buffers (NDAT1/NDAT2).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct NewDataStatus {
    /// Flags of buffers 0..=31
    pub low: u32,
    /// Flags of buffers 32..=63
    pub high: u32,
}

impl NewDataStatus {
    /// `true` if buffer `index` holds an unread frame.
    pub fn is_set(&self, index: u8) -> bool {
        match index {
            0..=31 => self.low & (1 << index) != 0,
            32..=63 => self.high & (1 << (index - 32)) != 0,
            _ => false,
        }
    }

    /// `true` if no buffer holds an unread frame.
    pub fn is_empty(&self) -> bool {
        self.low == 0 && self.high == 0
    }
}

impl Debug for NewDataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NewDataStatus({:#010x}, {:#010x})", self.high, self.low)
    }
}

impl<I: Interface> Can<I> {
    /// Reads the dedicated receive buffer `index`.
    ///
    /// The buffer content is only meaningful while the corresponding
    /// new-data flag is set; the flag is left untouched so the payload
    /// reference stays valid until [`Self::clear_new_data`].
    pub fn receive_dedicated(&self, index: u8) -> Result<rx::Frame, TransferError> {
        let region = self.layout.rx_buffers;
        let offset = region
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        Ok(self.read_element(&region, address))
    }

    /// Snapshot of the new-data flags.
    pub fn new_data(&self) -> NewDataStatus {
        NewDataStatus {
            low: self.interface.read(reg::NDAT1),
            high: self.interface.read(reg::NDAT2),
        }
    }

    /// Clears the given new-data flags, handing the buffers back to the
    /// peripheral.
    pub fn clear_new_data(&mut self, status: NewDataStatus) {
        self.interface.write(reg::NDAT1, status.low);
        self.interface.write(reg::NDAT2, status.high);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::test::operational;
    use crate::message::tx;
    use embedded_can::{Id, StandardId};

    #[test]
    fn dedicated_buffers_read_back_what_was_stored() {
        let mut can = operational();
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        let frame = tx::Frame::classic(StandardId::new(0x7AB).unwrap(), &payload).unwrap();
        let region = can.layout.rx_buffers;
        let address = can.element_address(&region, 2);
        can.write_element(address, &frame).unwrap();

        let received = can.receive_dedicated(2).unwrap();
        assert_eq!(received.id, Id::Standard(StandardId::new(0x7AB).unwrap()));
        assert_eq!(received.dlc, 4);
        let mut buffer = [0; 8];
        assert_eq!(can.read_payload(&received, &mut buffer), &payload);
    }

    #[test]
    fn index_at_configured_count_is_rejected() {
        let can = operational();
        // 4 dedicated buffers are configured.
        assert!(can.receive_dedicated(3).is_ok());
        assert!(matches!(
            can.receive_dedicated(4),
            Err(TransferError::InvalidIndex)
        ));
    }

    #[test]
    fn new_data_flags_round_trip() {
        let mut can = operational();
        can.interface.write(reg::NDAT1, 1 << 3);
        can.interface.write(reg::NDAT2, 1 << 0);
        let status = can.new_data();
        assert!(status.is_set(3));
        assert!(status.is_set(32));
        assert!(!status.is_set(4));
        assert!(!status.is_empty());
        can.clear_new_data(status);
        assert_eq!(can.interface.read(reg::NDAT1), 1 << 3);
    }
}
