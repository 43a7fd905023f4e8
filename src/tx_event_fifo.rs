//! Transmit event FIFO operations.
//!
//! Frames sent with event storage enabled leave a two-word event
//! element behind. Events carry no payload, so they are copied out
//! completely and acknowledged in one step.

use crate::bus::Can;
use crate::interface::Interface;
use crate::message::TxEvent;
use crate::reg;
use bitfield::bitfield;
use core::convert::Infallible;
use core::fmt::{self, Debug};

bitfield! {
    /// Transmit event FIFO status register contents (TXEFS).
    #[derive(Copy, Clone)]
    pub struct TxEventFifoStatus(u32);

    /// Event FIFO Fill Level
    pub u8, effl, _: 5, 0;
    /// Event FIFO Get Index
    pub u8, efgi, _: 12, 8;
    /// Event FIFO Put Index
    pub u8, efpi, _: 20, 16;
    /// Event FIFO Full
    pub eff, _: 24;
    /// Tx Event FIFO Element Lost
    pub tefl, _: 25;
}

impl Debug for TxEventFifoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxEventFifoStatus")
            .field("tefl", &self.tefl())
            .field("eff", &self.eff())
            .field("efpi", &self.efpi())
            .field("efgi", &self.efgi())
            .field("effl", &self.effl())
            .finish()
    }
}

impl<I: Interface> Can<I> {
    /// Fill level, indices and overflow flags of the event FIFO.
    pub fn tx_event_fifo_status(&self) -> TxEventFifoStatus {
        TxEventFifoStatus(self.interface.read(reg::TXEFS))
    }

    /// Returns and acknowledges the oldest stored TX event. Fails with
    /// [`nb::Error::WouldBlock`] while the event FIFO is empty.
    pub fn next_tx_event(&mut self) -> nb::Result<TxEvent, Infallible> {
        let status = self.tx_event_fifo_status();
        if status.effl() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let get_index = status.efgi();
        let region = self.layout.tx_event_fifo;
        let address = self.element_address(&region, get_index.into());
        let event = TxEvent::decode([
            self.interface.read(address),
            self.interface.read(address + 4),
        ]);
        self.interface.write(reg::TXEFA, get_index.into());
        Ok(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::test::operational;
    use crate::message::TxEventType;
    use embedded_can::{Id, StandardId};

    #[test]
    fn empty_event_fifo_would_block() {
        let mut can = operational();
        assert!(matches!(can.next_tx_event(), Err(nb::Error::WouldBlock)));
    }

    #[test]
    fn events_are_decoded_and_acknowledged() {
        let mut can = operational();
        let region = can.layout.tx_event_fifo;
        // Two-word elements stride 8 bytes.
        assert_eq!(region.element_offset(1) - region.element_offset(0), 8);
        let address = can.element_address(&region, 1);
        can.interface.write(address, 0x70F << 18);
        can.interface
            .write(address + 4, 0x4321 | 8 << 16 | 1 << 22 | 0x5A << 24);

        can.interface.write(reg::TXEFS, 1 | 1 << 8);
        let event = can.next_tx_event().unwrap();
        assert_eq!(event.id, Id::Standard(StandardId::new(0x70F).unwrap()));
        assert_eq!(event.dlc, 8);
        assert_eq!(event.timestamp, 0x4321);
        assert_eq!(event.event_type, TxEventType::TxEvent);
        assert_eq!(event.message_marker, 0x5A);
        assert_eq!(can.interface.read(reg::TXEFA), 1);
    }
}
