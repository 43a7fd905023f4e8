//! Receive FIFO operations.
//!
//! The hardware keeps the circulating get/put indices; they are read
//! from the status register at every operation and never cached. A
//! received element stays valid until it is acknowledged, which hands
//! the slot back to the peripheral.

use crate::bus::{Can, TransferError};
use crate::interface::Interface;
use crate::message::rx;
use crate::messageram::Region;
use crate::reg;
use bitfield::bitfield;
use core::convert::Infallible;
use core::fmt::{self, Debug};

/// Receive FIFO selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxFifo {
    /// Receive FIFO 0
    Fifo0,
    /// Receive FIFO 1
    Fifo1,
}

impl RxFifo {
    fn status_reg(self) -> u32 {
        match self {
            Self::Fifo0 => reg::RXF0S,
            Self::Fifo1 => reg::RXF1S,
        }
    }

    fn ack_reg(self) -> u32 {
        match self {
            Self::Fifo0 => reg::RXF0A,
            Self::Fifo1 => reg::RXF1A,
        }
    }
}

bitfield! {
    /// Receive FIFO status register contents (RXF0S/RXF1S).
    #[derive(Copy, Clone)]
    pub struct RxFifoStatus(u32);

    /// Rx FIFO Fill Level
    pub u8, ffl, _: 6, 0;
    /// Rx FIFO Get Index
    pub u8, fgi, _: 13, 8;
    /// Rx FIFO Put Index
    pub u8, fpi, _: 21, 16;
    /// Rx FIFO Full
    pub ff, _: 24;
    /// Rx FIFO Message Lost
    pub rfl, _: 25;
}

impl Debug for RxFifoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxFifoStatus")
            .field("rfl", &self.rfl())
            .field("ff", &self.ff())
            .field("fpi", &self.fpi())
            .field("fgi", &self.fgi())
            .field("ffl", &self.ffl())
            .finish()
    }
}

impl<I: Interface> Can<I> {
    fn rx_fifo_region(&self, fifo: RxFifo) -> &Region {
        match fifo {
            RxFifo::Fifo0 => &self.layout.rx_fifo_0,
            RxFifo::Fifo1 => &self.layout.rx_fifo_1,
        }
    }

    /// Fill level, indices and overflow flags of the FIFO.
    pub fn rx_fifo_status(&self, fifo: RxFifo) -> RxFifoStatus {
        RxFifoStatus(self.interface.read(fifo.status_reg()))
    }

    /// Returns the oldest unread element of the FIFO along with its
    /// index, without consuming it.
    ///
    /// The payload is referenced in place; copy it with
    /// [`Can::read_payload`] and then release the slot by passing the
    /// index to [`Can::acknowledge`]. Fails with
    /// [`nb::Error::WouldBlock`] while the FIFO is empty.
    pub fn receive(&mut self, fifo: RxFifo) -> nb::Result<(u8, rx::Frame), Infallible> {
        let status = self.rx_fifo_status(fifo);
        if status.ffl() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let get_index = status.fgi();
        let region = *self.rx_fifo_region(fifo);
        let address = self.element_address(&region, get_index.into());
        Ok((get_index, self.read_element(&region, address)))
    }

    /// Hands the element at `index` back to the peripheral.
    ///
    /// The index must come from [`Can::receive`] or the FIFO status;
    /// values beyond the configured FIFO size are rejected.
    pub fn acknowledge(&mut self, fifo: RxFifo, index: u8) -> Result<(), TransferError> {
        if index >= self.rx_fifo_region(fifo).count {
            return Err(TransferError::InvalidIndex);
        }
        self.interface.write(fifo.ack_reg(), index.into());
        Ok(())
    }
}
