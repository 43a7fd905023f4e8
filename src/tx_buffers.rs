//! Transmit buffer and FIFO/queue operations.
//!
//! The transmit section is one array of elements; dedicated buffers are
//! addressed by number, the FIFO/queue part through the put index the
//! hardware reports in TXFQS. Writing an element and requesting its
//! transmission are separate steps, matching the hardware protocol.

use crate::bus::{Can, TransferError};
use crate::interface::Interface;
use crate::message::tx;
use crate::reg;
use bitfield::bitfield;
use core::convert::Infallible;
use core::fmt::{self, Debug};

bitfield! {
    /// Transmit FIFO/queue status register contents (TXFQS).
    #[derive(Copy, Clone)]
    pub struct TxFifoQueueStatus(u32);

    /// Tx FIFO Free Level
    pub u8, tffl, _: 5, 0;
    /// Tx FIFO Get Index
    pub u8, tfgi, _: 12, 8;
    /// Tx FIFO/Queue Put Index
    pub u8, tfqpi, _: 20, 16;
    /// Tx FIFO/Queue Full
    pub tfqf, _: 21;
}

impl Debug for TxFifoQueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxFifoQueueStatus")
            .field("tfqf", &self.tfqf())
            .field("tfqpi", &self.tfqpi())
            .field("tfgi", &self.tfgi())
            .field("tffl", &self.tffl())
            .finish()
    }
}

/// A set of transmit buffers, which may be dedicated buffers or part of
/// the queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TxBufferSet(pub u32);

impl FromIterator<usize> for TxBufferSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut set = 0_u32;
        for i in iter.into_iter() {
            set |= 1u32 << i;
        }
        TxBufferSet(set)
    }
}

impl TxBufferSet {
    /// Returns the set of all transmit buffers
    pub fn all() -> Self {
        Self(u32::MAX)
    }

    /// `true` if buffer `index` is in the set
    pub fn contains(&self, index: usize) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    /// An iterator visiting all elements in arbitrary order.
    pub fn iter(&self) -> Iter {
        Iter {
            flags: *self,
            index: 0,
        }
    }
}

/// An iterator over the buffer indexes of the buffers in a
/// [`TxBufferSet`].
///
/// This `struct` is created by [`TxBufferSet::iter`].
pub struct Iter {
    flags: TxBufferSet,
    index: u8,
}

impl Iterator for Iter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.index;
        self.index = self.index.saturating_add(1);
        if i > 31 {
            None
        } else if self.flags.0 & (1 << i) != 0 {
            Some(i as usize)
        } else {
            self.next()
        }
    }
}

impl<I: Interface> Can<I> {
    /// Free level, indices and full flag of the transmit FIFO/queue.
    pub fn tx_fifo_queue_status(&self) -> TxFifoQueueStatus {
        TxFifoQueueStatus(self.interface.read(reg::TXFQS))
    }

    /// Serializes `frame` into transmit buffer `index` without
    /// requesting transmission.
    ///
    /// The index addresses the whole transmit section, so both
    /// dedicated buffers and queue slots can be written; for queue
    /// slots prefer [`Self::transmit_queued`], which asks the hardware
    /// where to put the element.
    pub fn write_dedicated_tx(&mut self, index: u8, frame: &tx::Frame) -> Result<(), TransferError> {
        let offset = self
            .layout
            .tx_buffers
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        self.write_element(address, frame)
    }

    /// Requests transmission of buffer `index`.
    pub fn request_transmission(&mut self, index: u8) -> Result<(), TransferError> {
        if index >= self.layout.tx_buffers.count {
            return Err(TransferError::InvalidIndex);
        }
        self.add_request(index);
        Ok(())
    }

    /// Puts `frame` into the transmit FIFO/queue slot reported by the
    /// hardware and requests its transmission, returning the used
    /// index. Fails with [`nb::Error::WouldBlock`] while the queue is
    /// full.
    pub fn transmit_queued(&mut self, frame: &tx::Frame) -> nb::Result<u8, TransferError> {
        let status = self.tx_fifo_queue_status();
        if status.tfqf() {
            return Err(nb::Error::WouldBlock);
        }
        let index = status.tfqpi();
        let region = self.layout.tx_buffers;
        let address = self.element_address(&region, index.into());
        self.write_element(address, frame).map_err(nb::Error::Other)?;
        self.add_request(index);
        Ok(index)
    }

    fn add_request(&mut self, index: u8) {
        // TXBAR bits are set by writing 1; writing 0 leaves a pending
        // request unchanged, so no read-modify-write is needed.
        self.interface.write(reg::TXBAR, 1 << index);
    }

    /// Buffers with a transmission request the peripheral has not
    /// finished yet.
    pub fn pending_transmissions(&self) -> TxBufferSet {
        TxBufferSet(self.interface.read(reg::TXBRP))
    }

    /// Buffers whose transmission completed. The flags clear when a new
    /// request is made for the buffer.
    pub fn completed_transmissions(&self) -> TxBufferSet {
        TxBufferSet(self.interface.read(reg::TXBTO))
    }

    /// Buffers whose cancellation finished. The flags clear when a new
    /// request is made for the buffer.
    pub fn cancelled_transmissions(&self) -> TxBufferSet {
        TxBufferSet(self.interface.read(reg::TXBCF))
    }

    /// Requests cancellation of `to_be_cancelled`. Returns
    /// [`nb::Error::WouldBlock`] until the cancellation is finished. If
    /// a buffer that has started transmission is cancelled, it may
    /// still finish successfully, in which case the corresponding
    /// [`Self::completed_transmissions`] flag will be set as well.
    pub fn cancel_multi(&mut self, to_be_cancelled: TxBufferSet) -> nb::Result<(), Infallible> {
        self.poll_cancelled(to_be_cancelled).or_else(|_| {
            // TXBCR bits are set by writing 1, like TXBAR.
            self.interface.write(reg::TXBCR, to_be_cancelled.0);
            self.poll_cancelled(to_be_cancelled)
        })
    }

    /// Requests cancellation of a single buffer. See
    /// [`Self::cancel_multi`].
    pub fn cancel(&mut self, index: u8) -> nb::Result<(), Infallible> {
        self.cancel_multi(TxBufferSet(1 << index))
    }

    fn poll_cancelled(&self, to_be_cancelled: TxBufferSet) -> nb::Result<(), Infallible> {
        let finished = self.cancelled_transmissions();
        if finished.0 & to_be_cancelled.0 == to_be_cancelled.0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Allows the transmission-completed interrupt to be triggered by
    /// the buffers in `to_be_enabled`. Other buffers are unchanged.
    pub fn enable_transmission_completed_interrupt(&mut self, to_be_enabled: TxBufferSet) {
        let current = self.interface.read(reg::TXBTIE);
        self.interface.write(reg::TXBTIE, current | to_be_enabled.0);
    }

    /// Disallows the transmission-completed interrupt for the buffers
    /// in `to_be_disabled`. Other buffers are unchanged.
    pub fn disable_transmission_completed_interrupt(&mut self, to_be_disabled: TxBufferSet) {
        let current = self.interface.read(reg::TXBTIE);
        self.interface.write(reg::TXBTIE, current & !to_be_disabled.0);
    }

    /// Allows the cancellation-finished interrupt to be triggered by
    /// the buffers in `to_be_enabled`. Other buffers are unchanged.
    pub fn enable_cancellation_interrupt(&mut self, to_be_enabled: TxBufferSet) {
        let current = self.interface.read(reg::TXBCIE);
        self.interface.write(reg::TXBCIE, current | to_be_enabled.0);
    }

    /// Disallows the cancellation-finished interrupt for the buffers in
    /// `to_be_disabled`. Other buffers are unchanged.
    pub fn disable_cancellation_interrupt(&mut self, to_be_disabled: TxBufferSet) {
        let current = self.interface.read(reg::TXBCIE);
        self.interface.write(reg::TXBCIE, current & !to_be_disabled.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::test::operational;
    use embedded_can::StandardId;

    #[test]
    fn dedicated_write_and_request_are_separate_steps() {
        let mut can = operational();
        let frame = tx::Frame::classic(StandardId::new(0x321).unwrap(), &[9, 8, 7]).unwrap();
        can.write_dedicated_tx(0, &frame).unwrap();
        assert_eq!(can.interface.read(reg::TXBAR), 0);
        can.request_transmission(0).unwrap();
        assert_eq!(can.interface.read(reg::TXBAR), 1);
    }

    #[test]
    fn boundary_index_is_rejected() {
        let mut can = operational();
        let frame = tx::Frame::classic(StandardId::ZERO, &[]).unwrap();
        // 2 dedicated + 2 queue elements are configured.
        assert!(can.write_dedicated_tx(3, &frame).is_ok());
        assert_eq!(
            can.write_dedicated_tx(4, &frame),
            Err(TransferError::InvalidIndex)
        );
        assert_eq!(
            can.request_transmission(4),
            Err(TransferError::InvalidIndex)
        );
    }

    #[test]
    fn queued_transmit_uses_the_hardware_put_index() {
        let mut can = operational();
        let frame = tx::Frame::classic(StandardId::new(0x42).unwrap(), &[1]).unwrap();
        can.interface.write(reg::TXFQS, 2 << 16);
        let index = can.transmit_queued(&frame).unwrap();
        assert_eq!(index, 2);
        assert_eq!(can.interface.read(reg::TXBAR), 1 << 2);
        let offset = can.layout.tx_buffers.element_offset(2);
        let t0 = can.interface.read(can.interface.message_ram_base() + offset);
        assert_eq!(t0, 0x42 << 18);
    }

    #[test]
    fn full_queue_would_block() {
        let mut can = operational();
        let frame = tx::Frame::classic(StandardId::ZERO, &[]).unwrap();
        can.interface.write(reg::TXFQS, 1 << 21);
        assert!(matches!(
            can.transmit_queued(&frame),
            Err(nb::Error::WouldBlock)
        ));
    }

    #[test]
    fn cancellation_polls_the_finished_flags() {
        let mut can = operational();
        assert!(matches!(can.cancel(1), Err(nb::Error::WouldBlock)));
        assert_eq!(can.interface.read(reg::TXBCR), 1 << 1);
        // The peripheral reports the cancellation as finished.
        can.interface.write(reg::TXBCF, 1 << 1);
        assert!(can.cancel(1).is_ok());
    }

    #[test]
    fn interrupt_gates_are_read_modify_write() {
        let mut can = operational();
        can.enable_transmission_completed_interrupt([0, 3].into_iter().collect());
        can.enable_transmission_completed_interrupt([1].into_iter().collect());
        assert_eq!(can.interface.read(reg::TXBTIE), 0b1011);
        can.disable_transmission_completed_interrupt([0].into_iter().collect());
        assert_eq!(can.interface.read(reg::TXBTIE), 0b1010);

        can.enable_cancellation_interrupt(TxBufferSet::all());
        assert_eq!(can.interface.read(reg::TXBCIE), u32::MAX);
        can.disable_cancellation_interrupt([31].into_iter().collect());
        assert_eq!(can.interface.read(reg::TXBCIE), u32::MAX >> 1);
    }

    #[test]
    fn buffer_sets_collect_and_iterate() {
        let set: TxBufferSet = [0, 5, 31].into_iter().collect();
        assert!(set.contains(0) && set.contains(5) && set.contains(31));
        assert!(!set.contains(1));
        let mut iter = set.iter();
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next(), Some(5));
        assert_eq!(iter.next(), Some(31));
        assert_eq!(iter.next(), None);
    }
}
