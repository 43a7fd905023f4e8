//! Read-only projections of the fixed-format status registers.
//!
//! Each view wraps the raw register word; the accessors pick the fields
//! apart without further hardware access. The FIFO and queue views live
//! next to their operations in [`rx_fifo`](crate::rx_fifo),
//! [`tx_buffers`](crate::tx_buffers) and
//! [`tx_event_fifo`](crate::tx_event_fifo).

use bitfield::bitfield;
use core::fmt::{self, Debug};

bitfield! {
    /// Error counter register contents (ECR).
    #[derive(Copy, Clone)]
    pub struct ErrorCounters(u32);

    /// Transmit error counter
    pub u8, tec, _: 7, 0;
    /// Receive error counter
    pub u8, rec, _: 14, 8;
    /// Receive error passive, set at 128 receive errors
    pub rp, _: 15;
    /// CAN error logging count
    pub u8, cel, _: 23, 16;
}

impl Debug for ErrorCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCounters")
            .field("cel", &self.cel())
            .field("rec", &self.rec())
            .field("rp", &self.rp())
            .field("tec", &self.tec())
            .finish()
    }
}

bitfield! {
    /// Protocol status register contents (PSR).
    #[derive(Copy, Clone)]
    pub struct ProtocolStatus(u32);

    /// Last error code
    pub u8, lec, _: 2, 0;
    /// Activity
    pub u8, act, _: 4, 3;
    /// Error passive
    pub ep, _: 5;
    /// Warning status, set at 96 errors
    pub ew, _: 6;
    /// Bus_Off status
    pub bo, _: 7;
    /// Last error code in the data phase
    pub u8, dlec, _: 10, 8;
    /// ESI flag of the last received CAN FD message
    pub resi, _: 11;
    /// BRS flag of the last received CAN FD message
    pub rbrs, _: 12;
    /// A CAN FD message was received since this bit was last cleared
    pub rfdf, _: 13;
    /// Protocol exception event occurred
    pub pxe, _: 14;
    /// Transmitter delay compensation value
    pub u8, tdcv, _: 22, 16;
}

impl ProtocolStatus {
    /// Decoded last error code of the arbitration phase.
    pub fn last_error_code(&self) -> LastErrorCode {
        self.lec().into()
    }

    /// Decoded last error code of the data phase.
    pub fn data_phase_last_error_code(&self) -> LastErrorCode {
        self.dlec().into()
    }

    /// Decoded communication state.
    pub fn activity(&self) -> Activity {
        match self.act() {
            0 => Activity::Synchronizing,
            1 => Activity::Idle,
            2 => Activity::Receiver,
            _ => Activity::Transmitter,
        }
    }
}

impl Debug for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolStatus")
            .field("tdcv", &self.tdcv())
            .field("pxe", &self.pxe())
            .field("rfdf", &self.rfdf())
            .field("rbrs", &self.rbrs())
            .field("resi", &self.resi())
            .field("dlec", &self.dlec())
            .field("bo", &self.bo())
            .field("ew", &self.ew())
            .field("ep", &self.ep())
            .field("act", &self.act())
            .field("lec", &self.lec())
            .finish()
    }
}

/// Type of the last error that occurred on the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LastErrorCode {
    /// No error since the flag was last read
    None,
    /// More than five equal bits in a row
    Stuff,
    /// Fixed format part of a frame had the wrong format
    Form,
    /// Transmitted message was not acknowledged
    Ack,
    /// Sent recessive, monitored dominant
    Bit1,
    /// Sent dominant, monitored recessive
    Bit0,
    /// CRC check of a received message failed
    Crc,
    /// No CAN bus event since the flag was last read
    NoChange,
}

impl From<u8> for LastErrorCode {
    fn from(value: u8) -> Self {
        match value & 0x7 {
            0 => Self::None,
            1 => Self::Stuff,
            2 => Self::Form,
            3 => Self::Ack,
            4 => Self::Bit1,
            5 => Self::Bit0,
            6 => Self::Crc,
            _ => Self::NoChange,
        }
    }
}

/// Communication state of the peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Synchronizing to CAN communication
    Synchronizing,
    /// Neither receiver nor transmitter
    Idle,
    /// Receiving a message
    Receiver,
    /// Transmitting a message
    Transmitter,
}

bitfield! {
    /// High priority message status register contents (HPMS).
    #[derive(Copy, Clone)]
    pub struct HighPriorityMessageStatus(u32);

    /// Buffer index the message was stored at
    pub u8, bidx, _: 5, 0;
    /// Message storage indicator
    pub u8, msi, _: 7, 6;
    /// Index of the matching filter element
    pub u8, fidx, _: 14, 8;
    /// The matching filter was an extended one
    pub flst, _: 15;
}

impl Debug for HighPriorityMessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighPriorityMessageStatus")
            .field("flst", &self.flst())
            .field("fidx", &self.fidx())
            .field("msi", &self.msi())
            .field("bidx", &self.bidx())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_counters_are_picked_apart() {
        let ecr = ErrorCounters(0x12 << 16 | 1 << 15 | 0x45 << 8 | 0x67);
        assert_eq!(ecr.cel(), 0x12);
        assert!(ecr.rp());
        assert_eq!(ecr.rec(), 0x45);
        assert_eq!(ecr.tec(), 0x67);
    }

    #[test]
    fn protocol_status_decodes_enums() {
        let psr = ProtocolStatus(3 << 8 | 2 << 3 | 5);
        assert_eq!(psr.last_error_code(), LastErrorCode::Bit0);
        assert_eq!(psr.data_phase_last_error_code(), LastErrorCode::Ack);
        assert_eq!(psr.activity(), Activity::Receiver);
    }
}
