//! Handling of messages/frames
//!
//! Stored elements share one header layout: word 0 carries the
//! identifier and the RTR/XTD/ESI flags, word 1 the DLC, format flags
//! and the direction specific upper bits. The payload follows as
//! little-endian packed words.

pub mod rx;
pub mod tx;
mod tx_event;

pub use tx_event::{TxEvent, TxEventType};

use embedded_can::{ExtendedId, Id, StandardId};

/// Largest payload a single frame can carry.
pub const MAX_DATA_LENGTH: usize = 64;

/// Data length code to payload byte count, fixed by the CAN FD
/// standard. Indexed by the 4-bit DLC; nonlinear above 8.
const DATA_LENGTH: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Data does not fit in any data length code
#[derive(Debug)]
pub struct TooMuchData;

/// Payload byte count encoded by `dlc`. `None` if the code is outside
/// the 4-bit range.
///
/// This is the per-frame mapping; the words an element occupies in the
/// message RAM are a property of the region and come from
/// [`DataFieldSize::object_words`](crate::messageram::DataFieldSize::object_words).
pub fn data_length(dlc: u8) -> Option<usize> {
    DATA_LENGTH.get(usize::from(dlc)).map(|&len| len.into())
}

/// Converts data length code to a length in bytes. Classic frames top
/// out at 8 bytes regardless of the code.
pub(crate) fn dlc_to_len(dlc: u8, fd_format: bool) -> usize {
    let len = usize::from(DATA_LENGTH[usize::from(dlc & 0xf)]);
    if fd_format {
        len
    } else {
        len.min(8)
    }
}

/// Finds the smallest data length code that encodes at least len bytes
pub(crate) fn len_to_dlc(len: usize, fd_format: bool) -> Result<u8, TooMuchData> {
    if fd_format {
        match len {
            0..=8 => Ok(len as u8),
            9..=12 => Ok(9),
            13..=16 => Ok(10),
            17..=20 => Ok(11),
            21..=24 => Ok(12),
            25..=32 => Ok(13),
            33..=48 => Ok(14),
            49..=64 => Ok(15),
            65.. => Err(TooMuchData),
        }
    } else {
        match len {
            0..=8 => Ok(len as u8),
            9.. => Err(TooMuchData),
        }
    }
}

/// Identifier as stored in element word 0, bits 28:0.
pub(crate) fn id_to_field(id: Id) -> u32 {
    match id {
        Id::Standard(id) => u32::from(id.as_raw()) << 18,
        Id::Extended(id) => id.as_raw(),
    }
}

/// Inverse of [`id_to_field`], selected by the XTD flag.
pub(crate) fn field_to_id(field: u32, extended: bool) -> Id {
    if extended {
        // The mask keeps the value in range for a 29-bit identifier
        Id::Extended(unsafe { ExtendedId::new_unchecked(field & ExtendedId::MAX.as_raw()) })
    } else {
        // The mask keeps the value in range for an 11-bit identifier
        Id::Standard(unsafe {
            StandardId::new_unchecked((field >> 18) as u16 & StandardId::MAX.as_raw())
        })
    }
}
