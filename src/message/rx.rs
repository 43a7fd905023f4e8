//! Messages received from the bus.

use super::*;

/// RX frame descriptor decoded from a message RAM element.
///
/// The payload stays in the message RAM; [`Data`] records where it is.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    /// CAN identifier
    pub id: Id,
    /// Remote transmission request
    pub remote: bool,
    /// The transmitter indicated "error passive" state
    pub error_state_indicator: bool,
    /// Data length code, 0..=15
    pub dlc: u8,
    /// The frame was received with bit rate switching
    pub bit_rate_switching: bool,
    /// CAN FD frame format
    pub fd_format: bool,
    /// Timestamp counter value captured on start of frame reception
    pub timestamp: u16,
    /// Index of the filter that accepted the frame. `None` if no filter
    /// matched and the frame was accepted by the peripheral wide
    /// non-matching policy.
    pub filter_index: Option<u8>,
    /// Location of the payload within the message RAM
    pub data: Data,
}

impl Frame {
    /// `true` if no filter matched, but the frame was accepted due to
    /// the peripheral wide settings. See also [`Self::filter_index`].
    pub fn accepted_non_matching_filter(&self) -> bool {
        self.filter_index.is_none()
    }

    /// Payload length in bytes, as stored in the element.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` for frames without payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes header words R0 and R1; `data` locates the payload that
    /// follows them.
    pub(crate) fn decode(header: [u32; 2], data: Data) -> Self {
        let [r0, r1] = header;
        let extended = r0 & (1 << 30) != 0;
        let accepted_non_matching = r1 & (1 << 31) != 0;
        Self {
            id: field_to_id(r0, extended),
            remote: r0 & (1 << 29) != 0,
            error_state_indicator: r0 & (1 << 31) != 0,
            dlc: (r1 >> 16) as u8 & 0xf,
            bit_rate_switching: r1 & (1 << 20) != 0,
            fd_format: r1 & (1 << 21) != 0,
            timestamp: r1 as u16,
            filter_index: if accepted_non_matching {
                None
            } else {
                Some((r1 >> 24) as u8 & 0x7f)
            },
            data,
        }
    }
}

/// Location of a received payload inside the message RAM.
///
/// Resolved to bytes through
/// [`Can::read_payload`](crate::bus::Can::read_payload). The reference
/// is only valid until the hardware reuses the element, i.e. until the
/// FIFO slot is acknowledged or the dedicated buffer receives again.
#[derive(Copy, Clone, Debug)]
pub struct Data {
    /// Absolute word address of the first payload word
    pub(crate) address: u32,
    /// Stored payload length in bytes
    pub(crate) len: usize,
}

impl Data {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no payload bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dummy_data() -> Data {
        Data { address: 0, len: 0 }
    }

    #[test]
    fn decode_reads_the_fixed_bit_positions() {
        let r0 = 0x123 << 18 | 1 << 31;
        let r1 = 0xBEEF | 8 << 16 | 1 << 20 | 1 << 21 | 0x12 << 24;
        let frame = Frame::decode([r0, r1], dummy_data());
        assert_eq!(frame.id, Id::Standard(StandardId::new(0x123).unwrap()));
        assert!(frame.error_state_indicator);
        assert!(!frame.remote);
        assert_eq!(frame.dlc, 8);
        assert!(frame.bit_rate_switching);
        assert!(frame.fd_format);
        assert_eq!(frame.timestamp, 0xBEEF);
        assert_eq!(frame.filter_index, Some(0x12));
    }

    #[test]
    fn non_matching_acceptance_clears_the_filter_index() {
        let r1 = 1 << 31 | 0x7f << 24;
        let frame = Frame::decode([0, r1], dummy_data());
        assert!(frame.accepted_non_matching_filter());
        assert_eq!(frame.filter_index, None);
    }
}
