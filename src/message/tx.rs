//! Messages to be sent on the bus

use super::*;

/// TX frame descriptor.
///
/// Mirrors the element field layout; [`Can`](crate::bus::Can) consumes
/// one per transmission and does not retain it. The DLC decides how
/// many payload words are serialized, not the amount of data the caller
/// filled in; a descriptor built by hand must keep the two consistent
/// and must not carry a DLC larger than the configured element payload
/// capacity.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    /// CAN identifier
    pub id: Id,
    /// Remote transmission request
    pub remote: bool,
    /// Transmit with the error state indicator set to "error passive"
    /// regardless of the actual peripheral state
    pub error_state_indicator: bool,
    /// Data length code, 0..=15
    pub dlc: u8,
    /// Switch to the data phase bit rate
    pub bit_rate_switching: bool,
    /// CAN FD frame format
    pub fd_format: bool,
    /// Store a TX event once the frame has been sent
    pub store_tx_event: bool,
    /// Marker copied into the TX event element
    pub message_marker: u8,
    /// Payload; bytes beyond the DLC-implied length are ignored
    pub data: [u8; MAX_DATA_LENGTH],
}

impl Frame {
    /// Classic CAN data frame.
    pub fn classic(id: impl Into<Id>, payload: &[u8]) -> Result<Self, TooMuchData> {
        Self::build(id.into(), payload, false, false)
    }

    /// Classic CAN remote frame requesting `desired_len` bytes.
    pub fn remote(id: impl Into<Id>, desired_len: usize) -> Result<Self, TooMuchData> {
        let mut frame = Self::build(id.into(), &[], false, false)?;
        frame.dlc = len_to_dlc(desired_len, false)?;
        frame.remote = true;
        Ok(frame)
    }

    /// CAN FD data frame. Payloads that fall between two data length
    /// codes are padded with zeros up to the next one.
    pub fn fd(
        id: impl Into<Id>,
        payload: &[u8],
        bit_rate_switching: bool,
    ) -> Result<Self, TooMuchData> {
        Self::build(id.into(), payload, true, bit_rate_switching)
    }

    /// Requests a TX event with `marker` for this frame.
    pub fn with_event(mut self, marker: u8) -> Self {
        self.store_tx_event = true;
        self.message_marker = marker;
        self
    }

    fn build(id: Id, payload: &[u8], fd_format: bool, brs: bool) -> Result<Self, TooMuchData> {
        let dlc = len_to_dlc(payload.len(), fd_format)?;
        let mut data = [0; MAX_DATA_LENGTH];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            remote: false,
            error_state_indicator: false,
            dlc,
            bit_rate_switching: brs,
            fd_format,
            store_tx_event: false,
            message_marker: 0,
            data,
        })
    }

    /// Header words T0 and T1 in the element layout.
    pub(crate) fn header(&self) -> [u32; 2] {
        let xtd = matches!(self.id, Id::Extended(_));
        let t0 = id_to_field(self.id)
            | (self.remote as u32) << 29
            | (xtd as u32) << 30
            | (self.error_state_indicator as u32) << 31;
        let t1 = u32::from(self.dlc & 0xf) << 16
            | (self.bit_rate_switching as u32) << 20
            | (self.fd_format as u32) << 21
            | (self.store_tx_event as u32) << 23
            | u32::from(self.message_marker) << 24;
        [t0, t1]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_packs_the_fixed_bit_positions() {
        let frame = Frame::fd(StandardId::new(0x7FF).unwrap(), &[0; 12], true)
            .unwrap()
            .with_event(0xAB);
        let [t0, t1] = frame.header();
        assert_eq!(t0, 0x7FF << 18);
        assert_eq!(t1, 9 << 16 | 1 << 20 | 1 << 21 | 1 << 23 | 0xAB << 24);
    }

    #[test]
    fn extended_frames_set_xtd_and_keep_the_raw_id() {
        let frame = Frame::classic(ExtendedId::new(0x1234_5678).unwrap(), &[1, 2]).unwrap();
        let [t0, t1] = frame.header();
        assert_eq!(t0, 0x1234_5678 | 1 << 30);
        assert_eq!(t1, 2 << 16);
    }

    #[test]
    fn remote_frames_carry_the_requested_length() {
        let frame = Frame::remote(StandardId::new(0x100).unwrap(), 8).unwrap();
        let [t0, t1] = frame.header();
        assert_eq!(t0 & 1 << 29, 1 << 29);
        assert_eq!((t1 >> 16) & 0xf, 8);
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        assert!(Frame::classic(StandardId::ZERO, &[0; 9]).is_err());
        assert!(Frame::fd(StandardId::ZERO, &[0; 65], false).is_err());
    }
}
