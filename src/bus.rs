//! Controller handle and message RAM transfers.
//!
//! The peripheral is modeled as an owned handle around the platform
//! [`Interface`]; there is no global register state. The handle comes
//! in two forms mirroring the hardware state machine:
//! [`CanConfigurable`] (initialization mode, layout and filter setup
//! allowed) and [`Can`] (normal operation, frame transfers allowed).
//! Protected register writes only happen inside a
//! [`ConfigGuard`](crate::guard::ConfigGuard), so the controller can
//! never be left in configuration mode by a failed call.

use crate::ecc::{self, EccConfig, EccErrorStatus, EccErrorType};
use crate::filter::{
    ExtFilter, Filter, FilterExtendedId, FilterStandardId, GlobalFilterPolicy,
};
use crate::guard::ConfigGuard;
use crate::interface::Interface;
use crate::message::{self, rx, tx};
use crate::messageram::{ConfigurationError, MessageRamConfig, MessageRamLayout, Region};
use crate::reg;
use crate::status::{ErrorCounters, HighPriorityMessageStatus, ProtocolStatus};
use embedded_can::ExtendedId;

/// Errors that may occur while moving elements in or out of the
/// message RAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferError {
    /// Element index outside the configured range
    InvalidIndex,
    /// TX descriptor carries a data length code greater than 15
    InvalidDataLengthCode,
    /// No message RAM layout has been applied yet
    NotConfigured,
}

/// A CAN controller in initialization mode (CCCR.INIT set).
///
/// Messages are neither received nor transmitted in this state. The
/// message RAM layout and the filters are set up here; [`Self::finalize`]
/// moves to normal operation.
pub struct CanConfigurable<I: Interface> {
    pub(crate) interface: I,
    pub(crate) layout: Option<MessageRamLayout>,
}

/// A CAN controller in normal operation.
///
/// Obtained from [`CanConfigurable::finalize`]. All frame transfer
/// operations live here; layout changes require going back through
/// [`Self::configure`].
pub struct Can<I: Interface> {
    pub(crate) interface: I,
    pub(crate) layout: MessageRamLayout,
}

/// Switches between initialization mode and normal operation, waiting
/// until the peripheral reflects the change.
fn set_init<I: Interface>(interface: &mut I, init: bool) {
    let cccr = interface.read(reg::CCCR);
    let value = if init {
        cccr | reg::cccr::INIT
    } else {
        cccr & !reg::cccr::INIT
    };
    interface.write(reg::CCCR, value);
    while (interface.read(reg::CCCR) & reg::cccr::INIT != 0) != init {}
}

/// Packs `value` into a register field.
fn field(value: u32, mask: u32, shift: u32) -> u32 {
    (value & mask) << shift
}

impl<I: Interface> CanConfigurable<I> {
    /// Takes ownership of the peripheral behind `interface` and puts it
    /// into initialization mode.
    pub fn new(mut interface: I) -> Self {
        set_init(&mut interface, true);
        Self {
            interface,
            layout: None,
        }
    }

    /// Applies the one-shot message RAM layout.
    ///
    /// The configuration is validated against the physical message RAM
    /// capacity first; on rejection no register has been touched. The
    /// register writes run under a configuration guard, so the
    /// controller leaves configuration mode on every path.
    pub fn apply_message_ram_config(
        &mut self,
        config: &MessageRamConfig,
    ) -> Result<(), ConfigurationError> {
        let layout = config.validate(self.interface.message_ram_size())?;

        let mut guard = ConfigGuard::acquire(&mut self.interface);

        if layout.standard_filters.count != 0 {
            guard.write(
                reg::SIDFC,
                (layout.standard_filters.start & reg::START_ADDRESS_MASK)
                    | field(
                        layout.standard_filters.count.into(),
                        reg::sidfc::LSS_MASK,
                        reg::sidfc::LSS_SHIFT,
                    ),
            );
        }
        if layout.extended_filters.count != 0 {
            guard.write(
                reg::XIDFC,
                (layout.extended_filters.start & reg::START_ADDRESS_MASK)
                    | field(
                        layout.extended_filters.count.into(),
                        reg::xidfc::LSE_MASK,
                        reg::xidfc::LSE_SHIFT,
                    ),
            );
        }
        if layout.rx_fifo_0.count != 0 {
            guard.write(
                reg::RXF0C,
                (layout.rx_fifo_0.start & reg::START_ADDRESS_MASK)
                    | field(layout.rx_fifo_0.count.into(), reg::rxfc::FS_MASK, reg::rxfc::FS_SHIFT)
                    | field(
                        config.rx_fifo_0.watermark.into(),
                        reg::rxfc::FWM_MASK,
                        reg::rxfc::FWM_SHIFT,
                    )
                    | if config.rx_fifo_0.mode.is_overwrite() {
                        reg::rxfc::FOM
                    } else {
                        0
                    },
            );
            guard.modify(reg::RXESC, |v| {
                v & !(reg::rxesc::DS_MASK << reg::rxesc::F0DS_SHIFT)
                    | field(
                        config.rx_fifo_0.element_size.code().into(),
                        reg::rxesc::DS_MASK,
                        reg::rxesc::F0DS_SHIFT,
                    )
            });
        }
        if layout.rx_fifo_1.count != 0 {
            guard.write(
                reg::RXF1C,
                (layout.rx_fifo_1.start & reg::START_ADDRESS_MASK)
                    | field(layout.rx_fifo_1.count.into(), reg::rxfc::FS_MASK, reg::rxfc::FS_SHIFT)
                    | field(
                        config.rx_fifo_1.watermark.into(),
                        reg::rxfc::FWM_MASK,
                        reg::rxfc::FWM_SHIFT,
                    )
                    | if config.rx_fifo_1.mode.is_overwrite() {
                        reg::rxfc::FOM
                    } else {
                        0
                    },
            );
            guard.modify(reg::RXESC, |v| {
                v & !(reg::rxesc::DS_MASK << reg::rxesc::F1DS_SHIFT)
                    | field(
                        config.rx_fifo_1.element_size.code().into(),
                        reg::rxesc::DS_MASK,
                        reg::rxesc::F1DS_SHIFT,
                    )
            });
        }

        guard.write(reg::RXBC, layout.rx_buffers.start & reg::START_ADDRESS_MASK);
        guard.modify(reg::RXESC, |v| {
            v & !(reg::rxesc::DS_MASK << reg::rxesc::RBDS_SHIFT)
                | field(
                    config.rx_buffers.element_size.code().into(),
                    reg::rxesc::DS_MASK,
                    reg::rxesc::RBDS_SHIFT,
                )
        });

        if layout.tx_buffers.count != 0 {
            guard.write(
                reg::TXBC,
                (layout.tx_buffers.start & reg::START_ADDRESS_MASK)
                    | field(
                        config.tx_buffers.dedicated.into(),
                        reg::txbc::NDTB_MASK,
                        reg::txbc::NDTB_SHIFT,
                    )
                    | field(
                        config.tx_buffers.queue_size.into(),
                        reg::txbc::TFQS_MASK,
                        reg::txbc::TFQS_SHIFT,
                    )
                    | if config.tx_buffers.queue_mode.is_priority() {
                        reg::txbc::TFQM
                    } else {
                        0
                    },
            );
            guard.write(
                reg::TXESC,
                field(
                    config.tx_buffers.element_size.code().into(),
                    reg::txesc::TBDS_MASK,
                    0,
                ),
            );
        }
        if layout.tx_event_fifo.count != 0 {
            guard.write(
                reg::TXEFC,
                (layout.tx_event_fifo.start & reg::START_ADDRESS_MASK)
                    | field(
                        layout.tx_event_fifo.count.into(),
                        reg::txefc::EFS_MASK,
                        reg::txefc::EFS_SHIFT,
                    )
                    | field(
                        config.tx_event_fifo.watermark.into(),
                        reg::txefc::EFWM_MASK,
                        reg::txefc::EFWM_SHIFT,
                    ),
            );
        }
        drop(guard);

        self.layout = Some(layout);
        Ok(())
    }

    /// Sets the acceptance policy for frames no filter matched and for
    /// remote frames.
    pub fn set_global_filter_policy(&mut self, policy: GlobalFilterPolicy) {
        let mut guard = ConfigGuard::acquire(&mut self.interface);
        guard.write(reg::GFC, policy.encode());
    }

    /// Sets the AND mask applied to extended IDs ahead of the filter
    /// list lookup.
    pub fn set_extended_id_mask(&mut self, mask: ExtendedId) {
        let mut guard = ConfigGuard::acquire(&mut self.interface);
        guard.write(reg::XIDAM, mask.as_raw());
    }

    /// Configures the ECC protection of the message RAM.
    pub fn configure_ecc(&mut self, config: EccConfig) {
        ecc::configure(&mut self.interface, config);
    }

    fn layout(&self) -> Result<&MessageRamLayout, TransferError> {
        self.layout.as_ref().ok_or(TransferError::NotConfigured)
    }

    /// Writes the filter element at `index` of the standard ID list.
    pub fn set_standard_filter(&mut self, index: u8, filter: Filter) -> Result<(), TransferError> {
        let offset = self
            .layout()?
            .standard_filters
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        let element = FilterStandardId::from(filter);
        self.interface.write(address, element.0);
        Ok(())
    }

    /// Reads back the filter element at `index` of the standard ID list.
    pub fn standard_filter(&self, index: u8) -> Result<Filter, TransferError> {
        let offset = self
            .layout()?
            .standard_filters
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        Ok(FilterStandardId(self.interface.read(address)).decode())
    }

    /// Writes the filter element at `index` of the extended ID list.
    pub fn set_extended_filter(
        &mut self,
        index: u8,
        filter: ExtFilter,
    ) -> Result<(), TransferError> {
        let offset = self
            .layout()?
            .extended_filters
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        let element = FilterExtendedId::from(filter);
        self.interface.write(address, element.0[0]);
        self.interface.write(address + 4, element.0[1]);
        Ok(())
    }

    /// Reads back the filter element at `index` of the extended ID list.
    pub fn extended_filter(&self, index: u8) -> Result<ExtFilter, TransferError> {
        let offset = self
            .layout()?
            .extended_filters
            .checked_offset(index)
            .ok_or(TransferError::InvalidIndex)?;
        let address = self.interface.message_ram_base() + offset;
        let element = FilterExtendedId([
            self.interface.read(address),
            self.interface.read(address + 4),
        ]);
        Ok(element.decode())
    }

    /// Leaves initialization mode and enters normal operation.
    ///
    /// Fails if no message RAM layout has been applied; operating the
    /// peripheral with unconfigured regions corrupts memory.
    pub fn finalize(mut self) -> Result<Can<I>, ConfigurationError> {
        let layout = self.layout.ok_or(ConfigurationError::LayoutMissing)?;
        set_init(&mut self.interface, false);
        Ok(Can {
            interface: self.interface,
            layout,
        })
    }
}

impl<I: Interface> Can<I> {
    /// Re-enters initialization mode, keeping the applied layout.
    pub fn configure(mut self) -> CanConfigurable<I> {
        set_init(&mut self.interface, true);
        CanConfigurable {
            interface: self.interface,
            layout: Some(self.layout),
        }
    }

    /// Releases the platform interface.
    pub fn release(mut self) -> I {
        set_init(&mut self.interface, true);
        self.interface
    }

    /// Read the error counters.
    pub fn error_counters(&self) -> ErrorCounters {
        ErrorCounters(self.interface.read(reg::ECR))
    }

    /// Read additional status information.
    pub fn protocol_status(&self) -> ProtocolStatus {
        ProtocolStatus(self.interface.read(reg::PSR))
    }

    /// Status of the most recent high priority message.
    pub fn high_priority_message_status(&self) -> HighPriorityMessageStatus {
        HighPriorityMessageStatus(self.interface.read(reg::HPMS))
    }

    /// Current timestamp counter value.
    pub fn timestamp_counter(&self) -> u16 {
        self.interface.read(reg::TSCV) as u16
    }

    /// Pending ECC error flags for the message RAM.
    pub fn ecc_error_status(&self) -> EccErrorStatus {
        ecc::error_status(&self.interface)
    }

    /// Clears the pending ECC error flags of the given class.
    pub fn clear_ecc_error_status(&mut self, error_type: EccErrorType) {
        ecc::clear_error_status(&mut self.interface, error_type);
    }

    /// Copies the payload of a received frame out of the message RAM,
    /// returning the filled prefix of `buffer`.
    ///
    /// The frame's payload location is only valid until the hardware
    /// reuses the element; copy before acknowledging the FIFO slot.
    pub fn read_payload<'a>(&self, frame: &rx::Frame, buffer: &'a mut [u8]) -> &'a [u8] {
        let len = frame.data.len().min(buffer.len());
        let mut address = frame.data.address;
        let mut copied = 0;
        while copied < len {
            let word = self.interface.read(address).to_le_bytes();
            let take = (len - copied).min(4);
            buffer[copied..copied + take].copy_from_slice(&word[..take]);
            address += 4;
            copied += take;
        }
        &buffer[..len]
    }

    /// Absolute address of element `index` in `region`.
    pub(crate) fn element_address(&self, region: &Region, index: u32) -> u32 {
        self.interface.message_ram_base() + region.element_offset(index)
    }

    /// Serializes a TX descriptor into the element at `address`.
    ///
    /// Emits the two header words followed by the payload words implied
    /// by the DLC; the caller has picked `address` so that the element
    /// accommodates them.
    pub(crate) fn write_element(
        &mut self,
        address: u32,
        frame: &tx::Frame,
    ) -> Result<(), TransferError> {
        let len = message::data_length(frame.dlc).ok_or(TransferError::InvalidDataLengthCode)?;
        let [t0, t1] = frame.header();
        self.interface.write(address, t0);
        self.interface.write(address + 4, t1);
        let words = len.div_ceil(4);
        for index in 0..words {
            let bytes = &frame.data[index * 4..];
            let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            self.interface.write(address + 8 + 4 * index as u32, value);
        }
        Ok(())
    }

    /// Deserializes the RX element at `address`; the payload stays in
    /// place and is referenced by the returned descriptor.
    pub(crate) fn read_element(&self, region: &Region, address: u32) -> rx::Frame {
        let r0 = self.interface.read(address);
        let r1 = self.interface.read(address + 4);
        let dlc = (r1 >> 16) as u8 & 0xf;
        let fd_format = r1 & (1 << 21) != 0;
        let len = message::dlc_to_len(dlc, fd_format).min(region.data_bytes() as usize);
        rx::Frame::decode(
            [r0, r1],
            rx::Data {
                address: address + 8,
                len,
            },
        )
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::filter::{Action, NonMatchingAction};
    use crate::messageram::{
        DataFieldSize, FilterListConfig, MessageRamConfig, RxBuffersConfig, RxFifoConfig,
        TxBuffersConfig, TxEventFifoConfig,
    };
    use crate::rx_fifo::RxFifo;
    use embedded_can::{Id, StandardId};

    const RAM_BASE: u32 = 0x8000;
    const RAM_SIZE: u32 = 4096;

    pub(crate) struct Mock {
        regs: [u32; 0x480 / 4],
        ram: [u32; (RAM_SIZE / 4) as usize],
    }

    impl Mock {
        pub fn new() -> Self {
            Self {
                regs: [0; 0x480 / 4],
                ram: [0; (RAM_SIZE / 4) as usize],
            }
        }
    }

    impl Interface for Mock {
        fn read(&self, offset: u32) -> u32 {
            if offset >= RAM_BASE {
                self.ram[((offset - RAM_BASE) / 4) as usize]
            } else {
                self.regs[(offset / 4) as usize]
            }
        }

        fn write(&mut self, offset: u32, value: u32) {
            if offset >= RAM_BASE {
                self.ram[((offset - RAM_BASE) / 4) as usize] = value;
            } else if offset == reg::ecc::VECTOR {
                // The aggregator load completes immediately.
                self.regs[(offset / 4) as usize] = value | reg::ecc::RD_SVBUS_DONE;
            } else {
                self.regs[(offset / 4) as usize] = value;
            }
        }

        fn message_ram_base(&self) -> u32 {
            RAM_BASE
        }

        fn message_ram_size(&self) -> u32 {
            RAM_SIZE
        }
    }

    pub(crate) fn test_config() -> MessageRamConfig {
        MessageRamConfig {
            standard_filters: FilterListConfig {
                start: 0x000,
                count: 8,
            },
            extended_filters: FilterListConfig {
                start: 0x020,
                count: 4,
            },
            rx_fifo_0: RxFifoConfig {
                start: 0x040,
                size: 8,
                watermark: 4,
                element_size: DataFieldSize::B8,
                ..Default::default()
            },
            rx_fifo_1: RxFifoConfig {
                start: 0x0C0,
                size: 4,
                element_size: DataFieldSize::B64,
                ..Default::default()
            },
            rx_buffers: RxBuffersConfig {
                start: 0x400,
                count: 4,
                element_size: DataFieldSize::B8,
            },
            tx_buffers: TxBuffersConfig {
                start: 0x500,
                dedicated: 2,
                queue_size: 2,
                element_size: DataFieldSize::B8,
                ..Default::default()
            },
            tx_event_fifo: TxEventFifoConfig {
                start: 0x600,
                size: 4,
                watermark: 2,
            },
        }
    }

    pub(crate) fn operational() -> Can<Mock> {
        let mut can = CanConfigurable::new(Mock::new());
        can.apply_message_ram_config(&test_config()).unwrap();
        can.finalize().unwrap()
    }

    #[test]
    fn init_is_set_while_configuring_and_cleared_after() {
        let can = CanConfigurable::new(Mock::new());
        assert_ne!(can.interface.read(reg::CCCR) & reg::cccr::INIT, 0);
        let mut can = can;
        can.apply_message_ram_config(&test_config()).unwrap();
        let can = can.finalize().unwrap();
        assert_eq!(can.interface.read(reg::CCCR) & reg::cccr::INIT, 0);
        assert_eq!(can.interface.read(reg::CCCR) & reg::cccr::CCE, 0);
    }

    #[test]
    fn layout_registers_reflect_the_configuration() {
        let mut can = CanConfigurable::new(Mock::new());
        can.apply_message_ram_config(&test_config()).unwrap();
        let regs = &can.interface;
        assert_eq!(regs.read(reg::SIDFC), 0x000 | 8 << 16);
        assert_eq!(regs.read(reg::XIDFC), 0x020 | 4 << 16);
        assert_eq!(regs.read(reg::RXF0C), 0x040 | 8 << 16 | 4 << 24);
        assert_eq!(regs.read(reg::RXF1C), 0x0C0 | 4 << 16);
        assert_eq!(regs.read(reg::RXBC), 0x400);
        // FIFO1 stores 64-byte elements, FIFO0 and the buffers 8-byte ones.
        assert_eq!(regs.read(reg::RXESC), 7 << 4);
        assert_eq!(regs.read(reg::TXBC), 0x500 | 2 << 16 | 2 << 24);
        assert_eq!(regs.read(reg::TXESC), 0);
        assert_eq!(regs.read(reg::TXEFC), 0x600 | 4 << 16 | 2 << 24);
        // The guard released configuration mode.
        assert_eq!(regs.read(reg::CCCR) & reg::cccr::CCE, 0);
    }

    #[test]
    fn rejected_configuration_writes_nothing() {
        let mut can = CanConfigurable::new(Mock::new());
        let mut config = test_config();
        config.rx_fifo_0.start = RAM_SIZE;
        assert!(can.apply_message_ram_config(&config).is_err());
        assert_eq!(can.interface.read(reg::SIDFC), 0);
        assert_eq!(can.interface.read(reg::RXF0C), 0);
        assert!(can.finalize().is_err());
    }

    #[test]
    fn global_filter_policy_reaches_gfc() {
        let mut can = CanConfigurable::new(Mock::new());
        can.set_global_filter_policy(GlobalFilterPolicy {
            non_matching_standard: NonMatchingAction::Reject,
            non_matching_extended: NonMatchingAction::Reject,
            reject_remote_standard: true,
            reject_remote_extended: true,
        });
        assert_eq!(can.interface.read(reg::GFC), 2 << 4 | 2 << 2 | 0x3);
        assert_eq!(can.interface.read(reg::CCCR) & reg::cccr::CCE, 0);
    }

    #[test]
    fn extended_id_mask_reaches_xidam() {
        let mut can = CanConfigurable::new(Mock::new());
        can.set_extended_id_mask(ExtendedId::new(0x1FFF_0000).unwrap());
        assert_eq!(can.interface.read(reg::XIDAM), 0x1FFF_0000);
    }

    #[test]
    fn filters_round_trip_through_the_message_ram() {
        let mut can = CanConfigurable::new(Mock::new());
        assert_eq!(
            can.set_standard_filter(0, Filter::Disabled),
            Err(TransferError::NotConfigured)
        );
        can.apply_message_ram_config(&test_config()).unwrap();

        let filter = Filter::Classic {
            action: Action::StoreFifo0,
            filter: StandardId::new(0x123).unwrap(),
            mask: StandardId::new(0x7FF).unwrap(),
        };
        can.set_standard_filter(3, filter).unwrap();
        assert_eq!(can.standard_filter(3).unwrap(), filter);
        // One word stride: element 3 sits 12 bytes into the list.
        assert_ne!(can.interface.read(RAM_BASE + 12), 0);
        assert_eq!(
            can.set_standard_filter(8, filter),
            Err(TransferError::InvalidIndex)
        );

        let ext = ExtFilter::Dual {
            action: Action::StoreFifo1,
            id1: ExtendedId::new(0x18DA_F101).unwrap(),
            id2: ExtendedId::new(0x18DB_33F1).unwrap(),
        };
        can.set_extended_filter(1, ext).unwrap();
        assert_eq!(can.extended_filter(1).unwrap(), ext);
        // Two word stride: element 1 sits 8 bytes into the list.
        assert_ne!(can.interface.read(RAM_BASE + 0x020 + 8), 0);
        assert_eq!(
            can.set_extended_filter(4, ext),
            Err(TransferError::InvalidIndex)
        );
    }

    #[test]
    fn fifo0_element_three_round_trips_a_classic_frame() {
        let mut can = operational();
        let payload = [1, 2, 3, 4, 5, 6, 7, 8];
        let frame = tx::Frame::classic(StandardId::new(0x123).unwrap(), &payload).unwrap();

        // Element size code 0 means 4-word objects: index 3 lives at
        // byte offset 3 * 16 from the region start.
        let offset = can.layout.rx_fifo_0.element_offset(3);
        assert_eq!(offset, 0x040 + 48);
        can.write_element(RAM_BASE + offset, &frame).unwrap();

        // Fill level 1, get index 3.
        can.interface.write(reg::RXF0S, 1 | 3 << 8);
        let (index, received) = can.receive(RxFifo::Fifo0).unwrap();
        assert_eq!(index, 3);
        assert_eq!(received.id, Id::Standard(StandardId::new(0x123).unwrap()));
        assert_eq!(received.dlc, 8);
        let mut buffer = [0; 64];
        assert_eq!(can.read_payload(&received, &mut buffer), &payload);

        can.acknowledge(RxFifo::Fifo0, index).unwrap();
        assert_eq!(can.interface.read(reg::RXF0A), 3);
    }

    #[test]
    fn every_dlc_round_trips_through_an_element() {
        let mut can = operational();
        let mut pattern = [0u8; 64];
        for (i, byte) in pattern.iter_mut().enumerate() {
            *byte = i as u8 ^ 0xA5;
        }
        // FIFO 1 stores 64-byte elements, enough for every code.
        let region = can.layout.rx_fifo_1;
        let address = can.element_address(&region, 0);
        for dlc in 0..=15u8 {
            let len = message::data_length(dlc).unwrap();
            let frame =
                tx::Frame::fd(StandardId::new(0x200).unwrap(), &pattern[..len], false).unwrap();
            assert_eq!(frame.dlc, dlc);
            can.write_element(address, &frame).unwrap();

            let received = can.read_element(&region, address);
            assert_eq!(received.dlc, dlc);
            assert_eq!(received.len(), len);
            let mut buffer = [0; 64];
            assert_eq!(can.read_payload(&received, &mut buffer), &pattern[..len]);
        }
    }

    #[test]
    fn invalid_dlc_is_rejected_before_any_ram_write() {
        let mut can = operational();
        let mut frame = tx::Frame::classic(StandardId::ZERO, &[]).unwrap();
        frame.dlc = 16;
        assert_eq!(
            can.write_dedicated_tx(0, &frame),
            Err(TransferError::InvalidDataLengthCode)
        );
        let offset = can.layout.tx_buffers.element_offset(0);
        assert_eq!(can.interface.read(RAM_BASE + offset), 0);
        assert_eq!(can.interface.read(RAM_BASE + offset + 4), 0);
    }

    #[test]
    fn payload_is_packed_little_endian() {
        let mut can = operational();
        let frame = tx::Frame::classic(StandardId::ZERO, &[0x11, 0x22, 0x33, 0x44, 0x55]).unwrap();
        can.write_dedicated_tx(1, &frame).unwrap();
        let offset = can.layout.tx_buffers.element_offset(1);
        assert_eq!(can.interface.read(RAM_BASE + offset + 8), 0x4433_2211);
        // DLC 5 still fills two words; the tail bytes come from the
        // zero padded descriptor array.
        assert_eq!(can.interface.read(RAM_BASE + offset + 12), 0x0000_0055);
    }

    #[test]
    fn timestamp_counter_reads_tscv() {
        let mut can = operational();
        can.interface.write(reg::TSCV, 0xABCD);
        assert_eq!(can.timestamp_counter(), 0xABCD);
    }

    #[test]
    fn ecc_status_round_trip() {
        let mut can = operational();
        can.interface.write(reg::ecc::SEC_STATUS0, 1);
        assert!(can.ecc_error_status().single_bit);
        can.clear_ecc_error_status(EccErrorType::SingleBit);
        assert_eq!(
            can.interface.read(reg::ecc::ERROR_STATUS1),
            reg::ecc::STATUS_CLR_SEC
        );
    }
}
