//! Memory management for the RAM interface between core and peripheral.
//!
//! The message RAM holds seven regions (two filter lists, two receive
//! FIFOs, dedicated receive buffers, the transmit buffers with their
//! FIFO/queue part, and the transmit event FIFO). Their geometry is
//! chosen once through [`MessageRamConfig`]; validation produces a
//! [`MessageRamLayout`], the table all element addressing is derived
//! from. The byte arithmetic lives here and nowhere else.

/// Payload sizes a data region can be configured to use.
///
/// The discriminant is the element size code written to RXESC/TXESC.
/// Not to be confused with the data length code of an individual frame;
/// the element size bounds what one stored element can hold, the DLC
/// says how much of it a frame uses.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum DataFieldSize {
    /// 8 byte data field
    #[default]
    B8 = 0,
    /// 12 byte data field
    B12 = 1,
    /// 16 byte data field
    B16 = 2,
    /// 20 byte data field
    B20 = 3,
    /// 24 byte data field
    B24 = 4,
    /// 32 byte data field
    B32 = 5,
    /// 48 byte data field
    B48 = 6,
    /// 64 byte data field
    B64 = 7,
}

/// Element size code to stored object size in words, headers included.
const OBJECT_WORDS: [u32; 8] = [4, 5, 6, 7, 8, 10, 14, 18];

/// Words of one standard ID filter element
const STANDARD_FILTER_WORDS: u32 = 1;
/// Words of one extended ID filter element
const EXTENDED_FILTER_WORDS: u32 = 2;
/// Words of one TX event FIFO element
const TX_EVENT_WORDS: u32 = 2;

impl DataFieldSize {
    /// Element size code as written to RXESC/TXESC.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Element size for a raw code. `None` if the code is outside 0..=7.
    pub fn from_code(code: u8) -> Option<Self> {
        use DataFieldSize::*;
        match code {
            0 => Some(B8),
            1 => Some(B12),
            2 => Some(B16),
            3 => Some(B20),
            4 => Some(B24),
            5 => Some(B32),
            6 => Some(B48),
            7 => Some(B64),
            _ => None,
        }
    }

    /// Total words one stored element occupies, including the two
    /// header words.
    pub fn object_words(self) -> u32 {
        OBJECT_WORDS[self as usize]
    }

    /// Payload bytes one stored element can hold.
    pub fn data_bytes(self) -> u32 {
        (self.object_words() - 2) * 4
    }
}

/// The seven message RAM regions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// Standard (11-bit) ID filter list
    StandardFilters,
    /// Extended (29-bit) ID filter list
    ExtendedFilters,
    /// Receive FIFO 0
    RxFifo0,
    /// Receive FIFO 1
    RxFifo1,
    /// Dedicated receive buffers
    RxBuffers,
    /// Transmit buffers, dedicated and FIFO/queue combined
    TxBuffers,
    /// Transmit event FIFO
    TxEventFifo,
}

/// Errors detected while validating a message RAM configuration.
///
/// Validation happens before any register is written; a rejected
/// configuration leaves the peripheral untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A region start address is not 32-bit word aligned
    UnalignedStart(RegionKind),
    /// A region holds more elements than the hardware can index
    TooManyElements(RegionKind),
    /// A region extends past the end of the physical message RAM
    RegionOutOfBounds(RegionKind),
    /// The combined region spans do not fit in the physical message RAM
    Overcommitted {
        /// Bytes required by the configuration
        required: u32,
        /// Bytes physically available
        available: u32,
    },
    /// The operation requires an applied message RAM configuration
    LayoutMissing,
}

/// Mode of operation for a RX FIFO.
#[derive(Default, Copy, Clone)]
pub struct RxFifoMode(RxFifoModeVariant);

impl RxFifoMode {
    /// Blocking mode
    ///
    /// When the RX FIFO is full, incoming messages are dropped until at
    /// least one message has been read out from the FIFO.
    pub fn blocking() -> Self {
        Self(RxFifoModeVariant::Blocking)
    }

    /// Overwriting mode
    ///
    /// When the RX FIFO is full, the oldest message will be deleted and
    /// a new message will take its place.
    ///
    /// # Safety
    /// For a FIFO running in this mode the peripheral provides no
    /// synchronization the reader could rely on; the element at the get
    /// index may be overwritten while it is read. The application has
    /// to offset its reads from the oldest element far enough for its
    /// CPU speed to guarantee integrity.
    pub unsafe fn overwrite() -> Self {
        Self(RxFifoModeVariant::Overwrite)
    }

    pub(crate) fn is_overwrite(self) -> bool {
        matches!(self.0, RxFifoModeVariant::Overwrite)
    }
}

#[derive(Default, Copy, Clone)]
enum RxFifoModeVariant {
    #[default]
    Blocking,
    Overwrite,
}

/// Mode of operation for the transmit queue.
#[derive(Default, Copy, Clone)]
pub enum TxQueueMode {
    /// Messages are sent according to the order they are enqueued
    #[default]
    Fifo,
    /// Messages are sent according to their priority
    ///
    /// Lower ID means higher priority. Messages of the same ID are sent
    /// in an arbitrary order.
    Priority,
}

impl TxQueueMode {
    pub(crate) fn is_priority(self) -> bool {
        matches!(self, Self::Priority)
    }
}

/// Geometry of an ID filter list.
#[derive(Copy, Clone, Default)]
pub struct FilterListConfig {
    /// Byte offset of the list within the message RAM, word aligned
    pub start: u32,
    /// Number of filter elements; 0 leaves the list unconfigured
    pub count: u8,
}

/// Geometry and behavior of a receive FIFO.
#[derive(Copy, Clone, Default)]
pub struct RxFifoConfig {
    /// Byte offset of the FIFO within the message RAM, word aligned
    pub start: u32,
    /// Number of elements; 0 leaves the FIFO unconfigured
    pub size: u8,
    /// Fill level that triggers the watermark interrupt; 0 disables it
    pub watermark: u8,
    /// Blocking or overwriting operation
    pub mode: RxFifoMode,
    /// Payload capacity of each element
    pub element_size: DataFieldSize,
}

/// Geometry of the dedicated receive buffer section.
#[derive(Copy, Clone, Default)]
pub struct RxBuffersConfig {
    /// Byte offset of the section within the message RAM, word aligned
    pub start: u32,
    /// Number of dedicated buffers; 0 leaves the section unconfigured
    pub count: u8,
    /// Payload capacity of each buffer
    pub element_size: DataFieldSize,
}

/// Geometry of the transmit buffer section.
///
/// The section is a single array of `dedicated + queue_size` elements;
/// the first `dedicated` are addressed by buffer number, the rest form
/// the transmit FIFO/queue.
#[derive(Copy, Clone, Default)]
pub struct TxBuffersConfig {
    /// Byte offset of the section within the message RAM, word aligned
    pub start: u32,
    /// Number of dedicated transmit buffers
    pub dedicated: u8,
    /// Number of FIFO/queue elements
    pub queue_size: u8,
    /// FIFO or priority queue operation for the non-dedicated part
    pub queue_mode: TxQueueMode,
    /// Payload capacity of each element
    pub element_size: DataFieldSize,
}

/// Geometry of the transmit event FIFO.
#[derive(Copy, Clone, Default)]
pub struct TxEventFifoConfig {
    /// Byte offset of the FIFO within the message RAM, word aligned
    pub start: u32,
    /// Number of elements; 0 leaves the FIFO unconfigured
    pub size: u8,
    /// Fill level that triggers the watermark interrupt; 0 disables it
    pub watermark: u8,
}

/// One-shot message RAM configuration.
///
/// Regions left at their zero default are not configured in hardware;
/// operations addressing them fail with an out-of-range index.
#[derive(Copy, Clone, Default)]
pub struct MessageRamConfig {
    /// Standard ID filter list
    pub standard_filters: FilterListConfig,
    /// Extended ID filter list
    pub extended_filters: FilterListConfig,
    /// Receive FIFO 0
    pub rx_fifo_0: RxFifoConfig,
    /// Receive FIFO 1
    pub rx_fifo_1: RxFifoConfig,
    /// Dedicated receive buffers
    pub rx_buffers: RxBuffersConfig,
    /// Transmit buffers and FIFO/queue
    pub tx_buffers: TxBuffersConfig,
    /// Transmit event FIFO
    pub tx_event_fifo: TxEventFifoConfig,
}

/// Maximum number of standard ID filter elements
pub const STANDARD_FILTERS_MAX: u8 = 128;
/// Maximum number of extended ID filter elements
pub const EXTENDED_FILTERS_MAX: u8 = 64;
/// Maximum number of elements in a receive FIFO
pub const RX_FIFO_MAX: u8 = 64;
/// Maximum number of dedicated receive buffers
pub const RX_BUFFERS_MAX: u8 = 64;
/// Maximum number of transmit buffers, dedicated and queued combined
pub const TX_BUFFERS_MAX: u8 = 32;
/// Maximum number of transmit event FIFO elements
pub const TX_EVENT_FIFO_MAX: u8 = 32;

/// Resolved geometry of a single region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Region {
    /// Byte offset within the message RAM
    pub start: u32,
    /// Number of elements
    pub count: u8,
    /// Words occupied by one element
    pub element_words: u32,
}

impl Region {
    /// Byte distance between consecutive elements.
    pub fn stride(&self) -> u32 {
        self.element_words * 4
    }

    /// Bytes the whole region occupies.
    pub fn span(&self) -> u32 {
        u32::from(self.count) * self.stride()
    }

    /// Payload bytes of one element, headers excluded.
    pub fn data_bytes(&self) -> u32 {
        self.element_words.saturating_sub(2) * 4
    }

    /// Byte offset of element `index` within the message RAM.
    ///
    /// The index is not range checked; it either comes from a live
    /// hardware get/put index or has been checked by the caller.
    pub fn element_offset(&self, index: u32) -> u32 {
        self.start + index * self.stride()
    }

    /// Like [`Self::element_offset`], for caller supplied indices.
    /// `None` when `index` is outside the configured element count.
    pub fn checked_offset(&self, index: u8) -> Option<u32> {
        (index < self.count).then(|| self.element_offset(u32::from(index)))
    }

    fn validate(&self, kind: RegionKind, max_count: u8, available: u32) -> Result<(), ConfigurationError> {
        if self.count == 0 {
            return Ok(());
        }
        if self.start % 4 != 0 {
            return Err(ConfigurationError::UnalignedStart(kind));
        }
        if self.count > max_count {
            return Err(ConfigurationError::TooManyElements(kind));
        }
        match self.start.checked_add(self.span()) {
            Some(end) if end <= available => Ok(()),
            _ => Err(ConfigurationError::RegionOutOfBounds(kind)),
        }
    }
}

/// Validated message RAM layout table.
///
/// Built by [`MessageRamConfig::validate`], held by the controller
/// handle and read by every element address computation. The start
/// addresses are stored in bytes; the hardware keeps them right-shifted
/// by two in the configuration registers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MessageRamLayout {
    pub(crate) standard_filters: Region,
    pub(crate) extended_filters: Region,
    pub(crate) rx_fifo_0: Region,
    pub(crate) rx_fifo_1: Region,
    pub(crate) rx_buffers: Region,
    pub(crate) tx_buffers: Region,
    pub(crate) tx_event_fifo: Region,
}

impl MessageRamLayout {
    pub(crate) fn region(&self, kind: RegionKind) -> &Region {
        match kind {
            RegionKind::StandardFilters => &self.standard_filters,
            RegionKind::ExtendedFilters => &self.extended_filters,
            RegionKind::RxFifo0 => &self.rx_fifo_0,
            RegionKind::RxFifo1 => &self.rx_fifo_1,
            RegionKind::RxBuffers => &self.rx_buffers,
            RegionKind::TxBuffers => &self.tx_buffers,
            RegionKind::TxEventFifo => &self.tx_event_fifo,
        }
    }

    /// Byte offset of element `index` of the given region within the
    /// message RAM. `None` when the index is outside the configured
    /// element count.
    ///
    /// Resolution is a pure function of the layout table; nothing is
    /// cached between calls.
    pub fn element_offset(&self, kind: RegionKind, index: u8) -> Option<u32> {
        self.region(kind).checked_offset(index)
    }
}

impl MessageRamConfig {
    /// Checks the configuration against the region count ceilings and
    /// the physical message RAM capacity of `available` bytes.
    pub fn validate(&self, available: u32) -> Result<MessageRamLayout, ConfigurationError> {
        // The TX section ceiling applies to the combined count; checked
        // in u16 so an absurd pair of u8 parameters cannot wrap.
        if u16::from(self.tx_buffers.dedicated) + u16::from(self.tx_buffers.queue_size)
            > u16::from(TX_BUFFERS_MAX)
        {
            return Err(ConfigurationError::TooManyElements(RegionKind::TxBuffers));
        }

        let layout = MessageRamLayout {
            standard_filters: Region {
                start: self.standard_filters.start,
                count: self.standard_filters.count,
                element_words: STANDARD_FILTER_WORDS,
            },
            extended_filters: Region {
                start: self.extended_filters.start,
                count: self.extended_filters.count,
                element_words: EXTENDED_FILTER_WORDS,
            },
            rx_fifo_0: Region {
                start: self.rx_fifo_0.start,
                count: self.rx_fifo_0.size,
                element_words: self.rx_fifo_0.element_size.object_words(),
            },
            rx_fifo_1: Region {
                start: self.rx_fifo_1.start,
                count: self.rx_fifo_1.size,
                element_words: self.rx_fifo_1.element_size.object_words(),
            },
            rx_buffers: Region {
                start: self.rx_buffers.start,
                count: self.rx_buffers.count,
                element_words: self.rx_buffers.element_size.object_words(),
            },
            tx_buffers: Region {
                start: self.tx_buffers.start,
                count: self.tx_buffers.dedicated + self.tx_buffers.queue_size,
                element_words: self.tx_buffers.element_size.object_words(),
            },
            tx_event_fifo: Region {
                start: self.tx_event_fifo.start,
                count: self.tx_event_fifo.size,
                element_words: TX_EVENT_WORDS,
            },
        };

        use RegionKind::*;
        layout
            .standard_filters
            .validate(StandardFilters, STANDARD_FILTERS_MAX, available)?;
        layout
            .extended_filters
            .validate(ExtendedFilters, EXTENDED_FILTERS_MAX, available)?;
        layout.rx_fifo_0.validate(RxFifo0, RX_FIFO_MAX, available)?;
        layout.rx_fifo_1.validate(RxFifo1, RX_FIFO_MAX, available)?;
        layout.rx_buffers.validate(RxBuffers, RX_BUFFERS_MAX, available)?;
        layout.tx_buffers.validate(TxBuffers, TX_BUFFERS_MAX, available)?;
        layout
            .tx_event_fifo
            .validate(TxEventFifo, TX_EVENT_FIFO_MAX, available)?;

        let required = layout.standard_filters.span()
            + layout.extended_filters.span()
            + layout.rx_fifo_0.span()
            + layout.rx_fifo_1.span()
            + layout.rx_buffers.span()
            + layout.tx_buffers.span()
            + layout.tx_event_fifo.span();
        if required > available {
            return Err(ConfigurationError::Overcommitted {
                required,
                available,
            });
        }

        Ok(layout)
    }
}
