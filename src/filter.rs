//! Message filters
//!
//! Filter elements live in the message RAM: one word per standard ID
//! filter, two consecutive words per extended ID filter. Their stride
//! is fixed and independent of the data element sizes.

use embedded_can::{ExtendedId, StandardId};

/// 11-bit filter element in the peripheral's representation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterStandardId(pub(crate) u32);

/// 29-bit filter element in the peripheral's representation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterExtendedId(pub(crate) [u32; 2]);

/// Message filter for 11-bit RX messages
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// The filter is skipped
    Disabled,
    /// Range filter from low to high IDs
    Range {
        /// Action to take on a matched element
        action: Action,
        /// Lower filter limit
        low: StandardId,
        /// Upper filter limit
        high: StandardId,
    },
    /// Filter for two IDs
    Dual {
        /// Action to take on a matched element
        action: Action,
        /// Individual filter 1
        id1: StandardId,
        /// Individual filter 2
        id2: StandardId,
    },
    /// Traditional filter/mask CAN filter
    Classic {
        /// Action to take on a matched element
        action: Action,
        /// ID filter
        filter: StandardId,
        /// ID mask
        mask: StandardId,
    },
    /// Store into a dedicated RX buffer or as debug message, ignoring
    /// the filter type
    StoreBuffer {
        /// 11-bit filter ID
        id: StandardId,
        /// Storage destination
        msg_type: SbMsgType,
        /// Offset from the RX buffer section start, in elements
        offset: u8,
    },
}

/// Message filter for 29-bit RX messages
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtFilter {
    /// The filter is skipped
    Disabled,
    /// Range filter from low to high IDs, the extended ID AND mask
    /// applied beforehand
    MaskedRange {
        /// Action to take on a matched element
        action: Action,
        /// Lower filter limit
        low: ExtendedId,
        /// Upper filter limit
        high: ExtendedId,
    },
    /// Filter for two IDs
    Dual {
        /// Action to take on a matched element
        action: Action,
        /// Individual filter 1
        id1: ExtendedId,
        /// Individual filter 2
        id2: ExtendedId,
    },
    /// Traditional filter/mask CAN filter
    Classic {
        /// Action to take on a matched element
        action: Action,
        /// ID filter
        filter: ExtendedId,
        /// ID mask
        mask: ExtendedId,
    },
    /// Range filter from low to high IDs without the AND mask
    Range {
        /// Action to take on a matched element
        action: Action,
        /// Lower filter limit
        low: ExtendedId,
        /// Upper filter limit
        high: ExtendedId,
    },
    /// Store into a dedicated RX buffer or as debug message, ignoring
    /// the filter type
    StoreBuffer {
        /// 29-bit filter ID
        id: ExtendedId,
        /// Storage destination
        msg_type: SbMsgType,
        /// Offset from the RX buffer section start, in elements
        offset: u8,
    },
}

/// Store buffer message types
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SbMsgType {
    /// Store into the RX buffer slot selected by the filter offset
    #[default]
    RxBuffer = 0,
    /// Debug message A
    DebugA = 1,
    /// Debug message B
    DebugB = 2,
    /// Debug message C
    DebugC = 3,
}

impl From<u32> for SbMsgType {
    fn from(value: u32) -> Self {
        match value & 0x3 {
            1 => Self::DebugA,
            2 => Self::DebugB,
            3 => Self::DebugC,
            _ => Self::RxBuffer,
        }
    }
}

/// Filter element configurations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Store in RX FIFO 0 if filter matches
    StoreFifo0,
    /// Store in RX FIFO 1 if filter matches
    StoreFifo1,
    /// Reject ID if filter matches
    Reject,
    /// Set priority if filter matches
    Priority,
    /// Set priority and store in FIFO 0 if filter matches
    PriorityFifo0,
    /// Set priority and store in FIFO 1 if filter matches
    PriorityFifo1,
}

impl From<Action> for u32 {
    fn from(val: Action) -> Self {
        match val {
            Action::StoreFifo0 => 0x1,
            Action::StoreFifo1 => 0x2,
            Action::Reject => 0x3,
            Action::Priority => 0x4,
            Action::PriorityFifo0 => 0x5,
            Action::PriorityFifo1 => 0x6,
        }
    }
}

/// Element configuration field to [`Action`]; only defined for the
/// non-special encodings 1..=6.
fn action_from_bits(bits: u32) -> Option<Action> {
    Some(match bits {
        0x1 => Action::StoreFifo0,
        0x2 => Action::StoreFifo1,
        0x3 => Action::Reject,
        0x4 => Action::Priority,
        0x5 => Action::PriorityFifo0,
        0x6 => Action::PriorityFifo1,
        _ => return None,
    })
}

impl From<Filter> for FilterStandardId {
    fn from(val: Filter) -> Self {
        let v = match val {
            Filter::Disabled => 0,
            Filter::Range { action, high, low } => {
                let action: u32 = action.into();

                (high.as_raw() as u32) | ((low.as_raw() as u32) << 16) | (action << 27)
            }
            Filter::Dual { action, id1, id2 } => {
                let action: u32 = action.into();

                (id2.as_raw() as u32) | ((id1.as_raw() as u32) << 16) | (action << 27) | (1 << 30)
            }
            Filter::Classic {
                action,
                filter,
                mask,
            } => {
                let action: u32 = action.into();

                (mask.as_raw() as u32)
                    | ((filter.as_raw() as u32) << 16)
                    | (action << 27)
                    | (2 << 30)
            }
            Filter::StoreBuffer {
                id,
                msg_type,
                offset,
            } => (id.as_raw() as u32) << 16 | (msg_type as u32) << 9 | offset as u32 | (0x7 << 27),
        };

        FilterStandardId(v)
    }
}

impl FilterStandardId {
    /// Decodes the stored element. Reserved filter type encodings come
    /// back as [`Filter::Disabled`], matching how the hardware skips
    /// them.
    pub fn decode(self) -> Filter {
        let w = self.0;
        // The masks keep the values in range for 11-bit identifiers
        let id = |raw: u32| unsafe { StandardId::new_unchecked(raw as u16 & StandardId::MAX.as_raw()) };
        match (w >> 27) & 0x7 {
            0 => Filter::Disabled,
            7 => Filter::StoreBuffer {
                id: id(w >> 16),
                msg_type: (w >> 9).into(),
                offset: (w & 0xff) as u8,
            },
            sfec => {
                let Some(action) = action_from_bits(sfec) else {
                    return Filter::Disabled;
                };
                match (w >> 30) & 0x3 {
                    0 => Filter::Range {
                        action,
                        low: id(w >> 16),
                        high: id(w),
                    },
                    1 => Filter::Dual {
                        action,
                        id1: id(w >> 16),
                        id2: id(w),
                    },
                    2 => Filter::Classic {
                        action,
                        filter: id(w >> 16),
                        mask: id(w),
                    },
                    _ => Filter::Disabled,
                }
            }
        }
    }
}

impl From<ExtFilter> for FilterExtendedId {
    fn from(val: ExtFilter) -> Self {
        let (v1, v2) = match val {
            ExtFilter::Disabled => (0, 0),
            ExtFilter::MaskedRange { action, high, low } => {
                let action: u32 = action.into();

                ((action << 29 | low.as_raw()), high.as_raw())
            }
            ExtFilter::Dual { action, id1, id2 } => {
                let action: u32 = action.into();

                ((action << 29 | id1.as_raw()), (1 << 30 | id2.as_raw()))
            }
            ExtFilter::Classic {
                action,
                filter,
                mask,
            } => {
                let action: u32 = action.into();

                ((action << 29 | filter.as_raw()), (2 << 30 | mask.as_raw()))
            }
            ExtFilter::Range { action, high, low } => {
                let action: u32 = action.into();

                ((action << 29 | low.as_raw()), (3 << 30 | high.as_raw()))
            }
            ExtFilter::StoreBuffer {
                id,
                msg_type,
                offset,
            } => (
                (0x7 << 29 | id.as_raw()),
                (msg_type as u32) << 9 | offset as u32,
            ),
        };
        FilterExtendedId([v1, v2])
    }
}

impl FilterExtendedId {
    /// Decodes the stored element pair.
    pub fn decode(self) -> ExtFilter {
        let [w1, w2] = self.0;
        // The masks keep the values in range for 29-bit identifiers
        let id = |raw: u32| unsafe { ExtendedId::new_unchecked(raw & ExtendedId::MAX.as_raw()) };
        match (w1 >> 29) & 0x7 {
            0 => ExtFilter::Disabled,
            7 => ExtFilter::StoreBuffer {
                id: id(w1),
                msg_type: (w2 >> 9).into(),
                offset: (w2 & 0xff) as u8,
            },
            efec => {
                let Some(action) = action_from_bits(efec) else {
                    return ExtFilter::Disabled;
                };
                match (w2 >> 30) & 0x3 {
                    0 => ExtFilter::MaskedRange {
                        action,
                        low: id(w1),
                        high: id(w2),
                    },
                    1 => ExtFilter::Dual {
                        action,
                        id1: id(w1),
                        id2: id(w2),
                    },
                    2 => ExtFilter::Classic {
                        action,
                        filter: id(w1),
                        mask: id(w2),
                    },
                    _ => ExtFilter::Range {
                        action,
                        low: id(w1),
                        high: id(w2),
                    },
                }
            }
        }
    }
}

/// What to do with frames that match no filter element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NonMatchingAction {
    /// Store in RX FIFO 0
    #[default]
    StoreFifo0,
    /// Store in RX FIFO 1
    StoreFifo1,
    /// Reject the frame
    Reject,
}

impl From<NonMatchingAction> for u32 {
    fn from(val: NonMatchingAction) -> Self {
        match val {
            NonMatchingAction::StoreFifo0 => 0x0,
            NonMatchingAction::StoreFifo1 => 0x1,
            NonMatchingAction::Reject => 0x2,
        }
    }
}

/// Peripheral wide acceptance policy, applied before the filter lists.
#[derive(Copy, Clone, Debug, Default)]
pub struct GlobalFilterPolicy {
    /// Handling of standard IDs that match no filter
    pub non_matching_standard: NonMatchingAction,
    /// Handling of extended IDs that match no filter
    pub non_matching_extended: NonMatchingAction,
    /// Reject all remote frames with standard IDs
    pub reject_remote_standard: bool,
    /// Reject all remote frames with extended IDs
    pub reject_remote_extended: bool,
}

impl GlobalFilterPolicy {
    /// GFC register encoding.
    pub(crate) fn encode(&self) -> u32 {
        (self.reject_remote_extended as u32)
            | (self.reject_remote_standard as u32) << 1
            | u32::from(self.non_matching_extended) << 2
            | u32::from(self.non_matching_standard) << 4
    }
}
