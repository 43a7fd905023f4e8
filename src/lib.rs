#![no_std]
#![warn(missing_docs)]
//! # MCAN message RAM layer
//!
//! ## Overview
//! This crate provides the message RAM management and frame codec core
//! of an MCAN CAN FD driver.
//!
//! It provides the following features:
//!
//! - runtime message RAM layouting with validation against the
//!   physical RAM capacity before any register is written
//! - element address resolution for all seven RAM regions in one place
//! - classical CAN and CAN FD frame element packing and unpacking, with
//!   zero-copy access to received payloads
//! - standard and extended acceptance filter element codecs
//! - scoped unlocking of the write protected configuration registers
//!   that cannot leave the controller stuck in configuration mode
//! - the ECC aggregator load sequence required before its serialized
//!   registers deliver valid data
//! - structured read-only views of the status registers
//!
//! The surrounding platform concerns are out of scope: clocks, pins,
//! bit timing and interrupt line routing stay with the platform HAL,
//! which reaches the hardware through the same word-access
//! [`Interface`](interface::Interface) it hands to this crate.
//!
//! ## State machine
//!
//! The controller handle exists in two forms. [`CanConfigurable`]
//! corresponds to initialization mode: the message RAM layout, filters
//! and policies are set up here, with the protected register writes
//! wrapped in a scoped [`ConfigGuard`](guard::ConfigGuard).
//! [`finalize`] moves to [`Can`], the operational form carrying the
//! frame transfer operations; [`configure`] moves back.
//!
//! ## Concurrency
//!
//! All operations are synchronous and, apart from the ECC load spin
//! wait, non-blocking. The message RAM is shared with the peripheral;
//! ordering between the two sides is enforced by the hardware's own
//! get/put index registers, under the hardware guarantee that a buffer
//! slot is not reused until it has been acknowledged. No software lock
//! is added on top. Callers that drive the same handle from both a
//! task and an interrupt context must serialize themselves around any
//! multi-register sequence (notably everything on [`CanConfigurable`]),
//! for example by masking the relevant interrupt.
//!
//! ## Usage
//!
//! ```no_run
//! use mcan_msgram::bus::CanConfigurable;
//! use mcan_msgram::interface::Mmio;
//! use mcan_msgram::message::tx;
//! use mcan_msgram::messageram::{DataFieldSize, MessageRamConfig, RxFifoConfig, TxBuffersConfig};
//! use mcan_msgram::rx_fifo::RxFifo;
//! use mcan_msgram::embedded_can::StandardId;
//!
//! // Safety: CAN0 register window and message RAM as mapped on the
//! // target platform, owned exclusively by this handle.
//! let interface = unsafe { Mmio::new(0x4000_A000 as *mut u32, 0x8000, 0x1000) };
//! let mut can = CanConfigurable::new(interface);
//!
//! can.apply_message_ram_config(&MessageRamConfig {
//!     rx_fifo_0: RxFifoConfig {
//!         start: 0x000,
//!         size: 16,
//!         element_size: DataFieldSize::B64,
//!         ..Default::default()
//!     },
//!     tx_buffers: TxBuffersConfig {
//!         start: 0x500,
//!         dedicated: 4,
//!         queue_size: 8,
//!         element_size: DataFieldSize::B64,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! })?;
//!
//! let mut can = can.finalize()?;
//!
//! let frame = tx::Frame::classic(StandardId::new(0x123).unwrap(), &[1, 2, 3]).unwrap();
//! nb::block!(can.transmit_queued(&frame)).unwrap();
//!
//! if let Ok((index, frame)) = can.receive(RxFifo::Fifo0) {
//!     let mut buffer = [0; 64];
//!     let payload = can.read_payload(&frame, &mut buffer);
//!     // ... handle the frame ...
//!     can.acknowledge(RxFifo::Fifo0, index).unwrap();
//! }
//! # Ok::<(), mcan_msgram::messageram::ConfigurationError>(())
//! ```
//!
//! [`CanConfigurable`]: crate::bus::CanConfigurable
//! [`Can`]: crate::bus::Can
//! [`finalize`]: crate::bus::CanConfigurable::finalize
//! [`configure`]: crate::bus::Can::configure

pub mod bus;
pub mod ecc;
pub mod filter;
pub mod guard;
pub mod interface;
pub mod message;
pub mod messageram;
pub mod reg;
pub mod rx_dedicated_buffers;
pub mod rx_fifo;
pub mod status;
pub mod tx_buffers;
pub mod tx_event_fifo;

pub use embedded_can;
