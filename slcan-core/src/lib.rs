//! Board-agnostic adapter logic for the slcan firmware
//!
//! This crate contains everything between the host line protocol and the
//! hardware traits:
//!
//! - CAN controller driver with its transmit ring queue
//! - Status LED timing
//! - Diagnostic counters
//! - Millisecond timebase
//! - The adapter context and its poll loop
//!
//! ```text
//!  host bytes ─▶ LineBuffer ─▶ Command ─▶ CanController ─▶ TxQueue ─▶ TX mailbox
//!  host line  ◀─ CanFrame::encode ◀──────── receive_drain ◀──────────── RX FIFO
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod led;
pub mod tick;

#[cfg(test)]
mod testing;

pub use adapter::AdapterContext;
pub use config::AdapterConfig;
pub use diagnostics::{Diagnostics, Fault};
pub use driver::{BusState, CanController, ControllerError, QueueFull, TxQueue, TX_QUEUE_CAPACITY};
pub use led::{Indicator, StatusLeds};
pub use tick::MonotonicTick;
