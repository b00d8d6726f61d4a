//! Serial Line CAN (slcan) Protocol
//!
//! This crate implements the ASCII line protocol spoken between a host
//! running `slcand`/SocketCAN tooling and the adapter. It is pure data
//! transformation: no hardware, no timing.
//!
//! # Protocol Overview
//!
//! Every message is one line of printable ASCII terminated by `\r`:
//! ```text
//! ┌─────┬──────────────┬─────┬──────────────────┬────┐
//! │ CMD │ ID           │ DLC │ DATA             │ CR │
//! │ 1   │ 3 or 8 hex   │ 1   │ 16 hex (8 slots) │ 1  │
//! └─────┴──────────────┴─────┴──────────────────┴────┘
//! ```
//!
//! `t`/`r` carry standard (11-bit) identifiers, `T`/`R` extended (29-bit)
//! ones; lowercase/uppercase `r` marks remote frames. Single-letter
//! commands (`O`, `C`, `S`, `M`, `A`, `V`) configure the adapter.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod hex;
pub mod line;

pub use command::{Bitrate, Command, DecodeError};
pub use frame::{CanFrame, EncodeError, FrameError, FrameKind, Id, MAX_DATA_LEN, MAX_LINE_LEN};
pub use line::{Line, LineBuffer, LineError, LINE_CAPACITY, LINE_TERMINATOR};
