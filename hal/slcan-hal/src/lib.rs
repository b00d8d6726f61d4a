//! slcan Adapter Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the adapter logic is written
//! against. Chip-specific HALs implement them so the same controller
//! driver, codec and poll loop run on real silicon and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (slcan-core poll loop)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  slcan-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ slcan-hal-    │       │  test mocks   │
//! │   stm32f0     │       │ (slcan-core)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`can::CanPeripheral`] - CAN controller access
//! - [`gpio::OutputPin`] - Status indicators
//! - [`serial::SerialRx`], [`serial::SerialTx`] - Host transport

#![no_std]
#![deny(unsafe_code)]

pub mod can;
pub mod gpio;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use can::{BitTiming, CanPeripheral, MailboxBusy, MailboxFrame};
pub use gpio::OutputPin;
pub use serial::{Serial, SerialError, SerialRx, SerialTx};
