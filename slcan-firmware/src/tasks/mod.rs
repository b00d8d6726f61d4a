//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod adapter;
pub mod tick;
pub mod usb;

pub use adapter::adapter_task;
pub use tick::tick_task;
pub use usb::{cdc_task, usb_task, UsbDriver, MAX_PACKET_SIZE};
