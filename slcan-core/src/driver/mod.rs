//! CAN controller driver and its transmit queue

mod controller;
mod tx_queue;

pub use controller::{
    frame_from_mailbox, mailbox_from_frame, BusState, CanController, ControllerError,
    ControllerSettings, Phase, TxService,
};
pub use tx_queue::{QueueFull, TxQueue, TX_QUEUE_CAPACITY};
