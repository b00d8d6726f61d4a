//! Statics shared between Embassy tasks
//!
//! The USB task and the adapter task never share a borrow: bytes cross
//! between them through two pipes, and the millisecond tick is an atomic.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;

use slcan_core::MonotonicTick;

/// Pipe capacity in each direction; several full frame lines
pub const HOST_PIPE_SIZE: usize = 256;

pub type HostPipe = Pipe<CriticalSectionRawMutex, HOST_PIPE_SIZE>;

/// Bytes received from the host, waiting for the poll loop
pub static HOST_RX: HostPipe = Pipe::new();

/// Encoded lines waiting to go out over USB
pub static HOST_TX: HostPipe = Pipe::new();

/// Millisecond timebase for LED windows
pub static TICK: MonotonicTick = MonotonicTick::new();
