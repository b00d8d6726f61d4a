//! Millisecond tick task
//!
//! Advances the shared [`TICK`](crate::channels::TICK) counter used for
//! LED timing windows.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::TICK;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1;

#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;
        TICK.increment();
    }
}
