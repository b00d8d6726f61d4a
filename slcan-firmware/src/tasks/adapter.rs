//! Adapter poll-loop task
//!
//! Runs [`AdapterContext::poll`] forever, yielding to the executor between
//! iterations so the USB and tick tasks keep running. Diagnostics are
//! logged periodically when they change.

use defmt::*;
use embassy_futures::yield_now;

use slcan_core::{AdapterContext, Diagnostics};
use slcan_hal_stm32f0::{BxCan, Led};

use crate::channels::TICK;
use crate::serial::PipeSerial;

/// Interval between diagnostics reports
const REPORT_INTERVAL_MS: u32 = 10_000;

/// The adapter as wired on this board
pub type Adapter = AdapterContext<BxCan, PipeSerial, Led, Led>;

#[embassy_executor::task]
pub async fn adapter_task(mut adapter: Adapter) {
    info!("Adapter task started");

    let mut last_report_ms = TICK.now_ms();
    let mut reported = Diagnostics::new();

    loop {
        let now_ms = TICK.now_ms();
        adapter.poll(now_ms);

        if now_ms.wrapping_sub(last_report_ms) >= REPORT_INTERVAL_MS {
            last_report_ms = now_ms;
            let current = *adapter.diagnostics();
            if current != reported {
                report(&current);
                reported = current;
            }
        }

        yield_now().await;
    }
}

fn report(diag: &Diagnostics) {
    info!(
        "frames tx={} rx={}, faults={}",
        diag.frames_sent,
        diag.frames_received,
        diag.total_faults()
    );
    if diag.total_faults() > 0 {
        warn!("diagnostics: {}", diag);
    }
}
