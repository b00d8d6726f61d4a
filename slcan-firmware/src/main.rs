//! slcan USB-to-CAN adapter firmware
//!
//! Firmware for STM32F042C6 CAN dongles. The host speaks the slcan ASCII
//! line protocol over USB CDC-ACM; frames are queued to the bxCAN
//! controller and received frames are streamed back as lines.
//!
//! Tasks:
//! - `usb_task` / `cdc_task`: USB stack and the byte bridge to the pipes
//! - `tick_task`: 1 ms timebase for LED windows
//! - `adapter_task`: the cooperative poll loop

#![no_std]
#![no_main]

mod channels;
mod serial;
mod tasks;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::rcc::{Hsi48Config, Sysclk};
use embassy_stm32::{bind_interrupts, can, peripherals, usb, Config};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use slcan_core::{AdapterConfig, AdapterContext, StatusLeds};
use slcan_hal_stm32f0::{BxCan, Led};

use crate::channels::{HOST_RX, HOST_TX};
use crate::serial::PipeSerial;
use crate::tasks::{UsbDriver, MAX_PACKET_SIZE};

bind_interrupts!(struct Irqs {
    USB => usb::InterruptHandler<peripherals::USB>;
    CEC_CAN => can::Rx0InterruptHandler<peripherals::CAN>,
        can::Rx1InterruptHandler<peripherals::CAN>,
        can::SceInterruptHandler<peripherals::CAN>,
        can::TxInterruptHandler<peripherals::CAN>;
});

/// Core clock, also the CAN peripheral clock (APB undivided)
const SYSCLK_HZ: u32 = 48_000_000;

/// Busy-wait cycles per millisecond at `SYSCLK_HZ`
const CYCLES_PER_MS: u32 = SYSCLK_HZ / 1000;

/// Startup blink: cycles and half-period
const STARTUP_BLINKS: u8 = 5;
const STARTUP_BLINK_MS: u32 = 50;

/// LED polarity on this board
const LEDS_ACTIVE_LOW: bool = false;

const USB_VID: u16 = 0x1d50;
const USB_PID: u16 = 0x606f;

/// Reply to `V`
const VERSION_LINE: &[u8] = b"V1013";

static CONFIG_DESCRIPTOR: StaticCell<[u8; 128]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 16]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("slcan firmware starting...");

    // HSI48 trimmed from USB SOF drives everything
    let mut config = Config::default();
    config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true });
    config.rcc.sys = Sysclk::HSI48;
    let p = embassy_stm32::init(config);
    info!("Peripherals initialized");

    let adapter_config = AdapterConfig {
        peripheral_clock_hz: SYSCLK_HZ,
        ..AdapterConfig::default()
    }
    .with_version_line(VERSION_LINE);

    // Status LEDs (PB0 = bus, PB1 = activity)
    let mut leds = StatusLeds::new(
        Led::new(p.PB0, LEDS_ACTIVE_LOW),
        Led::new(p.PB1, LEDS_ACTIVE_LOW),
        adapter_config.activity_on_ms,
        adapter_config.activity_off_ms,
    );
    leds.startup_blink(STARTUP_BLINKS, STARTUP_BLINK_MS, |ms| {
        cortex_m::asm::delay(ms * CYCLES_PER_MS)
    });

    // CAN on PB8 (RX) / PB9 (TX)
    let bxcan = BxCan::new(can::Can::new(p.CAN, p.PB8, p.PB9, Irqs));

    // USB CDC-ACM on PA12 (D+) / PA11 (D-)
    let driver: UsbDriver = usb::Driver::new(p.USB, Irqs, p.PA12, p.PA11);

    let mut usb_config = embassy_usb::Config::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some("slcan");
    usb_config.product = Some("USB-CAN adapter");
    usb_config.serial_number = Some("00000001");
    usb_config.max_packet_size_0 = MAX_PACKET_SIZE as u8;

    let mut builder = Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 128]),
        BOS_DESCRIPTOR.init([0; 16]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET_SIZE);
    let usb = builder.build();

    let adapter = AdapterContext::new(
        bxcan,
        PipeSerial::new(&HOST_RX, &HOST_TX),
        leds,
        &adapter_config,
    );

    // Spawn tasks
    spawner.spawn(tasks::usb_task(usb)).unwrap();
    spawner.spawn(tasks::cdc_task(class)).unwrap();
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::adapter_task(adapter)).unwrap();

    info!("All tasks spawned");
}
