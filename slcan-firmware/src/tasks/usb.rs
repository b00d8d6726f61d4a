//! USB device and CDC-ACM bridge tasks
//!
//! The CDC class is split in two halves. Host packets are copied into
//! [`HOST_RX`]; whatever the adapter leaves in [`HOST_TX`] is sent back as
//! packets. Both halves restart when the host disconnects.

use defmt::*;
use embassy_futures::join::join;
use embassy_stm32::peripherals::USB;
use embassy_stm32::usb::Driver;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;

use crate::channels::{HOST_RX, HOST_TX};

/// Full-speed bulk packet size
pub const MAX_PACKET_SIZE: u16 = 64;

pub type UsbDriver = Driver<'static, USB>;

/// Runs the USB device stack (enumeration, control requests)
#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) {
    usb.run().await
}

#[embassy_executor::task]
pub async fn cdc_task(class: CdcAcmClass<'static, UsbDriver>) {
    info!("CDC bridge task started");

    let (mut sender, mut receiver) = class.split();
    join(host_to_adapter(&mut receiver), adapter_to_host(&mut sender)).await;
}

async fn host_to_adapter(receiver: &mut Receiver<'static, UsbDriver>) {
    let mut packet = [0u8; MAX_PACKET_SIZE as usize];

    loop {
        receiver.wait_connection().await;
        info!("USB host connected");

        loop {
            match receiver.read_packet(&mut packet).await {
                Ok(len) => HOST_RX.write_all(&packet[..len]).await,
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => warn!("USB packet overflow"),
            }
        }

        info!("USB host disconnected");
        HOST_RX.clear();
    }
}

async fn adapter_to_host(sender: &mut Sender<'static, UsbDriver>) {
    let mut packet = [0u8; MAX_PACKET_SIZE as usize];

    loop {
        sender.wait_connection().await;

        loop {
            let len = HOST_TX.read(&mut packet).await;
            if sender.write_packet(&packet[..len]).await.is_err() {
                break;
            }
            // A full packet needs a zero-length packet to end the transfer
            if len == packet.len() && sender.write_packet(&[]).await.is_err() {
                break;
            }
        }

        HOST_TX.clear();
    }
}
