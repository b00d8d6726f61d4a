//! STM32F0-specific HAL for the slcan adapter firmware
//!
//! This crate provides STM32F0 implementations of the `slcan-hal` traits.
//! Supported chips:
//!
//! - STM32F042C6 (CANable-style dongles)
//! - STM32F072CB
//!
//! # Features
//!
//! - `stm32f042c6` / `stm32f072cb` - select the chip
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! The firmware initialises clocks and USB through embassy-stm32 as usual,
//! builds an `embassy_stm32::can::Can` on its CAN pins and hands it to
//! [`BxCan::new`].

#![no_std]
#![deny(unsafe_code)]

pub mod can;
pub mod gpio;

pub use can::BxCan;
pub use gpio::Led;
