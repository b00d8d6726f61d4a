//! Build script for slcan-firmware
//!
//! memory.x comes from embassy-stm32 (`memory-x` feature); this only adds
//! the linker scripts for cortex-m-rt and defmt.

fn main() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    #[cfg(feature = "defmt")]
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}
