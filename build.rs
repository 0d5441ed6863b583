//! Build script for the Morse trainer firmware
//!
//! Adds the cortex-m-rt and defmt linker scripts to the firmware binary.
//! Host builds (`std` feature) are left untouched.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    // memory.x comes from embassy-stm32 (`memory-x` feature)
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
