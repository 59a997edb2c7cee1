//! An [`embedded-hal`]-based driver for SPI FRAM chips.
//!
//! The driver targets 8 KiB parts with a 16-bit address such as the Fujitsu
//! MB85RS64V. Every access is a single addressed transaction of the form
//! `[opcode, addr_hi, addr_lo, data]`; FRAM writes complete within the
//! transaction, so there is no busy polling.
//!
//! With the `std` feature (enabled by default) the [`image`] module moves chip
//! contents to and from owned buffers and files. The `util` feature builds the
//! `fram-util` command-line tool for Linux `spidev` devices.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/

#![doc(html_root_url = "https://docs.rs/spi-fram/0.1.0")]
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod log;
mod error;
pub mod fm25;
#[cfg(feature = "std")]
pub mod image;
pub mod prelude;
#[cfg(test)]
mod sim;
mod utils;

pub use crate::error::{Error, OutOfBounds};
#[cfg(feature = "std")]
pub use crate::utils::hex_dump;

use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

/// A trait for reading operations from a memory chip.
pub trait Read<Addr, SPI: Transfer<u8>, CS: OutputPin> {
    /// Reads bytes from a memory chip.
    ///
    /// # Parameters
    /// * `addr`: The address to start reading at.
    /// * `buf`: The buffer to read `buf.len()` bytes into.
    fn read(&mut self, addr: Addr, buf: &mut [u8]) -> Result<(), Error<SPI, CS>>;
}

/// A trait for writing and erasing operations on a memory chip.
pub trait BlockDevice<Addr, SPI: Transfer<u8>, CS: OutputPin> {
    /// Erases the memory chip fully.
    ///
    /// For FRAM there is no erased state; every byte is overwritten with zero.
    fn erase_all(&mut self) -> Result<(), Error<SPI, CS>>;

    /// Writes bytes onto the memory chip.
    ///
    /// # Parameters
    /// * `addr`: The address to write to.
    /// * `data`: The bytes to write to `addr`.
    fn write_bytes(&mut self, addr: Addr, data: &[u8]) -> Result<(), Error<SPI, CS>>;
}
