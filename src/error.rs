use crate::fm25::{Identification, CAPACITY};
use core::fmt::{self, Debug, Display};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

mod private {
    #[derive(Debug)]
    pub enum Private {}
}

/// The error type used by this library.
///
/// This can encapsulate an SPI or GPIO error, and adds its own protocol errors
/// on top of that.
pub enum Error<SPI: Transfer<u8>, GPIO: OutputPin> {
    /// An SPI transfer failed.
    Spi(SPI::Error),

    /// A GPIO could not be set.
    Gpio(GPIO::Error),

    /// The chip answered the identification request with a manufacturer code
    /// the driver does not support.
    ///
    /// This usually means nothing is connected, or the bus is wired or
    /// configured incorrectly.
    UnrecognizedDevice(Identification),

    /// The requested range does not fit into the device.
    OutOfBounds(OutOfBounds),

    /// Reading back a freshly written byte returned a different value.
    VerifyFailed {
        /// Address of the byte.
        addr: u16,
        /// The value that was written.
        expected: u8,
        /// The value the chip returned.
        found: u8,
    },

    /// A file could not be opened, read or written.
    #[cfg(feature = "std")]
    Io(std::io::Error),

    #[doc(hidden)]
    __NonExhaustive(private::Private),
}

impl<SPI: Transfer<u8>, GPIO: OutputPin> From<OutOfBounds> for Error<SPI, GPIO> {
    fn from(bounds: OutOfBounds) -> Self {
        Error::OutOfBounds(bounds)
    }
}

impl<SPI: Transfer<u8>, GPIO: OutputPin> Debug for Error<SPI, GPIO>
where
    SPI::Error: Debug,
    GPIO::Error: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "Error::Spi({:?})", spi),
            Error::Gpio(gpio) => write!(f, "Error::Gpio({:?})", gpio),
            Error::UnrecognizedDevice(id) => write!(f, "Error::UnrecognizedDevice({:?})", id),
            Error::OutOfBounds(bounds) => write!(f, "Error::OutOfBounds({:?})", bounds),
            Error::VerifyFailed {
                addr,
                expected,
                found,
            } => write!(
                f,
                "Error::VerifyFailed {{ addr: 0x{:04x}, expected: 0x{:02x}, found: 0x{:02x} }}",
                addr, expected, found
            ),
            #[cfg(feature = "std")]
            Error::Io(io) => write!(f, "Error::Io({:?})", io),
            Error::__NonExhaustive(_) => unreachable!(),
        }
    }
}

impl<SPI: Transfer<u8>, GPIO: OutputPin> Display for Error<SPI, GPIO>
where
    SPI::Error: Display,
    GPIO::Error: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "SPI error: {}", spi),
            Error::Gpio(gpio) => write!(f, "GPIO error: {}", gpio),
            Error::UnrecognizedDevice(id) => write!(
                f,
                "unrecognized device (manufacturer ID {:04x}, product ID {:04x})",
                id.manufacturer_id(),
                id.product_id()
            ),
            Error::OutOfBounds(bounds) => Display::fmt(bounds, f),
            Error::VerifyFailed {
                addr,
                expected,
                found,
            } => write!(
                f,
                "bad write at 0x{:04X}: wrote 0x{:02X}, read back 0x{:02X}",
                addr, expected, found
            ),
            #[cfg(feature = "std")]
            Error::Io(io) => write!(f, "I/O error: {}", io),
            Error::__NonExhaustive(_) => unreachable!(),
        }
    }
}

/// A request that does not fit into the device's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfBounds {
    /// The start address lies past the end of the device.
    Address(u16),
    /// The start address is valid, but `len` bytes from it are not.
    Data {
        /// Start address of the request.
        addr: u16,
        /// Number of bytes requested.
        len: usize,
    },
}

impl Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfBounds::Address(addr) => write!(
                f,
                "address 0x{:04X} out of bounds (device ends at 0x{:04X})",
                addr, CAPACITY
            ),
            OutOfBounds::Data { addr, len } => write!(
                f,
                "data out of bounds: {} bytes from 0x{:04X} exceed 0x{:04X}",
                len, addr, CAPACITY
            ),
        }
    }
}
