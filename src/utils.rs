use crate::Error;
use core::fmt;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

pub struct HexSlice<T>(pub T)
where
    T: AsRef<[u8]>;

impl<T: AsRef<[u8]>> fmt::Debug for HexSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.as_ref().iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}

/// Clocks `bytes` out with chip select asserted, replacing them with the
/// received bytes.
pub(crate) fn spi_command<SPI, CS>(
    spi: &mut SPI,
    cs: &mut CS,
    bytes: &mut [u8],
) -> Result<(), Error<SPI, CS>>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    // If the SPI transfer fails, make sure to disable CS anyways
    cs.set_low().map_err(Error::Gpio)?;
    let spi_result = spi.transfer(bytes).map_err(Error::Spi);
    cs.set_high().map_err(Error::Gpio)?;
    spi_result?;
    Ok(())
}

/// Formats `data` as uppercase hex, 16 bytes per line.
///
/// Every line, including the last, is terminated by `\n`. An empty slice
/// gives an empty string.
#[cfg(feature = "std")]
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 16 + 1);
    for line in data.chunks(16) {
        out.push_str(&hex::encode_upper(line));
        out.push('\n');
    }
    out
}
