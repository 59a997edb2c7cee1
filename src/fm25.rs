//! Driver for 25-series SPI FRAM chips with a 16-bit address.
//!
//! The supported chips expose a linear 8 KiB array and a small command set.
//! Every memory access addresses a single byte; there is no burst mode in use,
//! so bulk operations issue one frame per byte.

use crate::error::OutOfBounds;
use crate::utils::{spi_command, HexSlice};
use crate::{BlockDevice, Error, Read};
use bitflags::bitflags;
use core::fmt;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

/// Size of the device's address space in bytes.
pub const CAPACITY: usize = 0x2000;

/// JEDEC manufacturer code of Fujitsu, the only vendor the driver accepts.
pub const FUJITSU: u8 = 0x04;

/// Manufacturer and product identification returned by `RDID`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    /// - First byte is the JEDEC manufacturer code
    /// - Second byte is a continuation code (`0x7F` on Fujitsu parts)
    /// - The trailing two bytes are the product ID
    bytes: [u8; 4],
}

impl Identification {
    /// Build an Identification from the four bytes following the `RDID`
    /// opcode.
    pub fn from_bytes(bytes: [u8; 4]) -> Identification {
        Self { bytes }
    }

    /// The JEDEC manufacturer code for this chip.
    pub fn mfr_code(&self) -> u8 {
        self.bytes[0]
    }

    /// The 16-bit manufacturer ID, including the continuation code.
    pub fn manufacturer_id(&self) -> u16 {
        u16::from_be_bytes([self.bytes[0], self.bytes[1]])
    }

    /// The 16-bit product ID, encoding density and revision.
    pub fn product_id(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }
}

impl fmt::Debug for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identification")
            .field(&HexSlice(self.bytes))
            .finish()
    }
}

#[allow(unused)]
enum Opcode {
    /// Set the write enable latch.
    WriteEnable = 0x06,
    /// Clear the write enable latch.
    WriteDisable = 0x04,
    /// Read the 8-bit status register.
    ReadStatus = 0x05,
    /// Write the 8-bit status register.
    WriteStatus = 0x01,
    Read = 0x03,
    Write = 0x02,
    /// Read the 32-bit manufacturer and product ID.
    ReadDeviceId = 0x9F,
}

bitflags! {
    /// Status register bits.
    pub struct Status: u8 {
        /// Status of the **W**rite **E**nable **L**atch.
        const WEL = 1 << 1;
        /// The 2 block protection bits.
        const BP = 0b0000_1100;
        /// **W**rite **P**rotect **EN**able bit.
        const WPEN = 1 << 7;
    }
}

/// Which part of a request [`check_boundary`] validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Only the start address.
    Addr,
    /// Only the end of the range, `addr + len`.
    Data,
    /// Both of the above.
    Both,
}

/// Checks that a request stays inside `[0, CAPACITY)`.
///
/// Never touches the bus.
pub fn check_boundary(check: Check, addr: u16, len: usize) -> Result<(), OutOfBounds> {
    if check != Check::Data && usize::from(addr) >= CAPACITY {
        return Err(OutOfBounds::Address(addr));
    }
    let past_end = usize::from(addr)
        .checked_add(len)
        .map_or(true, |end| end > CAPACITY);
    if check != Check::Addr && past_end {
        return Err(OutOfBounds::Data { addr, len });
    }
    Ok(())
}

fn frame(opcode: Opcode, addr: u16, data: u8) -> [u8; 4] {
    let [hi, lo] = addr.to_be_bytes();
    [opcode as u8, hi, lo, data]
}

/// Driver for 25-series SPI FRAM chips.
///
/// A `Fram` only exists once the attached chip has identified itself, so
/// every method can assume a recognized device.
///
/// # Type Parameters
///
/// * **`SPI`**: The SPI master to which the FRAM chip is attached.
/// * **`CS`**: The **C**hip-**S**elect line attached to the `\CS` pin of the
///   FRAM chip.
#[derive(Debug)]
pub struct Fram<SPI: Transfer<u8>, CS: OutputPin> {
    spi: SPI,
    cs: CS,
    id: Identification,
}

impl<SPI: Transfer<u8>, CS: OutputPin> Fram<SPI, CS> {
    /// Probes the chip and creates a new FRAM driver.
    ///
    /// # Parameters
    ///
    /// * **`spi`**: An SPI master. Must be configured for mode 0, MSB first.
    /// * **`cs`**: The **C**hip-**S**elect Pin connected to the `\CS` pin of
    ///   the FRAM chip. Will be driven low when accessing the device.
    ///
    /// Fails with [`Error::UnrecognizedDevice`] unless the manufacturer code
    /// is [`FUJITSU`].
    pub fn init(spi: SPI, cs: CS) -> Result<Self, Error<SPI, CS>> {
        let mut this = Self {
            spi,
            cs,
            id: Identification::from_bytes([0; 4]),
        };
        this.id = this.read_device_id()?;
        info!("Fram::init: id = {:?}", this.id);

        if this.id.mfr_code() != FUJITSU {
            return Err(Error::UnrecognizedDevice(this.id));
        }

        Ok(this)
    }

    /// The identification read during [`Fram::init`].
    pub fn id(&self) -> &Identification {
        &self.id
    }

    /// Returns the SPI and chip select objects so they can be used elsewhere.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn command(&mut self, bytes: &mut [u8]) -> Result<(), Error<SPI, CS>> {
        spi_command(&mut self.spi, &mut self.cs, bytes)
    }

    /// Reads the manufacturer and product identification.
    pub fn read_device_id(&mut self) -> Result<Identification, Error<SPI, CS>> {
        let mut buf = [Opcode::ReadDeviceId as u8, 0, 0, 0, 0];
        self.command(&mut buf)?;

        // Skip buf[0] (SPI read response byte)
        Ok(Identification::from_bytes([buf[1], buf[2], buf[3], buf[4]]))
    }

    /// Reads the status register.
    pub fn read_status(&mut self) -> Result<Status, Error<SPI, CS>> {
        let mut buf = [Opcode::ReadStatus as u8, 0];
        self.command(&mut buf)?;

        Ok(Status::from_bits_truncate(buf[1]))
    }

    /// Sets the write enable latch. The chip clears it after the next write.
    pub fn write_enable(&mut self) -> Result<(), Error<SPI, CS>> {
        let mut cmd_buf = [Opcode::WriteEnable as u8];
        self.command(&mut cmd_buf)?;
        Ok(())
    }

    /// Clears the write enable latch.
    pub fn write_disable(&mut self) -> Result<(), Error<SPI, CS>> {
        let mut cmd_buf = [Opcode::WriteDisable as u8];
        self.command(&mut cmd_buf)?;
        Ok(())
    }

    fn load(&mut self, addr: u16) -> Result<u8, Error<SPI, CS>> {
        let mut cmd_buf = frame(Opcode::Read, addr, 0);
        self.command(&mut cmd_buf)?;
        Ok(cmd_buf[3])
    }

    /// One enable, write, disable cycle. The latch is cleared again even if
    /// the write frame fails.
    fn store(&mut self, addr: u16, data: u8) -> Result<(), Error<SPI, CS>> {
        self.write_enable()?;
        let mut cmd_buf = frame(Opcode::Write, addr, data);
        let write_result = self.command(&mut cmd_buf);
        let disable_result = self.write_disable();
        write_result?;
        disable_result
    }

    /// Reads the byte at `addr`.
    pub fn read_byte(&mut self, addr: u16) -> Result<u8, Error<SPI, CS>> {
        check_boundary(Check::Addr, addr, 0)?;
        let data = self.load(addr)?;
        debug!("read 0x{:02x} from 0x{:04x}", data, addr);
        Ok(data)
    }

    /// Writes `data` to `addr` and reads it back.
    ///
    /// Fails with [`Error::VerifyFailed`] if the chip returns a different
    /// value. The write is not retried.
    pub fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), Error<SPI, CS>> {
        check_boundary(Check::Addr, addr, 0)?;
        self.store(addr, data)?;
        debug!("wrote 0x{:02x} to 0x{:04x}", data, addr);

        let found = self.load(addr)?;
        if found != data {
            return Err(Error::VerifyFailed {
                addr,
                expected: data,
                found,
            });
        }
        Ok(())
    }
}

impl<SPI: Transfer<u8>, CS: OutputPin> Read<u16, SPI, CS> for Fram<SPI, CS> {
    /// Reads FRAM contents into `buf`, starting at `addr`.
    ///
    /// The whole range is checked before the first frame is sent.
    fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Error<SPI, CS>> {
        check_boundary(Check::Both, addr, buf.len())?;
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.load(addr + offset as u16)?;
        }
        Ok(())
    }
}

impl<SPI: Transfer<u8>, CS: OutputPin> BlockDevice<u16, SPI, CS> for Fram<SPI, CS> {
    fn erase_all(&mut self) -> Result<(), Error<SPI, CS>> {
        for addr in 0..CAPACITY as u16 {
            self.store(addr, 0)?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, addr: u16, data: &[u8]) -> Result<(), Error<SPI, CS>> {
        check_boundary(Check::Both, addr, data.len())?;
        for (offset, &byte) in data.iter().enumerate() {
            self.store(addr + offset as u16, byte)?;
        }
        Ok(())
    }
}
