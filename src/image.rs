//! Moving chip contents to and from owned buffers and flat binary files.
//!
//! Image files hold exactly the bytes of the requested window, with no header.

use crate::fm25::{check_boundary, Check};
use crate::{BlockDevice, Error, OutOfBounds, Read};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, Read as _, Write as _};
use std::path::Path;

/// Reads `len` bytes starting at `addr` into a new buffer.
pub fn dump_bytes<D, SPI, CS>(
    dev: &mut D,
    addr: u16,
    len: usize,
) -> Result<Vec<u8>, Error<SPI, CS>>
where
    D: Read<u16, SPI, CS>,
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    // Checked before allocating; `dev` may be any `Read` implementation.
    check_boundary(Check::Both, addr, len)?;
    let mut buf = vec![0; len];
    dev.read(addr, &mut buf)?;
    Ok(buf)
}

/// Programs the contents of the file at `path` into the device, starting at
/// `addr`.
///
/// The file size is checked against the device before the file is read.
/// Returns the number of bytes written.
pub fn write_image<D, SPI, CS, P>(
    dev: &mut D,
    addr: u16,
    path: P,
) -> Result<usize, Error<SPI, CS>>
where
    D: BlockDevice<u16, SPI, CS>,
    SPI: Transfer<u8>,
    CS: OutputPin,
    P: AsRef<Path>,
{
    let mut file = File::open(path).map_err(Error::Io)?;
    let size = file.metadata().map_err(Error::Io)?.len();
    let size = usize::try_from(size).map_err(|_| OutOfBounds::Data {
        addr,
        len: usize::MAX,
    })?;
    check_boundary(Check::Both, addr, size)?;

    let mut data = Vec::with_capacity(size);
    file.read_to_end(&mut data).map_err(Error::Io)?;
    if data.len() != size {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("read {} of {} bytes", data.len(), size),
        )));
    }
    drop(file);

    info!("writing {} bytes to 0x{:04x}", size, addr);
    dev.write_bytes(addr, &data)?;
    Ok(size)
}

/// Saves `len` bytes starting at `addr` to the file at `path`.
///
/// The file is created or truncated and synced to storage before it is
/// closed. Returns the number of bytes saved.
pub fn read_image<D, SPI, CS, P>(
    dev: &mut D,
    addr: u16,
    len: usize,
    path: P,
) -> Result<usize, Error<SPI, CS>>
where
    D: Read<u16, SPI, CS>,
    SPI: Transfer<u8>,
    CS: OutputPin,
    P: AsRef<Path>,
{
    let data = dump_bytes(dev, addr, len)?;

    let mut file = File::create(path).map_err(Error::Io)?;
    file.write_all(&data).map_err(Error::Io)?;
    file.sync_all().map_err(Error::Io)?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fm25::{Fram, CAPACITY};
    use crate::sim;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spi-fram-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_image_round_trip() {
        let (spi, cs, chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let input = scratch("round-trip.in");
        let output = scratch("round-trip.out");
        let contents: Vec<u8> = (0..300u32).map(|i| (i * 7) as u8).collect();
        std::fs::write(&input, &contents).unwrap();

        assert_eq!(write_image(&mut fram, 0x1E00, &input).unwrap(), 300);
        assert_eq!(chip.borrow().mem[0x1E00..0x1E00 + 300], contents[..]);
        assert_eq!(read_image(&mut fram, 0x1E00, 300, &output).unwrap(), 300);
        assert_eq!(std::fs::read(&output).unwrap(), contents);

        std::fs::remove_file(input).ok();
        std::fs::remove_file(output).ok();
    }

    #[test]
    fn test_write_image_too_large() {
        let (spi, cs, chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let input = scratch("too-large.in");
        std::fs::write(&input, vec![0xEE; 0x101]).unwrap();

        let before = chip.borrow().frames.len();
        assert!(matches!(
            write_image(&mut fram, 0x1F00, &input),
            Err(Error::OutOfBounds(OutOfBounds::Data { addr: 0x1F00, len: 0x101 }))
        ));
        assert_eq!(chip.borrow().frames.len(), before);

        // Exactly filling the tail is fine.
        std::fs::write(&input, vec![0xEE; 0x100]).unwrap();
        assert_eq!(write_image(&mut fram, 0x1F00, &input).unwrap(), 0x100);
        assert_eq!(chip.borrow().mem[CAPACITY - 1], 0xEE);

        std::fs::remove_file(input).ok();
    }

    #[test]
    fn test_write_image_missing_file() {
        let (spi, cs, _chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let result = write_image(&mut fram, 0, scratch("does-not-exist"));
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_read_image_out_of_range_creates_no_file() {
        let (spi, cs, _chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let output = scratch("out-of-range.out");
        std::fs::remove_file(&output).ok();
        assert!(matches!(
            read_image(&mut fram, 0x1000, 0x1001, &output),
            Err(Error::OutOfBounds(OutOfBounds::Data { .. }))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_dump_after_erase() {
        let (spi, cs, _chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        fram.erase_all().unwrap();
        let data = dump_bytes(&mut fram, 0x0000, 0x0020).unwrap();
        assert_eq!(data, vec![0; 32]);
        let dump = crate::hex_dump(&data);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines, ["00000000000000000000000000000000"; 2]);
    }

    #[test]
    fn test_dump_huge_length() {
        let (spi, cs, chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let before = chip.borrow().frames.len();
        assert!(matches!(
            dump_bytes(&mut fram, 0x10, usize::MAX - 0xF),
            Err(Error::OutOfBounds(OutOfBounds::Data { addr: 0x10, .. }))
        ));
        assert!(matches!(
            read_image(&mut fram, 0x10, usize::MAX, scratch("huge.out")),
            Err(Error::OutOfBounds(OutOfBounds::Data { .. }))
        ));
        assert_eq!(chip.borrow().frames.len(), before);
    }

    #[test]
    fn test_dump_empty() {
        let (spi, cs, chip) = sim::mb85rs64v();
        let mut fram = Fram::init(spi, cs).unwrap();

        let before = chip.borrow().frames.len();
        assert_eq!(dump_bytes(&mut fram, 0x1FFF, 0).unwrap(), Vec::<u8>::new());
        assert_eq!(chip.borrow().frames.len(), before);
        assert!(matches!(
            dump_bytes(&mut fram, 0x2000, 0),
            Err(Error::OutOfBounds(OutOfBounds::Address(0x2000)))
        ));
    }
}
