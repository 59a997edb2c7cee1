use std::fmt;
use std::path::PathBuf;
use std::process;

use log::{error, info};

use structopt::StructOpt;

pub use linux_embedded_hal::sysfs_gpio::Direction;
pub use linux_embedded_hal::{spidev, Pin as Pindev, Spidev, spidev::SpiModeFlags};

use simplelog::{Config, LevelFilter, SimpleLogger, TermLogger, TerminalMode};

use spi_fram::{fm25::Fram, hex_dump, image, prelude::*, Error};

/// SPI FRAM utility
#[derive(Debug, PartialEq, StructOpt)]
struct Options {
    #[structopt(subcommand)]
    operation: Option<Operations>,

    /// SPI device
    #[structopt(long, default_value="/dev/spidev0.0", env = "SPI_DEV")]
    spi_dev: String,

    /// SPI baud rate (defaults to the 250 MHz core clock divided by 32)
    #[structopt(long, default_value = "7812500", env = "SPI_BAUD")]
    spi_baud: u32,

    /// Chip Select (output) pin, GPIO 8 is CE0
    #[structopt(long, default_value = "8", env = "CS_PIN")]
    cs_pin: u64,

    /// Configure log level
    #[structopt(long, default_value = "info", env="LOG_LEVEL")]
    log_level: LevelFilter,
}

#[derive(Debug, PartialEq, StructOpt)]
#[structopt(rename_all = "snake_case")]
pub enum Operations {
    /// Read device identification and status
    Info,
    /// Read a single byte
    Read {
        /// FRAM address in hex
        #[structopt(parse(try_from_str = parse_hex_addr))]
        address: u16,
    },
    /// Write a single byte and verify it
    Write {
        /// FRAM address in hex
        #[structopt(parse(try_from_str = parse_hex_addr))]
        address: u16,

        /// Data byte in hex
        #[structopt(parse(try_from_str = parse_hex_byte))]
        data: u8,
    },
    /// Hex-dump a range of the device
    Dump {
        /// FRAM address for dump start in hex
        #[structopt(parse(try_from_str = parse_hex_addr))]
        address: u16,

        /// Length of dump in bytes, in hex
        #[structopt(parse(try_from_str = parse_hex_len))]
        length: usize,
    },
    /// Zero every byte of the device
    EraseAll,
    /// Save a range of the device to a binary file
    ReadImage {
        /// FRAM address for read start in hex
        #[structopt(parse(try_from_str = parse_hex_addr))]
        address: u16,

        /// Length of read in bytes, in hex
        #[structopt(parse(try_from_str = parse_hex_len))]
        length: usize,

        /// Output binary file
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
    /// Program the device from a binary file
    WriteImage {
        /// FRAM address for write start in hex
        #[structopt(parse(try_from_str = parse_hex_addr))]
        address: u16,

        /// Input binary file
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn parse_hex_addr(s: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(strip_hex_prefix(s), 16)
}

fn parse_hex_byte(s: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(strip_hex_prefix(s), 16)
}

fn parse_hex_len(s: &str) -> Result<usize, std::num::ParseIntError> {
    usize::from_str_radix(strip_hex_prefix(s), 16)
}

type FramError = Error<Spidev, Pindev>;

/// Everything that can end a run early.
enum Failure {
    /// The SPI device or the chip-select GPIO could not be claimed.
    Setup(&'static str, Box<dyn std::error::Error>),
    /// The driver reported an error.
    Fram(FramError),
}

impl Failure {
    /// Process exit status. `1` is left to argument errors reported by
    /// structopt.
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Fram(Error::UnrecognizedDevice(_)) => 3,
            Failure::Fram(Error::OutOfBounds(_)) => 4,
            Failure::Fram(Error::VerifyFailed { .. }) => 5,
            Failure::Fram(Error::Io(_)) => 6,
            // Setup, SPI and GPIO failures
            _ => 2,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Setup(what, e) => write!(
                f,
                "{} failed: {} (are the access permissions correct?)",
                what, e
            ),
            Failure::Fram(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<FramError> for Failure {
    fn from(e: FramError) -> Self {
        Failure::Fram(e)
    }
}

fn main() {
    // Load options
    let opts = Options::from_args();

    let operation = match &opts.operation {
        Some(op) => op,
        None => {
            Options::clap().print_help().ok();
            println!();
            return;
        }
    };

    // Setup logging
    if TermLogger::init(opts.log_level, Config::default(), TerminalMode::Mixed).is_err() {
        SimpleLogger::init(opts.log_level, Config::default()).ok();
    }

    if let Err(e) = run(&opts, operation) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}

fn open(opts: &Options) -> Result<Fram<Spidev, Pindev>, Failure> {
    // Connect and configure GPIO pin, deselected
    let cs_pin = Pindev::new(opts.cs_pin);

    cs_pin
        .export()
        .map_err(|e| Failure::Setup("exporting chip select GPIO", e.into()))?;
    cs_pin
        .set_direction(Direction::High)
        .map_err(|e| Failure::Setup("configuring chip select GPIO", e.into()))?;

    // Connect and configure SPI device
    let mut spi = Spidev::open(&opts.spi_dev)
        .map_err(|e| Failure::Setup("opening SPI device", e.into()))?;

    let mut spi_config = spidev::SpidevOptions::new();
    spi_config.bits_per_word(8);
    spi_config.lsb_first(false);
    spi_config.mode(SpiModeFlags::SPI_MODE_0 | SpiModeFlags::SPI_NO_CS);
    spi_config.max_speed_hz(opts.spi_baud);
    spi.configure(&spi_config)
        .map_err(|e| Failure::Setup("configuring SPI device", e.into()))?;

    info!("Detecting chip on {}", opts.spi_dev);
    let fram = Fram::init(spi, cs_pin)?;

    let id = fram.id();
    info!(
        "Manufacturer ID: {:04x} Product ID: {:04x}",
        id.manufacturer_id(),
        id.product_id()
    );

    Ok(fram)
}

fn run(opts: &Options, operation: &Operations) -> Result<(), Failure> {
    let mut fram = open(opts)?;

    // Perform the requested operation
    match *operation {
        Operations::Info => {
            let status = fram.read_status()?;
            info!("Status: {:?}", status);
        },
        Operations::Read{address} => {
            info!("Reading from 0x{:04X}", address);

            let data = fram.read_byte(address)?;

            info!("Data: {:02X}", data);
        },
        Operations::Write{address, data} => {
            info!("Writing 0x{:02X} to 0x{:04X}", data, address);

            fram.write_byte(address, data)?;

            info!("Write verified");
        },
        Operations::Dump{address, length} => {
            info!("Dumping {} bytes from 0x{:04X}", length, address);

            let buff = image::dump_bytes(&mut fram, address, length)?;

            print!("{}", hex_dump(&buff));
        },
        Operations::EraseAll => {
            info!("Erasing chip");

            fram.erase_all()?;

            info!("Erase complete");
        },
        Operations::ReadImage{address, length, ref file} => {
            info!("Reading {} bytes from 0x{:04X} to {}", length, address, file.display());

            image::read_image(&mut fram, address, length, file)?;

            info!("Read image complete");
        },
        Operations::WriteImage{address, ref file} => {
            info!("Writing {} to 0x{:04X}", file.display(), address);

            let written = image::write_image(&mut fram, address, file)?;

            info!("Wrote {} bytes", written);
        },
    }

    Ok(())
}
