//! A simulated MB85RS64V for the unit tests.
//!
//! [`SimSpi`] and [`SimCs`] share one [`Chip`], the same way a real bus and
//! chip-select line share the physical part.

use crate::fm25::CAPACITY;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use std::cell::RefCell;
use std::rc::Rc;

/// ID bytes returned by an MB85RS64V.
pub const MB85RS64V_ID: [u8; 4] = [0x04, 0x7F, 0x03, 0x02];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// A transfer happened while chip select was deasserted.
    NotSelected,
    /// Injected failure.
    Injected,
}

#[derive(Debug)]
pub struct Chip {
    pub mem: Vec<u8>,
    pub id: [u8; 4],
    pub wel: bool,
    pub selected: bool,
    /// Every frame as sent by the driver, in order.
    pub frames: Vec<Vec<u8>>,
    /// An address that ignores writes and always reads back this value.
    pub stuck: Option<(u16, u8)>,
    /// Fail any transfer whose opcode matches.
    pub fail_opcode: Option<u8>,
}

impl Chip {
    fn execute(&mut self, words: &mut [u8]) {
        let opcode = words[0];
        words[0] = 0;
        match opcode {
            0x06 => self.wel = true,
            0x04 => self.wel = false,
            0x05 => {
                let status = (self.wel as u8) << 1;
                for byte in words[1..].iter_mut() {
                    *byte = status;
                }
            }
            0x9F => {
                for (byte, id) in words[1..].iter_mut().zip(self.id.iter()) {
                    *byte = *id;
                }
            }
            0x03 if words.len() >= 3 => {
                let mut addr = self.address(words);
                for byte in words[3..].iter_mut() {
                    *byte = self.load(addr);
                    addr = (addr + 1) % CAPACITY;
                }
            }
            0x02 if words.len() >= 3 => {
                if self.wel {
                    let mut addr = self.address(words);
                    for &byte in words[3..].iter() {
                        self.mem[addr] = byte;
                        addr = (addr + 1) % CAPACITY;
                    }
                }
                // The latch clears once the write completes.
                self.wel = false;
            }
            _ => {}
        }
    }

    fn address(&self, words: &[u8]) -> usize {
        (usize::from(words[1]) << 8 | usize::from(words[2])) % CAPACITY
    }

    fn load(&self, addr: usize) -> u8 {
        match self.stuck {
            Some((stuck, value)) if usize::from(stuck) == addr => value,
            _ => self.mem[addr],
        }
    }

    /// Number of frames that carried `opcode`.
    pub fn count(&self, opcode: u8) -> usize {
        self.frames.iter().filter(|f| f[0] == opcode).count()
    }
}

#[derive(Debug)]
pub struct SimSpi {
    chip: Rc<RefCell<Chip>>,
}

impl Transfer<u8> for SimSpi {
    type Error = SimError;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], SimError> {
        let mut chip = self.chip.borrow_mut();
        if !chip.selected {
            return Err(SimError::NotSelected);
        }
        chip.frames.push(words.to_vec());
        if chip.fail_opcode.is_some() && chip.fail_opcode == words.first().copied() {
            return Err(SimError::Injected);
        }
        chip.execute(words);
        Ok(words)
    }
}

#[derive(Debug)]
pub struct SimCs {
    chip: Rc<RefCell<Chip>>,
}

impl OutputPin for SimCs {
    type Error = SimError;

    fn set_low(&mut self) -> Result<(), SimError> {
        self.chip.borrow_mut().selected = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), SimError> {
        self.chip.borrow_mut().selected = false;
        Ok(())
    }
}

/// Creates a chip answering with `id`, filled with `0xA5`.
pub fn with_id(id: [u8; 4]) -> (SimSpi, SimCs, Rc<RefCell<Chip>>) {
    let chip = Rc::new(RefCell::new(Chip {
        mem: vec![0xA5; CAPACITY],
        id,
        wel: false,
        selected: false,
        frames: Vec::new(),
        stuck: None,
        fail_opcode: None,
    }));
    (
        SimSpi { chip: chip.clone() },
        SimCs { chip: chip.clone() },
        chip,
    )
}

pub fn mb85rs64v() -> (SimSpi, SimCs, Rc<RefCell<Chip>>) {
    with_id(MB85RS64V_ID)
}
