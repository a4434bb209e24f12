//! Flat 64 KiB memory with big-endian word accessors.
//!
//! Addresses are 16-bit and wrap modulo 65,536, so a word access at `0xFFFF`
//! touches `0xFFFF` and `0x0000`. No memory access can fail; only ROM
//! loading is fallible.
//!
//! One address is special: the interrupt master-enable cell at
//! [`cells::INTERRUPT_ENABLE`](crate::cells::INTERRUPT_ENABLE) is backed by
//! the shared [`InterruptLine`] rather than the byte array, the same way a
//! system bus routes a register range to the owning peripheral. Bytecode
//! reads and writes it like any other address; device threads touch it only
//! through the line's atomics.

use std::sync::Arc;

use crate::cells;
use crate::interrupt::InterruptLine;
use crate::{Result, VmError};

/// Size of the flat address space in bytes.
pub const MEM_SIZE: usize = 0x1_0000;

/// Flat 64 KiB memory bank.
#[derive(Debug)]
pub struct Mmu {
    bytes: Box<[u8; MEM_SIZE]>,
    irq: Arc<InterruptLine>,
}

impl Mmu {
    /// Create zeroed memory wired to `irq` for the enable cell.
    #[must_use]
    pub fn new(irq: Arc<InterruptLine>) -> Self {
        Self {
            bytes: Box::new([0; MEM_SIZE]),
            irq,
        }
    }

    /// Read the byte at `addr`.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        if addr == cells::INTERRUPT_ENABLE {
            self.irq.enable_cell()
        } else {
            self.bytes[usize::from(addr)]
        }
    }

    /// Write a byte to `addr`.
    pub fn write(&mut self, addr: u16, value: u8) {
        if addr == cells::INTERRUPT_ENABLE {
            self.irq.set_enable_cell(value);
        } else {
            self.bytes[usize::from(addr)] = value;
        }
    }

    /// Read the big-endian 16-bit word at `addr` (high byte at `addr`).
    #[must_use]
    pub fn read16(&self, addr: u16) -> u16 {
        let hi = self.read(addr);
        let lo = self.read(addr.wrapping_add(1));
        u16::from(hi) << 8 | u16::from(lo)
    }

    /// Write a big-endian 16-bit word: high byte at `addr`, low at `addr+1`.
    pub fn write16(&mut self, addr: u16, value: u16) {
        self.write(addr, (value >> 8) as u8);
        self.write(addr.wrapping_add(1), value as u8);
    }

    /// Zero the whole bank, including the enable cell.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.irq.set_enable_cell(0);
    }

    /// Copy a ROM image into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`VmError::MemoryLoadingOverflow`] if the image would run past the
    /// end of the 64 KiB bank.
    pub fn load(&mut self, addr: u16, image: &[u8]) -> Result<()> {
        let dest = usize::from(addr);
        let end = dest
            .checked_add(image.len())
            .filter(|&end| end <= MEM_SIZE)
            .ok_or(VmError::MemoryLoadingOverflow {
                addr,
                size: image.len(),
            })?;
        self.bytes[dest..end].copy_from_slice(image);

        // The enable cell lives in the interrupt line; an image that covers
        // it must land there, not in the shadowed array slot.
        let enable = usize::from(cells::INTERRUPT_ENABLE);
        if (dest..end).contains(&enable) {
            self.irq.set_enable_cell(self.bytes[enable]);
        }
        Ok(())
    }
}
