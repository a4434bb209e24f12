//! Top-level machine: memory, CPU, bus table, interrupt line.
//!
//! The machine owns every component and is what a host constructs, loads a
//! ROM into, and clocks. Devices are attached to one of the sixteen bus
//! slots; device threads get a clone of the interrupt line to signal with.

use std::sync::Arc;

use crate::bus::{Bus, Device};
use crate::cpu::Cpu;
use crate::interrupt::InterruptLine;
use crate::memory::Mmu;
use crate::stack::Stack;
use crate::{Result, VmError, BUS_COUNT};

/// A complete twin-stack machine.
pub struct Machine {
    mmu: Mmu,
    cpu: Cpu,
    buses: [Option<Bus>; BUS_COUNT],
    irq: Arc<InterruptLine>,
}

impl Machine {
    /// Create a machine with zeroed memory, no devices, and PC 0.
    #[must_use]
    pub fn new() -> Self {
        let irq = Arc::new(InterruptLine::new());
        Self {
            mmu: Mmu::new(Arc::clone(&irq)),
            cpu: Cpu::new(),
            buses: std::array::from_fn(|_| None),
            irq,
        }
    }

    /// Copy a ROM image into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`VmError::MemoryLoadingOverflow`] if the image would run past the
    /// end of memory.
    pub fn load_rom(&mut self, addr: u16, image: &[u8]) -> Result<()> {
        self.mmu.load(addr, image)
    }

    /// Bind `device` to bus slot `id` (masked to 4 bits), replacing any
    /// previous occupant.
    pub fn attach_device<D: Device + 'static>(&mut self, id: u8, device: D) {
        let id = id & 0x0F;
        self.buses[usize::from(id)] = Some(Bus::new(id, Box::new(device)));
    }

    /// The bus registered at slot `id`, if any.
    #[must_use]
    pub fn bus(&self, id: u8) -> Option<&Bus> {
        self.buses[usize::from(id & 0x0F)].as_ref()
    }

    /// Zero the PC, empty both stacks, clear memory, and drop any pending
    /// interrupt. Attached devices stay attached.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.mmu.clear();
        self.irq.reset();
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.cpu.pc
    }

    /// Point the program counter at `addr` (the host's entry point).
    pub fn set_pc(&mut self, addr: u16) {
        self.cpu.pc = addr;
    }

    /// Execute one tick, surfacing the per-tick result.
    ///
    /// # Errors
    ///
    /// Whatever the tick faulted with; [`VmError::PcBreak`] is the normal
    /// halt signal.
    pub fn step(&mut self) -> Result<()> {
        self.cpu.tick(&mut self.mmu, &mut self.buses, &self.irq)
    }

    /// Execute up to `ticks` instructions, swallowing per-tick faults.
    ///
    /// A fault halts execution logically (the PC is forced to 0 and the
    /// loop stops) but never reaches the host. `PcBreak` logs at debug
    /// level (it is how programs end); anything else logs at warn.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            match self.step() {
                Ok(()) => {}
                Err(VmError::PcBreak) => {
                    log::debug!("halted: program counter reached zero");
                    break;
                }
                Err(err) => {
                    log::warn!("tick fault near 0x{:04X}: {err}", self.cpu.pc);
                    self.cpu.pc = 0;
                    break;
                }
            }
        }
    }

    /// Clone of the interrupt line for device threads.
    #[must_use]
    pub fn interrupt_line(&self) -> Arc<InterruptLine> {
        Arc::clone(&self.irq)
    }

    /// Read access to memory.
    #[must_use]
    pub fn memory(&self) -> &Mmu {
        &self.mmu
    }

    /// Write access to memory (hosts poking state between ticks).
    pub fn memory_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    /// The CPU's parameter stack.
    #[must_use]
    pub fn param_stack(&self) -> &Stack {
        self.cpu.param_stack()
    }

    /// The CPU's return stack.
    #[must_use]
    pub fn return_stack(&self) -> &Stack {
        self.cpu.return_stack()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells;
    use crate::opcode::Opcode;

    #[test]
    fn test_run_stops_at_brk() {
        let mut machine = Machine::new();
        machine
            .load_rom(
                0x0100,
                &[Opcode::Lit.byte(), 0x07, Opcode::Brk.byte(), Opcode::Nop.byte()],
            )
            .unwrap();
        machine.set_pc(0x0100);
        machine.run(100);
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.param_stack().as_bytes(), &[0x07]);
    }

    #[test]
    fn test_run_swallows_faults() {
        let mut machine = Machine::new();
        // An immediate underflow: ADD on an empty stack.
        machine.load_rom(0x0100, &[Opcode::Add.byte()]).unwrap();
        machine.set_pc(0x0100);
        machine.run(100);
        assert_eq!(machine.pc(), 0);
    }

    #[test]
    fn test_step_surfaces_faults() {
        let mut machine = Machine::new();
        machine.load_rom(0x0100, &[Opcode::Pop.byte()]).unwrap();
        machine.set_pc(0x0100);
        assert!(machine.step().is_err());
    }

    #[test]
    fn test_reset() {
        let mut machine = Machine::new();
        machine.load_rom(0x0100, &[Opcode::Lit.byte(), 0x01]).unwrap();
        machine.set_pc(0x0100);
        machine.run(1);
        machine.memory_mut().write(cells::INTERRUPT_ENABLE, 1);

        machine.reset();
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.param_stack().depth(), 0);
        assert_eq!(machine.return_stack().depth(), 0);
        assert_eq!(machine.memory().read(0x0100), 0);
        assert_eq!(machine.memory().read(cells::INTERRUPT_ENABLE), 0);
    }

    #[test]
    fn test_attach_device_masks_id() {
        let mut machine = Machine::new();
        machine.attach_device(0x1A, |_: &mut [u8; 16], _: &mut Mmu, _: u8, _: crate::PortAccess| {});
        assert!(machine.bus(0x0A).is_some());
        assert_eq!(machine.bus(0x0A).unwrap().id(), 0x0A);
    }

    #[test]
    fn test_load_rom_overflow() {
        let mut machine = Machine::new();
        let image = vec![0u8; 0x200];
        assert_eq!(
            machine.load_rom(0xFF00, &image),
            Err(VmError::MemoryLoadingOverflow {
                addr: 0xFF00,
                size: 0x200
            })
        );
    }
}
