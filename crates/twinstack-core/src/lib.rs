//! Execution core of the twinstack virtual machine.
//!
//! Twinstack is a small stack-based 8/16-bit computer: a compact bytecode
//! executed against two 256-byte stacks, a flat 64 KiB memory, and up to
//! sixteen memory-mapped device buses. This crate is the execution engine
//! only: the opcode set, the twin-stack discipline with its three modifier
//! flags (swap/copy/short), the memory subsystem, the bus interaction
//! model, and interrupt delivery. Concrete devices (console, display,
//! audio, input, file), the assembler, and the host event loop live
//! elsewhere and talk to the core through the contracts defined here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Machine                        │
//! │  ┌────────────┐  ┌──────────────────────────────┐    │
//! │  │    Mmu     │  │     buses[16]                │    │
//! │  │   64 KiB   │  │  ports ×16 ──► Device        │    │
//! │  └────────────┘  └──────────────────────────────┘    │
//! │        ▲                   ▲                         │
//! │        │                   │            InterruptLine│
//! │   ┌────┴───────────────────┴────┐      (Arc, shared  │
//! │   │   Cpu: PC + twin stacks     │◄──── with devices) │
//! │   └─────────────────────────────┘                    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The machine owns everything; the CPU receives memory, the bus table,
//! and the interrupt line as borrowed handles each tick.
//!
//! # Example
//!
//! ```
//! use twinstack_core::{Machine, Opcode};
//!
//! let mut machine = Machine::new();
//!
//! // 3 + 5, then halt.
//! let rom = [
//!     Opcode::Lit.byte(), 0x03,
//!     Opcode::Lit.byte(), 0x05,
//!     Opcode::Add.byte(),
//!     Opcode::Brk.byte(),
//! ];
//! machine.load_rom(0x0100, &rom).unwrap();
//! machine.set_pc(0x0100);
//! machine.run(16);
//!
//! assert_eq!(machine.param_stack().as_bytes(), &[0x08]);
//! assert_eq!(machine.pc(), 0);
//! ```

#![warn(missing_docs)]

mod bus;
mod cpu;
mod interrupt;
mod machine;
mod memory;
mod opcode;
mod stack;

pub use bus::{Bus, Device, PortAccess, PORT_COUNT};
pub use cpu::Cpu;
pub use interrupt::InterruptLine;
pub use machine::Machine;
pub use memory::{Mmu, MEM_SIZE};
pub use opcode::{Modifiers, Opcode, OPCODE_MASK};
pub use stack::{Stack, StackId, STACK_SIZE};

/// Number of bus slots in a machine.
pub const BUS_COUNT: usize = 16;

/// Well-known memory-mapped cells.
pub mod cells {
    /// Interrupt master enable: 1 permits devices to raise an interrupt.
    pub const INTERRUPT_ENABLE: u16 = 0x00B0;
}

/// Conventional device-id assignments. The core does not enforce these;
/// only the low 4 bits of an id index the bus table.
pub mod device_id {
    /// System control device.
    pub const SYSTEM: u8 = 0x0;
    /// Console (character I/O).
    pub const CONSOLE: u8 = 0x1;
    /// Display (framebuffer).
    pub const DISPLAY: u8 = 0x2;
    /// Audio mixer.
    pub const AUDIO: u8 = 0x3;
    /// First controller.
    pub const CONTROLLER_1: u8 = 0x4;
    /// Second controller.
    pub const CONTROLLER_2: u8 = 0x5;
    /// Mouse.
    pub const MOUSE: u8 = 0x6;
    /// File device.
    pub const FILE: u8 = 0xA;
}

/// Geometry the display device renders at.
pub mod display {
    /// Framebuffer width in pixels.
    pub const WIDTH: u16 = 640;
    /// Framebuffer height in pixels.
    pub const HEIGHT: u16 = 480;
}

/// Core error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    /// A push would exceed the stack's 256 bytes.
    #[error("{0} stack overflow")]
    StackOverflow(StackId),

    /// A pop or peek would read below the bottom of the stack.
    #[error("{0} stack underflow")]
    StackUnderflow(StackId),

    /// The program counter reached 0 at fetch; the normal halt signal.
    #[error("program counter reached zero")]
    PcBreak,

    /// One of the two reserved opcode slots was fetched.
    #[error("invalid opcode 0x{0:02X} at 0x{1:04X}")]
    InvalidOpcode(u8, u16),

    /// An interrupt is pending on a bus with no registered device.
    #[error("interrupt pending on unregistered bus {0}")]
    InvalidInterrupt(u8),

    /// A ROM image would run past the end of the 64 KiB memory.
    #[error("ROM image of {size} bytes does not fit at 0x{addr:04X}")]
    MemoryLoadingOverflow {
        /// Requested load address.
        addr: u16,
        /// Image size in bytes.
        size: usize,
    },

    /// DIV popped a zero divisor.
    #[error("division by zero at 0x{0:04X}")]
    DivisionByZero(u16),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_add_smoke() {
        let mut machine = Machine::new();
        let rom = [
            Opcode::Lit.byte(),
            0x03,
            Opcode::Lit.byte(),
            0x05,
            Opcode::Add.byte(),
            Opcode::Brk.byte(),
        ];
        machine.load_rom(0x0100, &rom).unwrap();
        machine.set_pc(0x0100);
        machine.run(16);

        assert_eq!(machine.param_stack().as_bytes(), &[0x08]);
        assert_eq!(machine.pc(), 0);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            VmError::StackOverflow(StackId::Return).to_string(),
            "return stack overflow"
        );
        assert_eq!(
            VmError::InvalidOpcode(0x1F, 0x0200).to_string(),
            "invalid opcode 0x1F at 0x0200"
        );
    }
}
