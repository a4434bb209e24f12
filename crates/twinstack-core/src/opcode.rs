//! Instruction encoding: opcode identifiers and modifier flags.
//!
//! Every instruction is one byte. The high three bits are orthogonal
//! modifier flags, the low five bits name the opcode:
//!
//! ```text
//! 7      6      5      4 ... 0
//! swap   copy   short  opcode
//! │      │      └─ operate on 16-bit values
//! │      └──────── read operands non-destructively (copy cursor)
//! └─────────────── exchange source and target stacks
//! ```
//!
//! The short bit turns each opcode into its 16-bit variant, e.g.
//! `ADD16 = ADD | 0x20`. Two of the 32 identifier slots are reserved and
//! decode to `None`.

use bitflags::bitflags;

bitflags! {
    /// Modifier bits in the high three bits of an instruction byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Source stack becomes the return stack, target the parameter stack.
        const SWAP = 0x80;
        /// Stack reads walk the copy cursor instead of popping.
        const COPY = 0x40;
        /// Arithmetic, logic, and memory operate on 16-bit values.
        const SHORT = 0x20;
    }
}

impl Modifiers {
    /// Decode the modifier bits of an instruction byte (opcode bits dropped).
    #[must_use]
    pub const fn from_instruction(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

/// Mask selecting the opcode identifier bits of an instruction byte.
pub const OPCODE_MASK: u8 = 0x1F;

/// The thirty opcode identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)] // The variants are the mnemonics; semantics live on Cpu.
pub enum Opcode {
    Brk = 0x00,
    Nop = 0x01,
    Lit = 0x02,
    Pop = 0x03,
    Dup = 0x04,
    Ovr = 0x05,
    Rot = 0x06,
    Swp = 0x07,
    Sts = 0x08,
    Add = 0x09,
    Sub = 0x0A,
    Mul = 0x0B,
    Div = 0x0C,
    And = 0x0D,
    Ior = 0x0E,
    Xor = 0x0F,
    Shi = 0x10,
    Equ = 0x11,
    Neq = 0x12,
    Grt = 0x13,
    Lst = 0x14,
    Jmp = 0x15,
    Jnz = 0x16,
    Jsr = 0x17,
    Lda = 0x18,
    Sta = 0x19,
    Ldr = 0x1A,
    Str = 0x1B,
    Bsi = 0x1C,
    Bso = 0x1D,
}

impl Opcode {
    /// Decode the identifier bits of an instruction byte.
    ///
    /// Returns `None` for the two reserved slots (`0x1E`, `0x1F`).
    #[must_use]
    pub const fn decode(byte: u8) -> Option<Self> {
        Some(match byte & OPCODE_MASK {
            0x00 => Self::Brk,
            0x01 => Self::Nop,
            0x02 => Self::Lit,
            0x03 => Self::Pop,
            0x04 => Self::Dup,
            0x05 => Self::Ovr,
            0x06 => Self::Rot,
            0x07 => Self::Swp,
            0x08 => Self::Sts,
            0x09 => Self::Add,
            0x0A => Self::Sub,
            0x0B => Self::Mul,
            0x0C => Self::Div,
            0x0D => Self::And,
            0x0E => Self::Ior,
            0x0F => Self::Xor,
            0x10 => Self::Shi,
            0x11 => Self::Equ,
            0x12 => Self::Neq,
            0x13 => Self::Grt,
            0x14 => Self::Lst,
            0x15 => Self::Jmp,
            0x16 => Self::Jnz,
            0x17 => Self::Jsr,
            0x18 => Self::Lda,
            0x19 => Self::Sta,
            0x1A => Self::Ldr,
            0x1B => Self::Str,
            0x1C => Self::Bsi,
            0x1D => Self::Bso,
            _ => return None,
        })
    }

    /// Encoded instruction byte with no modifier flags set.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Encoded instruction byte with `flags` applied.
    #[must_use]
    pub const fn with(self, flags: Modifiers) -> u8 {
        self as u8 | flags.bits()
    }

    /// Mnemonic, for fault logs and debug dumps.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Brk => "BRK",
            Self::Nop => "NOP",
            Self::Lit => "LIT",
            Self::Pop => "POP",
            Self::Dup => "DUP",
            Self::Ovr => "OVR",
            Self::Rot => "ROT",
            Self::Swp => "SWP",
            Self::Sts => "STS",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::And => "AND",
            Self::Ior => "IOR",
            Self::Xor => "XOR",
            Self::Shi => "SHI",
            Self::Equ => "EQU",
            Self::Neq => "NEQ",
            Self::Grt => "GRT",
            Self::Lst => "LST",
            Self::Jmp => "JMP",
            Self::Jnz => "JNZ",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Sta => "STA",
            Self::Ldr => "LDR",
            Self::Str => "STR",
            Self::Bsi => "BSI",
            Self::Bso => "BSO",
        }
    }
}
