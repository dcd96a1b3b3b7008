//! # CPU Operating Modes
//!
//! The ARM7TDMI has seven operating modes. The active one selects which
//! physical copy backs the banked registers:
//!
//! ```text
//! ┌──────────┬──────┬─────────────┬──────────┬──────┐
//! │ Mode     │ Bits │ R8-R12      │ R13, R14 │ SPSR │
//! ├──────────┼──────┼─────────────┼──────────┼──────┤
//! │ User     │10000 │ shared      │ shared   │  -   │
//! │ System   │11111 │ shared      │ shared   │  -   │
//! │ FIQ      │10001 │ banked      │ banked   │ yes  │
//! │ IRQ      │10010 │ shared      │ banked   │ yes  │
//! │ SVC      │10011 │ shared      │ banked   │ yes  │
//! │ Abort    │10111 │ shared      │ banked   │ yes  │
//! │ Undef    │11011 │ shared      │ banked   │ yes  │
//! └──────────┴──────┴─────────────┴──────────┴──────┘
//! ```
//!
//! R0-R7 and R15 are never banked. User and System share one bank.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::cpu::error::PsrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuMode {
    /// The normal ARM program execution state.
    User = 0b10000,

    /// Designed to support a data transfer or channel process.
    Fiq = 0b10001,

    /// Used for general-purpose interrupt handling.
    Irq = 0b10010,

    /// Protected mode for the operating system
    Supervisor = 0b10011,

    /// Entered after a data or instruction prefetch abort.
    Abort = 0b10111,

    /// Entered when an undefined instruction is executed
    Undefined = 0b11011,

    /// A privileged user mode for the operating system.
    System = 0b11111,
}

impl CpuMode {
    pub const COUNT: usize = 7;

    /// Every mode, in the column order of the banking table.
    pub const ALL: [Self; Self::COUNT] = [
        Self::User,
        Self::System,
        Self::Fiq,
        Self::Supervisor,
        Self::Abort,
        Self::Irq,
        Self::Undefined,
    ];

    /// Position of the mode inside [`CpuMode::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::User => 0,
            Self::System => 1,
            Self::Fiq => 2,
            Self::Supervisor => 3,
            Self::Abort => 4,
            Self::Irq => 5,
            Self::Undefined => 6,
        }
    }

    /// User and System have no saved status register.
    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::User => "USR",
            Self::System => "SYS",
            Self::Fiq => "FIQ",
            Self::Supervisor => "SVC",
            Self::Abort => "ABT",
            Self::Irq => "IRQ",
            Self::Undefined => "UND",
        }
    }
}

impl Display for CpuMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl From<CpuMode> for u32 {
    fn from(m: CpuMode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for CpuMode {
    type Error = PsrError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(PsrError::InvalidMode(n)),
        }
    }
}

/// Instruction set currently decoded by the CPU (the T bit of the CPSR).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionMode {
    /// 32 bit instructions.
    #[default]
    Arm,

    /// 16 bit instructions.
    Thumb,
}

impl From<bool> for InstructionMode {
    fn from(state_bit: bool) -> Self {
        if state_bit { Self::Thumb } else { Self::Arm }
    }
}

impl From<InstructionMode> for bool {
    fn from(mode: InstructionMode) -> Self {
        mode == InstructionMode::Thumb
    }
}
