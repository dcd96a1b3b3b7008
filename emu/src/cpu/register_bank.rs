//! # Banked Registers
//!
//! Physical storage for one group of registers. Six banks exist:
//!
//! | Bank       | Holds               | Status |
//! |------------|---------------------|--------|
//! | System     | R0-R15              | CPSR   |
//! | FIQ        | R8-R14              | SPSR   |
//! | Supervisor | R13-R14             | SPSR   |
//! | Abort      | R13-R14             | SPSR   |
//! | IRQ        | R13-R14             | SPSR   |
//! | Undefined  | R13-R14             | SPSR   |
//!
//! Which bank answers for a logical register is decided by
//! [`RegisterFile`](super::register_file::RegisterFile).

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::cpu::cpu_modes::CpuMode;
use crate::cpu::psr::Psr;
use crate::cpu::register_file::REG_SP;

/// Names one of the six physical banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankId {
    System,
    Fiq,
    Supervisor,
    Abort,
    Irq,
    Undefined,
}

impl BankId {
    /// The bank owning R13/R14 (and the SPSR) for `mode`.
    #[must_use]
    pub const fn of(mode: CpuMode) -> Self {
        match mode {
            CpuMode::User | CpuMode::System => Self::System,
            CpuMode::Fiq => Self::Fiq,
            CpuMode::Supervisor => Self::Supervisor,
            CpuMode::Abort => Self::Abort,
            CpuMode::Irq => Self::Irq,
            CpuMode::Undefined => Self::Undefined,
        }
    }
}

/// `N` consecutive registers starting at logical register `first`, plus
/// the status register stored alongside them.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBank<const N: usize> {
    first: u32,
    #[serde_as(as = "[_; N]")]
    registers: [u32; N],
    status: Psr,
}

/// R0-R15 and the CPSR, shared by User and System mode.
pub type SystemBank = RegisterBank<16>;

/// R8-R14 and the SPSR of FIQ mode.
pub type FiqBank = RegisterBank<7>;

/// R13-R14 and the SPSR of SVC, ABT, IRQ and UND mode.
pub type ExceptionBank = RegisterBank<2>;

impl<const N: usize> RegisterBank<N> {
    #[must_use]
    pub const fn new(first: u32) -> Self {
        Self {
            first,
            registers: [0; N],
            status: Psr::from_raw(0),
        }
    }

    fn slot(&self, register: u32) -> Option<usize> {
        let slot = usize::try_from(register.checked_sub(self.first)?).ok()?;
        (slot < N).then_some(slot)
    }

    /// Whether the bank stores a physical copy of `register`.
    #[must_use]
    pub fn holds(&self, register: u32) -> bool {
        self.slot(register).is_some()
    }

    #[must_use]
    pub fn register(&self, register: u32) -> Option<u32> {
        self.slot(register).map(|slot| self.registers[slot])
    }

    pub fn register_mut(&mut self, register: u32) -> Option<&mut u32> {
        self.slot(register).map(|slot| &mut self.registers[slot])
    }

    #[must_use]
    pub const fn status(&self) -> Psr {
        self.status
    }

    pub const fn set_status(&mut self, status: Psr) {
        self.status = status;
    }

    /// Clears every register, then applies the boot stack pointer and status.
    pub fn reset(&mut self, stack_pointer: u32, status: Psr) {
        self.registers = [0; N];
        if let Some(sp) = self.register_mut(REG_SP) {
            *sp = stack_pointer;
        }
        self.status = status;
    }
}
