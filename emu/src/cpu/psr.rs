//! # Program Status Registers (CPSR and SPSR)
//!
//! ```text
//! 31 30 29 28 27      8 7 6 5 4   0
//! ┌──┬──┬──┬──┬────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │Reserved│I│F│T│Mode │
//! └──┴──┴──┴──┴────────┴─┴─┴─┴─────┘
//! ```
//!
//! - **Mode (0-4)**: see [`cpu_modes`](super::cpu_modes)
//! - **T bit (5)**: ARM (0) or Thumb (1) state
//! - **I/F bits (6-7)**: IRQ/FIQ disable
//!
//! The CPSR lives in the System/User bank, each exception mode keeps its
//! SPSR in its own bank.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::cpu_modes::{CpuMode, InstructionMode};
use crate::cpu::error::PsrError;

/// Program Status Register (CPSR or SPSR), a thin wrapper over the raw word.
///
/// # Example
///
/// ```
/// use emu::cpu::cpu_modes::CpuMode;
/// use emu::cpu::psr::Psr;
///
/// let cpsr = Psr::from(0x5F);
/// assert_eq!(cpsr.mode(), Ok(CpuMode::System));
/// assert!(cpsr.fiq_disable());
/// assert!(!cpsr.irq_disable());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn instruction_mode(self) -> InstructionMode {
        self.0.get_bit(5).into()
    }

    /// M4-M0 => Bits 4-0
    ///
    /// # Errors
    ///
    /// The BIOS may store mode bits that name no mode (e.g. 0) in an SPSR.
    pub fn mode(self) -> Result<CpuMode, PsrError> {
        CpuMode::try_from(self.0.get_bits(0..=4))
    }

    pub fn set_mode(&mut self, mode: CpuMode) {
        self.0.set_bits(0..=4, mode.into());
    }

    pub fn set_instruction_mode(&mut self, mode: InstructionMode) {
        self.0.set_bit(5, mode.into());
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(6, value);
    }
}

impl From<u32> for Psr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Psr> for u32 {
    fn from(psr: Psr) -> Self {
        psr.0
    }
}

impl Display for Psr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { c.to_ascii_lowercase() };
        let mode = self.mode().map_or("???", CpuMode::short_name);

        write!(
            f,
            "0x{:08X} [{}{}{}{} {}{}{} {mode}]",
            self.0,
            flag(self.sign_flag(), 'N'),
            flag(self.zero_flag(), 'Z'),
            flag(self.carry_flag(), 'C'),
            flag(self.overflow_flag(), 'V'),
            flag(self.irq_disable(), 'I'),
            flag(self.fiq_disable(), 'F'),
            flag(self.instruction_mode() == InstructionMode::Thumb, 'T'),
        )
    }
}
