//! # Branch unit
//!
//! `B`, `BL` and `BX`. Every register access goes through the mode-aware
//! interface of [`Arm7tdmi`], so PC and LR land in the active bank.

use tracing::trace;

use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::decoder::{Branch, BranchAndExchange, BranchKind, decode};
use crate::cpu::error::DecodeError;
use crate::cpu::register_file::REG_LR;

/// PC reads two instructions ahead of the one executing.
const PREFETCH_OFFSET: u32 = 8;

impl Arm7tdmi {
    /// Decodes and runs a `B`/`BL` instruction.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TooShort`] when `instruction` has fewer than 4 bytes,
    /// no register is touched in that case.
    pub fn branch_with_link(&mut self, instruction: &[u8]) -> Result<(), DecodeError> {
        let instruction = Branch::from(decode(instruction)?);
        self.trace_instruction(&instruction);
        self.branch(instruction);

        Ok(())
    }

    /// Decodes and runs a `BX` instruction.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TooShort`] when `instruction` has fewer than 4 bytes,
    /// no register is touched in that case.
    pub fn branch_and_exchange(&mut self, instruction: &[u8]) -> Result<(), DecodeError> {
        let instruction = BranchAndExchange::from(decode(instruction)?);
        self.trace_instruction(&instruction);
        self.exchange(instruction);

        Ok(())
    }

    /// PC = PC + 8 + 4 * offset, then LR = new PC + 4 for `BL`.
    pub fn branch(&mut self, instruction: Branch) {
        let new_pc = self
            .program_counter()
            .wrapping_add(PREFETCH_OFFSET)
            .wrapping_add(instruction.offset.wrapping_mul(4));
        self.set_program_counter(new_pc);
        trace!("PC <- 0x{new_pc:08X}");

        if instruction.kind == BranchKind::BranchWithLink {
            let link = new_pc.wrapping_add(4);
            self.set_register(REG_LR, link);
            trace!("LR <- 0x{link:08X}");
        }
    }

    /// PC = Rn. The instruction set is left as it is.
    pub fn exchange(&mut self, instruction: BranchAndExchange) {
        let target = self.register(instruction.source_register);
        self.set_program_counter(target);
        trace!("PC <- R{} = 0x{target:08X}", instruction.source_register);

        // Unreachable: `operation` is a single bit. Hardware BX instead picks
        // the instruction set from bit 0 of Rn, which is not modelled here.
        if instruction.operation == 3 {
            let link = target.wrapping_add(4);
            self.set_register(REG_LR, link);
            trace!("LR <- 0x{link:08X}");
        }
    }
}
