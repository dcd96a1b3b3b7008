//! # ARM Instruction Decoding (branch family)
//!
//! Instructions arrive as 4 little-endian bytes. [`decode`] turns them into
//! the 32 bit word, [`Branch`] and [`BranchAndExchange`] pull the fields
//! the branch unit needs out of it.
//!
//! ```text
//! B/BL |_Cond__|1_0_1|L|______________________Offset___________________|
//! BX   |_Cond__|0_0_0_1|0_0_1_0|1_1_1_1|1_1_1_1|1_1_1_1|0_0_0_1|__Rn___|
//! ```

use std::fmt::{self, Display, Formatter};

use crate::bitwise::Bits;
use crate::cpu::condition::Condition;
use crate::cpu::error::DecodeError;

pub const SIZE_OF_ARM_INSTRUCTION: usize = 4;

/// Reads the first 4 bytes of `bytes` as a little-endian word.
///
/// # Errors
///
/// [`DecodeError::TooShort`] when fewer than 4 bytes are given.
pub fn decode(bytes: &[u8]) -> Result<u32, DecodeError> {
    let word: [u8; SIZE_OF_ARM_INSTRUCTION] = bytes
        .get(..SIZE_OF_ARM_INSTRUCTION)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::TooShort { len: bytes.len() })?;

    Ok(u32::from_le_bytes(word))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `B`
    Branch,

    /// `BL`, also writes the link register.
    BranchWithLink,
}

impl From<bool> for BranchKind {
    fn from(link: bool) -> Self {
        if link {
            Self::BranchWithLink
        } else {
            Self::Branch
        }
    }
}

/// Fields of a `B`/`BL` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub condition: Condition,
    pub kind: BranchKind,

    /// Word offset. When bit 23 of the encoded field is set, this holds the
    /// wrapping negation of the unsigned 24 bit field, not its sign extension.
    pub offset: u32,
    pub raw: u32,
}

impl From<u32> for Branch {
    fn from(op_code: u32) -> Self {
        let mut offset = op_code.get_bits(0..=23);
        if offset.get_bit(23) {
            offset = offset.wrapping_neg();
        }

        Self {
            condition: Condition::from(op_code.get_bits(28..=31)),
            kind: op_code.get_bit(24).into(),
            offset,
            raw: op_code,
        }
    }
}

/// Fields of a `BX` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchAndExchange {
    pub condition: Condition,

    /// Register holding the branch target.
    pub source_register: u32,

    /// Bit 4 of the instruction.
    pub operation: u32,
    pub raw: u32,
}

impl From<u32> for BranchAndExchange {
    fn from(op_code: u32) -> Self {
        Self {
            condition: Condition::from(op_code.get_bits(28..=31)),
            source_register: op_code.get_bits(0..=3),
            operation: op_code.get_bits(4..=4),
            raw: op_code,
        }
    }
}

fn write_layout(f: &mut Formatter<'_>, instruction: &str, raw: u32, format: &str) -> fmt::Result {
    let bytes_pos1 = "POS: |..3 ..................2 ..................1 ..................0|";
    let bytes_pos2 = "     |1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|";

    let mut raw_bits = String::new();
    for i in format!("{raw:032b}").chars() {
        raw_bits.push(i);
        raw_bits.push('_');
    }
    raw_bits.pop();

    writeln!(f, "INS: {instruction}")?;
    writeln!(f, "{bytes_pos1}")?;
    writeln!(f, "{bytes_pos2}")?;
    writeln!(f, "RAW: |{raw_bits}|")?;
    write!(f, "FMT: {format}")
}

impl Display for Branch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mnemonic = match self.kind {
            BranchKind::Branch => "B",
            BranchKind::BranchWithLink => "BL",
        };
        let instruction = format!(
            "{mnemonic}{} #0x{:06X}",
            self.condition,
            self.raw.get_bits(0..=23)
        );

        write_layout(
            f,
            &instruction,
            self.raw,
            "|_Cond__|1_0_1|L|______________________Offset___________________|",
        )
    }
}

impl Display for BranchAndExchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let instruction = format!("BX{} R{}", self.condition, self.source_register);

        write_layout(
            f,
            &instruction,
            self.raw,
            "|_Cond__|0_0_0_1|0_0_1_0|1_1_1_1|1_1_1_1|1_1_1_1|0_0_0_1|__Rn___|",
        )
    }
}
