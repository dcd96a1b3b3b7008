//! # ARM Condition Field
//!
//! Bits 31-28 of every ARM instruction:
//!
//! ```text
//! ┌───────┬────────┬─────────────────────┐
//! │ Code  │ Suffix │     Flags Tested    │
//! ├───────┼────────┼─────────────────────┤
//! │ 0000  │   EQ   │ Z=1                 │
//! │ 0001  │   NE   │ Z=0                 │
//! │ 0010  │   CS   │ C=1                 │
//! │ 0011  │   CC   │ C=0                 │
//! │ 0100  │   MI   │ N=1                 │
//! │ 0101  │   PL   │ N=0                 │
//! │ 0110  │   VS   │ V=1                 │
//! │ 0111  │   VC   │ V=0                 │
//! │ 1000  │   HI   │ C=1 AND Z=0         │
//! │ 1001  │   LS   │ C=0 OR Z=1          │
//! │ 1010  │   GE   │ N=V                 │
//! │ 1011  │   LT   │ N≠V                 │
//! │ 1100  │   GT   │ Z=0 AND N=V         │
//! │ 1101  │   LE   │ Z=1 OR N≠V          │
//! │ 1110  │   AL   │ (unconditional)     │
//! │ 1111  │   NV   │ (reserved)          │
//! └───────┴────────┴─────────────────────┘
//! ```
//!
//! The branch unit decodes and displays the field but does not evaluate it.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    CS = 0x2,
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    AL = 0xE,
    NV = 0xF,
}

impl From<u32> for Condition {
    /// Only the low 4 bits of `value` are looked at.
    fn from(value: u32) -> Self {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match value & 0xF {
            0x0 => EQ,
            0x1 => NE,
            0x2 => CS,
            0x3 => CC,
            0x4 => MI,
            0x5 => PL,
            0x6 => VS,
            0x7 => VC,
            0x8 => HI,
            0x9 => LS,
            0xA => GE,
            0xB => LT,
            0xC => GT,
            0xD => LE,
            0xE => AL,
            _ => NV,
        }
    }
}

impl Display for Condition {
    /// The mnemonic suffix, empty for `AL`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AL => Ok(()),
            other => write!(f, "{other:?}"),
        }
    }
}
