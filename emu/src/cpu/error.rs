use thiserror::Error;

use crate::cpu::cpu_modes::CpuMode;

/// Failures of the mode-aware register interface.
///
/// None of them is fatal for the emulated machine: the CPU turns them into a
/// warning, a zero read or a dropped write.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("register r{register} does not exist in {mode} mode")]
    InvalidRegisterAccess { register: u32, mode: CpuMode },

    #[error("{mode} mode has no saved program status register")]
    SpsrUnavailable { mode: CpuMode },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("an ARM instruction is 4 bytes long, got {len}")]
    TooShort { len: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PsrError {
    #[error("0b{0:05b} is not a valid CPU mode")]
    InvalidMode(u32),
}
