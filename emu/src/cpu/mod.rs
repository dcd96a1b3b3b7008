//! # ARM7TDMI core
//!
//! Banked register storage, mode-aware register access and the branch
//! family of ARM instructions.
//!
//! ```text
//! instruction bytes ─► decoder ─► Branch / BranchAndExchange
//!                                          │
//!                                          ▼
//!                          Arm7tdmi::register / set_register
//!                                          │  (current CpuMode)
//!                                          ▼
//!                    RegisterFile ─► banking table ─► RegisterBank
//! ```

pub mod arm7tdmi;
mod branch;
pub mod condition;
pub mod cpu_modes;
pub mod decoder;
pub mod error;
pub mod psr;
pub mod register_bank;
pub mod register_file;
