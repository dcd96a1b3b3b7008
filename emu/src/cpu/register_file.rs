//! # ARM7TDMI Register File
//!
//! All 37 physical registers of the CPU and the rule mapping a logical
//! register number, seen from a given mode, onto one of them.
//!
//! - **R0-R7, R15**: always the System/User copy
//! - **R8-R12**: FIQ copy in FIQ mode, System/User copy otherwise
//! - **R13 (SP), R14 (LR)**: one copy per bank
//!
//! The rule is evaluated once, at compile time, into [`BANKING`].

use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::CpuMode;
use crate::cpu::error::RegisterError;
use crate::cpu::psr::Psr;
use crate::cpu::register_bank::{BankId, ExceptionBank, FiqBank, SystemBank};

/// Stack Pointer register index.
pub const REG_SP: u32 = 0xD;

/// Link Register index (return address for subroutines).
pub const REG_LR: u32 = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: u32 = 0xF;

/// Number of logical registers visible from any mode.
pub const REGISTER_COUNT: usize = 16;

/// Bank answering for `(logical register, mode)`, modes ordered as [`CpuMode::ALL`].
pub const BANKING: [[BankId; CpuMode::COUNT]; REGISTER_COUNT] = banking_table();

const fn bank_for(register: usize, mode: CpuMode) -> BankId {
    match register {
        8..=12 if matches!(mode, CpuMode::Fiq) => BankId::Fiq,
        13 | 14 => BankId::of(mode),
        _ => BankId::System,
    }
}

const fn banking_table() -> [[BankId; CpuMode::COUNT]; REGISTER_COUNT] {
    let mut table = [[BankId::System; CpuMode::COUNT]; REGISTER_COUNT];
    let mut register = 0;
    while register < REGISTER_COUNT {
        let mut column = 0;
        while column < CpuMode::COUNT {
            table[register][column] = bank_for(register, CpuMode::ALL[column]);
            column += 1;
        }
        register += 1;
    }
    table
}

/// Register values loaded by [`RegisterFile::reset`].
///
/// Both profiles come from the GBA boot contract: when the BIOS is skipped
/// the registers must look as the BIOS would have left them.
struct BootProfile {
    sp_system: u32,
    sp_fiq: u32,
    sp_supervisor: u32,
    sp_abort: u32,
    sp_irq: u32,
    sp_undefined: u32,
    program_counter: u32,
    cpsr: u32,
}

const DIRECT_BOOT: BootProfile = BootProfile {
    sp_system: 0x0300_7F00,
    sp_fiq: 0x0300_7F00,
    sp_supervisor: 0x0300_7FE0,
    sp_abort: 0x0300_7F00,
    sp_irq: 0x0300_7FA0,
    sp_undefined: 0x0300_7F00,
    program_counter: 0x0800_0000,
    cpsr: 0x5F,
};

const BIOS_BOOT: BootProfile = BootProfile {
    sp_system: 0x0,
    sp_fiq: 0x0,
    sp_supervisor: 0x0,
    sp_abort: 0x0,
    sp_irq: 0x0,
    sp_undefined: 0x0,
    program_counter: 0x0,
    cpsr: 0xD3,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    system: SystemBank,
    fiq: FiqBank,
    supervisor: ExceptionBank,
    abort: ExceptionBank,
    irq: ExceptionBank,
    undefined: ExceptionBank,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            system: SystemBank::new(0),
            fiq: FiqBank::new(8),
            supervisor: ExceptionBank::new(REG_SP),
            abort: ExceptionBank::new(REG_SP),
            irq: ExceptionBank::new(REG_SP),
            undefined: ExceptionBank::new(REG_SP),
        }
    }
}

impl RegisterFile {
    /// The bank backing `register` while in `mode`, `None` for numbers above 15.
    #[must_use]
    pub fn bank_of(mode: CpuMode, register: u32) -> Option<BankId> {
        let row = BANKING.get(usize::try_from(register).ok()?)?;
        Some(row[mode.index()])
    }

    /// Reads `register` as seen from `mode`.
    ///
    /// # Errors
    ///
    /// [`RegisterError::InvalidRegisterAccess`] when `register` is not in 0..=15.
    pub fn get(&self, mode: CpuMode, register: u32) -> Result<u32, RegisterError> {
        Self::bank_of(mode, register)
            .and_then(|bank| self.physical(bank, register))
            .ok_or(RegisterError::InvalidRegisterAccess { register, mode })
    }

    /// Writes `register` as seen from `mode`. Nothing is written on error.
    ///
    /// # Errors
    ///
    /// [`RegisterError::InvalidRegisterAccess`] when `register` is not in 0..=15.
    pub fn set(&mut self, mode: CpuMode, register: u32, value: u32) -> Result<(), RegisterError> {
        let slot = Self::bank_of(mode, register)
            .and_then(|bank| self.physical_mut(bank, register))
            .ok_or(RegisterError::InvalidRegisterAccess { register, mode })?;
        *slot = value;

        Ok(())
    }

    fn physical(&self, bank: BankId, register: u32) -> Option<u32> {
        match bank {
            BankId::System => self.system.register(register),
            BankId::Fiq => self.fiq.register(register),
            BankId::Supervisor => self.supervisor.register(register),
            BankId::Abort => self.abort.register(register),
            BankId::Irq => self.irq.register(register),
            BankId::Undefined => self.undefined.register(register),
        }
    }

    fn physical_mut(&mut self, bank: BankId, register: u32) -> Option<&mut u32> {
        match bank {
            BankId::System => self.system.register_mut(register),
            BankId::Fiq => self.fiq.register_mut(register),
            BankId::Supervisor => self.supervisor.register_mut(register),
            BankId::Abort => self.abort.register_mut(register),
            BankId::Irq => self.irq.register_mut(register),
            BankId::Undefined => self.undefined.register_mut(register),
        }
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        self.system.status()
    }

    pub const fn set_cpsr(&mut self, cpsr: Psr) {
        self.system.set_status(cpsr);
    }

    /// # Errors
    ///
    /// [`RegisterError::SpsrUnavailable`] in User and System mode.
    pub fn spsr(&self, mode: CpuMode) -> Result<Psr, RegisterError> {
        match BankId::of(mode) {
            BankId::System => Err(RegisterError::SpsrUnavailable { mode }),
            BankId::Fiq => Ok(self.fiq.status()),
            BankId::Supervisor => Ok(self.supervisor.status()),
            BankId::Abort => Ok(self.abort.status()),
            BankId::Irq => Ok(self.irq.status()),
            BankId::Undefined => Ok(self.undefined.status()),
        }
    }

    /// # Errors
    ///
    /// [`RegisterError::SpsrUnavailable`] in User and System mode, the CPSR is
    /// left untouched.
    pub fn set_spsr(&mut self, mode: CpuMode, spsr: Psr) -> Result<(), RegisterError> {
        match BankId::of(mode) {
            BankId::System => return Err(RegisterError::SpsrUnavailable { mode }),
            BankId::Fiq => self.fiq.set_status(spsr),
            BankId::Supervisor => self.supervisor.set_status(spsr),
            BankId::Abort => self.abort.set_status(spsr),
            BankId::Irq => self.irq.set_status(spsr),
            BankId::Undefined => self.undefined.set_status(spsr),
        }

        Ok(())
    }

    /// Loads the boot values into every bank, whatever mode the CPU is in.
    /// SPSRs and every register without a boot value are cleared.
    pub fn reset(&mut self, using_bios: bool) {
        let profile = if using_bios { &BIOS_BOOT } else { &DIRECT_BOOT };
        let cleared = Psr::default();

        self.system.reset(profile.sp_system, Psr::from(profile.cpsr));
        if let Some(pc) = self.system.register_mut(REG_PROGRAM_COUNTER) {
            *pc = profile.program_counter;
        }

        self.fiq.reset(profile.sp_fiq, cleared);
        self.supervisor.reset(profile.sp_supervisor, cleared);
        self.abort.reset(profile.sp_abort, cleared);
        self.irq.reset(profile.sp_irq, cleared);
        self.undefined.reset(profile.sp_undefined, cleared);
    }

    /// R0-R15 as seen from `mode`.
    #[must_use]
    pub fn visible(&self, mode: CpuMode) -> [u32; REGISTER_COUNT] {
        let mut registers = [0; REGISTER_COUNT];
        for (register, value) in (0..).zip(registers.iter_mut()) {
            *value = self.get(mode, register).unwrap_or_default();
        }
        registers
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;

    const SP_DIRECT_BOOT: [(CpuMode, u32); 7] = [
        (CpuMode::User, 0x0300_7F00),
        (CpuMode::System, 0x0300_7F00),
        (CpuMode::Fiq, 0x0300_7F00),
        (CpuMode::Supervisor, 0x0300_7FE0),
        (CpuMode::Abort, 0x0300_7F00),
        (CpuMode::Irq, 0x0300_7FA0),
        (CpuMode::Undefined, 0x0300_7F00),
    ];

    fn dirty_register_file() -> RegisterFile {
        let mut file = RegisterFile::default();
        for mode in CpuMode::ALL {
            for r in 0..16 {
                file.set(mode, r, 0xDEAD_0000 | r).unwrap();
            }
            if mode.has_spsr() {
                file.set_spsr(mode, Psr::from(0xFFFF_FFFF)).unwrap();
            }
        }
        file
    }

    #[test]
    fn banking_table_shape() {
        for mode in CpuMode::ALL {
            for r in (0..=7).chain([15]) {
                assert_eq!(RegisterFile::bank_of(mode, r), Some(BankId::System));
            }
            let high = if mode == CpuMode::Fiq {
                BankId::Fiq
            } else {
                BankId::System
            };
            for r in 8..=12 {
                assert_eq!(RegisterFile::bank_of(mode, r), Some(high));
            }
            assert_eq!(RegisterFile::bank_of(mode, REG_SP), Some(BankId::of(mode)));
            assert_eq!(RegisterFile::bank_of(mode, REG_LR), Some(BankId::of(mode)));
            assert_eq!(RegisterFile::bank_of(mode, 16), None);
        }
    }

    #[test]
    fn reset_direct_boot() {
        let mut file = dirty_register_file();
        file.reset(false);

        for (mode, sp) in SP_DIRECT_BOOT {
            assert_eq!(file.get(mode, REG_SP), Ok(sp), "SP in {mode}");
            assert_eq!(file.get(mode, REG_LR), Ok(0), "LR in {mode}");
            assert_eq!(file.get(mode, REG_PROGRAM_COUNTER), Ok(0x0800_0000));
            for r in 0..=12 {
                assert_eq!(file.get(mode, r), Ok(0));
            }
            if mode.has_spsr() {
                assert_eq!(file.spsr(mode), Ok(Psr::default()));
            }
        }
        assert_eq!(file.cpsr().raw(), 0x5F);
    }

    #[test]
    fn reset_bios_boot() {
        let mut file = dirty_register_file();
        file.reset(true);

        for mode in CpuMode::ALL {
            assert_eq!(file.get(mode, REG_SP), Ok(0), "SP in {mode}");
            assert_eq!(file.get(mode, REG_LR), Ok(0), "LR in {mode}");
            assert_eq!(file.get(mode, REG_PROGRAM_COUNTER), Ok(0));
            for r in 0..=12 {
                assert_eq!(file.get(mode, r), Ok(0));
            }
        }
        assert_eq!(file.cpsr().raw(), 0xD3);
    }

    #[test]
    fn unbanked_registers_are_shared() {
        let mut rng = rand::thread_rng();
        let mut file = RegisterFile::default();

        for writer in CpuMode::ALL {
            for r in (0..=7).chain([REG_PROGRAM_COUNTER]) {
                let value = rng.gen_range(0..=u32::MAX);
                file.set(writer, r, value).unwrap();
                for reader in CpuMode::ALL {
                    assert_eq!(file.get(reader, r), Ok(value), "r{r} {writer}->{reader}");
                }
            }
        }
    }

    #[test]
    fn fiq_high_registers_are_isolated() {
        let mut file = RegisterFile::default();
        for r in 8..=12 {
            file.set(CpuMode::User, r, 0x100 + r).unwrap();
        }

        for r in 8..=12 {
            file.set(CpuMode::Fiq, r, 0xF00 + r).unwrap();
        }
        for mode in CpuMode::ALL.into_iter().filter(|&m| m != CpuMode::Fiq) {
            for r in 8..=12 {
                assert_eq!(file.get(mode, r), Ok(0x100 + r), "r{r} in {mode}");
            }
        }

        for r in 8..=12 {
            file.set(CpuMode::Irq, r, 0xA00 + r).unwrap();
            assert_eq!(file.get(CpuMode::Fiq, r), Ok(0xF00 + r));
            assert_eq!(file.get(CpuMode::System, r), Ok(0xA00 + r));
        }
    }

    #[test]
    fn stack_pointers_are_isolated() {
        let mut file = RegisterFile::default();
        file.set(CpuMode::System, REG_SP, 0x66).unwrap();
        file.set(CpuMode::Supervisor, REG_SP, 0x77).unwrap();
        file.set(CpuMode::Irq, REG_SP, 0x88).unwrap();

        assert_eq!(file.get(CpuMode::System, REG_SP), Ok(0x66));
        assert_eq!(file.get(CpuMode::User, REG_SP), Ok(0x66));
        assert_eq!(file.get(CpuMode::Supervisor, REG_SP), Ok(0x77));
        assert_eq!(file.get(CpuMode::Irq, REG_SP), Ok(0x88));
        assert_eq!(file.get(CpuMode::Fiq, REG_SP), Ok(0));
        assert_eq!(file.get(CpuMode::Abort, REG_SP), Ok(0));
        assert_eq!(file.get(CpuMode::Undefined, REG_SP), Ok(0));
    }

    #[test]
    fn link_registers_are_isolated() {
        let mut file = RegisterFile::default();
        for (value, mode) in (1..).zip(CpuMode::ALL) {
            file.set(mode, REG_LR, value).unwrap();
        }

        // User and System write the same copy, the last write wins.
        assert_eq!(file.get(CpuMode::User, REG_LR), Ok(2));
        assert_eq!(file.get(CpuMode::System, REG_LR), Ok(2));
        assert_eq!(file.get(CpuMode::Fiq, REG_LR), Ok(3));
        assert_eq!(file.get(CpuMode::Supervisor, REG_LR), Ok(4));
        assert_eq!(file.get(CpuMode::Abort, REG_LR), Ok(5));
        assert_eq!(file.get(CpuMode::Irq, REG_LR), Ok(6));
        assert_eq!(file.get(CpuMode::Undefined, REG_LR), Ok(7));
    }

    #[test]
    fn invalid_register_index() {
        let mut file = dirty_register_file();
        let before = file.clone();

        for mode in CpuMode::ALL {
            assert_eq!(
                file.get(mode, 99),
                Err(RegisterError::InvalidRegisterAccess { register: 99, mode })
            );
            assert_eq!(
                file.set(mode, 16, 0x1234),
                Err(RegisterError::InvalidRegisterAccess { register: 16, mode })
            );
        }

        assert_eq!(file, before);
    }

    #[test]
    fn spsr_per_exception_mode() {
        let mut file = RegisterFile::default();
        for (value, mode) in (0x10..).zip(CpuMode::ALL) {
            let result = file.set_spsr(mode, Psr::from(value));
            assert_eq!(result.is_ok(), mode.has_spsr());
        }

        assert_eq!(file.spsr(CpuMode::Fiq), Ok(Psr::from(0x12)));
        assert_eq!(file.spsr(CpuMode::Supervisor), Ok(Psr::from(0x13)));
        assert_eq!(file.spsr(CpuMode::Abort), Ok(Psr::from(0x14)));
        assert_eq!(file.spsr(CpuMode::Irq), Ok(Psr::from(0x15)));
        assert_eq!(file.spsr(CpuMode::Undefined), Ok(Psr::from(0x16)));
        assert_eq!(
            file.spsr(CpuMode::User),
            Err(RegisterError::SpsrUnavailable {
                mode: CpuMode::User
            })
        );
        assert_eq!(file.cpsr(), Psr::default());
    }

    #[test]
    fn visible_registers() {
        let mut file = RegisterFile::default();
        file.reset(false);
        file.set(CpuMode::Fiq, 8, 0x8F).unwrap();

        let fiq = file.visible(CpuMode::Fiq);
        assert_eq!(fiq[8], 0x8F);
        assert_eq!(fiq[13], 0x0300_7F00);
        assert_eq!(fiq[15], 0x0800_0000);

        let svc = file.visible(CpuMode::Supervisor);
        assert_eq!(svc[8], 0);
        assert_eq!(svc[13], 0x0300_7FE0);
    }

    #[test]
    fn save_state_round_trip() {
        let mut file = dirty_register_file();
        file.set_cpsr(Psr::from(0x5F));

        let saved = serde_json::to_string(&file).unwrap();
        let restored: RegisterFile = serde_json::from_str(&saved).unwrap();

        assert_eq!(restored, file);
        assert_eq!(restored.get(CpuMode::Fiq, 8), Ok(0xDEAD_0008));
        assert_eq!(restored.get(CpuMode::Irq, REG_SP), Ok(0xDEAD_000D));
        assert_eq!(restored.spsr(CpuMode::Abort), Ok(Psr::from(0xFFFF_FFFF)));
        assert_eq!(restored.cpsr(), Psr::from(0x5F));
    }
}
