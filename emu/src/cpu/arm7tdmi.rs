use std::fmt::Display;

use logger::log;
use tracing::{debug, trace, warn};

use crate::cpu::cpu_modes::{CpuMode, InstructionMode};
use crate::cpu::error::{PsrError, RegisterError};
use crate::cpu::psr::Psr;
use crate::cpu::register_file::{REG_PROGRAM_COUNTER, REGISTER_COUNT, RegisterFile};

/// The CPU: the register file plus the active mode and instruction set.
///
/// Every register access made by instruction logic goes through
/// [`Arm7tdmi::register`] / [`Arm7tdmi::set_register`], which resolve banked
/// registers using the mode active at call time.
///
/// The current mode and instruction set mirror the mode bits and the T bit
/// of the CPSR: changing one through this type updates the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm7tdmi {
    registers: RegisterFile,
    mode: CpuMode,
    instruction_mode: InstructionMode,
}

impl Default for Arm7tdmi {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Arm7tdmi {
    /// Builds a CPU already reset for a BIOS or a direct cartridge boot.
    #[must_use]
    pub fn new(using_bios: bool) -> Self {
        let mut cpu = Self {
            registers: RegisterFile::default(),
            mode: CpuMode::System,
            instruction_mode: InstructionMode::Arm,
        };
        cpu.reset(using_bios);

        cpu
    }

    /// Reloads the boot values in every bank. The mode follows the reset
    /// CPSR: System for a direct boot, Supervisor when booting the BIOS.
    pub fn reset(&mut self, using_bios: bool) {
        self.registers.reset(using_bios);

        let cpsr = self.registers.cpsr();
        match cpsr.mode() {
            Ok(mode) => self.mode = mode,
            Err(e) => warn!("reset CPSR {cpsr}: {e}, keeping {} mode", self.mode),
        }
        self.instruction_mode = cpsr.instruction_mode();

        debug!(using_bios, mode = %self.mode, %cpsr, "cpu reset");
    }

    #[must_use]
    pub const fn mode(&self) -> CpuMode {
        self.mode
    }

    /// Switches the active mode, the banked registers of `mode` become visible.
    pub fn set_mode(&mut self, mode: CpuMode) {
        let mut cpsr = self.registers.cpsr();
        cpsr.set_mode(mode);
        self.registers.set_cpsr(cpsr);

        debug!("mode change {} -> {mode}", self.mode);
        self.mode = mode;
    }

    #[must_use]
    pub const fn instruction_mode(&self) -> InstructionMode {
        self.instruction_mode
    }

    pub fn set_instruction_mode(&mut self, instruction_mode: InstructionMode) {
        let mut cpsr = self.registers.cpsr();
        cpsr.set_instruction_mode(instruction_mode);
        self.registers.set_cpsr(cpsr);

        self.instruction_mode = instruction_mode;
    }

    /// Reads `register` in the current mode. An invalid register reads as 0.
    #[must_use]
    pub fn register(&self, register: u32) -> u32 {
        self.try_register(register).unwrap_or_else(|e| {
            warn!("{e}, reading 0");
            0
        })
    }

    /// Writes `register` in the current mode. Writes to an invalid register
    /// are dropped.
    pub fn set_register(&mut self, register: u32, value: u32) {
        if let Err(e) = self.try_set_register(register, value) {
            warn!("{e}, ignoring write of 0x{value:08X}");
        }
    }

    /// # Errors
    ///
    /// [`RegisterError::InvalidRegisterAccess`] when `register` is not in 0..=15.
    pub fn try_register(&self, register: u32) -> Result<u32, RegisterError> {
        self.registers.get(self.mode, register)
    }

    /// # Errors
    ///
    /// [`RegisterError::InvalidRegisterAccess`] when `register` is not in 0..=15.
    pub fn try_set_register(&mut self, register: u32, value: u32) -> Result<(), RegisterError> {
        self.registers.set(self.mode, register, value)
    }

    #[must_use]
    pub fn program_counter(&self) -> u32 {
        self.register(REG_PROGRAM_COUNTER)
    }

    pub fn set_program_counter(&mut self, value: u32) {
        self.set_register(REG_PROGRAM_COUNTER, value);
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        self.registers.cpsr()
    }

    /// Replaces the CPSR, the mode and instruction set follow its bits.
    ///
    /// # Errors
    ///
    /// [`PsrError::InvalidMode`] when the mode bits name no mode. Nothing
    /// changes in that case.
    pub fn set_cpsr(&mut self, cpsr: Psr) -> Result<(), PsrError> {
        let mode = cpsr.mode()?;
        self.registers.set_cpsr(cpsr);
        self.mode = mode;
        self.instruction_mode = cpsr.instruction_mode();

        Ok(())
    }

    /// The saved status register of the current mode.
    ///
    /// # Errors
    ///
    /// [`RegisterError::SpsrUnavailable`] in User and System mode.
    pub fn spsr(&self) -> Result<Psr, RegisterError> {
        self.registers.spsr(self.mode)
    }

    /// # Errors
    ///
    /// [`RegisterError::SpsrUnavailable`] in User and System mode.
    pub fn set_spsr(&mut self, spsr: Psr) -> Result<(), RegisterError> {
        self.registers.set_spsr(self.mode, spsr)
    }

    /// R0-R15 as seen from the current mode.
    #[must_use]
    pub fn visible_registers(&self) -> [u32; REGISTER_COUNT] {
        self.registers.visible(self.mode)
    }

    #[must_use]
    pub const fn register_file(&self) -> &RegisterFile {
        &self.registers
    }

    pub(crate) fn trace_instruction<T: Display>(&self, instruction: &T) {
        log(instruction);

        let pc = self.program_counter();
        trace!(mode = %self.mode, "0x{pc:08X}\n{instruction}");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;
    use crate::cpu::register_file::{REG_LR, REG_SP};

    #[test]
    fn direct_boot_state() {
        let cpu = Arm7tdmi::new(false);
        assert_eq!(cpu.mode(), CpuMode::System);
        assert_eq!(cpu.instruction_mode(), InstructionMode::Arm);
        assert_eq!(cpu.program_counter(), 0x0800_0000);
        assert_eq!(cpu.register(REG_SP), 0x0300_7F00);
        assert_eq!(cpu.cpsr().raw(), 0x5F);
    }

    #[test]
    fn bios_boot_state() {
        let cpu = Arm7tdmi::new(true);
        assert_eq!(cpu.mode(), CpuMode::Supervisor);
        assert_eq!(cpu.program_counter(), 0);
        assert_eq!(cpu.register(REG_SP), 0);
        assert_eq!(cpu.cpsr().raw(), 0xD3);
    }

    #[test]
    fn reset_stack_pointer_per_mode() {
        let expected = [
            (CpuMode::User, 0x0300_7F00),
            (CpuMode::System, 0x0300_7F00),
            (CpuMode::Fiq, 0x0300_7F00),
            (CpuMode::Supervisor, 0x0300_7FE0),
            (CpuMode::Abort, 0x0300_7F00),
            (CpuMode::Irq, 0x0300_7FA0),
            (CpuMode::Undefined, 0x0300_7F00),
        ];

        let mut cpu = Arm7tdmi::default();
        for (mode, sp) in expected {
            cpu.set_mode(mode);
            assert_eq!(cpu.register(REG_SP), sp, "SP in {mode}");
        }

        cpu.reset(true);
        for (mode, _) in expected {
            cpu.set_mode(mode);
            assert_eq!(cpu.register(REG_SP), 0, "SP in {mode}");
        }
    }

    #[test]
    fn reset_ignores_current_mode() {
        let mut cpu = Arm7tdmi::default();
        cpu.set_mode(CpuMode::Irq);
        cpu.set_register(REG_SP, 0x1234);
        cpu.set_register(REG_LR, 0x5678);

        cpu.reset(false);
        cpu.set_mode(CpuMode::Irq);
        assert_eq!(cpu.register(REG_SP), 0x0300_7FA0);
        assert_eq!(cpu.register(REG_LR), 0);
    }

    #[test]
    fn banking_follows_current_mode() {
        let mut cpu = Arm7tdmi::default();

        cpu.set_mode(CpuMode::System);
        cpu.set_register(REG_SP, 0x66);
        cpu.set_mode(CpuMode::Supervisor);
        cpu.set_register(REG_SP, 0x77);
        cpu.set_mode(CpuMode::Irq);
        cpu.set_register(REG_SP, 0x88);

        cpu.set_mode(CpuMode::System);
        assert_eq!(cpu.register(REG_SP), 0x66);
        cpu.set_mode(CpuMode::Supervisor);
        assert_eq!(cpu.register(REG_SP), 0x77);
        cpu.set_mode(CpuMode::Irq);
        assert_eq!(cpu.register(REG_SP), 0x88);
    }

    #[test]
    fn fiq_banks_high_registers() {
        let mut rng = rand::thread_rng();
        let mut cpu = Arm7tdmi::default();

        let user: Vec<u32> = (8..=12).map(|_| rng.gen_range(0..=u32::MAX)).collect();
        for (r, &v) in (8..=12).zip(&user) {
            cpu.set_register(r, v);
        }

        cpu.set_mode(CpuMode::Fiq);
        for r in 8..=12 {
            assert_eq!(cpu.register(r), 0, "FIQ sees the user r{r}");
            cpu.set_register(r, 0xF1F1_0000 | r);
        }

        cpu.set_mode(CpuMode::Abort);
        for (r, &v) in (8..=12).zip(&user) {
            assert_eq!(cpu.register(r), v, "r{r} leaked out of FIQ");
        }
    }

    #[test]
    fn set_mode_writes_cpsr_mode_bits() {
        let mut cpu = Arm7tdmi::default();
        cpu.set_mode(CpuMode::Undefined);
        assert_eq!(cpu.cpsr().raw(), 0x5B);
        assert_eq!(cpu.cpsr().mode(), Ok(CpuMode::Undefined));
    }

    #[test]
    fn set_cpsr_drives_mode() {
        let mut cpu = Arm7tdmi::default();
        assert_eq!(cpu.set_cpsr(Psr::from(0x33)), Ok(()));
        assert_eq!(cpu.mode(), CpuMode::Supervisor);
        assert_eq!(cpu.instruction_mode(), InstructionMode::Thumb);

        assert_eq!(
            cpu.set_cpsr(Psr::from(0x00)),
            Err(PsrError::InvalidMode(0))
        );
        assert_eq!(cpu.cpsr().raw(), 0x33);
        assert_eq!(cpu.mode(), CpuMode::Supervisor);
    }

    #[test]
    fn instruction_mode_sets_state_bit() {
        let mut cpu = Arm7tdmi::default();
        cpu.set_instruction_mode(InstructionMode::Thumb);
        assert_eq!(cpu.cpsr().raw(), 0x7F);
        assert_eq!(cpu.instruction_mode(), InstructionMode::Thumb);
    }

    #[test]
    fn spsr_only_in_exception_modes() {
        let mut cpu = Arm7tdmi::default();
        assert_eq!(
            cpu.set_spsr(Psr::from(0x10)),
            Err(RegisterError::SpsrUnavailable {
                mode: CpuMode::System
            })
        );
        assert_eq!(cpu.cpsr().raw(), 0x5F);

        cpu.set_mode(CpuMode::Irq);
        assert_eq!(cpu.set_spsr(Psr::from(0x10)), Ok(()));
        assert_eq!(cpu.spsr(), Ok(Psr::from(0x10)));

        cpu.set_mode(CpuMode::Fiq);
        assert_eq!(cpu.spsr(), Ok(Psr::default()));
    }

    #[test]
    fn invalid_register_reads_zero_and_drops_writes() {
        let mut cpu = Arm7tdmi::default();
        for r in 0..16 {
            cpu.set_register(r, 0x1000 + r);
        }
        let before = cpu.clone();

        assert_eq!(cpu.register(99), 0);
        cpu.set_register(99, 0xFFFF_FFFF);
        cpu.set_register(16, 0xFFFF_FFFF);

        assert_eq!(cpu, before);
        assert_eq!(
            cpu.try_register(99),
            Err(RegisterError::InvalidRegisterAccess {
                register: 99,
                mode: CpuMode::System
            })
        );
    }

    #[test]
    fn cpus_are_independent() {
        let mut first = Arm7tdmi::new(false);
        let second = Arm7tdmi::new(false);

        first.set_register(0, 0xAAAA);
        first.set_mode(CpuMode::Fiq);

        assert_eq!(second.register(0), 0);
        assert_eq!(second.mode(), CpuMode::System);
    }

    #[test]
    fn visible_registers_of_current_mode() {
        let mut cpu = Arm7tdmi::default();
        cpu.set_mode(CpuMode::Supervisor);
        let registers = cpu.visible_registers();
        assert_eq!(registers[13], 0x0300_7FE0);
        assert_eq!(registers[15], 0x0800_0000);
    }
}
