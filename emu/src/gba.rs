use crate::{
    cartridge_header::CartridgeHeader,
    cpu::{arm7tdmi::Arm7tdmi, error::DecodeError},
};

pub struct Gba {
    pub cpu: Arm7tdmi,

    pub cartridge_header: CartridgeHeader,
}

impl Gba {
    /// A reset CPU with the cartridge inserted.
    #[must_use]
    pub fn new(cartridge_header: CartridgeHeader, using_bios: bool) -> Self {
        Self {
            cpu: Arm7tdmi::new(using_bios),
            cartridge_header,
        }
    }

    /// Executes the branch stored at the ROM entry point.
    ///
    /// # Errors
    ///
    /// Never in practice: the entry point is always 4 bytes long.
    pub fn boot(&mut self) -> Result<(), DecodeError> {
        let entry_point = self.cartridge_header.rom_entry_point();
        self.cpu.branch_with_link(&entry_point)
    }
}
