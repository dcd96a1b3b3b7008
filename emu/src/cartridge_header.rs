use std::{fs, path::Path};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Bytes of the ROM covered by the header, up to the Joybus entry point.
pub const HEADER_SIZE: usize = 0xE4;

const FIXED_VALUE: u8 = 0x96;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("cannot read the cartridge: {0}")]
    Io(#[from] std::io::Error),

    #[error("a cartridge header is 0x{HEADER_SIZE:X} bytes long, got 0x{0:X}")]
    TooShort(usize),

    #[error("fixed value is 0x{0:02X}, expected 0x{FIXED_VALUE:02X}")]
    FixedValue(u8),

    #[error("complement check is 0x{expected:02X} but the header sums to 0x{computed:02X}")]
    Checksum { expected: u8, computed: u8 },
}

/// Contains the information of the cartridge header.
/// Entry points are 32bit ARM opcodes, kept as the raw little-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    rom_entry_point: [u8; 4],
    nintendo_logo: [u8; 156],
    game_title: String,
    game_code: String,
    maker_code: String,
    fixed_value: u8,
    main_unit_code: u8,
    device_type: u8,
    software_version: u8,
    complement_check: u8,
    computed_check: u8,
    ram_entry_point: [u8; 4],
    boot_mode: u8,
    slave_id_number: u8,
    joybus_mode_entry_point: [u8; 4],
}

impl CartridgeHeader {
    /// Extracts the header fields from the start of a ROM.
    ///
    /// The fixed value and the checksum are not enforced here, see
    /// [`CartridgeHeader::validate`]. Non-ASCII bytes in the title, game or
    /// maker code are replaced with `U+FFFD` and logged.
    ///
    /// # Errors
    ///
    /// [`CartridgeError::TooShort`] when `data` ends before the header does.
    pub fn new(data: &[u8]) -> Result<Self, CartridgeError> {
        let data = data
            .get(..HEADER_SIZE)
            .ok_or(CartridgeError::TooShort(data.len()))?;

        Ok(Self {
            rom_entry_point: array_at(data, 0x00),
            nintendo_logo: array_at(data, 0x04),
            game_title: ascii_at(data, 0xA0..0xAC, "game title"),
            game_code: ascii_at(data, 0xAC..0xB0, "game code"),
            maker_code: ascii_at(data, 0xB0..0xB2, "maker code"),
            fixed_value: data[0xB2],
            main_unit_code: data[0xB3],
            device_type: data[0xB4],
            software_version: data[0xBC],
            complement_check: data[0xBD],
            computed_check: complement_check(&data[0xA0..0xBD]),

            // ---- Multiboot header ----
            ram_entry_point: array_at(data, 0xC0),
            boot_mode: data[0xC4],
            slave_id_number: data[0xC5],
            joybus_mode_entry_point: array_at(data, 0xE0),
        })
    }

    /// Reads a whole ROM file and parses its header.
    ///
    /// # Errors
    ///
    /// [`CartridgeError::Io`] when the file cannot be read, otherwise as
    /// [`CartridgeHeader::new`].
    pub fn from_file(path: &Path) -> Result<(Self, Vec<u8>), CartridgeError> {
        info!("loading rom file {}", path.display());
        let data = fs::read(path)?;
        info!("ROM with {} KB loaded", data.len() / 1024);

        let cartridge = Self::new(&data)?;

        Ok((cartridge, data))
    }

    /// Checks the fixed value and the header complement.
    ///
    /// # Errors
    ///
    /// [`CartridgeError::FixedValue`] or [`CartridgeError::Checksum`].
    pub const fn validate(&self) -> Result<(), CartridgeError> {
        if self.fixed_value != FIXED_VALUE {
            return Err(CartridgeError::FixedValue(self.fixed_value));
        }

        if self.computed_check != self.complement_check {
            return Err(CartridgeError::Checksum {
                expected: self.complement_check,
                computed: self.computed_check,
            });
        }

        Ok(())
    }

    pub fn log_fields(&self) {
        info!("Game Title: {}", self.game_title);
        info!("Game Code: {}", self.game_code);
        info!("Maker Code: {}", self.maker_code);
        info!("ROM Entry Point: {:02X?}", self.rom_entry_point);
        debug!("Fixed Value: 0x{:02X}", self.fixed_value);
        debug!("Main unit code: 0x{:02X}", self.main_unit_code);
        debug!("Device type: 0x{:02X}", self.device_type);
        debug!("Software version: {}", self.software_version);
        debug!("Complement Check: 0x{:02X}", self.complement_check);
        debug!("RAM Entry Point: {:02X?}", self.ram_entry_point);
        debug!("Boot mode: 0x{:02X}", self.boot_mode);
        debug!("Slave ID Number: 0x{:02X}", self.slave_id_number);
        debug!("Joybus Entry Point: {:02X?}", self.joybus_mode_entry_point);
    }

    /// 32bit ARM branch opcode, usually `B <start>`.
    #[must_use]
    pub const fn rom_entry_point(&self) -> [u8; 4] {
        self.rom_entry_point
    }

    /// Compressed bitmap, checked by the BIOS.
    #[must_use]
    pub const fn nintendo_logo(&self) -> &[u8; 156] {
        &self.nintendo_logo
    }

    #[must_use]
    pub fn game_title(&self) -> &str {
        self.game_title.as_str()
    }

    #[must_use]
    pub fn game_code(&self) -> &str {
        self.game_code.as_str()
    }

    #[must_use]
    pub fn maker_code(&self) -> &str {
        self.maker_code.as_str()
    }

    /// 00h for current GBA models
    #[must_use]
    pub const fn main_unit_code(&self) -> u8 {
        self.main_unit_code
    }

    /// Usually 0x00
    #[must_use]
    pub const fn device_type(&self) -> u8 {
        self.device_type
    }

    /// Usually 0x00
    #[must_use]
    pub const fn software_version(&self) -> u8 {
        self.software_version
    }

    #[must_use]
    pub const fn complement_check(&self) -> u8 {
        self.complement_check
    }

    /// 32bit ARM branch opcode, used when booted over Normal or Multiplay transfer.
    #[must_use]
    pub const fn ram_entry_point(&self) -> [u8; 4] {
        self.ram_entry_point
    }

    /// Init as 00h, BIOS overwrites this value
    #[must_use]
    pub const fn boot_mode(&self) -> u8 {
        // 01h Joybus mode, 02h Normal mode, 03h Multiplay mode.
        self.boot_mode
    }

    /// Init as 00h, BIOS overwrites this value
    #[must_use]
    pub const fn slave_id_number(&self) -> u8 {
        self.slave_id_number
    }

    /// 32bit ARM branch opcode, used when booted over Joybus.
    #[must_use]
    pub const fn joybus_mode_entry_point(&self) -> [u8; 4] {
        self.joybus_mode_entry_point
    }
}

/// `chk = 0; for each byte: chk -= byte; chk -= 0x19`
fn complement_check(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &item| acc.wrapping_sub(item))
        .wrapping_sub(0x19)
}

/// Callers guarantee `offset + N` is inside `data`.
fn array_at<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

/// ASCII string stored in `range`, without its trailing NUL padding.
fn ascii_at(data: &[u8], range: std::ops::Range<usize>, field: &str) -> String {
    let bytes = &data[range];
    if !bytes.is_ascii() {
        warn!("{field} {bytes:02X?} is not ASCII");
    }

    let text: String = bytes
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                char::from(b)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect();
    text.trim_end_matches('\0').to_string()
}
