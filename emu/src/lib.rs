#[allow(clippy::cast_possible_truncation)]
mod bitwise;

#[allow(clippy::similar_names)]
pub mod cartridge_header;
pub mod cpu;
pub mod gba;
