//! NES Cartridge Mapper Implementations.
//!
//! This crate provides mapper implementations for NES cartridge emulation.
//! Mappers handle memory banking for PRG-ROM, CHR-ROM/RAM, and provide
//! nametable mirroring control.
//!
//! # Supported Mappers
//!
//! | Mapper | Name | Description |
//! |--------|------|-------------|
//! | 0 | NROM | No banking, simplest mapper |
//! | 1 | MMC1 | Nintendo's first bank-switching mapper |
//!
//! # Example
//!
//! ```no_run
//! use rustynes_mappers::{Rom, create_mapper};
//!
//! let rom_data = std::fs::read("game.nes").expect("Failed to read ROM");
//! let rom = Rom::load(&rom_data).expect("Failed to parse ROM");
//!
//! let mut mapper = create_mapper(&rom).expect("Unsupported mapper");
//! ```
//!
//! # no_std Support
//!
//! This crate supports `no_std` environments with the `alloc` feature.
//! Disable the default `std` feature for embedded use.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod mapper;
pub mod rom;

mod mmc1;
mod nrom;

pub use mapper::{Mapper, Mirroring, RomWriteFault};
pub use mmc1::Mmc1;
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cartridge mapper, tagged over the two variants this core supports.
///
/// A tagged variant is used instead of `Box<dyn Mapper>` so the hot path
/// (bus reads in `0x8000..=0xFFFF`) lets the compiler inline the concrete
/// branch rather than going through a vtable.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CartridgeMapper {
    /// Mapper 0.
    Nrom(Nrom),
    /// Mapper 1.
    Mmc1(Mmc1),
}

impl Mapper for CartridgeMapper {
    fn read_prg(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.read_prg(addr),
            Self::Mmc1(m) => m.read_prg(addr),
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) -> Result<(), RomWriteFault> {
        match self {
            Self::Nrom(m) => m.write_prg(addr, val),
            Self::Mmc1(m) => m.write_prg(addr, val),
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.read_chr(addr),
            Self::Mmc1(m) => m.read_chr(addr),
        }
    }

    fn write_chr(&mut self, addr: u16, val: u8) {
        match self {
            Self::Nrom(m) => m.write_chr(addr, val),
            Self::Mmc1(m) => m.write_chr(addr, val),
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self {
            Self::Nrom(m) => m.mirroring(),
            Self::Mmc1(m) => m.mirroring(),
        }
    }

    fn mapper_number(&self) -> u16 {
        match self {
            Self::Nrom(m) => m.mapper_number(),
            Self::Mmc1(m) => m.mapper_number(),
        }
    }

    fn mapper_name(&self) -> &'static str {
        match self {
            Self::Nrom(m) => m.mapper_name(),
            Self::Mmc1(m) => m.mapper_name(),
        }
    }

    fn has_battery(&self) -> bool {
        match self {
            Self::Nrom(m) => m.has_battery(),
            Self::Mmc1(m) => m.has_battery(),
        }
    }

    fn sram(&self) -> &[u8] {
        match self {
            Self::Nrom(m) => m.sram(),
            Self::Mmc1(m) => m.sram(),
        }
    }

    fn load_sram(&mut self, data: &[u8]) {
        match self {
            Self::Nrom(m) => m.load_sram(data),
            Self::Mmc1(m) => m.load_sram(data),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Nrom(m) => m.reset(),
            Self::Mmc1(m) => m.reset(),
        }
    }
}

/// Create a mapper instance from ROM data.
///
/// Returns the appropriate mapper implementation based on the ROM header's
/// mapper number. Returns an error if the mapper is not supported.
///
/// # Errors
///
/// Returns `RomError::UnsupportedMapper` if the mapper number is not
/// implemented in this crate.
pub fn create_mapper(rom: &Rom) -> Result<CartridgeMapper, RomError> {
    match rom.header.mapper_number {
        0 => Ok(CartridgeMapper::Nrom(Nrom::new(rom))),
        1 => Ok(CartridgeMapper::Mmc1(Mmc1::new(rom))),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}

/// Get a list of supported mapper numbers.
#[must_use]
pub fn supported_mappers() -> &'static [u16] {
    &[0, 1]
}

/// Check if a mapper number is supported.
#[must_use]
pub fn is_mapper_supported(mapper: u16) -> bool {
    supported_mappers().contains(&mapper)
}

/// Get the name of a mapper by number.
#[must_use]
pub fn mapper_name(mapper: u16) -> Option<&'static str> {
    match mapper {
        0 => Some("NROM"),
        1 => Some("MMC1"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_rom(mapper: u16) -> Rom {
        let prg_rom: Vec<u8> = (0..32768).map(|i| (i & 0xFF) as u8).collect();
        let chr_rom: Vec<u8> = (0..8192).map(|i| (i & 0xFF) as u8).collect();

        Rom {
            header: RomHeader {
                prg_rom_size: 32768,
                chr_rom_size: 8192,
                mapper_number: mapper,
                submapper: 0,
                prg_ram_size: 8192,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
            },
            prg_rom,
            chr_rom,
            trainer: None,
        }
    }

    #[test]
    fn test_create_mapper_nrom() {
        let rom = create_test_rom(0);
        let mapper = create_mapper(&rom).unwrap();
        assert_eq!(mapper.mapper_number(), 0);
        assert_eq!(mapper.mapper_name(), "NROM");
    }

    #[test]
    fn test_create_mapper_mmc1() {
        let rom = create_test_rom(1);
        let mapper = create_mapper(&rom).unwrap();
        assert_eq!(mapper.mapper_number(), 1);
        assert_eq!(mapper.mapper_name(), "MMC1");
    }

    #[test]
    fn test_create_mapper_unsupported() {
        let rom = create_test_rom(100);
        let result = create_mapper(&rom);
        assert!(matches!(result, Err(RomError::UnsupportedMapper(100))));
    }

    #[test]
    fn test_supported_mappers() {
        let mappers = supported_mappers();
        assert_eq!(mappers, &[0, 1]);
    }

    #[test]
    fn test_is_mapper_supported() {
        assert!(is_mapper_supported(0));
        assert!(is_mapper_supported(1));
        assert!(!is_mapper_supported(100));
    }

    #[test]
    fn test_mapper_name() {
        assert_eq!(mapper_name(0), Some("NROM"));
        assert_eq!(mapper_name(1), Some("MMC1"));
        assert_eq!(mapper_name(100), None);
    }

    #[test]
    fn test_mapper_trait_read_write() {
        let rom = create_test_rom(0);
        let mut mapper = create_mapper(&rom).unwrap();

        let val = mapper.read_prg(0x8000);
        assert_eq!(val, 0);

        // Writes into the fixed ROM window are a fatal fault on NROM.
        assert!(mapper.write_prg(0x8000, 0xFF).is_err());
        assert_eq!(mapper.read_prg(0x8000), 0);
    }
}
