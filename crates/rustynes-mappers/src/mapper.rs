//! Mapper Trait Definition.
//!
//! This module defines the core `Mapper` trait that all NES cartridge mappers
//! must implement. Mappers handle memory banking for PRG-ROM, CHR-ROM/RAM,
//! and provide mirroring control.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement).
    #[default]
    Horizontal,
    /// Vertical mirroring (horizontal arrangement).
    Vertical,
    /// Single-screen, lower bank.
    SingleScreenLower,
    /// Single-screen, upper bank.
    SingleScreenUpper,
    /// Four-screen (uses extra VRAM).
    FourScreen,
}

/// A write landed in a region of cartridge address space this mapper has no
/// control logic for (e.g. NROM's fixed ROM window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("write to read-only cartridge ROM space at ${addr:04X}")]
pub struct RomWriteFault {
    /// CPU address the offending write targeted.
    pub addr: u16,
}

/// Mapper trait.
///
/// All NES cartridge mappers must implement this trait. The mapper handles:
/// - PRG-ROM/RAM memory access (CPU $6000-$FFFF)
/// - CHR-ROM/RAM memory access (PPU $0000-$1FFF)
/// - Nametable mirroring control
pub trait Mapper {
    /// Read a byte from PRG memory (CPU address space, $6000-$FFFF).
    fn read_prg(&self, addr: u16) -> u8;

    /// Write a byte to PRG memory (CPU address space, $6000-$FFFF).
    ///
    /// # Errors
    ///
    /// Returns [`RomWriteFault`] if the write targets a fixed ROM window
    /// with no mapper control logic attached to it.
    fn write_prg(&mut self, addr: u16, val: u8) -> Result<(), RomWriteFault>;

    /// Read a byte from CHR memory (PPU address space, $0000-$1FFF).
    fn read_chr(&self, addr: u16) -> u8;

    /// Write a byte to CHR memory (PPU address space, $0000-$1FFF).
    ///
    /// Only has an effect if the cartridge has CHR-RAM instead of CHR-ROM.
    fn write_chr(&mut self, addr: u16, val: u8);

    /// Get the current nametable mirroring mode.
    fn mirroring(&self) -> Mirroring;

    /// Get the mapper number (iNES mapper ID).
    fn mapper_number(&self) -> u16;

    /// Get the mapper name.
    fn mapper_name(&self) -> &'static str;

    /// Check if the mapper's save RAM is battery-backed (persists across `power()`).
    fn has_battery(&self) -> bool;

    /// Get the mapper's 8 KiB save-RAM bank, for save-state serialization.
    fn sram(&self) -> &[u8];

    /// Restore the mapper's save-RAM bank from a save state.
    fn load_sram(&mut self, data: &[u8]);

    /// Reset the mapper's control registers to power-on defaults.
    fn reset(&mut self);
}
