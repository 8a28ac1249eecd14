//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! This crate provides a cycle-accurate implementation of the NES PPU,
//! responsible for all graphics rendering.
//!
//! # Overview
//!
//! The PPU operates at 3x the CPU clock rate and generates a 256x240 pixel
//! image. It consists of several subsystems:
//!
//! - **Registers**: Control, Mask, Status, OAM Address, Scroll, Address, Data
//! - **Background rendering**: Nametables, pattern tables, attribute tables
//! - **Sprite rendering**: OAM, sprite evaluation, sprite 0 hit detection
//! - **Palette**: 32-byte palette RAM with mirroring
//!
//! # Timing
//!
//! NTSC timing (the primary target):
//! - Master clock: 21.477272 MHz
//! - PPU clock: 5.369318 MHz (master / 4)
//! - 341 dots per scanline
//! - 262 scanlines per frame
//! - 89,341-89,342 dots per frame (odd frame skip)
//!
//! # Usage
//!
//! The PPU does not own a reference to cartridge CHR memory; callers pass a
//! closure that reads (or writes) the mapper's CHR space for every access
//! that needs it. Nametable storage and mirroring live inside the `Ppu`
//! itself (see [`vram`]).
//!
//! ```no_run
//! use rustynes_ppu::{Mirroring, Ppu};
//!
//! let mut ppu = Ppu::new(Mirroring::Horizontal);
//! let chr = vec![0u8; 0x2000];
//!
//! // Step the PPU (call 3 times per CPU cycle for NTSC).
//! let (frame_complete, nmi) = ppu.step_with_chr(|addr| chr[addr as usize]);
//! if nmi {
//!     // Trigger NMI in CPU
//! }
//!
//! // Access registers from CPU.
//! ppu.write_register(0x2000, 0x80, |_, _| {}); // Enable NMI
//! let status = ppu.read_register(0x2002, |addr| chr[addr as usize]);
//! let _ = (frame_complete, status);
//! ```
//!
//! # Features
//!
//! - `serde`: Enable serialization support for save states

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;
mod vram;

pub use background::Background;
pub use oam::{Oam, SecondaryOam, Sprite, SpriteAttributes};
pub use ppu::{FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH, Ppu, PpuSnapshot};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::ScrollRegisters;
pub use sprites::{SpriteEvaluator, SpriteRenderer};
pub use timing::Timing;
pub use vram::{Mirroring, Vram};
