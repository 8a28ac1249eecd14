//! RustyNES Core - NES Emulation Integration Layer.
//!
//! This crate provides the high-level NES emulation API, integrating the CPU,
//! PPU, APU, and mapper components into a complete console emulator.
//!
//! # Architecture
//!
//! The core crate connects all NES components through a central bus:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Console                              │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │                      NesBus                          │   │
//! │  │  ┌─────┐  ┌─────┐  ┌─────┐  ┌────────┐  ┌────────┐ │   │
//! │  │  │ RAM │  │ PPU │  │ APU │  │ Mapper │  │ Input  │ │   │
//! │  │  │ 2KB │  │     │  │     │  │        │  │        │ │   │
//! │  │  └─────┘  └─────┘  └─────┘  └────────┘  └────────┘ │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                          ▲                                  │
//! │                          │                                  │
//! │                     ┌────┴────┐                             │
//! │                     │   CPU   │                             │
//! │                     │  6502   │                             │
//! │                     └─────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use rustynes_core::{Button, Console};
//!
//! let rom_data = std::fs::read("game.nes").expect("failed to read ROM");
//! let mut console = Console::from_rom_bytes(&rom_data).expect("failed to create console");
//!
//! loop {
//!     console.set_gamepad_button(0, Button::A, true);
//!
//!     let _event = console.step();
//!
//!     // 256x240 NES palette indices (0-63), one byte per pixel.
//!     let _framebuffer = console.framebuffer();
//!
//!     // 8-bit unsigned PCM at 44.1kHz mono.
//!     let _audio = console.drain_audio();
//!     break;
//! }
//! ```
//!
//! # Features
//!
//! - `std` (default): Enable standard library support
//! - `serde`: Enable serialization for save states

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod bus;
mod console;
mod input;
pub mod save_state;

pub use bus::{BusFault, NesBus};
pub use console::{
    AUDIO_SAMPLE_RATE, Console, ConsoleConfig, ConsoleError, CPU_CLOCK_NTSC, CPU_CLOCK_PAL,
    Region, StepEvent,
};
pub use input::{Button, Controller, Port2Device, Zapper};
pub use save_state::SaveStateError;

// Re-export commonly used types from dependencies.
pub use rustynes_apu::Apu;
pub use rustynes_cpu::Cpu;
pub use rustynes_mappers::{
    CartridgeMapper, Mapper, Mirroring, Rom, RomError, RomHeader, create_mapper,
};
pub use rustynes_ppu::Ppu;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// NES screen dimensions.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: u32 = 256;
    /// Screen height in pixels.
    pub const HEIGHT: u32 = 240;
    /// Total pixels per frame.
    pub const PIXELS: u32 = WIDTH * HEIGHT;
    /// Bytes per frame: one NES palette index (0-63) per pixel. Converting
    /// to a displayable color space is the host's job, not this crate's.
    pub const FRAMEBUFFER_SIZE: usize = PIXELS as usize;
}
