//! NES controller input handling.
//!
//! This module emulates the NES standard controller protocol, which uses a
//! **strobe-based parallel-to-serial shift register** (4021 IC) to read
//! 8 button states sequentially.
//!
//! # Hardware Protocol
//!
//! The NES controller protocol works as follows:
//!
//! 1. **Strobe** ($4016 write, bit 0):
//!    - Write 1: Continuously reload shift register (parallel mode)
//!    - Write 0: Enable serial reads (shift mode)
//!    - Falling edge (1 → 0) latches current button states
//!
//! 2. **Serial Read** ($4016/$4017 read):
//!    - Returns one button bit per read
//!    - Order: A, B, Select, Start, Up, Down, Left, Right
//!    - Reads 9+ always return 1
//!
//! # Registers
//!
//! - **$4016**: Controller 1 data (read) / Strobe (write)
//! - **$4017**: Controller 2 data (read) / APU Frame Counter (write)
//!
//! **Note**: $4016 writes strobe BOTH controllers simultaneously.
//!
//! # Usage Example
//!
//! ```no_run
//! use rustynes_core::{Button, Console};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rom = std::fs::read("game.nes")?;
//! let mut console = Console::from_rom_bytes(&rom)?;
//!
//! // Set controller 1 button state
//! console.set_gamepad_button(0, Button::A, true);       // Press A
//! console.set_gamepad_button(0, Button::Start, true);   // Press Start
//!
//! // Release buttons
//! console.set_gamepad_button(0, Button::A, false);
//! console.set_gamepad_button(0, Button::Start, false);
//! # Ok(())
//! # }
//! ```

mod controller;
mod zapper;

pub use controller::{Button, Controller};
pub use zapper::Zapper;

/// Whatever is plugged into port 2 ($4017): a second standard controller,
/// or a Zapper light gun.
#[derive(Debug, Clone)]
pub enum Port2Device {
    /// A second standard controller.
    Controller(Controller),
    /// A Zapper light gun.
    Zapper(Zapper),
}

impl Port2Device {
    /// Read the device's data register, given the most recently rendered
    /// frame (needed for the Zapper's light sensor).
    pub fn read(&mut self, frame_buffer: &[u8]) -> u8 {
        match self {
            Self::Controller(c) => c.read(),
            Self::Zapper(z) => z.read(frame_buffer),
        }
    }

    /// Forward a $4016 strobe write (standard controllers latch on this;
    /// the Zapper ignores it).
    pub fn write_strobe(&mut self, value: u8) {
        if let Self::Controller(c) = self {
            c.write_strobe(value);
        }
    }

    /// Power-on/reset state.
    pub fn reset(&mut self) {
        match self {
            Self::Controller(c) => c.reset(),
            Self::Zapper(z) => z.reset(),
        }
    }
}
