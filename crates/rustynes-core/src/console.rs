//! NES Console Implementation.
//!
//! `Console` is the public aggregate: it owns the CPU, bus (which in turn
//! owns the PPU, APU, mapper, and RAM) and the audio resampler, by value.
//! `step()` drives everything through one call; there is no back-pointer or
//! shared-ownership wiring between peers.

use rustynes_apu::Resampler;
use rustynes_cpu::{Bus as _, Cpu, Status};
use rustynes_mappers::{Mapper, Mirroring, Rom, RomError, create_mapper};

use crate::bus::NesBus;
use crate::input::{Button, Controller, Port2Device, Zapper};
use crate::save_state::{self, Reader, SaveStateError, Writer};

/// NTSC CPU clock frequency, in Hz. The APU samples once per CPU cycle.
pub const CPU_CLOCK_NTSC: u32 = 1_789_773;
/// PAL CPU clock frequency, in Hz.
pub const CPU_CLOCK_PAL: u32 = 1_662_607;
/// Output sample rate `drain_audio` produces.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Which television standard to emulate timing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// 60 Hz, 1.789 MHz CPU clock.
    #[default]
    Ntsc,
    /// 50 Hz, 1.663 MHz CPU clock.
    Pal,
}

impl Region {
    fn cpu_clock(self) -> u32 {
        match self {
            Self::Ntsc => CPU_CLOCK_NTSC,
            Self::Pal => CPU_CLOCK_PAL,
        }
    }
}

/// Console construction/runtime configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfig {
    /// Television standard to time the CPU clock against.
    pub region: Region,
    /// When true, a jam/halt opcode freezes the CPU (matching real
    /// hardware) instead of surfacing `ConsoleError::UnimplementedOpcode`.
    pub tolerate_unofficial_opcodes: bool,
}

/// What caused `step()` to return control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// The PPU completed a frame; `framebuffer()` holds the new pixels.
    FrameReady,
    /// The game polled `$4016`/`$4017`; a good point to sample input.
    InputPoll,
}

/// Console error type.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The cartridge image couldn't be parsed or uses an unsupported mapper.
    #[error("invalid cartridge: {0}")]
    InvalidCartridge(RomError),
    /// A jam/halt opcode was executed and `tolerate_unofficial_opcodes` is
    /// false.
    #[error("unimplemented opcode encountered at ${pc:04X}")]
    UnimplementedOpcode {
        /// Program counter at the jam opcode.
        pc: u16,
    },
    /// A bus access landed in a cartridge address region this core has no
    /// control logic for (the $4020-$5FFF expansion window).
    #[error("unimplemented memory region at ${addr:04X}")]
    UnimplementedMemoryRegion {
        /// The offending address.
        addr: u16,
    },
    /// A save state failed to load.
    #[error("save state load failed: {0}")]
    StateLoadError(#[from] SaveStateError),
}

impl From<RomError> for ConsoleError {
    fn from(err: RomError) -> Self {
        Self::InvalidCartridge(err)
    }
}

/// NES console emulator.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    config: ConsoleConfig,
    resampler: Resampler,
    rom_hash: [u8; 32],
    /// Once `step()` hits an unrecoverable condition the console stops
    /// advancing and keeps reporting the same error on every further call.
    frozen: Option<Frozen>,
}

/// A `Copy`-friendly record of why the console froze, so repeated `step()`
/// calls can reconstruct the same [`ConsoleError`] without needing it to be
/// `Clone` (its cartridge/save-state variants wrap non-`Clone` errors).
#[derive(Debug, Clone, Copy)]
enum Frozen {
    UnimplementedOpcode(u16),
    UnimplementedMemoryRegion(u16),
}

impl Frozen {
    fn into_error(self) -> ConsoleError {
        match self {
            Self::UnimplementedOpcode(pc) => ConsoleError::UnimplementedOpcode { pc },
            Self::UnimplementedMemoryRegion(addr) => {
                ConsoleError::UnimplementedMemoryRegion { addr }
            }
        }
    }
}

impl Console {
    /// Create a console from raw iNES/NES 2.0 ROM bytes, using default
    /// (NTSC) configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidCartridge`] if the ROM can't be
    /// parsed or uses an unsupported mapper.
    pub fn from_rom_bytes(bytes: &[u8]) -> Result<Self, ConsoleError> {
        Self::with_config(bytes, ConsoleConfig::default())
    }

    /// Create a console from raw ROM bytes with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidCartridge`] if the ROM can't be
    /// parsed or uses an unsupported mapper.
    pub fn with_config(bytes: &[u8], config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let rom = Rom::load(bytes)?;
        let rom_hash = save_state::rom_hash(&rom.prg_rom, &rom.chr_rom);
        let mapper = create_mapper(&rom)?;

        let mut bus = NesBus::new(mapper);
        if matches!(rom.header.mirroring, Mirroring::FourScreen) {
            bus.ppu.set_mirroring(rustynes_ppu::Mirroring::FourScreen);
        }

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        Ok(Self {
            cpu,
            bus,
            config,
            resampler: Resampler::with_input_rate(AUDIO_SAMPLE_RATE, config.region.cpu_clock()),
            rom_hash,
            frozen: None,
        })
    }

    /// Run one CPU instruction, stepping the PPU and APU alongside it.
    /// Internal primitive `step()` builds on; kept for tests and debugging.
    fn step_instruction(&mut self) -> Result<(bool, bool), ConsoleError> {
        if self.bus.dmc_stall_active() {
            self.bus.decrement_dmc_stall();
            return Ok(self.advance_peripherals(1));
        }

        if self.bus.oam_dma_pending() {
            let cycles = self.bus.execute_oam_dma();
            return Ok(self.advance_peripherals(cycles));
        }

        if self.bus.nmi_pending() {
            self.bus.acknowledge_nmi();
            self.cpu.trigger_nmi();
        } else if self.bus.irq_pending() && !self.cpu.status().contains(Status::I) {
            self.cpu.set_irq(true);
        }

        if self.cpu.is_jammed() {
            if self.config.tolerate_unofficial_opcodes {
                return Ok(self.advance_peripherals(1));
            }
            return Err(ConsoleError::UnimplementedOpcode { pc: self.cpu.pc() });
        }

        let cycles = self.cpu.step(&mut self.bus);
        Ok(self.advance_peripherals(u16::from(cycles)))
    }

    /// Step the PPU/APU for `cpu_cycles` CPU cycles.
    ///
    /// Returns `(frame_ready, input_polled)`.
    fn advance_peripherals(&mut self, cpu_cycles: u16) -> (bool, bool) {
        let mut frame_ready = false;
        for _ in 0..cpu_cycles {
            self.bus.step_ppu();
            let sample = self.bus.step_apu();
            self.resampler.add_sample(sample);
        }
        frame_ready |= self.bus.take_frame_ready();
        let input_polled = self.bus.take_input_polled();
        (frame_ready, input_polled)
    }

    /// Run emulation until either a frame completes or the game polls
    /// input, whichever comes first, and report which.
    ///
    /// # Errors
    ///
    /// Returns the frozen [`ConsoleError`] if a previous call surfaced one;
    /// otherwise returns a new error at the instruction that triggers it.
    pub fn step(&mut self) -> Result<StepEvent, ConsoleError> {
        if let Some(frozen) = self.frozen {
            return Err(frozen.into_error());
        }
        if let Some(addr) = self.bus.take_fault().and_then(|fault| match fault {
            crate::bus::BusFault::ExpansionRegion(addr) => Some(addr),
            crate::bus::BusFault::RomWrite(_) => None,
        }) {
            self.frozen = Some(Frozen::UnimplementedMemoryRegion(addr));
            return Err(ConsoleError::UnimplementedMemoryRegion { addr });
        }

        loop {
            match self.step_instruction() {
                Ok((frame_ready, input_polled)) => {
                    if frame_ready {
                        return Ok(StepEvent::FrameReady);
                    }
                    if input_polled {
                        return Ok(StepEvent::InputPoll);
                    }
                }
                Err(ConsoleError::UnimplementedOpcode { pc }) => {
                    self.frozen = Some(Frozen::UnimplementedOpcode(pc));
                    return Err(ConsoleError::UnimplementedOpcode { pc });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Reset line: reloads PC from the reset vector, sets the interrupt
    /// disable flag, decrements SP by 3, and otherwise preserves RAM/SRAM.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.frozen = None;
        self.resampler.reset();
    }

    /// Cold boot: zeroes RAM, PPU, APU, and non-battery-backed mapper RAM,
    /// then performs the same vector load as `reset()`.
    pub fn power(&mut self) {
        self.bus.power();
        self.cpu = Cpu::new();
        self.cpu.reset(&mut self.bus);
        self.frozen = None;
        self.resampler.reset();
    }

    /// Current framebuffer: 256×240 NES palette indices (0-63), one byte
    /// per pixel. Converting to a displayable color space is the host's
    /// job, not this crate's.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.frame_buffer()
    }

    /// Drain accumulated audio as 8-bit unsigned PCM at 44.1kHz mono.
    pub fn drain_audio(&mut self) -> Vec<u8> {
        self.resampler.flush();
        let samples: Vec<u8> = self
            .resampler
            .samples()
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0).mul_add(127.5, 127.5)) as u8)
            .collect();
        self.resampler.clear();
        samples
    }

    /// Set a gamepad button on port 0 or 1.
    pub fn set_gamepad_button(&mut self, port: usize, button: Button, pressed: bool) {
        self.bus.set_gamepad_button(port, button, pressed);
    }

    /// Plug a Zapper into port 2 (replacing any controller there) and aim
    /// it at a pixel in the 256x240 frame.
    pub fn set_light_aim(&mut self, x: u16, y: u16) {
        if !matches!(self.bus.port2, Port2Device::Zapper(_)) {
            self.bus.port2 = Port2Device::Zapper(Zapper::new());
        }
        if let Port2Device::Zapper(zapper) = &mut self.bus.port2 {
            zapper.set_aim(x, y);
        }
    }

    /// Set the Zapper's trigger state. Plugs a Zapper into port 2 if one
    /// isn't already there.
    pub fn set_light_trigger(&mut self, pressed: bool) {
        if !matches!(self.bus.port2, Port2Device::Zapper(_)) {
            self.bus.port2 = Port2Device::Zapper(Zapper::new());
        }
        if let Port2Device::Zapper(zapper) = &mut self.bus.port2 {
            zapper.set_trigger(pressed);
        }
    }

    /// Plug a second standard controller into port 2 (replacing a Zapper,
    /// if one was there).
    pub fn plug_controller_into_port2(&mut self) {
        if !matches!(self.bus.port2, Port2Device::Controller(_)) {
            self.bus.port2 = Port2Device::Controller(Controller::new());
        }
    }

    /// Serialize full emulator state into a versioned, hashed, checksummed
    /// binary save state.
    #[must_use]
    pub fn save_state(&self) -> Vec<u8> {
        let payload = self.encode_payload();
        save_state::frame(&self.rom_hash, payload)
    }

    /// Restore emulator state from a save state produced by `save_state()`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::RomMismatch`] if the save state was taken
    /// against a different cartridge, [`SaveStateError::ChecksumMismatch`]
    /// on data corruption, or other [`SaveStateError`] variants on a
    /// malformed payload.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), SaveStateError> {
        let payload = save_state::unframe(data, &self.rom_hash)?;
        self.decode_payload(&payload)?;
        self.frozen = None;
        Ok(())
    }

    fn encode_payload(&self) -> Vec<u8> {
        let mut w = Writer::new();

        let cpu = self.cpu.snapshot();
        w.u8(cpu.a);
        w.u8(cpu.x);
        w.u8(cpu.y);
        w.u16(cpu.pc);
        w.u8(cpu.sp);
        w.u8(cpu.status);
        w.u64(cpu.cycles);
        w.bool(cpu.jammed);

        let ppu = self.bus.ppu.snapshot();
        w.u8(ppu.ctrl);
        w.u8(ppu.mask);
        w.u8(ppu.status);
        w.u16(ppu.v);
        w.u16(ppu.t);
        w.u8(ppu.fine_x);
        w.bool(ppu.w);
        w.bool(ppu.mid_scanline_write);
        w.u16(ppu.last_v_before_update);
        w.bytes(&ppu.nametables);
        w.bytes(&ppu.palette);
        w.bool(ppu.four_screen_ram.is_some());
        if let Some(four_screen) = &ppu.four_screen_ram {
            w.bytes(four_screen);
        }
        w.u8(mirroring_tag(ppu.mirroring));
        w.bytes(&ppu.oam);
        w.u8(ppu.oam_addr);
        w.u16(ppu.scanline);
        w.u16(ppu.dot);
        w.u64(ppu.frame);
        w.bytes(&ppu.frame_buffer);
        w.u8(ppu.vram_read_buffer);
        w.u8(ppu.open_bus_latch);
        w.u32(ppu.decay_counter);
        w.bool(ppu.nmi_pending);

        let apu_blob = bincode::serialize(&self.bus.apu).unwrap_or_default();
        w.bytes(&apu_blob);

        let mapper_blob = bincode::serialize(&self.bus.mapper).unwrap_or_default();
        w.bytes(&mapper_blob);

        w.into_vec()
    }

    fn decode_payload(&mut self, payload: &[u8]) -> Result<(), SaveStateError> {
        let mut r = Reader::new(payload);

        let mut cpu = self.cpu.snapshot();
        cpu.a = r.u8()?;
        cpu.x = r.u8()?;
        cpu.y = r.u8()?;
        cpu.pc = r.u16()?;
        cpu.sp = r.u8()?;
        cpu.status = r.u8()?;
        cpu.cycles = r.u64()?;
        cpu.jammed = r.bool()?;
        self.cpu.restore(&cpu);

        let mut ppu = self.bus.ppu.snapshot();
        ppu.ctrl = r.u8()?;
        ppu.mask = r.u8()?;
        ppu.status = r.u8()?;
        ppu.v = r.u16()?;
        ppu.t = r.u16()?;
        ppu.fine_x = r.u8()?;
        ppu.w = r.bool()?;
        ppu.mid_scanline_write = r.bool()?;
        ppu.last_v_before_update = r.u16()?;
        ppu.nametables = r.bytes()?;
        ppu.palette = r.bytes()?;
        let has_four_screen = r.bool()?;
        ppu.four_screen_ram = if has_four_screen {
            Some(r.bytes()?)
        } else {
            None
        };
        ppu.mirroring = mirroring_from_tag(r.u8()?);
        ppu.oam = r.bytes()?;
        ppu.oam_addr = r.u8()?;
        ppu.scanline = r.u16()?;
        ppu.dot = r.u16()?;
        ppu.frame = r.u64()?;
        ppu.frame_buffer = r.bytes()?;
        ppu.vram_read_buffer = r.u8()?;
        ppu.open_bus_latch = r.u8()?;
        ppu.decay_counter = r.u32()?;
        ppu.nmi_pending = r.bool()?;
        self.bus.ppu.restore(&ppu);

        let apu_blob = r.bytes()?;
        if let Ok(apu) = bincode::deserialize::<rustynes_apu::Apu>(&apu_blob) {
            self.bus.apu.restore(apu);
        }

        let mapper_blob = r.bytes()?;
        if let Ok(mapper) =
            bincode::deserialize::<rustynes_mappers::CartridgeMapper>(&mapper_blob)
        {
            self.bus.mapper = mapper;
        }

        Ok(())
    }

    /// Get a reference to the CPU for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get a reference to the bus for debugging.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Peek at memory without side effects.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }
}

fn mirroring_tag(m: rustynes_ppu::Mirroring) -> u8 {
    match m {
        rustynes_ppu::Mirroring::Horizontal => 0,
        rustynes_ppu::Mirroring::Vertical => 1,
        rustynes_ppu::Mirroring::SingleScreenLower => 2,
        rustynes_ppu::Mirroring::SingleScreenUpper => 3,
        rustynes_ppu::Mirroring::FourScreen => 4,
    }
}

fn mirroring_from_tag(tag: u8) -> rustynes_ppu::Mirroring {
    match tag {
        1 => rustynes_ppu::Mirroring::Vertical,
        2 => rustynes_ppu::Mirroring::SingleScreenLower,
        3 => rustynes_ppu::Mirroring::SingleScreenUpper,
        4 => rustynes_ppu::Mirroring::FourScreen,
        _ => rustynes_ppu::Mirroring::Horizontal,
    }
}
