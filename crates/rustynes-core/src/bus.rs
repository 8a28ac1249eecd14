//! NES System Bus Implementation.
//!
//! The bus connects the CPU to all other components:
//! - PPU registers ($2000-$2007, mirrored every 8 bytes to $3FFF)
//! - APU/IO registers ($4000-$4017)
//! - Expansion-ROM window ($4020-$5FFF, unmapped on these boards)
//! - Cartridge space ($6000-$FFFF)
//! - Internal RAM ($0000-$07FF, mirrored to $1FFF)
//!
//! Nametable storage and CHR access for the PPU are not owned here: `Ppu`
//! keeps its own internal VRAM, and CHR reads/writes are threaded through as
//! closures over the mapper at each call site.

use rustynes_apu::Apu;
use rustynes_cpu::Bus;
use rustynes_mappers::{CartridgeMapper, Mapper, Mirroring, RomWriteFault};
use rustynes_ppu::Ppu;

use crate::input::{Button, Controller, Port2Device};

/// A bus access with no modeled control logic behind it.
///
/// Both variants represent the same kind of hardware fault: an access into
/// cartridge-mapped address space this core cannot service, surfaced to the
/// caller instead of silently corrupting emulated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusFault {
    /// Write into fixed cartridge ROM space the mapper rejected.
    RomWrite(RomWriteFault),
    /// Access into the $4020-$5FFF expansion-ROM window, which these boards
    /// never populate.
    ExpansionRegion(u16),
}

/// Translate a mapper's mirroring mode into the PPU crate's own type.
///
/// The two crates define structurally identical but independent `Mirroring`
/// enums so neither depends on the other; this is the seam where they meet.
fn ppu_mirroring(mirroring: Mirroring) -> rustynes_ppu::Mirroring {
    match mirroring {
        Mirroring::Horizontal => rustynes_ppu::Mirroring::Horizontal,
        Mirroring::Vertical => rustynes_ppu::Mirroring::Vertical,
        Mirroring::SingleScreenLower => rustynes_ppu::Mirroring::SingleScreenLower,
        Mirroring::SingleScreenUpper => rustynes_ppu::Mirroring::SingleScreenUpper,
        Mirroring::FourScreen => rustynes_ppu::Mirroring::FourScreen,
    }
}

/// NES system bus connecting all components.
pub struct NesBus {
    /// Internal RAM (2KB, mirrored 4 times).
    pub ram: [u8; 2048],
    /// PPU (Picture Processing Unit).
    pub ppu: Ppu,
    /// APU (Audio Processing Unit).
    pub apu: Apu,
    /// Cartridge mapper.
    pub mapper: CartridgeMapper,
    /// Controller 1 (port $4016).
    pub controller1: Controller,
    /// Port 2 device ($4017): a second controller or a light sensor.
    pub port2: Port2Device,
    /// Shared strobe latch for both controller ports.
    controller_strobe: bool,
    /// OAM DMA page, if a transfer is pending.
    oam_dma_page: Option<u8>,
    /// CPU cycle counter for DMA timing.
    cpu_cycles: u64,
    /// DMC DMA stall cycles remaining.
    dmc_stall_cycles: u8,
    /// Last value on the data bus (for open bus behavior).
    last_bus_value: u8,
    /// NMI pending from PPU.
    nmi_pending: bool,
    /// IRQ pending from the APU frame sequencer / DMC.
    irq_pending: bool,
    /// Most recent unresolved bus fault, if any.
    fault: Option<BusFault>,
    /// Set on the dot that completes a PPU frame, so `Console::step` can
    /// report `StepEvent::FrameReady`.
    frame_ready: bool,
    /// Set when $4016 or $4017 is read, so `Console::step` can report
    /// `StepEvent::InputPoll`.
    input_polled: bool,
    /// Mirroring mode the PPU was last synced to; mappers like MMC1 can
    /// change this at runtime, and the PPU must be told when it does.
    last_mirroring: Mirroring,
}

impl NesBus {
    /// Create a new NES bus with the given mapper.
    #[must_use]
    pub fn new(mapper: CartridgeMapper) -> Self {
        let mirroring = mapper.mirroring();
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(ppu_mirroring(mirroring)),
            apu: Apu::new(),
            mapper,
            controller1: Controller::new(),
            port2: Port2Device::Controller(Controller::new()),
            controller_strobe: false,
            oam_dma_page: None,
            cpu_cycles: 0,
            dmc_stall_cycles: 0,
            last_bus_value: 0,
            nmi_pending: false,
            irq_pending: false,
            fault: None,
            frame_ready: false,
            input_polled: false,
            last_mirroring: mirroring,
        }
    }

    /// Reset the bus and all components, preserving RAM and mapper SRAM.
    ///
    /// Mirrors the real console's reset line: working RAM is untouched,
    /// only the components that own a reset-visible register move.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.apu.reset();
        self.mapper.reset();
        self.controller1.reset();
        self.port2.reset();
        self.controller_strobe = false;
        self.oam_dma_page = None;
        self.dmc_stall_cycles = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.fault = None;
        self.frame_ready = false;
        self.input_polled = false;
        self.last_mirroring = self.mapper.mirroring();
        self.ppu.set_mirroring(ppu_mirroring(self.last_mirroring));
    }

    /// Zero RAM and non-battery-backed mapper state for a cold boot.
    pub fn power(&mut self) {
        self.ram.fill(0);
        self.reset();
        self.cpu_cycles = 0;
        self.last_bus_value = 0;
    }

    /// Take and clear the most recent unresolved bus fault.
    pub fn take_fault(&mut self) -> Option<BusFault> {
        self.fault.take()
    }

    /// Take and clear the frame-ready flag.
    pub fn take_frame_ready(&mut self) -> bool {
        core::mem::take(&mut self.frame_ready)
    }

    /// Take and clear the input-poll flag.
    pub fn take_input_polled(&mut self) -> bool {
        core::mem::take(&mut self.input_polled)
    }

    /// Check if OAM DMA is pending.
    #[must_use]
    pub fn oam_dma_pending(&self) -> bool {
        self.oam_dma_page.is_some()
    }

    /// Execute OAM DMA transfer.
    ///
    /// Returns the number of CPU cycles consumed.
    pub fn execute_oam_dma(&mut self) -> u16 {
        if let Some(page) = self.oam_dma_page.take() {
            let base = u16::from(page) << 8;
            let mut data = [0u8; 256];

            for (i, slot) in data.iter_mut().enumerate() {
                let addr = base.wrapping_add(i as u16);
                *slot = self.cpu_read(addr);
            }
            self.ppu.oam_dma(&data);

            // DMA takes 513 or 514 cycles depending on CPU cycle parity.
            let cycles = if self.cpu_cycles % 2 == 1 { 514 } else { 513 };
            self.cpu_cycles += u64::from(cycles);
            cycles
        } else {
            0
        }
    }

    /// Internal CPU read without updating bus state (for DMA).
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x6000..=0xFFFF => self.mapper.read_prg(addr),
            _ => 0,
        }
    }

    /// Sync the PPU's mirroring mode if the mapper changed it (e.g. MMC1's
    /// control register switching between horizontal/vertical/single-screen).
    fn sync_mirroring(&mut self) {
        let current = self.mapper.mirroring();
        if current != self.last_mirroring {
            self.last_mirroring = current;
            self.ppu.set_mirroring(ppu_mirroring(current));
        }
    }

    /// Step the PPU by 3 dots (one CPU cycle worth).
    ///
    /// Returns true if NMI should be triggered.
    pub fn step_ppu(&mut self) -> bool {
        self.sync_mirroring();

        let mut nmi = false;
        let mapper = &self.mapper;

        for _ in 0..3 {
            let (frame_complete, n) = self.ppu.step_with_chr(|addr| mapper.read_chr(addr));
            if n {
                nmi = true;
            }
            if frame_complete {
                self.frame_ready = true;
            }
        }

        if nmi {
            self.nmi_pending = true;
        }

        nmi
    }

    /// Step the APU by one CPU cycle.
    ///
    /// Returns the APU's raw per-cycle mixer output (0.0-1.0); the caller
    /// is responsible for downsampling to the target output rate.
    pub fn step_apu(&mut self) -> f32 {
        self.apu.clock();

        if self.apu.dmc_needs_sample() {
            let addr = self.apu.dmc_sample_addr();
            let sample = self.mapper.read_prg(addr);
            self.apu.dmc_fill_sample(sample);
            // DMC sample fetch stalls the CPU for 4 cycles, same primitive
            // as OAM-DMA: cycles still tick the PPU/APU while stalled.
            self.dmc_stall_cycles = 4;
        }

        self.irq_pending = self.apu.irq_pending();

        self.apu.output()
    }

    /// Check if NMI is pending.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Acknowledge NMI.
    pub fn acknowledge_nmi(&mut self) {
        self.nmi_pending = false;
    }

    /// Check if IRQ is pending (APU frame sequencer or DMC).
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Get the current CPU cycle count.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// Increment CPU cycle count.
    pub fn add_cpu_cycles(&mut self, cycles: u8) {
        self.cpu_cycles += u64::from(cycles);
    }

    /// Set a gamepad button on the given port (0 or 1).
    pub fn set_gamepad_button(&mut self, port: usize, button: Button, pressed: bool) {
        match port {
            0 => self.controller1.set_button(button, pressed),
            1 => {
                if let Port2Device::Controller(c) = &mut self.port2 {
                    c.set_button(button, pressed);
                }
            }
            _ => {}
        }
    }

    /// Check if DMC stall is active.
    #[must_use]
    pub fn dmc_stall_active(&self) -> bool {
        self.dmc_stall_cycles > 0
    }

    /// Decrement DMC stall counter.
    pub fn decrement_dmc_stall(&mut self) {
        if self.dmc_stall_cycles > 0 {
            self.dmc_stall_cycles -= 1;
        }
    }

    /// Peek at memory without side effects.
    ///
    /// This is useful for debugging/display purposes where we don't want
    /// to trigger PPU register side effects or mapper state changes.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.last_bus_value,
            0x4000..=0x4017 => match addr {
                0x4015 => self.apu.peek_status(),
                _ => self.last_bus_value,
            },
            0x4018..=0x401F => self.last_bus_value,
            0x4020..=0x5FFF => self.last_bus_value,
            0x6000..=0xFFFF => self.mapper.read_prg(addr),
        }
    }
}

/// CPU bus implementation.
impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            0x2000..=0x3FFF => {
                let mapper = &self.mapper;
                self.ppu.read_register(addr, |a| mapper.read_chr(a))
            }

            0x4000..=0x4017 => match addr {
                0x4015 => self.apu.read_status(),
                0x4016 => {
                    self.input_polled = true;
                    self.controller1.read()
                }
                0x4017 => {
                    self.input_polled = true;
                    self.port2.read(self.ppu.frame_buffer())
                }
                _ => self.last_bus_value,
            },

            0x4018..=0x401F => self.last_bus_value,

            // Expansion-ROM window: unmapped on NROM/MMC1 boards.
            0x4020..=0x5FFF => {
                self.fault = Some(BusFault::ExpansionRegion(addr));
                self.last_bus_value
            }

            0x6000..=0xFFFF => self.mapper.read_prg(addr),
        };

        self.last_bus_value = value;
        value
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.last_bus_value = val;

        match addr {
            0x0000..=0x1FFF => {
                self.ram[(addr & 0x07FF) as usize] = val;
            }

            0x2000..=0x3FFF => {
                let mapper = &mut self.mapper;
                self.ppu
                    .write_register(addr, val, |a, v| mapper.write_chr(a, v));
            }

            0x4000..=0x4017 => match addr {
                0x4000..=0x4013 | 0x4015 | 0x4017 => {
                    self.apu.write(addr, val);
                }
                0x4014 => {
                    self.oam_dma_page = Some(val);
                }
                0x4016 => {
                    let new_strobe = val & 1 != 0;
                    if self.controller_strobe && !new_strobe {
                        self.controller1.write_strobe(0);
                        self.port2.write_strobe(0);
                    }
                    self.controller_strobe = new_strobe;
                    let strobe_val = u8::from(new_strobe);
                    self.controller1.write_strobe(strobe_val);
                    self.port2.write_strobe(strobe_val);
                }
                _ => {}
            },

            0x4018..=0x401F => {}

            // Expansion-ROM window: unmapped on NROM/MMC1 boards.
            0x4020..=0x5FFF => {
                self.fault = Some(BusFault::ExpansionRegion(addr));
            }

            0x6000..=0xFFFF => {
                if let Err(e) = self.mapper.write_prg(addr, val) {
                    self.fault = Some(BusFault::RomWrite(e));
                }
            }
        }
    }
}
