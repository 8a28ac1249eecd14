//! Save state system for `RustyNES` emulator.
//!
//! This module provides instant save/load functionality for complete emulator
//! state, enabling features like rewind, TAS recording, and quick save/load.
//!
//! # Format
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │ Header                               │
//! │  - Magic: "RNES"                     │
//! │  - Version: u32                      │
//! │  - ROM hash: SHA-256 (32 bytes)      │
//! │  - Checksum: CRC32 of payload        │
//! ├─────────────────────────────────────┤
//! │ Payload                              │
//! │  - CPU/PPU registers: flat fields    │
//! │  - APU/mapper state: bincode blobs   │
//! └─────────────────────────────────────┘
//! ```
//!
//! The ROM itself is never serialized, only its hash, so `load_state` can
//! reject a save state taken against a different cartridge.

pub mod error;

pub use error::SaveStateError;

use sha2::{Digest, Sha256};

/// Save state format version.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Magic bytes for save state files.
pub const SAVE_STATE_MAGIC: &[u8; 4] = b"RNES";

/// Hash a cartridge's PRG+CHR ROM bytes for save-state identity checks.
#[must_use]
pub fn rom_hash(prg_rom: &[u8], chr_rom: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prg_rom);
    hasher.update(chr_rom);
    hasher.finalize().into()
}

/// A small cursor-based binary writer. Multi-byte integers are little-endian.
#[derive(Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn bool(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    pub(crate) fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn bytes(&mut self, v: &[u8]) {
        self.u32(v.len() as u32);
        self.buf.extend_from_slice(v);
    }

    pub(crate) fn fixed_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// A small cursor-based binary reader, paired with [`Writer`].
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn need(&self, n: usize) -> Result<(), SaveStateError> {
        if self.pos + n > self.buf.len() {
            return Err(SaveStateError::InsufficientData {
                needed: self.pos + n,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, SaveStateError> {
        self.need(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub(crate) fn bool(&mut self) -> Result<bool, SaveStateError> {
        Ok(self.u8()? != 0)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, SaveStateError> {
        self.need(2)?;
        let v = u16::from_le_bytes(self.buf[self.pos..self.pos + 2].try_into().unwrap());
        self.pos += 2;
        Ok(v)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, SaveStateError> {
        self.need(4)?;
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, SaveStateError> {
        self.need(8)?;
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    pub(crate) fn bytes(&mut self) -> Result<Vec<u8>, SaveStateError> {
        let len = self.u32()? as usize;
        self.need(len)?;
        let v = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(v)
    }

    pub(crate) fn fixed_bytes(&mut self, n: usize) -> Result<Vec<u8>, SaveStateError> {
        self.need(n)?;
        let v = self.buf[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(v)
    }
}

/// Wrap a payload in a versioned, hashed, checksummed save state header.
pub(crate) fn frame(rom_hash: &[u8; 32], payload: Vec<u8>) -> Vec<u8> {
    let checksum = crc32fast::hash(&payload);

    let mut out = Writer::new();
    out.fixed_bytes(SAVE_STATE_MAGIC);
    out.u32(SAVE_STATE_VERSION);
    out.fixed_bytes(rom_hash);
    out.u32(checksum);
    out.bytes(&payload);
    out.into_vec()
}

/// Validate and strip a save state's header, returning its payload.
pub(crate) fn unframe(
    data: &[u8],
    expected_rom_hash: &[u8; 32],
) -> Result<Vec<u8>, SaveStateError> {
    let mut r = Reader::new(data);
    let magic = r.fixed_bytes(4)?;
    if magic != SAVE_STATE_MAGIC {
        return Err(SaveStateError::InvalidMagic);
    }
    let version = r.u32()?;
    if version != SAVE_STATE_VERSION {
        return Err(SaveStateError::UnsupportedVersion(version));
    }
    let hash_bytes = r.fixed_bytes(32)?;
    let mut actual_hash = [0u8; 32];
    actual_hash.copy_from_slice(&hash_bytes);
    if &actual_hash != expected_rom_hash {
        return Err(SaveStateError::RomMismatch {
            expected: *expected_rom_hash,
            actual: actual_hash,
        });
    }
    let expected_checksum = r.u32()?;
    let payload = r.bytes()?;
    let actual_checksum = crc32fast::hash(&payload);
    if actual_checksum != expected_checksum {
        return Err(SaveStateError::ChecksumMismatch {
            expected: expected_checksum,
            actual: actual_checksum,
        });
    }
    Ok(payload)
}
