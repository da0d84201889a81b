//! .cuts file format structures
//!
//! Cut analysis is deterministic but expensive, so the CLI caches the cut
//! list on disk next to the input recording. A cache entry is only valid for
//! the exact buffer length and detector configuration it was computed with;
//! both are folded into a fingerprint checked on load.

use crc::{Crc, CRC_64_ECMA_182};
use resplice_core::{Cut, CutConfig};
use serde::{Deserialize, Serialize};

/// Magic bytes for .cuts files: "RSPC"
pub const MAGIC: [u8; 4] = [0x52, 0x53, 0x50, 0x43];

/// Current format version
pub const VERSION: u16 = 1;

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

/// File header, fixed size, little-endian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutsHeader {
    /// Magic bytes: "RSPC"
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Reserved flag bits
    pub flags: u16,
    /// Size of the detector config section (JSON)
    pub config_size: u64,
    /// Size of the cut payload (bincode)
    pub payload_size: u64,
    /// Number of cuts in the payload
    pub num_cuts: u32,
    /// Reserved
    pub reserved1: u32,
    /// Length of the analyzed buffer, in samples
    pub num_samples: u64,
    /// Fingerprint of (config JSON, num_samples)
    pub fingerprint: u64,
    /// CRC64 of the payload bytes
    pub checksum: u64,
}

impl CutsHeader {
    pub fn new(config_size: u64, payload_size: u64, num_cuts: u32, num_samples: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            config_size,
            payload_size,
            num_cuts,
            reserved1: 0,
            num_samples,
            fingerprint: 0,
            checksum: 0,
        }
    }
}

/// Complete .cuts file structure
#[derive(Debug, Clone)]
pub struct CutsFile {
    pub header: CutsHeader,
    pub config: CutConfig,
    pub cuts: Vec<Cut>,
}

/// Fingerprint tying a cache entry to its detector configuration and buffer
/// length.
pub fn fingerprint(config_json: &[u8], num_samples: u64) -> u64 {
    let mut digest = CRC64.digest();
    digest.update(config_json);
    digest.update(&num_samples.to_le_bytes());
    digest.finalize()
}

/// CRC64 over the serialized cut payload.
pub fn payload_checksum(payload: &[u8]) -> u64 {
    CRC64.checksum(payload)
}
