//! .cuts file reader

use crate::error::{CacheError, Result};
use crate::format::{fingerprint, payload_checksum, CutsFile, CutsHeader, MAGIC, VERSION};
use resplice_core::CutConfig;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct CutsReader;

impl CutsReader {
    /// Read and verify a .cuts file.
    pub fn read(path: &Path) -> Result<CutsFile> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = Self::read_header(&mut reader)?;
        if header.magic != MAGIC {
            return Err(CacheError::BadMagic);
        }
        if header.version != VERSION {
            return Err(CacheError::UnsupportedVersion(header.version));
        }

        let mut config_json = vec![0u8; header.config_size as usize];
        reader.read_exact(&mut config_json)?;
        let mut payload = vec![0u8; header.payload_size as usize];
        reader.read_exact(&mut payload)?;

        if payload_checksum(&payload) != header.checksum {
            return Err(CacheError::ChecksumMismatch);
        }
        if fingerprint(&config_json, header.num_samples) != header.fingerprint {
            return Err(CacheError::Stale);
        }

        let config: CutConfig = serde_json::from_slice(&config_json)?;
        let cuts = bincode::deserialize(&payload)?;
        Ok(CutsFile {
            header,
            config,
            cuts,
        })
    }

    fn read_header(reader: &mut BufReader<File>) -> Result<CutsHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        Ok(CutsHeader {
            magic,
            version: Self::read_u16(reader)?,
            flags: Self::read_u16(reader)?,
            config_size: Self::read_u64(reader)?,
            payload_size: Self::read_u64(reader)?,
            num_cuts: Self::read_u32(reader)?,
            reserved1: Self::read_u32(reader)?,
            num_samples: Self::read_u64(reader)?,
            fingerprint: Self::read_u64(reader)?,
            checksum: Self::read_u64(reader)?,
        })
    }

    fn read_u16(reader: &mut BufReader<File>) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(reader: &mut BufReader<File>) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(reader: &mut BufReader<File>) -> Result<u64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}
