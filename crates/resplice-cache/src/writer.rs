//! .cuts file writer

use crate::error::Result;
use crate::format::{fingerprint, payload_checksum, CutsHeader};
use resplice_core::{Cut, CutConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct CutsWriter;

impl CutsWriter {
    /// Write a .cuts file for the given analysis.
    pub fn write(path: &Path, num_samples: usize, config: &CutConfig, cuts: &[Cut]) -> Result<()> {
        let config_json = serde_json::to_vec(config)?;
        let payload = bincode::serialize(cuts)?;

        let mut header = CutsHeader::new(
            config_json.len() as u64,
            payload.len() as u64,
            cuts.len() as u32,
            num_samples as u64,
        );
        header.fingerprint = fingerprint(&config_json, num_samples as u64);
        header.checksum = payload_checksum(&payload);

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_header(&mut writer, &header)?;
        writer.write_all(&config_json)?;
        writer.write_all(&payload)?;
        writer.flush()?;

        log::debug!("wrote {} cuts to {}", cuts.len(), path.display());
        Ok(())
    }

    fn write_header(writer: &mut BufWriter<File>, header: &CutsHeader) -> Result<()> {
        // Little-endian binary, field order fixed by the format version.
        writer.write_all(&header.magic)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&header.flags.to_le_bytes())?;
        writer.write_all(&header.config_size.to_le_bytes())?;
        writer.write_all(&header.payload_size.to_le_bytes())?;
        writer.write_all(&header.num_cuts.to_le_bytes())?;
        writer.write_all(&header.reserved1.to_le_bytes())?;
        writer.write_all(&header.num_samples.to_le_bytes())?;
        writer.write_all(&header.fingerprint.to_le_bytes())?;
        writer.write_all(&header.checksum.to_le_bytes())?;
        Ok(())
    }
}
