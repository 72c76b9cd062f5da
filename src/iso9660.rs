//! ISO9660 Primary Volume Descriptor decoder (component C).
//!
//! Only used for diagnostic logging when `-v` is given; `verify` never
//! consults it, and its directory-table decoder exists but is never called
//! — PS3 discs are verified through the UDF tree only.

use crate::error::Result;
use crate::reader::ByteReader;

const PVD_BYTE_OFFSET: usize = 16 * 2048;

#[derive(Debug, Clone)]
pub struct PrimaryVolumeDescriptor {
    pub system_identifier: String,
    pub volume_identifier: String,
    pub logical_block_size: u16,
    pub root_directory: DirectoryRecord,
}

/// ECMA-119 9.1 Directory Record, the subset this crate reads.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryRecord {
    pub extent_sector: u32,
    pub data_length: u32,
}

impl PrimaryVolumeDescriptor {
    /// Returns `None` when sector 16 isn't a `type=1, identifier="CD001"`
    /// descriptor — PS3 discs always have one, but recognition failure here
    /// is diagnostic-only and never aborts verification.
    pub fn recognize(buf: &[u8]) -> Option<Self> {
        if buf.len() < PVD_BYTE_OFFSET + 2048 {
            return None;
        }
        let mut r = ByteReader::new(buf);
        r.seek(PVD_BYTE_OFFSET).ok()?;

        let descriptor_type = r.read_u8().ok()?;
        let identifier = r.read_fixed_string(5).ok()?;
        let _version = r.read_u8().ok()?;
        if descriptor_type != 1 || identifier != "CD001" {
            return None;
        }

        r.read_u8().ok()?; // unused
        let system_identifier = r.read_fixed_string(32).ok()?;
        let volume_identifier = r.read_fixed_string(32).ok()?;

        r.seek(PVD_BYTE_OFFSET + 128).ok()?;
        let logical_block_size = r.read_u16_le().ok()?;

        r.seek(PVD_BYTE_OFFSET + 156).ok()?;
        let root_directory = DirectoryRecord::decode(&mut r).ok()?;

        Some(Self {
            system_identifier,
            volume_identifier,
            logical_block_size,
            root_directory,
        })
    }
}

impl DirectoryRecord {
    fn decode(r: &mut ByteReader) -> Result<Self> {
        let _length = r.read_u8()?;
        let _extended_attr_length = r.read_u8()?;
        let extent_sector = r.read_u32_le()?;
        r.read_bytes(4)?; // big-endian mirror
        let data_length = r.read_u32_le()?;
        r.read_bytes(4)?; // big-endian mirror
        Ok(Self {
            extent_sector,
            data_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesize() -> Vec<u8> {
        let mut buf = vec![0u8; 17 * 2048];
        let pvd = PVD_BYTE_OFFSET;
        buf[pvd] = 1;
        buf[pvd + 1..pvd + 6].copy_from_slice(b"CD001");
        buf[pvd + 6] = 1;
        buf[pvd + 8..pvd + 40].copy_from_slice(b"PLAYSTATION3                    ");
        buf[pvd + 40..pvd + 72].copy_from_slice(b"BLES00001                       ");
        buf[pvd + 128..pvd + 130].copy_from_slice(&2048u16.to_le_bytes());
        buf[pvd + 156 + 2..pvd + 156 + 6].copy_from_slice(&261u32.to_le_bytes());
        buf[pvd + 156 + 10..pvd + 156 + 14].copy_from_slice(&2048u32.to_le_bytes());
        buf
    }

    #[test]
    fn recognizes_a_valid_pvd() {
        let buf = synthesize();
        let pvd = PrimaryVolumeDescriptor::recognize(&buf).unwrap();
        assert_eq!(pvd.volume_identifier, "BLES00001");
        assert_eq!(pvd.logical_block_size, 2048);
        assert_eq!(pvd.root_directory.extent_sector, 261);
    }

    #[test]
    fn rejects_wrong_identifier() {
        let mut buf = synthesize();
        buf[PVD_BYTE_OFFSET + 1..PVD_BYTE_OFFSET + 6].copy_from_slice(b"NSR02");
        assert!(PrimaryVolumeDescriptor::recognize(&buf).is_none());
    }
}
