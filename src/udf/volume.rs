//! Anchor → main descriptor sequence decode (component D).
//!
//! PS3 discs carry exactly one partition and one logical volume; unlike the
//! teacher, which tolerates several partitions in a `BTreeMap`, finding more
//! than one here is a hard error rather than something to merge.

use log::debug;

use crate::error::{PsIrdError, Result};
use crate::reader::ByteReader;
use crate::udf::types::{
    AnchorVolumeDescriptorPointer, DescriptorTag, LogicalVolumeDescriptor, PartitionDescriptor,
    SECTOR_SIZE,
};

const VOLUME_RECOGNITION_START_SECTOR: u64 = 16;
const ANCHOR_SECTOR: u64 = 256;

/// The two descriptors a PS3 IRD header blob needs out of the whole main
/// volume descriptor sequence.
#[derive(Debug, Clone, Copy)]
pub struct UdfVolume {
    pub partition_start: u32,
    pub partition_length: u32,
    /// Partition-relative sector of the File Set Descriptor.
    pub fileset_sector: u32,
    pub logical_block_size: u32,
}

impl UdfVolume {
    /// Decodes the UDF volume structure out of a header blob, starting from
    /// the Volume Recognition Sequence at sector 16.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        confirm_nsr_present(buf)?;

        let mut r = ByteReader::new(buf);
        r.seek((ANCHOR_SECTOR * SECTOR_SIZE) as usize)?;
        let anchor = AnchorVolumeDescriptorPointer::decode(&mut r)?;
        debug!("anchor: {anchor:?}");

        let start_sector = anchor.main_volume_descriptor_sequence_location.location_sector as u64;
        let length_bytes = anchor.main_volume_descriptor_sequence_location.length_bytes as u64;
        let end_sector = start_sector + length_bytes.div_ceil(SECTOR_SIZE);

        let mut partition: Option<PartitionDescriptor> = None;
        let mut logical_volume: Option<LogicalVolumeDescriptor> = None;

        let mut sector = start_sector;
        while sector < end_sector {
            let sector_offset = (sector * SECTOR_SIZE) as usize;
            r.seek(sector_offset)?;
            let tag = DescriptorTag::decode(&mut r)?;

            match tag.tag_identifier {
                DescriptorTag::TERMINATING_DESCRIPTOR | 0 => break,
                DescriptorTag::PARTITION_DESCRIPTOR => {
                    r.seek(sector_offset)?;
                    let pd = PartitionDescriptor::decode(&mut r)?;
                    if partition.is_some() {
                        return Err(PsIrdError::AmbiguousVolume("PartitionDescriptor"));
                    }
                    debug!("partition descriptor: start={} length={}", pd.partition_starting_location, pd.partition_length);
                    partition = Some(pd);
                }
                DescriptorTag::LOGICAL_VOLUME_DESCRIPTOR => {
                    r.seek(sector_offset)?;
                    let lvd = LogicalVolumeDescriptor::decode(&mut r)?;
                    if logical_volume.is_some() {
                        return Err(PsIrdError::AmbiguousVolume("LogicalVolumeDescriptor"));
                    }
                    debug!("logical volume descriptor: block_size={} fileset_sector={}", lvd.logical_block_size, lvd.content.sector);
                    logical_volume = Some(lvd);
                }
                _ => {}
            }

            sector += 1;
        }

        let partition = partition.ok_or(PsIrdError::MissingVolume("PartitionDescriptor"))?;
        let logical_volume =
            logical_volume.ok_or(PsIrdError::MissingVolume("LogicalVolumeDescriptor"))?;

        if logical_volume.logical_block_size as u64 != SECTOR_SIZE {
            return Err(PsIrdError::UnsupportedBlockSize(
                logical_volume.logical_block_size,
            ));
        }

        Ok(Self {
            partition_start: partition.partition_starting_location,
            partition_length: partition.partition_length,
            fileset_sector: logical_volume.content.sector,
            logical_block_size: logical_volume.logical_block_size,
        })
    }
}

/// Walks the Volume Recognition Sequence (2048-byte records starting at
/// sector 16) looking for an NSR02/NSR03 identifier before TEA01 ends it.
fn confirm_nsr_present(buf: &[u8]) -> Result<()> {
    let mut r = ByteReader::new(buf);
    let mut sector = VOLUME_RECOGNITION_START_SECTOR;

    loop {
        let offset = (sector * SECTOR_SIZE) as usize;
        if offset + 7 > buf.len() {
            break;
        }
        r.seek(offset)?;
        let _structure_type = r.read_u8()?;
        let identifier = r.read_fixed_string(5)?;
        let _version = r.read_u8()?;

        match identifier.as_str() {
            "TEA01" => break,
            "NSR02" | "NSR03" => return Ok(()),
            _ => {}
        }
        sector += 1;
    }

    Err(PsIrdError::MissingVolume("NSR02/NSR03 identifier"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tag(buf: &mut [u8], at: usize, identifier: u16) {
        buf[at..at + 2].copy_from_slice(&identifier.to_le_bytes());
        buf[at + 2..at + 4].copy_from_slice(&2u16.to_le_bytes());
    }

    fn synthesize_minimal_volume(partition_start: u32, fileset_sector: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 260 * SECTOR_SIZE as usize];

        // Volume recognition sequence at sector 16: one NSR02 record, then TEA01.
        let vrs = 16 * SECTOR_SIZE as usize;
        buf[vrs] = 0;
        buf[vrs + 1..vrs + 6].copy_from_slice(b"NSR02");
        let vrs2 = vrs + SECTOR_SIZE as usize;
        buf[vrs2] = 0;
        buf[vrs2 + 1..vrs2 + 6].copy_from_slice(b"TEA01");

        // Anchor at sector 256 pointing at main sequence sector 257, length 2 sectors.
        let anchor = (ANCHOR_SECTOR * SECTOR_SIZE) as usize;
        write_tag(&mut buf, anchor, DescriptorTag::ANCHOR_VOLUME_DESCRIPTOR_POINTER);
        buf[anchor + 16..anchor + 20].copy_from_slice(&(2 * SECTOR_SIZE as u32).to_le_bytes());
        buf[anchor + 20..anchor + 24].copy_from_slice(&257u32.to_le_bytes());

        // Partition descriptor at sector 257.
        let pd = 257 * SECTOR_SIZE as usize;
        write_tag(&mut buf, pd, DescriptorTag::PARTITION_DESCRIPTOR);
        buf[pd + 16 + 4 + 2..pd + 16 + 4 + 2 + 2].copy_from_slice(&1u16.to_le_bytes()); // partition number
        let content_offset = pd + 16 + 4 + 2 + 2 + 32 + 128 + 4;
        buf[content_offset..content_offset + 4].copy_from_slice(&partition_start.to_le_bytes());
        buf[content_offset + 4..content_offset + 8].copy_from_slice(&5000u32.to_le_bytes());

        // Logical volume descriptor at sector 258.
        let lvd = 258 * SECTOR_SIZE as usize;
        write_tag(&mut buf, lvd, DescriptorTag::LOGICAL_VOLUME_DESCRIPTOR);
        let block_size_offset = lvd + 16 + 4 + 64 + 128;
        buf[block_size_offset..block_size_offset + 4].copy_from_slice(&(SECTOR_SIZE as u32).to_le_bytes());
        let content_offset = block_size_offset + 4 + 32;
        buf[content_offset + 4..content_offset + 8].copy_from_slice(&fileset_sector.to_le_bytes());

        // Terminating descriptor at sector 259.
        let term = 259 * SECTOR_SIZE as usize;
        write_tag(&mut buf, term, DescriptorTag::TERMINATING_DESCRIPTOR);

        buf
    }

    #[test]
    fn decodes_partition_and_fileset_sector() {
        let buf = synthesize_minimal_volume(1000, 7);
        let volume = UdfVolume::decode(&buf).unwrap();
        assert_eq!(volume.partition_start, 1000);
        assert_eq!(volume.fileset_sector, 7);
        assert_eq!(volume.logical_block_size, 2048);
    }

    #[test]
    fn missing_nsr_identifier_is_an_error() {
        let mut buf = synthesize_minimal_volume(1000, 7);
        let vrs = 16 * SECTOR_SIZE as usize;
        buf[vrs + 1..vrs + 6].copy_from_slice(b"CD001");
        assert!(UdfVolume::decode(&buf).is_err());
    }
}
