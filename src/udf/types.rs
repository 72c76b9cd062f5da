//! Plain-record decoders for the UDF/ECMA-167 descriptors this crate needs.
//!
//! Every struct here owns a `decode(reader)` function instead of the
//! source's declarative grammar; unused reserved fields are still read (to
//! keep reader position correct) but rarely kept.

use crate::error::{PsIrdError, Result};
use crate::reader::ByteReader;

pub const SECTOR_SIZE: u64 = 2048;

/// ECMA-167 3/7.2 Descriptor Tag — the 16-byte header of every descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorTag {
    pub tag_identifier: u16,
    pub descriptor_version: u16,
    pub tag_checksum: u8,
    pub tag_serial_number: u16,
    pub descriptor_crc: u16,
    pub descriptor_crc_length: u16,
    pub tag_location: u32,
}

impl DescriptorTag {
    pub const SIZE: usize = 16;

    pub const PRIMARY_VOLUME_DESCRIPTOR: u16 = 1;
    pub const ANCHOR_VOLUME_DESCRIPTOR_POINTER: u16 = 2;
    pub const PARTITION_DESCRIPTOR: u16 = 5;
    pub const LOGICAL_VOLUME_DESCRIPTOR: u16 = 6;
    pub const TERMINATING_DESCRIPTOR: u16 = 8;
    pub const FILE_SET_DESCRIPTOR: u16 = 0x100;
    pub const FILE_IDENTIFIER_DESCRIPTOR: u16 = 0x101;
    pub const ALLOCATION_EXTENT_DESCRIPTOR: u16 = 0x102;
    pub const FILE_ENTRY: u16 = 0x105;

    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag_identifier = r.read_u16_le()?;
        let descriptor_version = r.read_u16_le()?;
        let tag_checksum = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let tag_serial_number = r.read_u16_le()?;
        let descriptor_crc = r.read_u16_le()?;
        let descriptor_crc_length = r.read_u16_le()?;
        let tag_location = r.read_u32_le()?;
        Ok(Self {
            tag_identifier,
            descriptor_version,
            tag_checksum,
            tag_serial_number,
            descriptor_crc,
            descriptor_crc_length,
            tag_location,
        })
    }

    /// Inverse of [`Self::decode`]; the reserved byte is always written as 0
    /// since this struct doesn't retain its original value.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..2].copy_from_slice(&self.tag_identifier.to_le_bytes());
        out[2..4].copy_from_slice(&self.descriptor_version.to_le_bytes());
        out[4] = self.tag_checksum;
        out[6..8].copy_from_slice(&self.tag_serial_number.to_le_bytes());
        out[8..10].copy_from_slice(&self.descriptor_crc.to_le_bytes());
        out[10..12].copy_from_slice(&self.descriptor_crc_length.to_le_bytes());
        out[12..16].copy_from_slice(&self.tag_location.to_le_bytes());
        out
    }
}

/// ECMA-167 7.1 Extent Descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtentAd {
    pub length_bytes: u32,
    pub location_sector: u32,
}

impl ExtentAd {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            length_bytes: r.read_u32_le()?,
            location_sector: r.read_u32_le()?,
        })
    }
}

/// ECMA-167 4/14.14.1 Short Allocation Descriptor; partition-relative.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortAd {
    pub length: u32,
    pub sector: u32,
}

impl ShortAd {
    pub const SIZE: usize = 8;

    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            length: r.read_u32_le()?,
            sector: r.read_u32_le()?,
        })
    }
}

/// ECMA-167 4/14.14.2 Long Allocation Descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongAd {
    pub length: u32,
    pub sector: u32,
    pub partition: u16,
}

impl LongAd {
    pub const SIZE: usize = 16;

    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let length = r.read_u32_le()?;
        let sector = r.read_u32_le()?;
        let partition = r.read_u16_le()?;
        r.read_bytes(6)?; // implementation use
        Ok(Self {
            length,
            sector,
            partition,
        })
    }
}

/// ECMA-167 3/10.2 Anchor Volume Descriptor Pointer, at sector 256.
#[derive(Debug, Clone, Copy)]
pub struct AnchorVolumeDescriptorPointer {
    pub tag: DescriptorTag,
    pub main_volume_descriptor_sequence_location: ExtentAd,
    pub reserve_volume_descriptor_sequence_location: ExtentAd,
}

impl AnchorVolumeDescriptorPointer {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag = DescriptorTag::decode(r)?;
        let main_volume_descriptor_sequence_location = ExtentAd::decode(r)?;
        let reserve_volume_descriptor_sequence_location = ExtentAd::decode(r)?;
        Ok(Self {
            tag,
            main_volume_descriptor_sequence_location,
            reserve_volume_descriptor_sequence_location,
        })
    }
}

/// ECMA-167 3/10.5 Partition Descriptor.
#[derive(Debug, Clone, Copy)]
pub struct PartitionDescriptor {
    pub tag: DescriptorTag,
    pub partition_number: u16,
    pub partition_starting_location: u32,
    pub partition_length: u32,
}

impl PartitionDescriptor {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag = DescriptorTag::decode(r)?;
        let _volume_sequence_number = r.read_u32_le()?;
        let _flags = r.read_u16_le()?;
        let partition_number = r.read_u16_le()?;
        r.read_bytes(32)?; // partition contents entity id
        r.read_bytes(128)?; // partition contents use
        let _access_type = r.read_u32_le()?;
        let partition_starting_location = r.read_u32_le()?;
        let partition_length = r.read_u32_le()?;
        Ok(Self {
            tag,
            partition_number,
            partition_starting_location,
            partition_length,
        })
    }
}

/// ECMA-167 3/10.6 Logical Volume Descriptor, truncated before the
/// variable-length partition-map table (which this crate never reads).
#[derive(Debug, Clone, Copy)]
pub struct LogicalVolumeDescriptor {
    pub tag: DescriptorTag,
    pub logical_block_size: u32,
    /// Location of the File Set Descriptor sequence, partition-relative.
    pub content: LongAd,
}

impl LogicalVolumeDescriptor {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag = DescriptorTag::decode(r)?;
        let _volume_descriptor_sequence_number = r.read_u32_le()?;
        r.read_bytes(64)?; // descriptor character set
        r.read_bytes(128)?; // logical volume identifier
        let logical_block_size = r.read_u32_le()?;
        r.read_bytes(32)?; // domain identifier
        let content = LongAd::decode(r)?;
        Ok(Self {
            tag,
            logical_block_size,
            content,
        })
    }
}

/// ECMA-167 4/14.1 File Set Descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FileSetDescriptor {
    pub tag: DescriptorTag,
    pub root_directory_ad: LongAd,
}

impl FileSetDescriptor {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag = DescriptorTag::decode(r)?;
        r.read_bytes(12)?; // recording timestamp
        r.read_bytes(12)?; // interchange level + max interchange level + charset list + max charset list
        r.read_bytes(8)?; // fileset number + fileset descriptor number
        r.read_bytes(64)?; // logical volume identifier charset
        r.read_bytes(128)?; // logical volume identifier
        r.read_bytes(64)?; // fileset identifier charset
        r.read_bytes(96)?; // fileset identifier + copyright identifier + abstract identifier
        let root_directory_ad = LongAd::decode(r)?;
        Ok(Self {
            tag,
            root_directory_ad,
        })
    }
}

/// ECMA-167 4/14.6 File Entry (truncated — this core never writes one back).
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub tag: DescriptorTag,
    pub information_length: u64,
    pub allocation_descriptors: Vec<ShortAd>,
}

impl FileEntry {
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let tag = DescriptorTag::decode(r)?;
        r.read_bytes(20)?; // ICB tag
        r.read_bytes(4 + 4 + 4)?; // uid, gid, permissions
        r.read_bytes(2 + 1 + 1 + 4)?; // link count, record fmt/attrs/length
        let information_length = r.read_u64_le()?;
        r.read_bytes(8)?; // logical blocks recorded
        r.read_bytes(12 * 3)?; // access/modification/attribute timestamps
        r.read_bytes(4)?; // checkpoint
        r.read_bytes(16)?; // extended attribute icb (LongAd)
        r.read_bytes(32)?; // implementation identifier
        r.read_bytes(8)?; // unique id
        let extended_attrs_length = r.read_u32_le()? as usize;
        let allocation_descriptors_length = r.read_u32_le()? as usize;
        r.read_bytes(extended_attrs_length)?;

        if allocation_descriptors_length % ShortAd::SIZE != 0 {
            return Err(PsIrdError::UnknownDescriptorTag {
                tag: tag.tag_identifier,
                offset: r.position() as u64,
            });
        }
        let count = allocation_descriptors_length / ShortAd::SIZE;
        let mut allocation_descriptors = Vec::with_capacity(count);
        for _ in 0..count {
            allocation_descriptors.push(ShortAd::decode(r)?);
        }

        Ok(Self {
            tag,
            information_length,
            allocation_descriptors,
        })
    }
}

/// ECMA-167 7.2 characteristics bitfield of a File Identifier Descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCharacteristics {
    pub existence_hidden: bool,
    pub directory: bool,
    pub deleted: bool,
    pub parent: bool,
    pub metadata: bool,
}

impl From<u8> for FileCharacteristics {
    fn from(bits: u8) -> Self {
        Self {
            existence_hidden: bits & 0x01 != 0,
            directory: bits & 0x02 != 0,
            deleted: bits & 0x04 != 0,
            parent: bits & 0x08 != 0,
            metadata: bits & 0x10 != 0,
        }
    }
}

/// ECMA-167 4/14.4 File Identifier Descriptor — a directory entry.
#[derive(Debug, Clone)]
pub struct FileIdentifierDescriptor {
    pub tag: DescriptorTag,
    pub characteristics: FileCharacteristics,
    pub icb: LongAd,
    pub identifier: String,
    /// Total on-disk size of this record, 4-byte aligned.
    pub record_len: usize,
}

impl FileIdentifierDescriptor {
    /// Decodes one FID starting at the reader's current position. `buf` is
    /// the surrounding slice so the identifier bytes can be sliced directly
    /// (OSTA decoding needs the raw bytes, not individual reads).
    pub fn decode(r: &mut ByteReader) -> Result<Self> {
        let start = r.position();
        let tag = DescriptorTag::decode(r)?;
        let _version = r.read_u16_le()?;
        let characteristics = FileCharacteristics::from(r.read_u8()?);
        let identifier_length = r.read_u8()? as usize;
        let icb = LongAd::decode(r)?;
        let implementation_use_length = r.read_u16_le()? as usize;
        r.read_bytes(implementation_use_length)?;
        let identifier = if identifier_length > 0 {
            crate::udf::osta::decode(r.read_bytes(identifier_length)?)
        } else {
            String::new()
        };

        let unpadded_len = r.position() - start;
        let padded_len = unpadded_len.div_ceil(4) * 4;
        r.read_bytes(padded_len - unpadded_len)?;

        Ok(Self {
            tag,
            characteristics,
            icb,
            identifier,
            record_len: padded_len,
        })
    }
}
