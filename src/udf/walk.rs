//! Recursive File Entry / File Identifier Descriptor walk (component E).
//!
//! `walk_directory` takes its partition context as plain parameters rather
//! than threading a lazy-bound parser context, matching the explicit
//! recursive-function style the corrected design calls for.

use log::warn;

use crate::error::{PsIrdError, Result};
use crate::reader::ByteReader;
use crate::udf::types::{DescriptorTag, FileEntry, FileSetDescriptor, ShortAd, SECTOR_SIZE};
use crate::udf::volume::UdfVolume;

/// The IRD header blob omits the first 32 sectors of the partition; this
/// quirk to skip strange file entry descriptors is baked into the PS3 IRD
/// format and applies uniformly to every partition-relative seek and to the
/// absolute sector used as the hash-join key.
pub const PARTITION_ENTRY_SHIFT: i64 = -32;

/// One node of the decoded disc tree: either a file (`children: None`) or a
/// directory (`children: Some`, possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub name: String,
    /// Absolute disc sector; used as the join key against the IRD hash table.
    pub sector: u64,
    pub size: u64,
    pub md5: Option<[u8; 16]>,
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }
}

fn effective_partition_start(partition_start: u32) -> i64 {
    partition_start as i64 + PARTITION_ENTRY_SHIFT
}

fn seek_sector(r: &mut ByteReader, partition_start_effective: i64, rel_sector: u32) -> Result<()> {
    let abs_sector = partition_start_effective + rel_sector as i64;
    if abs_sector < 0 {
        return Err(PsIrdError::UnknownDescriptorTag {
            tag: 0,
            offset: abs_sector as u64,
        });
    }
    r.seek(abs_sector as usize * SECTOR_SIZE as usize)?;
    Ok(())
}

fn expect_tag(r: &mut ByteReader, expected: u16) -> Result<DescriptorTag> {
    let start = r.position();
    let tag = DescriptorTag::decode(r)?;
    if tag.tag_identifier != expected {
        return Err(PsIrdError::UnknownDescriptorTag {
            tag: tag.tag_identifier,
            offset: start as u64,
        });
    }
    r.seek(start)?;
    Ok(tag)
}

/// Builds the full expected tree from the decoded volume, rooted at the
/// File Set Descriptor's root directory.
pub fn build_tree(buf: &[u8], volume: &UdfVolume) -> Result<FileNode> {
    let partition_start_effective = effective_partition_start(volume.partition_start);
    let mut r = ByteReader::new(buf);

    seek_sector(&mut r, partition_start_effective, volume.fileset_sector)?;
    expect_tag(&mut r, DescriptorTag::FILE_SET_DESCRIPTOR)?;
    let fileset = FileSetDescriptor::decode(&mut r)?;

    let (size, sector, children) = resolve(
        &mut r,
        partition_start_effective,
        fileset.root_directory_ad.sector,
        true,
    )?;
    Ok(FileNode {
        name: String::new(),
        sector,
        size,
        md5: None,
        children: Some(children.unwrap_or_default()),
    })
}

/// Decodes the File Entry at `rel_entry_sector`, returning its total size,
/// absolute join-key sector, and (for directories) its children.
fn resolve(
    r: &mut ByteReader,
    partition_start_effective: i64,
    rel_entry_sector: u32,
    is_directory: bool,
) -> Result<(u64, u64, Option<Vec<FileNode>>)> {
    seek_sector(r, partition_start_effective, rel_entry_sector)?;
    expect_tag(r, DescriptorTag::FILE_ENTRY)?;
    let entry = FileEntry::decode(r)?;

    if entry.allocation_descriptors.len() != 1 {
        warn!(
            "file entry at partition-relative sector {rel_entry_sector} has {} allocation descriptors, expected 1; using the first",
            entry.allocation_descriptors.len()
        );
    }
    let ad = *entry
        .allocation_descriptors
        .first()
        .ok_or(PsIrdError::UnknownDescriptorTag {
            tag: DescriptorTag::FILE_ENTRY,
            offset: rel_entry_sector as u64,
        })?;

    let size: u64 = entry.allocation_descriptors.iter().map(|a| a.length as u64).sum();
    let abs_sector = (partition_start_effective + ad.sector as i64) as u64;

    let children = if is_directory {
        Some(read_directory(r, partition_start_effective, ad)?)
    } else {
        None
    };

    Ok((size, abs_sector, children))
}

/// Decodes the fixed-length run of File Identifier Descriptors that make up
/// one directory's listing.
fn read_directory(
    r: &mut ByteReader,
    partition_start_effective: i64,
    content: ShortAd,
) -> Result<Vec<FileNode>> {
    seek_sector(r, partition_start_effective, content.sector)?;
    let start = r.position();
    let end = start + content.length as usize;

    let mut children = Vec::new();
    let mut seen_names = std::collections::HashSet::new();

    while r.position() < end {
        let fid = crate::udf::types::FileIdentifierDescriptor::decode(r)?;
        if fid.characteristics.parent {
            continue;
        }
        if fid.identifier.is_empty() {
            continue; // self-link
        }
        if !seen_names.insert(fid.identifier.clone()) {
            warn!("duplicate directory entry name {:?}", fid.identifier);
        }

        let (size, sector, grandchildren) = resolve(
            r,
            partition_start_effective,
            fid.icb.sector,
            fid.characteristics.directory,
        )?;
        children.push(FileNode {
            name: fid.identifier,
            sector,
            size,
            md5: None,
            children: grandchildren,
        });
    }

    Ok(children)
}
