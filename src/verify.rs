//! Walks a local directory, merges with the expected tree, diffs, tallies,
//! and renders a verdict (component G).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use md5::{Digest, Md5};

use crate::error::{PsIrdError, Result};
use crate::udf::FileNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Valid => write!(f, "GAME DATA VALID"),
            Verdict::Invalid => write!(f, "GAME DATA INVALID"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyReport {
    pub files_on_disk: u64,
    pub files_in_ird: u64,
    pub files_ok: u64,
    pub files_disk_only: u64,
    pub files_ird_only: u64,
    pub files_size_mismatch: u64,
    pub files_hash_mismatch: u64,
    pub dirs_on_disk: u64,
    pub dirs_in_ird: u64,
    pub dirs_ok: u64,
    pub dirs_disk_only: u64,
    pub dirs_ird_only: u64,
    pub dir_file_mismatch: u64,
}

impl VerifyReport {
    /// The spec's formula (`files_on_disk == files_in_ird` and all mismatch
    /// counters zero) is extended here to also require zero type mismatches
    /// — otherwise scenario 6 (a file replaced by a directory on disk)
    /// would report VALID whenever the counts happened to balance.
    pub fn verdict(&self) -> Verdict {
        let mismatches = self.files_disk_only
            + self.files_ird_only
            + self.files_size_mismatch
            + self.files_hash_mismatch
            + self.dirs_disk_only
            + self.dirs_ird_only
            + self.dir_file_mismatch;
        if self.files_on_disk == self.files_in_ird && mismatches == 0 {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

struct DiskEntry {
    path: PathBuf,
    is_dir: bool,
    size: u64,
}

/// Verifies `game_dir` against `expected_root` (the tree produced by
/// [`crate::udf::build_tree`] and joined by [`crate::hashjoin::HashJoiner`]).
pub fn verify(expected_root: &FileNode, game_dir: &Path) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    let children = expected_root.children.as_deref().unwrap_or(&[]);
    diff_dir(game_dir, children, &mut report)?;
    Ok(report)
}

fn diff_dir(dir_path: &Path, expected: &[FileNode], report: &mut VerifyReport) -> Result<()> {
    let mut by_name: BTreeMap<String, (Option<DiskEntry>, Option<&FileNode>)> = BTreeMap::new();

    let read_dir = std::fs::read_dir(dir_path).map_err(|source| PsIrdError::LocalIo {
        path: dir_path.to_path_buf(),
        source,
    })?;
    for entry in read_dir {
        let entry = entry.map_err(|source| PsIrdError::LocalIo {
            path: dir_path.to_path_buf(),
            source,
        })?;
        let metadata = entry.metadata().map_err(|source| PsIrdError::LocalIo {
            path: entry.path(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        by_name.insert(
            name,
            (
                Some(DiskEntry {
                    path: entry.path(),
                    is_dir: metadata.is_dir(),
                    size: metadata.len(),
                }),
                None,
            ),
        );
    }
    for node in expected {
        by_name.entry(node.name.clone()).or_insert((None, None)).1 = Some(node);
    }

    for (name, (disk, expected_node)) in by_name {
        match (disk, expected_node) {
            (Some(disk), Some(node)) => {
                classify_present(&name, dir_path, disk, node, report)?;
            }
            (Some(disk), None) => {
                debug!("{}/{name}: present on disk only", dir_path.display());
                if disk.is_dir {
                    report.dirs_on_disk += 1;
                    report.dirs_disk_only += 1;
                } else {
                    report.files_on_disk += 1;
                    report.files_disk_only += 1;
                }
            }
            (None, Some(node)) => {
                debug!("{}/{name}: present in IRD only", dir_path.display());
                if node.is_directory() {
                    report.dirs_in_ird += 1;
                    report.dirs_ird_only += 1;
                } else {
                    report.files_in_ird += 1;
                    report.files_ird_only += 1;
                }
            }
            (None, None) => unreachable!("combined map never holds an empty entry"),
        }
    }

    Ok(())
}

fn classify_present(
    name: &str,
    dir_path: &Path,
    disk: DiskEntry,
    node: &FileNode,
    report: &mut VerifyReport,
) -> Result<()> {
    let expected_is_dir = node.is_directory();

    if disk.is_dir != expected_is_dir {
        warn!(
            "{}/{name}: type mismatch (disk {}, IRD {})",
            dir_path.display(),
            if disk.is_dir { "directory" } else { "file" },
            if expected_is_dir { "directory" } else { "file" },
        );
        report.dir_file_mismatch += 1;
        return Ok(());
    }

    if expected_is_dir {
        report.dirs_on_disk += 1;
        report.dirs_in_ird += 1;
        report.dirs_ok += 1;
        diff_dir(&disk.path, node.children.as_deref().unwrap_or(&[]), report)?;
        return Ok(());
    }

    report.files_on_disk += 1;
    report.files_in_ird += 1;

    if disk.size != node.size {
        report.files_size_mismatch += 1;
        return Ok(());
    }

    match node.md5 {
        Some(expected_md5) => {
            let computed_md5 = md5_file(&disk.path)?;
            if computed_md5 != expected_md5 {
                report.files_hash_mismatch += 1;
            } else {
                report.files_ok += 1;
            }
        }
        None => report.files_ok += 1,
    }

    Ok(())
}

fn md5_file(path: &Path) -> Result<[u8; 16]> {
    let mut file = File::open(path).map_err(|source| PsIrdError::LocalIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = file.read(&mut buf).map_err(|source| PsIrdError::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EBOOT: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F,
    ];

    fn eboot_md5() -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(EBOOT);
        hasher.finalize().into()
    }

    fn expected_tree_with_eboot() -> FileNode {
        FileNode {
            name: String::new(),
            sector: 0,
            size: 0,
            md5: None,
            children: Some(vec![FileNode {
                name: "EBOOT.BIN".to_string(),
                sector: 1000,
                size: 16,
                md5: Some(eboot_md5()),
                children: None,
            }]),
        }
    }

    #[test]
    fn scenario_1_round_trip_identity() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("EBOOT.BIN"), EBOOT).unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.files_ok, 1);
        assert_eq!(report.verdict(), Verdict::Valid);
    }

    #[test]
    fn scenario_2_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut padded = EBOOT.to_vec();
        padded.push(0xAA);
        fs::write(dir.path().join("EBOOT.BIN"), padded).unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.files_size_mismatch, 1);
        assert_eq!(report.verdict(), Verdict::Invalid);
    }

    #[test]
    fn scenario_3_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut flipped = EBOOT.to_vec();
        *flipped.last_mut().unwrap() ^= 0xFF;
        fs::write(dir.path().join("EBOOT.BIN"), flipped).unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.files_hash_mismatch, 1);
        assert_eq!(report.verdict(), Verdict::Invalid);
    }

    #[test]
    fn scenario_4_disk_only_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("EBOOT.BIN"), EBOOT).unwrap();
        fs::write(dir.path().join("README.TXT"), b"extra").unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.files_disk_only, 1);
        assert_eq!(report.verdict(), Verdict::Invalid);
    }

    #[test]
    fn scenario_5_ird_only_file() {
        let dir = tempfile::tempdir().unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.files_ird_only, 1);
        assert_eq!(report.verdict(), Verdict::Invalid);
    }

    #[test]
    fn scenario_6_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("EBOOT.BIN")).unwrap();

        let report = verify(&expected_tree_with_eboot(), dir.path()).unwrap();
        assert_eq!(report.dir_file_mismatch, 1);
        assert_eq!(report.verdict(), Verdict::Invalid);
    }

    #[test]
    fn directories_recurse() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("PS3_GAME")).unwrap();
        fs::write(dir.path().join("PS3_GAME").join("EBOOT.BIN"), EBOOT).unwrap();

        let expected = FileNode {
            name: String::new(),
            sector: 0,
            size: 0,
            md5: None,
            children: Some(vec![FileNode {
                name: "PS3_GAME".to_string(),
                sector: 2000,
                size: 0,
                md5: None,
                children: Some(vec![FileNode {
                    name: "EBOOT.BIN".to_string(),
                    sector: 1000,
                    size: 16,
                    md5: Some(eboot_md5()),
                    children: None,
                }]),
            }]),
        };

        let report = verify(&expected, dir.path()).unwrap();
        assert_eq!(report.dirs_ok, 1);
        assert_eq!(report.files_ok, 1);
        assert_eq!(report.verdict(), Verdict::Valid);
    }
}
