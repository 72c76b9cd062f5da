use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while decoding or verifying PS3 IRD/UDF structures.
///
/// Mismatches found while diffing the on-disk tree against the IRD are
/// *not* represented here — they are counted by [`crate::verify`] and
/// folded into the final verdict instead of aborting the run.
#[derive(Error, Debug)]
pub enum PsIrdError {
    #[error("{0}: not a valid IRD file (bad magic bytes)")]
    InvalidMagic(PathBuf),

    #[error("{0}: truncated IRD file")]
    TruncatedIrd(PathBuf),

    #[error("{0}: gzip decompression failed: {1}")]
    BadCompression(PathBuf, #[source] io::Error),

    #[error("unknown UDF descriptor tag {tag} at byte offset {offset}")]
    UnknownDescriptorTag { tag: u16, offset: u64 },

    #[error("ambiguous UDF volume: more than one {0} in the descriptor sequence")]
    AmbiguousVolume(&'static str),

    #[error("missing UDF volume: no {0} found in the descriptor sequence")]
    MissingVolume(&'static str),

    #[error("unsupported logical block size {0} (PS3 discs require 2048)")]
    UnsupportedBlockSize(u32),

    #[error("I/O error reading {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PsIrdError>;
