//! UDF/ECMA-167 descriptor decoding: types, volume-sequence lookup, and the
//! recursive directory walk.

pub mod osta;
pub mod types;
pub mod volume;
pub mod walk;

pub use types::{DescriptorTag, FileEntry, FileIdentifierDescriptor, FileSetDescriptor, LongAd, ShortAd};
pub use volume::UdfVolume;
pub use walk::{build_tree, FileNode, PARTITION_ENTRY_SHIFT};
