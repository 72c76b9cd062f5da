//! Maps each leaf of the UDF tree to its IRD `(sector, md5)` record
//! (component F).

use std::collections::HashMap;

use log::warn;

use crate::ird::IrdContainer;
use crate::udf::FileNode;

pub struct HashJoiner {
    by_sector: HashMap<u64, [u8; 16]>,
}

impl HashJoiner {
    pub fn new(ird: &IrdContainer) -> Self {
        let mut by_sector = HashMap::new();
        for &(sector, md5) in &ird.file_hashes {
            by_sector.entry(sector).or_insert(md5);
        }
        Self { by_sector }
    }

    /// Fills `md5` on every leaf, recursively. Directory nodes never carry
    /// an MD5; a leaf absent from the IRD hash table is logged once and
    /// left with `md5: None`.
    pub fn fill(&self, node: &mut FileNode) {
        match &mut node.children {
            Some(children) => {
                for child in children {
                    self.fill(child);
                }
            }
            None => {
                node.md5 = self.by_sector.get(&node.sector).copied();
                if node.md5.is_none() {
                    warn!(
                        "IRD damaged: sector {} absent from UDF hash table ({})",
                        node.sector, node.name
                    );
                }
            }
        }
    }
}
