//! Human-readable and md5sum-compatible rendering of an expected tree and
//! verify report. No external table crate — formatting stays in-crate since
//! there's no separate collaborator binary to own it here.

use crate::ird::IrdContainer;
use crate::udf::FileNode;
use crate::verify::VerifyReport;

/// Prints the identity fields an IRD carries, in the order the container
/// stores them.
pub fn print_identity(ird: &IrdContainer) {
    println!("Game ID:       {}", ird.game_id);
    println!("Game name:     {}", ird.game_name);
    println!("Update ver:    {}", ird.update_version);
    println!("Game ver:      {}", ird.game_version);
    println!("App ver:       {}", ird.app_version);
    println!();
}

/// Pretty-prints the expected tree as a flat table: size, sector, path.
pub fn print_tree(root: &FileNode) {
    println!("{:>12}  {:>10}  {}", "SIZE", "SECTOR", "PATH");
    for (path, node) in leaves(root) {
        println!("{:>12}  {:>10}  {path}", node.size, node.sector);
    }
}

/// Prints `<hex md5>  <path>` for every file, md5sum(1)-compatible.
pub fn print_md5sums(root: &FileNode) {
    for (path, node) in leaves(root) {
        match node.md5 {
            Some(md5) => println!("{}  {path}", hex(&md5)),
            None => println!("{}  {path}", "?".repeat(32)),
        }
    }
}

pub fn print_verify_report(report: &VerifyReport) {
    println!(
        "files: {} on disk, {} in IRD, {} ok, {} disk-only, {} IRD-only, {} size-mismatch, {} hash-mismatch",
        report.files_on_disk,
        report.files_in_ird,
        report.files_ok,
        report.files_disk_only,
        report.files_ird_only,
        report.files_size_mismatch,
        report.files_hash_mismatch,
    );
    println!(
        "dirs:  {} on disk, {} in IRD, {} ok, {} disk-only, {} IRD-only, {} type-mismatch",
        report.dirs_on_disk,
        report.dirs_in_ird,
        report.dirs_ok,
        report.dirs_disk_only,
        report.dirs_ird_only,
        report.dir_file_mismatch,
    );
    println!("{}", report.verdict());
}

/// Depth-first listing of every file (not directory) under `root`, paired
/// with its slash-joined path relative to the root.
fn leaves(root: &FileNode) -> Vec<(String, &FileNode)> {
    let mut out = Vec::new();
    collect(root, String::new(), &mut out);
    out
}

fn collect<'a>(node: &'a FileNode, prefix: String, out: &mut Vec<(String, &'a FileNode)>) {
    match &node.children {
        Some(children) => {
            for child in children {
                let path = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{prefix}/{}", child.name)
                };
                collect(child, path, out);
            }
        }
        None => out.push((prefix, node)),
    }
}

fn hex(bytes: &[u8; 16]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
