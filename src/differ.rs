use rayon::prelude::*;
use std::path::Path;

use crate::error::{IoContext, ModResult};
use crate::util;

/// True when the two byte strings are equal after dropping every carriage
/// return and line feed. Any other whitespace still counts.
pub fn equal_ignoring_line_breaks(a: &[u8], b: &[u8]) -> bool {
    without_line_breaks(a).eq(without_line_breaks(b))
}

fn without_line_breaks(bytes: &[u8]) -> impl Iterator<Item = &u8> + '_ {
    bytes.iter().filter(|&&c| c != b'\r' && c != b'\n')
}

/// Find structured-data files present in both trees whose contents differ.
///
/// Files that only exist in the modified tree are additions and are not
/// reported. The result keeps traversal order of the modified tree.
pub fn find_differences(baseline_root: &Path, modified_root: &Path) -> ModResult<Vec<String>> {
    let candidates: Vec<(String, std::path::PathBuf, std::path::PathBuf)> =
        util::walk_structured_files(modified_root)
            .into_iter()
            .filter_map(|file| {
                let baseline_path = util::join_relative(baseline_root, &file.relative_path);
                baseline_path
                    .is_file()
                    .then(|| (file.relative_path, baseline_path, file.full_path))
            })
            .collect();

    tracing::debug!("comparing {} files present in both trees", candidates.len());

    let results = candidates
        .par_iter()
        .map(|(rel_path, baseline_path, modified_path)| -> ModResult<Option<String>> {
            let modified = std::fs::read(modified_path).io_context("read", modified_path)?;
            let baseline = std::fs::read(baseline_path).io_context("read", baseline_path)?;
            if equal_ignoring_line_breaks(&modified, &baseline) {
                Ok(None)
            } else {
                Ok(Some(rel_path.clone()))
            }
        })
        .collect::<ModResult<Vec<_>>>()?;

    let differences: Vec<String> = results.into_iter().flatten().collect();
    for rel_path in &differences {
        println!("{} is different.", rel_path);
    }

    Ok(differences)
}
