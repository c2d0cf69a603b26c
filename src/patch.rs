use serde_json::Value;
use std::path::Path;

use crate::error::{IoContext, ModError, ModResult};
use crate::json_apply;
use crate::json_diff;
use crate::patch_format::{PatchDocument, TaggedOp};

/// Read and parse a structured-data file, ignoring a UTF-8 byte-order mark.
///
/// Asset files use the relaxed JSON5 dialect: unquoted keys, comments and
/// trailing commas are all accepted.
pub fn read_document(path: &Path) -> ModResult<Value> {
    let text = std::fs::read_to_string(path).io_context("read", path)?;
    json5::from_str(text.trim_start_matches('\u{feff}')).map_err(|source| ModError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the tagged patch document turning `baseline_file` into `modified_file`.
///
/// Every operation carries `file` set to `relative_path` with forward slashes.
/// With `verify` set, the operations are replayed against the baseline and
/// must reproduce the modified document.
pub fn generate_patch(
    baseline_file: &Path,
    modified_file: &Path,
    relative_path: &str,
    verify: bool,
) -> ModResult<PatchDocument> {
    let left = read_document(baseline_file)?;
    let right = read_document(modified_file)?;
    let ops = json_diff::compute_diff(&left, &right);

    if verify {
        let replayed = json_apply::apply_ops(&left, &ops).map_err(|err| ModError::Verification {
            path: relative_path.to_string(),
            reason: format!("{:#}", err),
        })?;
        if replayed != right {
            return Err(ModError::Verification {
                path: relative_path.to_string(),
                reason: "replayed document differs".to_string(),
            });
        }
    }

    let file = relative_path.replace('\\', "/");
    Ok(ops
        .into_iter()
        .map(|op| TaggedOp {
            op,
            file: file.clone(),
        })
        .collect())
}

/// Serialize a patch document the way it is written into the mod.
pub fn render_patch(document: &PatchDocument, relative_path: &str) -> ModResult<String> {
    serde_json::to_string_pretty(document).map_err(|source| ModError::Serialize {
        what: format!("patch for {}", relative_path),
        source,
    })
}
