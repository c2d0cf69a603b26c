use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the staging subdirectory that holds flattened patch documents.
pub const PATCHES_DIR: &str = "patches";

/// One structural difference, addressed by a JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => {
                path
            }
        }
    }
}

/// A patch operation tagged with the asset it belongs to, so patch files stay
/// self-describing once they are all flattened into one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedOp {
    #[serde(flatten)]
    pub op: PatchOp,
    pub file: String,
}

/// Ordered operations turning one baseline file into its modified version.
pub type PatchDocument = Vec<TaggedOp>;

/// Flattened patch file name: every directory separator becomes a hyphen.
pub fn flattened_name(relative_path: &str) -> String {
    relative_path.replace(['/', '\\'], "-")
}
