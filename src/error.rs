//! Error kinds that abort a mod build.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ModError {
    /// Downloading or unpacking the baseline assets failed.
    #[error("could not acquire baseline assets for version {version}")]
    Acquisition {
        version: String,
        #[source]
        source: anyhow::Error,
    },

    /// A structured-data file could not be parsed while generating a patch.
    #[error("{} is not valid JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("failed to serialize {what}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive entry {entry}")]
    ArchiveWrite {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Two differing files would land on the same flattened patch name.
    #[error("{first} and {second} both map to patch file {flattened}")]
    PatchNameCollision {
        first: String,
        second: String,
        flattened: String,
    },

    #[error("patch for {path} does not reproduce the modified file: {reason}")]
    Verification { path: String, reason: String },

    #[error("mod name {0:?} does not contain any non-whitespace characters")]
    InvalidName(String),
}

impl ModError {
    /// Process exit code reported when this error ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            ModError::Io { .. } | ModError::Serialize { .. } => 1,
            ModError::Acquisition { .. } => 2,
            ModError::Parse { .. } => 3,
            ModError::ArchiveWrite { .. } => 4,
            ModError::PatchNameCollision { .. } => 5,
            ModError::Verification { .. } => 6,
            ModError::InvalidName(_) => 7,
        }
    }
}

pub type ModResult<T> = Result<T, ModError>;

/// Attach the failed action and path to an I/O error.
pub trait IoContext<T> {
    fn io_context(self, action: &'static str, path: &Path) -> ModResult<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &'static str, path: &Path) -> ModResult<T> {
        self.map_err(|source| ModError::Io {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Exit code for an arbitrary top-level error: the first `ModError` in the
/// chain decides, anything else is a generic failure.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ModError>())
        .map_or(1, ModError::exit_code)
}
