use clap::ValueEnum;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, ModError, ModResult};
use crate::manifest::{ManifestRecord, MANIFEST_FILE};
use crate::patch;
use crate::patch_format::{flattened_name, PATCHES_DIR};
use crate::util;

/// How a differing file is represented in the mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Write a JSON patch document per file into `patches/`.
    Patch,
    /// Copy the modified file verbatim, mirroring its relative path.
    Copy,
}

pub struct CollectRequest<'a> {
    pub differences: &'a [String],
    pub baseline_root: &'a Path,
    pub modified_root: &'a Path,
    pub staging_root: &'a Path,
    pub namespace: &'a str,
    pub mode: OutputMode,
    pub verify: bool,
}

#[derive(Debug)]
pub struct CollectSummary {
    pub patches_written: usize,
    pub files_copied: usize,
}

/// Stage the manifest and every difference under a freshly created staging
/// directory. Any failure aborts the whole collection.
pub fn collect(request: &CollectRequest, manifest: &ManifestRecord) -> ModResult<CollectSummary> {
    let staging = request.staging_root;
    if staging.exists() {
        fs::remove_dir_all(staging).io_context("remove stale staging directory", staging)?;
    }
    fs::create_dir_all(staging).io_context("create staging directory", staging)?;

    let manifest_path = staging.join(MANIFEST_FILE);
    fs::write(&manifest_path, manifest.to_json()?).io_context("write", &manifest_path)?;

    let assets_dir = staging.join("assets").join(request.namespace);
    fs::create_dir_all(&assets_dir).io_context("create directory", &assets_dir)?;

    let mut summary = CollectSummary {
        patches_written: 0,
        files_copied: 0,
    };

    match request.mode {
        OutputMode::Patch => {
            let patches_dir = assets_dir.join(PATCHES_DIR);
            let targets = patch_targets(request.differences, &patches_dir)?;
            fs::create_dir_all(&patches_dir).io_context("create directory", &patches_dir)?;

            for (rel_path, out_path) in request.differences.iter().zip(targets) {
                let document = patch::generate_patch(
                    &util::join_relative(request.baseline_root, rel_path),
                    &util::join_relative(request.modified_root, rel_path),
                    rel_path,
                    request.verify,
                )?;
                fs::write(&out_path, patch::render_patch(&document, rel_path)?).io_context("write patch", &out_path)?;
                tracing::debug!("wrote {} operations for {}", document.len(), rel_path);
                summary.patches_written += 1;
            }
        }
        OutputMode::Copy => {
            for rel_path in request.differences {
                let source = util::join_relative(request.modified_root, rel_path);
                let dest = util::join_relative(&assets_dir, rel_path);
                copy_with_metadata(&source, &dest)?;
                summary.files_copied += 1;
            }
        }
    }

    Ok(summary)
}

/// Flattened output path for each difference, in order. Two differences that
/// flatten to the same name are rejected before anything is written.
fn patch_targets(differences: &[String], patches_dir: &Path) -> ModResult<Vec<PathBuf>> {
    let mut seen: HashMap<String, &String> = HashMap::with_capacity(differences.len());
    let mut targets = Vec::with_capacity(differences.len());

    for rel_path in differences {
        let name = flattened_name(rel_path);
        if let Some(first) = seen.get(&name) {
            return Err(ModError::PatchNameCollision {
                first: (*first).clone(),
                second: rel_path.clone(),
                flattened: name,
            });
        }
        targets.push(patches_dir.join(&name));
        seen.insert(name, rel_path);
    }

    Ok(targets)
}

/// Copy a file, creating parent directories and carrying over its
/// permissions and last-write time. Permissions are applied last so a
/// read-only source still yields a writable handle for the timestamp.
fn copy_with_metadata(source: &Path, dest: &Path) -> ModResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).io_context("create directory", parent)?;
    }

    let mut reader = fs::File::open(source).io_context("open", source)?;
    let meta = reader.metadata().io_context("read metadata of", source)?;
    let modified = meta.modified().io_context("read modification time of", source)?;

    let mut writer = fs::File::create(dest).io_context("create", dest)?;
    std::io::copy(&mut reader, &mut writer).io_context("copy", source)?;
    writer.set_modified(modified).io_context("set modification time of", dest)?;
    drop(writer);

    fs::set_permissions(dest, meta.permissions()).io_context("set permissions of", dest)?;
    Ok(())
}
