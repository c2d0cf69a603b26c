use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

use crate::collect::OutputMode;
use crate::fetch::Channel;
use crate::manifest::{ModSide, ModType};

/// Everything one mod build needs, resolved up front and passed down.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub version: String,
    pub channel: Channel,
    pub origin: String,
    pub assets_root: PathBuf,
    pub mods_dir: PathBuf,
    pub cache_root: PathBuf,
    pub staging_dir: PathBuf,
    pub namespace: String,
    pub mode: OutputMode,
    pub mod_type: ModType,
    pub side: ModSide,
    pub verify: bool,
}

impl BuildConfig {
    pub fn archive_path(&self, modid: &str) -> PathBuf {
        self.mods_dir.join(format!("{}.zip", modid))
    }
}

fn base_dirs() -> Result<BaseDirs> {
    BaseDirs::new().context("Could not determine the home directory for default paths")
}

/// Assets of the local game installation.
pub fn default_assets_root() -> Result<PathBuf> {
    Ok(base_dirs()?.data_dir().join("Vintagestory").join("assets"))
}

/// The game's installed-mods folder.
pub fn default_mods_dir() -> Result<PathBuf> {
    Ok(base_dirs()?.config_dir().join("VintagestoryData").join("Mods"))
}

pub fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join("VintageStoryModMaker")
}

pub fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("vsmodextract")
}
