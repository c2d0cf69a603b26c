use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{ModError, ModResult};

pub const DEFAULT_ORIGIN: &str = "https://account.vintagestory.at";
pub const ARTIFACT_PREFIX: &str = "vs_server_";
const ASSETS_DIR: &str = "assets";

/// Release channel, selecting the download path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    Stable,
    Unstable,
}

impl Channel {
    pub fn path_segment(self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Unstable => "unstable",
        }
    }
}

/// Where the baseline for `version` lives once extracted.
pub fn baseline_path(cache_root: &Path, version: &str) -> PathBuf {
    cache_root.join(version).join(ASSETS_DIR)
}

pub fn download_url(origin: &str, channel: Channel, version: &str) -> String {
    format!(
        "{}/files/{}/{}{}.tar.gz",
        origin.trim_end_matches('/'),
        channel.path_segment(),
        ARTIFACT_PREFIX,
        version
    )
}

/// Make sure the baseline asset tree for `version` exists in the cache and
/// return its path. An existing directory is trusted as-is; otherwise the
/// server archive is downloaded and installed atomically.
pub async fn ensure_baseline(
    cache_root: &Path,
    origin: &str,
    channel: Channel,
    version: &str,
) -> ModResult<PathBuf> {
    let assets = baseline_path(cache_root, version);
    if assets.is_dir() {
        println!("Found vanilla assets in {}, will use that as reference.", assets.display());
        return Ok(assets);
    }

    let version_dir = cache_root.join(version);
    let created_version_dir = !version_dir.exists();

    let result = download_and_install(&version_dir, origin, channel, version).await;
    if result.is_err() && created_version_dir {
        // Only succeeds when the directory is still empty.
        let _ = std::fs::remove_dir(&version_dir);
    }

    result.map_err(|source| ModError::Acquisition {
        version: version.to_string(),
        source,
    })
}

async fn download_and_install(version_dir: &Path, origin: &str, channel: Channel, version: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(version_dir)
        .with_context(|| format!("Failed to create cache directory: {}", version_dir.display()))?;
    let work = tempfile::Builder::new()
        .prefix(".partial-")
        .tempdir_in(version_dir)
        .with_context(|| format!("Failed to create temp directory in {}", version_dir.display()))?;

    let url = download_url(origin, channel, version);
    let archive_path = work.path().join(format!("{}.tar.gz", version));
    println!("Downloading vanilla assets for v{} from {}...", version, url);
    let bytes = download(&url, &archive_path).await?;
    println!("File downloaded ({} bytes). Extracting...", bytes);

    let version_dir = version_dir.to_path_buf();
    let work_path = work.path().to_path_buf();
    let assets = tokio::task::spawn_blocking(move || install_archive(&archive_path, &work_path, &version_dir))
        .await
        .context("Extraction task panicked")??;

    println!("Files extracted to {}", assets.display());
    Ok(assets)
}

/// Stream `url` into `dest`, returning the number of bytes written.
async fn download(url: &str, dest: &Path) -> Result<u64> {
    tracing::debug!("GET {}", url);
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?
        .error_for_status()
        .with_context(|| format!("Server rejected download of {}", url))?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {} was interrupted", url))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

/// Unpack a `.tar.gz` server archive inside `work_dir`, then move its
/// `assets/` directory into `<version_dir>/assets` in a single rename.
pub fn install_archive(archive_path: &Path, work_dir: &Path, version_dir: &Path) -> Result<PathBuf> {
    let unpack_dir = work_dir.join("unpacked");
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(&unpack_dir)
        .with_context(|| format!("Failed to extract {}", archive_path.display()))?;

    let extracted = unpack_dir.join(ASSETS_DIR);
    if !extracted.is_dir() {
        bail!("{} has no top-level {}/ directory", archive_path.display(), ASSETS_DIR);
    }

    let target = version_dir.join(ASSETS_DIR);
    if let Err(err) = std::fs::rename(&extracted, &target) {
        // Another run may have installed the same version meanwhile.
        if !target.is_dir() {
            return Err(err).with_context(|| format!("Failed to move assets into {}", target.display()));
        }
        tracing::warn!("{} appeared while extracting; keeping the existing tree", target.display());
    }

    Ok(target)
}
