use chrono::{DateTime as LocalTime, Datelike, Local, Timelike};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::SystemTime;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{IoContext, ModError, ModResult};
use crate::util;

/// Deflate level for mod archives: between store (0) and maximum (9).
pub const COMPRESSION_LEVEL: i64 = 3;

const COPY_BUFFER_SIZE: usize = 4096;

const ZIP_MIN_YEAR: i32 = 1980;
const ZIP_MAX_YEAR: i32 = 2107;

#[derive(Debug)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub bytes: u64,
}

/// Pack every file under `staging_root` into a zip at `output`.
///
/// Entry names are relative to the staging root with forward slashes; no
/// directory entries are written. A failed build removes the partial output.
pub fn build_archive(staging_root: &Path, output: &Path) -> ModResult<ArchiveSummary> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).io_context("create directory", parent)?;
    }
    let file = File::create(output).io_context("create archive", output)?;

    let result = write_archive(staging_root, file, output);
    if result.is_err() {
        let _ = std::fs::remove_file(output);
    }
    result
}

fn write_archive(staging_root: &Path, file: File, output: &Path) -> ModResult<ArchiveSummary> {
    let mut zip = ZipWriter::new(file);
    let mut summary = ArchiveSummary { entries: 0, bytes: 0 };

    add_directory(&mut zip, staging_root, staging_root, &mut summary)?;

    let mut file = zip.finish().map_err(|source| ModError::ArchiveWrite {
        entry: "central directory".to_string(),
        source,
    })?;
    file.flush().io_context("flush archive", output)?;

    Ok(summary)
}

/// Files of `dir` first, then its subdirectories, recursively.
fn add_directory(
    zip: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    summary: &mut ArchiveSummary,
) -> ModResult<()> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir).io_context("list", dir)? {
        let entry = entry.io_context("list", dir)?;
        let file_type = entry.file_type().io_context("inspect", &entry.path())?;
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }
    files.sort();
    subdirs.sort();

    for path in &files {
        add_file(zip, root, path, summary)?;
    }
    for path in &subdirs {
        add_directory(zip, root, path, summary)?;
    }
    Ok(())
}

fn add_file(zip: &mut ZipWriter<File>, root: &Path, path: &Path, summary: &mut ArchiveSummary) -> ModResult<()> {
    let entry = util::relative_slash_path(root, path).ok_or_else(|| ModError::Io {
        action: "name archive entry for",
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
    })?;

    let source = File::open(path).io_context("open", path)?;
    let meta = source.metadata().io_context("read metadata of", path)?;
    let modified = meta.modified().io_context("read modification time of", path)?;
    let size = meta.len();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .last_modified_time(zip_timestamp(modified))
        .large_file(size > u32::MAX as u64);

    let write_err = |source: ZipError| ModError::ArchiveWrite {
        entry: entry.clone(),
        source,
    };

    zip.start_file(entry.as_str(), options).map_err(write_err)?;
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, source);
    let written = std::io::copy(&mut reader, zip).map_err(|e| write_err(ZipError::Io(e)))?;
    if written != size {
        return Err(write_err(ZipError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, read {}", size, written),
        ))));
    }

    tracing::debug!("archived {} ({} bytes)", entry, size);
    summary.entries += 1;
    summary.bytes += size;
    Ok(())
}

/// Local last-write time in zip resolution: seconds truncated to even,
/// anything before 1980 clamped to the zip epoch and anything after 2107
/// clamped to the last representable instant.
pub fn zip_timestamp(modified: SystemTime) -> DateTime {
    let local: LocalTime<Local> = modified.into();
    if local.year() < ZIP_MIN_YEAR {
        return DateTime::default();
    }
    if local.year() > ZIP_MAX_YEAR {
        return DateTime::from_date_and_time(ZIP_MAX_YEAR as u16, 12, 31, 23, 59, 58).unwrap_or_default();
    }
    DateTime::from_date_and_time(
        local.year() as u16,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        (local.second() as u8) & !1,
    )
    .unwrap_or_default()
}
