use flate2::read::GzDecoder;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tar::Archive;
use zip::ZipArchive;

use crate::error::{Result, SkillsmpError};
use crate::models::SKILL_DESCRIPTOR;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EMPTY_ZIP_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Packaging formats accepted for skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `.skill` and `.zip` packages
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Detect the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SkillsmpError::Archive("archive is empty".to_string()));
        }
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(EMPTY_ZIP_MAGIC) {
            Ok(Self::Zip)
        } else if bytes.starts_with(GZIP_MAGIC) {
            Ok(Self::TarGz)
        } else {
            Err(SkillsmpError::Archive(
                "not a zip or tar.gz archive".to_string(),
            ))
        }
    }
}

/// Unpack `bytes` into `dest`, which must exist.
pub fn extract(bytes: &[u8], dest: &Path) -> Result<ArchiveKind> {
    let kind = ArchiveKind::detect(bytes)?;
    match kind {
        ArchiveKind::Zip => extract_zip(bytes, dest)?,
        ArchiveKind::TarGz => extract_tar_gz(bytes, dest)?,
    }
    Ok(kind)
}

fn extract_zip(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SkillsmpError::Archive(format!("not a valid zip archive: {e}")))?;
    if archive.is_empty() {
        return Err(SkillsmpError::Archive("archive is empty".to_string()));
    }
    archive
        .extract(dest)
        .map_err(|e| SkillsmpError::Archive(format!("failed to extract zip archive: {e}")))
}

fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(bytes)));
    archive
        .unpack(dest)
        .map_err(|e| SkillsmpError::Archive(format!("failed to extract tar.gz archive: {e}")))?;

    if std::fs::read_dir(dest)?.next().is_none() {
        return Err(SkillsmpError::Archive("archive is empty".to_string()));
    }
    Ok(())
}

/// Directory holding `SKILL.md`: the extraction root itself or its single
/// top-level directory.
pub fn locate_skill_root(extracted: &Path) -> Result<PathBuf> {
    if extracted.join(SKILL_DESCRIPTOR).is_file() {
        return Ok(extracted.to_path_buf());
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(extracted)? {
        let entry = entry?;
        let name = entry.file_name();
        // macOS zip tools add resource-fork folders
        if name == "__MACOSX" {
            continue;
        }
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }

    match dirs.as_slice() {
        [single] if single.join(SKILL_DESCRIPTOR).is_file() => Ok(single.clone()),
        _ => Err(SkillsmpError::Archive(format!(
            "{SKILL_DESCRIPTOR} not found at the archive root or in a single top-level directory"
        ))),
    }
}
