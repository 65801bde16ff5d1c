//! Archive extraction for downloaded native artefacts.
//!
//! The archive format is sniffed from its leading bytes rather than the URL,
//! because CI artefact downloads are served from pre-signed URLs that carry
//! no file extension. Every entry path is validated before it is written to
//! guard against path traversal (zip-slip).

use log::trace;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const ZIP_MAGIC: &[u8] = &[0x50, 0x4b, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: &[u8] = &[0x50, 0x4b, 0x05, 0x06];

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip container could not be read.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The leading bytes match no supported archive format.
    #[error("unrecognised archive format")]
    UnknownFormat,

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Supported archive containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball (`.tar.gz`, `.tgz`).
    TarGz,
    /// Zstandard-compressed tarball (`.tar.zst`).
    TarZstd,
    /// Zip container, as served by the GitHub artefact API.
    Zip,
}

impl ArchiveFormat {
    /// Identify the archive format from its leading bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_installer::artefact::extraction::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_magic(&[0x1f, 0x8b, 0x08, 0x00]), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::from_magic(b"PK\x03\x04"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::from_magic(b"{}"), None);
    /// ```
    #[must_use]
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(GZIP_MAGIC) {
            Some(Self::TarGz)
        } else if header.starts_with(ZSTD_MAGIC) {
            Some(Self::TarZstd)
        } else if header.starts_with(ZIP_MAGIC) || header.starts_with(ZIP_EMPTY_MAGIC) {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Read the leading bytes of the file at `path` and identify its format.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownFormat`] when the header matches no
    /// supported format, or [`ExtractionError::Io`] if the file cannot be read.
    pub fn sniff(path: &Path) -> Result<Self, ExtractionError> {
        let mut header = Vec::with_capacity(4);
        File::open(path)?.take(4).read_to_end(&mut header)?;
        Self::from_magic(&header).ok_or(ExtractionError::UnknownFormat)
    }
}

/// Extract the archive at `archive_path` into `dest_dir`.
///
/// Returns the file names that were written; directories are created but
/// not listed.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
/// escape the destination directory, [`ExtractionError::EmptyArchive`] if no
/// files were found, and I/O or zip errors otherwise.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let format = ArchiveFormat::sniff(archive_path)?;
    trace!("extracting {} as {format:?}", archive_path.display());

    let file = File::open(archive_path)?;
    let extracted = match format {
        ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(file), dest_dir)?,
        ArchiveFormat::TarZstd => unpack_tar(zstd::Decoder::new(file)?, dest_dir)?,
        ArchiveFormat::Zip => unpack_zip(file, dest_dir)?,
    };

    if extracted.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(extracted)
}

fn unpack_tar(reader: impl Read, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        if let Some(target) = entry.link_name()? {
            validate_entry_path(&target)?;
        }

        // `unpack_in` also refuses entries whose parent resolves outside
        // `dest_dir` through a symlink already on disk.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }

        if entry.header().entry_type().is_dir() {
            continue;
        }
        if let Some(name) = entry_path.file_name() {
            extracted.push(name.to_string_lossy().into_owned());
        }
    }

    Ok(extracted)
}

fn unpack_zip(file: File, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(entry_path) = entry.enclosed_name() else {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        };

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut output = File::create(&dest_path)?;
        io::copy(&mut entry, &mut output)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(mode))?;
        }

        if let Some(name) = entry_path.file_name() {
            extracted.push(name.to_string_lossy().into_owned());
        }
    }

    Ok(extracted)
}

/// Validate that a tar entry path, or a link target, does not escape the
/// destination directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}
