//! Extraction of the executable and its detached signature from a release
//! archive.
//!
//! Release archives are `.tar.gz` on Unix-like targets and `.zip` on Windows.
//! Both are walked entry by entry and only two entries matter, compared by
//! base name with any directory prefix stripped:
//!
//! - the executable, `<bin>` or `<bin>.exe`
//! - its signature, `<bin>.sig` or `<bin>.exe.sig`
//!
//! The executable is streamed into a temporary file created in the
//! destination directory, so the final rename over the running binary stays on
//! one filesystem. The signature is read into memory. Walking stops as soon as
//! both have been seen.
//!
//! A missing entry is not an error here: [`ExtractedRelease`] simply holds
//! `None` and the verification step rejects it.
//!
//! # Formats
//!
//! | Format                | Reader         | Memory                          |
//! |-----------------------|----------------|---------------------------------|
//! | [`ArchiveFormat::TarGz`] | [`TarGzReader`] | streaming                     |
//! | [`ArchiveFormat::Zip`]   | [`ZipReader`]   | whole archive (needs seeking) |

use flate2::read::GzDecoder;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::UpgradeError;

/// Suffix of the detached signature file.
pub const SIGNATURE_EXTENSION: &str = ".sig";

/// Target platform family, which decides the archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux, macOS, the BSDs
    Posix,
    /// Windows
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Posix }
    }
}

/// Container format of a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// gzip-compressed tar
    TarGz,
    /// zip
    Zip,
}

impl ArchiveFormat {
    /// The format releases use for `platform`.
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Posix => Self::TarGz,
            Platform::Windows => Self::Zip,
        }
    }

    /// Short name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// The reader implementing this format.
    #[must_use]
    pub fn reader(self) -> &'static dyn ArchiveReader {
        match self {
            Self::TarGz => &TarGzReader,
            Self::Zip => &ZipReader,
        }
    }
}

/// The entry names that identify the executable and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    binary_name: String,
    binaries: [String; 2],
    signatures: [String; 2],
}

impl ArtifactNames {
    /// Names for an executable called `binary_name` (without extension).
    #[must_use]
    pub fn new(binary_name: &str) -> Self {
        let exe = format!("{binary_name}.exe");
        Self {
            signatures: [
                format!("{binary_name}{SIGNATURE_EXTENSION}"),
                format!("{exe}{SIGNATURE_EXTENSION}"),
            ],
            binaries: [binary_name.to_string(), exe],
            binary_name: binary_name.to_string(),
        }
    }

    /// The executable name without extension.
    #[must_use]
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Whether `base_name` is the executable.
    #[must_use]
    pub fn is_binary(&self, base_name: &str) -> bool {
        self.binaries.iter().any(|name| name == base_name)
    }

    /// Whether `base_name` is the signature file.
    #[must_use]
    pub fn is_signature(&self, base_name: &str) -> bool {
        self.signatures.iter().any(|name| name == base_name)
    }
}

/// What an archive walk produced.
///
/// The temporary file is removed when this value (or the file taken out of
/// it) is dropped, so abandoning an attempt at any point leaves nothing
/// behind.
#[derive(Debug, Default)]
pub struct ExtractedRelease {
    /// The executable, written to a temporary file next to the destination
    pub binary: Option<NamedTempFile>,
    /// Raw contents of the signature file
    pub signature: Option<Vec<u8>>,
}

impl ExtractedRelease {
    /// Path of the extracted executable, if one was found.
    #[must_use]
    pub fn binary_path(&self) -> Option<&Path> {
        self.binary.as_ref().map(NamedTempFile::path)
    }

    /// Whether both the executable and the signature were found.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.binary.is_some() && self.signature.is_some()
    }
}

/// Walks one archive format and collects the release artifacts.
pub trait ArchiveReader: Send + Sync {
    /// The format this reader understands.
    fn format(&self) -> ArchiveFormat;

    /// Read `archive` and extract the artifacts named by `names`, writing the
    /// executable into `target_dir`.
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::Archive`] if the stream is not a valid archive
    /// - [`UpgradeError::Io`] if the temporary file cannot be created or
    ///   written; the partial file is removed first
    fn extract(
        &self,
        target_dir: &Path,
        names: &ArtifactNames,
        archive: &mut dyn Read,
    ) -> Result<ExtractedRelease, UpgradeError>;
}

/// Extract with the reader for `format`.
pub fn extract(
    target_dir: &Path,
    format: ArchiveFormat,
    names: &ArtifactNames,
    archive: &mut dyn Read,
) -> Result<ExtractedRelease, UpgradeError> {
    format.reader().extract(target_dir, names, archive)
}

/// Streaming reader for `.tar.gz` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzReader;

impl ArchiveReader for TarGzReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::TarGz
    }

    fn extract(
        &self,
        target_dir: &Path,
        names: &ArtifactNames,
        archive: &mut dyn Read,
    ) -> Result<ExtractedRelease, UpgradeError> {
        let invalid = |e: io::Error| archive_error(ArchiveFormat::TarGz, e);

        let mut tar = tar::Archive::new(GzDecoder::new(archive));
        let mut collector = ArtifactCollector::new(target_dir, names, ArchiveFormat::TarGz);

        for entry in tar.entries().map_err(invalid)? {
            let mut entry = entry.map_err(invalid)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            collector.visit(&name, &mut entry)?;
            if collector.found.is_complete() {
                break;
            }
        }

        Ok(collector.found)
    }
}

/// Buffered reader for `.zip` archives.
///
/// Zip keeps its directory at the end of the file, so the whole archive is
/// read into memory before any entry is looked at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipReader;

impl ArchiveReader for ZipReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn extract(
        &self,
        target_dir: &Path,
        names: &ArtifactNames,
        archive: &mut dyn Read,
    ) -> Result<ExtractedRelease, UpgradeError> {
        let mut body = Vec::new();
        archive.read_to_end(&mut body).map_err(|e| archive_error(ArchiveFormat::Zip, e))?;
        debug!("Buffered {} byte zip archive", body.len());

        let mut zip = zip::ZipArchive::new(Cursor::new(body))
            .map_err(|e| archive_error(ArchiveFormat::Zip, e))?;
        let mut collector = ArtifactCollector::new(target_dir, names, ArchiveFormat::Zip);

        for index in 0..zip.len() {
            let mut file =
                zip.by_index(index).map_err(|e| archive_error(ArchiveFormat::Zip, e))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            collector.visit(&name, &mut file)?;
            if collector.found.is_complete() {
                break;
            }
        }

        Ok(collector.found)
    }
}

/// Shared per-entry logic for both formats.
struct ArtifactCollector<'a> {
    target_dir: &'a Path,
    names: &'a ArtifactNames,
    format: ArchiveFormat,
    found: ExtractedRelease,
}

impl<'a> ArtifactCollector<'a> {
    fn new(target_dir: &'a Path, names: &'a ArtifactNames, format: ArchiveFormat) -> Self {
        Self {
            target_dir,
            names,
            format,
            found: ExtractedRelease::default(),
        }
    }

    fn visit(&mut self, entry_name: &str, data: &mut dyn Read) -> Result<(), UpgradeError> {
        let base = base_name(entry_name);
        debug!("Considering archive entry {}", base);

        if self.names.is_binary(base) {
            debug!("Extracting binary from {}", entry_name);
            // A later duplicate replaces (and deletes) the earlier temp file.
            self.found.binary =
                Some(write_binary(self.target_dir, self.names.binary_name(), self.format, data)?);
        } else if self.names.is_signature(base) {
            debug!("Reading signature from {}", entry_name);
            let mut signature = Vec::new();
            data.read_to_end(&mut signature).map_err(|e| archive_error(self.format, e))?;
            self.found.signature = Some(signature);
        }

        Ok(())
    }
}

/// Stream `data` into a new executable temp file in `dir`.
///
/// Failures reading `data` are archive errors; failures writing the temp
/// file are I/O errors.
fn write_binary(
    dir: &Path,
    prefix: &str,
    format: ArchiveFormat,
    data: &mut dyn Read,
) -> Result<NamedTempFile, UpgradeError> {
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{prefix}-"))
        .tempfile_in(dir)
        .map_err(|e| UpgradeError::io("create temporary file in", dir, e))?;

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match data.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(archive_error(format, e)),
        };
        temp.as_file_mut()
            .write_all(&buf[..n])
            .map_err(|e| UpgradeError::io("write", temp.path(), e))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))
            .map_err(|e| UpgradeError::io("set permissions on", temp.path(), e))?;
    }

    Ok(temp)
}

/// Last path component of an archive entry name.
fn base_name(entry_name: &str) -> &str {
    let trimmed = entry_name.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

fn archive_error(format: ArchiveFormat, error: impl std::fmt::Display) -> UpgradeError {
    UpgradeError::Archive {
        format: format.name(),
        reason: error.to_string(),
    }
}
