use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, info, warn};

use crate::config::UpgradeConfig;
use crate::core::UpgradeError;
use crate::upgrade::archive::{self, ArchiveFormat, ArtifactNames, ExtractedRelease, Platform};
use crate::upgrade::backup::{self, BackupManager};
use crate::upgrade::fetch::{ACCEPT_OCTET_STREAM, Fetcher, HttpFetcher, ResponseBody};
use crate::upgrade::verification::{self, Ed25519Verifier, SignatureVerifier};

/// Downloads a release archive and replaces a binary with its verified
/// contents.
///
/// An upgrade runs four stages, each of which can end the attempt:
///
/// | Stage   | Work                                                | Failure             |
/// |---------|-----------------------------------------------------|---------------------|
/// | fetch   | GET the asset URL as `application/octet-stream`     | `Fetch*`            |
/// | extract | stream the archive, stage the binary beside the target | `Archive`, `Io`  |
/// | verify  | require binary and signature, check the signature   | verification errors |
/// | apply   | swap the staged file in, keeping `<binary>.old`     | `Io`                |
///
/// Nothing at the destination changes before the apply stage. A failure in
/// any earlier stage removes the staged file and leaves the binary as it was.
///
/// # Examples
///
/// ```rust,no_run
/// use selfup::upgrade::SelfUpdater;
/// use selfup::config::UpgradeConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpgradeConfig::load().await?;
/// let updater = SelfUpdater::from_config(&config)?;
/// let key = config.read_public_key().await?;
///
/// updater
///     .upgrade_to_url("https://example.com/widget-linux-amd64.tar.gz", &key)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SelfUpdater<F = HttpFetcher, V = Ed25519Verifier> {
    fetcher: F,
    verifier: Arc<V>,
    names: ArtifactNames,
    format: ArchiveFormat,
}

impl SelfUpdater {
    /// An updater with the HTTP transport and binary name from `config`,
    /// Ed25519 signatures and the archive format of this platform.
    pub fn from_config(config: &UpgradeConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        Ok(Self::new(fetcher, Ed25519Verifier).with_binary_name(&config.binary_name))
    }
}

impl<F, V> SelfUpdater<F, V>
where
    F: Fetcher,
    V: SignatureVerifier + 'static,
{
    /// An updater for a binary named like this crate's, in this platform's
    /// archive format.
    pub fn new(fetcher: F, verifier: V) -> Self {
        Self {
            fetcher,
            verifier: Arc::new(verifier),
            names: ArtifactNames::new(env!("CARGO_PKG_NAME")),
            format: ArchiveFormat::for_platform(Platform::current()),
        }
    }

    /// Look for `binary_name` (and `.exe`, `.sig` variants) in archives.
    #[must_use]
    pub fn with_binary_name(mut self, binary_name: &str) -> Self {
        self.names = ArtifactNames::new(binary_name);
        self
    }

    /// Read archives in `format` instead of this platform's default.
    #[must_use]
    pub const fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    /// The archive entry names this updater extracts.
    pub fn names(&self) -> &ArtifactNames {
        &self.names
    }

    /// The archive format this updater reads.
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Replace the running executable with the release at `url`.
    ///
    /// The new binary takes effect on the next start; the running process is
    /// not restarted.
    ///
    /// # Errors
    ///
    /// Any error of [`apply_upgrade`](Self::apply_upgrade), or
    /// [`UpgradeError::Io`] if the running executable cannot be located.
    pub async fn upgrade_to_url(&self, url: &str, key: &[u8]) -> Result<(), UpgradeError> {
        let current = backup::running_executable().await?;
        self.apply_upgrade(&current, url, key).await
    }

    /// Replace `current_binary` with the release archive at `url`, after
    /// checking its signature against `key`.
    ///
    /// On success `current_binary` holds the new executable and
    /// `<current_binary>.old` the one it replaced.
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::Fetch`] / [`UpgradeError::FetchStatus`] if the download fails
    /// - [`UpgradeError::Archive`] if the body is not a valid archive
    /// - [`UpgradeError::MissingBinary`] / [`UpgradeError::MissingSignature`]
    ///   if the archive lacks either artifact
    /// - [`UpgradeError::InvalidKey`], [`UpgradeError::InvalidSignature`] or
    ///   [`UpgradeError::SignatureMismatch`] if verification fails
    /// - [`UpgradeError::Io`] for filesystem failures; if the final rename
    ///   fails the previous binary is left at `<current_binary>.old`
    pub async fn apply_upgrade(
        &self,
        current_binary: &Path,
        url: &str,
        key: &[u8],
    ) -> Result<(), UpgradeError> {
        info!("Upgrading {} from {}", current_binary.display(), url);

        let target_dir = match current_binary.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let response = self.fetcher.get(url, ACCEPT_OCTET_STREAM).await?.error_for_status()?;
        debug!("Downloading {} archive from {}", self.format.name(), url);

        let extracted = self.extract(target_dir, response.body).await?;
        let staged = self.verify(extracted, key).await?;

        BackupManager::new(current_binary.to_path_buf()).swap_in(staged).await?;

        info!("Upgrade of {} complete; restart to use it", current_binary.display());
        Ok(())
    }

    async fn extract(
        &self,
        target_dir: PathBuf,
        body: ResponseBody,
    ) -> Result<ExtractedRelease, UpgradeError> {
        let names = self.names.clone();
        let format = self.format;
        // The bridge must be created on the runtime it will block on.
        let mut reader = SyncIoBridge::new(body);

        tokio::task::spawn_blocking(move || {
            archive::extract(&target_dir, format, &names, &mut reader)
        })
        .await
        .map_err(|e| UpgradeError::io("extract release", ".", std::io::Error::other(e)))?
    }

    async fn verify(
        &self,
        extracted: ExtractedRelease,
        key: &[u8],
    ) -> Result<NamedTempFile, UpgradeError> {
        let Some(binary) = extracted.binary else {
            warn!("Archive has no {} binary", self.names.binary_name());
            return Err(UpgradeError::MissingBinary);
        };
        let Some(signature) = extracted.signature else {
            warn!("Archive has no signature for {}", self.names.binary_name());
            return Err(UpgradeError::MissingSignature);
        };

        let verifier = Arc::clone(&self.verifier);
        let key = key.to_vec();

        let (binary, checksum) = tokio::task::spawn_blocking(move || {
            let mut payload =
                binary.reopen().map_err(|e| UpgradeError::io("open", binary.path(), e))?;
            verifier.verify(&key, &signature, &mut payload)?;
            let checksum = verification::compute_sha256(binary.path())?;
            Ok::<_, UpgradeError>((binary, checksum))
        })
        .await
        .map_err(|e| UpgradeError::io("verify release", ".", std::io::Error::other(e)))?
        .inspect_err(|e| warn!("Rejected release: {}", e))?;

        info!("Signature verified ({})", checksum);
        Ok(binary)
    }
}
