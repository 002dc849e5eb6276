use std::path::Path;
use tempfile::TempDir;

use selfup::core::{ErrorKind, UpgradeError};
use selfup::test_utils::{
    ArchiveFixture, MockFetcher, public_key, release_index, sign, signed_release,
};
use selfup::upgrade::backup::BackupManager;
use selfup::upgrade::{ArchiveFormat, Ed25519Verifier, ReleaseCatalog, SelfUpdater};

const INDEX: &str = "https://index.example.com/repos/acme/widget/releases?per_page=30";

fn updater(fetcher: MockFetcher, format: ArchiveFormat) -> SelfUpdater<MockFetcher> {
    SelfUpdater::new(fetcher, Ed25519Verifier).with_binary_name("widget").with_format(format)
}

fn install(dir: &Path, contents: &[u8]) -> std::path::PathBuf {
    let binary = dir.join("widget");
    std::fs::write(&binary, contents).unwrap();
    binary
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_discover_then_apply() {
    let temp = TempDir::new().unwrap();
    let binary = install(temp.path(), b"widget 1.3.0");

    let asset_url = "https://downloads.example.com/v1.4.0/linux-amd64";
    let fetcher = MockFetcher::new()
        .respond(INDEX, 200, release_index(&[("v2.0.0", false), ("v1.4.0", false)]))
        .respond(asset_url, 200, signed_release("widget", b"widget 1.4.0", ArchiveFormat::TarGz));

    let releases = ReleaseCatalog::new(fetcher.clone())
        .with_index_url("https://index.example.com")
        .list_releases("acme/widget", "v1.3.0", false, false)
        .await
        .unwrap();
    assert_eq!(releases.len(), 1);
    let url = &releases[0].assets[0].url;
    assert_eq!(url, asset_url);

    updater(fetcher, ArchiveFormat::TarGz).apply_upgrade(&binary, url, &public_key()).await.unwrap();

    assert_eq!(std::fs::read(&binary).unwrap(), b"widget 1.4.0");
    assert_eq!(std::fs::read(temp.path().join("widget.old")).unwrap(), b"widget 1.3.0");
}

#[tokio::test]
async fn test_hex_encoded_key_and_signature() {
    let temp = TempDir::new().unwrap();
    let binary = install(temp.path(), b"old");
    let archive = ArchiveFixture::new()
        .file("widget.exe", b"new")
        .file("widget.exe.sig", format!("{}\n", hex::encode(sign(b"new"))).as_bytes())
        .build(ArchiveFormat::Zip);
    let url = "https://downloads.example.com/widget.zip";
    let key = hex::encode(public_key());

    updater(MockFetcher::new().respond(url, 200, archive), ArchiveFormat::Zip)
        .apply_upgrade(&binary, url, key.as_bytes())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&binary).unwrap(), b"new");
}

#[tokio::test]
async fn test_rejected_release_leaves_directory_unchanged() {
    let temp = TempDir::new().unwrap();
    let binary = install(temp.path(), b"old");
    let url = "https://downloads.example.com/widget.tar.gz";
    let archive = ArchiveFixture::new()
        .file("dist/widget", b"tampered")
        .file("dist/widget.sig", &sign(b"genuine"))
        .build(ArchiveFormat::TarGz);

    let err = updater(MockFetcher::new().respond(url, 200, archive), ArchiveFormat::TarGz)
        .apply_upgrade(&binary, url, &public_key())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Verification);
    assert_eq!(std::fs::read(&binary).unwrap(), b"old");
    assert_eq!(entries(temp.path()), 1);
}

#[tokio::test]
async fn test_wrong_format_is_archive_error() {
    let temp = TempDir::new().unwrap();
    let binary = install(temp.path(), b"old");
    let url = "https://downloads.example.com/widget.zip";
    let zip = signed_release("widget", b"new", ArchiveFormat::Zip);

    let err = updater(MockFetcher::new().respond(url, 200, zip), ArchiveFormat::TarGz)
        .apply_upgrade(&binary, url, &public_key())
        .await
        .unwrap_err();

    assert!(matches!(err, UpgradeError::Archive { format: "tar.gz", .. }));
    assert_eq!(entries(temp.path()), 1);
}

#[tokio::test]
async fn test_upgrade_then_rollback() {
    let temp = TempDir::new().unwrap();
    let binary = install(temp.path(), b"widget 1.3.0");
    let url = "https://downloads.example.com/widget.tar.gz";
    let fetcher = MockFetcher::new().respond(
        url,
        200,
        signed_release("widget", b"widget 1.4.0", ArchiveFormat::TarGz),
    );

    updater(fetcher, ArchiveFormat::TarGz).apply_upgrade(&binary, url, &public_key()).await.unwrap();

    let manager = BackupManager::new(binary.clone());
    assert!(manager.has_previous());
    manager.restore_previous().await.unwrap();

    assert_eq!(std::fs::read(&binary).unwrap(), b"widget 1.3.0");
    assert_eq!(entries(temp.path()), 1);
}
