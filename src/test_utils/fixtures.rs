//! Release archive and index fixtures.

use ed25519_dalek::{Signer, SigningKey};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};

use crate::upgrade::ArchiveFormat;

/// The Ed25519 key every fixture is signed with.
pub fn test_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// Raw public key bytes of [`test_signing_key`].
pub fn public_key() -> Vec<u8> {
    test_signing_key().verifying_key().to_bytes().to_vec()
}

/// Raw 64-byte signature of `data` by [`test_signing_key`].
pub fn sign(data: &[u8]) -> Vec<u8> {
    test_signing_key().sign(data).to_bytes().to_vec()
}

/// An archive holding `binary` and a valid signature for it, nested in a
/// versioned directory the way release tooling lays it out.
pub fn signed_release(binary_name: &str, binary: &[u8], format: ArchiveFormat) -> Vec<u8> {
    let exe = match format {
        ArchiveFormat::TarGz => binary_name.to_string(),
        ArchiveFormat::Zip => format!("{binary_name}.exe"),
    };
    ArchiveFixture::new()
        .file(&format!("{binary_name}-release/README.md"), b"release notes")
        .file(&format!("{binary_name}-release/{exe}"), binary)
        .file(&format!("{binary_name}-release/{exe}.sig"), &sign(binary))
        .build(format)
}

/// A release index body: one entry per `(tag, prerelease)` with a single
/// asset named after the tag.
pub fn release_index(releases: &[(&str, bool)]) -> Vec<u8> {
    let entries: Vec<serde_json::Value> = releases
        .iter()
        .map(|(tag, prerelease)| {
            serde_json::json!({
                "tag_name": tag,
                "prerelease": prerelease,
                "draft": false,
                "assets": [{
                    "name": format!("widget-{tag}-linux-amd64.tar.gz"),
                    "url": format!("https://downloads.example.com/{tag}/linux-amd64"),
                    "size": 1024,
                }],
            })
        })
        .collect();
    serde_json::to_vec(&entries).expect("serialize release index")
}

/// Builder for archives with arbitrary entries.
#[derive(Debug, Clone, Default)]
pub struct ArchiveFixture {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries.push((name.to_string(), contents.to_vec()));
        self
    }

    pub fn build(&self, format: ArchiveFormat) -> Vec<u8> {
        match format {
            ArchiveFormat::TarGz => self.tar_gz(),
            ArchiveFormat::Zip => self.zip(),
        }
    }

    pub fn tar_gz(&self) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, contents) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o755);
            builder.append_data(&mut header, name, contents.as_slice()).expect("append tar entry");
        }
        builder.into_inner().expect("finish tar").finish().expect("finish gzip")
    }

    pub fn zip(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in &self.entries {
            writer.start_file(name.as_str(), options).expect("start zip entry");
            writer.write_all(contents).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }
}
