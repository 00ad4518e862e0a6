//! GitHub release assets.
//!
//! The asset is looked up through the releases API, streamed to a
//! temporary file, optionally verified against a SHA-256 digest and
//! unpacked. Only `.tar.gz` archives are supported.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tar::Archive;

use crate::sources::spec::{GitHubAuth, GitHubRepo};
use crate::util::hash::verify_sha256;
use crate::util::shell::Shell;

#[derive(Debug, Deserialize)]
struct Release {
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

/// Download a release asset and unpack it into `dest`.
pub fn download_asset(
    repo: &GitHubRepo,
    tag: &str,
    asset: &str,
    sha256: Option<&str>,
    dest: &Path,
    auth: &GitHubAuth,
    shell: &Arc<Shell>,
) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(auth.user_agent.as_str())
        .build()
        .context("failed to create HTTP client")?;

    let release = fetch_release(&client, repo, tag, auth)?;
    let found = release
        .assets
        .iter()
        .find(|a| a.name == asset)
        .with_context(|| format!("release {} of {} has no asset named {}", tag, repo, asset))?;

    let parent = dest
        .parent()
        .with_context(|| format!("{} has no parent directory", dest.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let archive = tempfile::Builder::new()
        .prefix("couplet-download")
        .tempfile_in(parent)
        .context("failed to create a temporary file for the download")?;

    tracing::debug!("downloading {}", found.browser_download_url);
    let mut response = client
        .get(&found.browser_download_url)
        .send()
        .with_context(|| format!("failed to download {}", found.browser_download_url))?;
    if !response.status().is_success() {
        bail!(
            "failed to download {}: HTTP {}",
            found.browser_download_url,
            response.status()
        );
    }

    let total = response.content_length().unwrap_or(found.size);
    let mut progress = shell.bytes_progress(asset, total);
    let mut writer = archive.as_file();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = response
            .read(&mut buffer)
            .with_context(|| format!("failed to read {}", found.browser_download_url))?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        progress.inc(read as u64);
    }
    writer.flush()?;
    progress.finish();

    if let Some(expected) = sha256 {
        verify_sha256(archive.path(), expected)?;
        tracing::debug!("verified the checksum of {}", asset);
    }

    if !asset.ends_with(".tar.gz") && !asset.ends_with(".tgz") {
        bail!("unsupported archive format: {}", asset);
    }

    let file = File::open(archive.path())
        .with_context(|| format!("failed to open {}", archive.path().display()))?;
    unpack_single_root(BufReader::new(file), dest)
        .with_context(|| format!("failed to unpack {}", asset))
}

fn fetch_release(
    client: &reqwest::blocking::Client,
    repo: &GitHubRepo,
    tag: &str,
    auth: &GitHubAuth,
) -> Result<Release> {
    let url = repo.release_api_url(tag)?;
    tracing::debug!("querying {}", url);

    let mut request = client
        .get(url.as_str())
        .header("Accept", "application/vnd.github.v3+json");
    if let Some(token) = &auth.api_token {
        request = request.header("Authorization", format!("token {}", token));
    }

    let response = request
        .send()
        .with_context(|| format!("failed to query {}", url))?;
    if !response.status().is_success() {
        bail!("failed to query {}: HTTP {}", url, response.status());
    }

    let body = response
        .text()
        .with_context(|| format!("failed to read the response from {}", url))?;
    serde_json::from_str(&body).with_context(|| format!("malformed release data from {}", url))
}

/// Unpack a gzipped tarball into `dest`.
///
/// When the archive holds a single top-level directory, its contents
/// become `dest`; otherwise the archive root does. The archive is first
/// unpacked into a staging directory next to `dest`, so an interrupted
/// unpack never leaves a partial `dest` behind.
pub fn unpack_single_root<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .with_context(|| format!("{} has no parent directory", dest.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix("couplet-unpack")
        .tempdir_in(parent)
        .context("failed to create a staging directory")?;

    let mut archive = Archive::new(GzDecoder::new(reader));
    archive
        .unpack(staging.path())
        .context("failed to read the archive")?;

    let root = single_root(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf());
    std::fs::rename(&root, dest).with_context(|| {
        format!("failed to move {} to {}", root.display(), dest.display())
    })?;
    Ok(())
}

fn single_root(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        return Ok(entries.pop().map(|e| e.path()));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::TempDir;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut data, Compression::default());
            let mut builder = Builder::new(encoder);
            for (path, contents) in files {
                let mut header = tar::Header::new_gnu();
                header.set_path(path).unwrap();
                header.set_size(contents.len() as u64);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append(&header, contents.as_bytes()).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        data
    }

    #[test]
    fn test_unpack_strips_single_root() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("cmake");
        let data = tarball(&[
            ("cmake-3.16.4-Linux-x86_64/bin/cmake", "#!/bin/sh"),
            ("cmake-3.16.4-Linux-x86_64/share/readme", "docs"),
        ]);

        unpack_single_root(data.as_slice(), &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("bin").join("cmake")).unwrap(),
            "#!/bin/sh"
        );
        assert!(dest.join("share").join("readme").is_file());
    }

    #[test]
    fn test_unpack_keeps_flat_archive() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("ninja");
        let data = tarball(&[("ninja", "binary"), ("LICENSE", "license")]);

        unpack_single_root(data.as_slice(), &dest).unwrap();

        assert!(dest.join("ninja").is_file());
        assert!(dest.join("LICENSE").is_file());
    }
}
