//! The source fetch interface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::sources::spec::{GitHubAuth, SourceSpec};
use crate::sources::{git, release};
use crate::util::shell::{Shell, Status};

/// Obtains source trees.
pub trait SourceFetcher: Send + Sync {
    /// Materialize `spec` at `dest` and return the path of the source tree.
    ///
    /// `dest` must not exist yet.
    fn fetch(&self, spec: &SourceSpec, dest: &Path, auth: &GitHubAuth) -> Result<PathBuf>;
}

/// Fetches from GitHub: git checkouts via git2 and release assets via the
/// releases API.
#[derive(Debug)]
pub struct GitHubFetcher {
    dry_run: bool,
    shell: Arc<Shell>,
}

impl GitHubFetcher {
    pub fn new(dry_run: bool, shell: Arc<Shell>) -> Self {
        GitHubFetcher { dry_run, shell }
    }
}

impl SourceFetcher for GitHubFetcher {
    fn fetch(&self, spec: &SourceSpec, dest: &Path, auth: &GitHubAuth) -> Result<PathBuf> {
        self.shell.status(Status::Fetching, spec);

        if self.dry_run {
            tracing::debug!("dry run: not fetching {} into {}", spec, dest.display());
            return Ok(dest.to_path_buf());
        }

        match spec {
            SourceSpec::Git { repo, reference } => git::clone_at(repo, reference, dest)?,
            SourceSpec::ReleaseAsset {
                repo,
                tag,
                asset,
                sha256,
            } => release::download_asset(
                repo,
                tag,
                asset,
                sha256.as_deref(),
                dest,
                auth,
                &self.shell,
            )?,
        }

        Ok(dest.to_path_buf())
    }
}
