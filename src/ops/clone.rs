//! Cloning the project repository.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::context::BuildContext;
use crate::sources::{GitHubRepo, GitReference, SourceSpec};

/// Owner of the project repositories on GitHub.
pub const PROJECT_OWNER: &str = "anttikivi";

/// Repository cloned when none is given.
pub const DEFAULT_REPOSITORY: &str = "unsung-anthem";

/// Clone the project into `<source root>/<repository>` unless a checkout is
/// already there. Returns the checkout directory.
pub fn clone_project(ctx: &BuildContext, repository: &str) -> Result<PathBuf> {
    let dest = ctx.layout.project_source_dir(repository);

    if dest.exists() {
        tracing::debug!("{} is already cloned to {}", repository, dest.display());
        return Ok(dest);
    }

    let spec = SourceSpec::Git {
        repo: GitHubRepo::new(PROJECT_OWNER, repository),
        reference: GitReference::DefaultBranch,
    };
    ctx.fetcher
        .fetch(&spec, &dest, &ctx.auth)
        .with_context(|| format!("failed to clone {}", spec.repo()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context_with_fetcher, NoopFetcher};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_clones_missing_checkout() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(NoopFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());

        let dest = clone_project(&ctx, DEFAULT_REPOSITORY).unwrap();

        assert_eq!(dest, tmp.path().join("unsung-anthem"));
        let fetched = fetcher.fetched();
        assert_eq!(fetched.len(), 1);
        assert_eq!(
            fetched[0].0.repo(),
            &GitHubRepo::new("anttikivi", "unsung-anthem")
        );
    }

    #[test]
    fn test_existing_checkout_is_kept() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("unsung-anthem")).unwrap();
        let fetcher = Arc::new(NoopFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());

        clone_project(&ctx, DEFAULT_REPOSITORY).unwrap();

        assert!(fetcher.fetched().is_empty());
    }
}
