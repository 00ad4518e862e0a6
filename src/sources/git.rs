//! Git checkouts with git2.

use std::path::Path;

use anyhow::{Context, Result};
use git2::{Repository, ResetType};

use crate::sources::spec::{GitHubRepo, GitReference};

/// Clone `repo` into `dest` and check out `reference`.
///
/// The clone happens in a staging directory next to `dest` and is moved in
/// place once checked out, so `dest` only ever exists complete.
pub fn clone_at(repo: &GitHubRepo, reference: &GitReference, dest: &Path) -> Result<()> {
    let url = repo
        .url()
        .with_context(|| format!("invalid repository URL for {}", repo))?;
    tracing::debug!("cloning {} into {}", url, dest.display());

    let parent = dest
        .parent()
        .with_context(|| format!("{} has no parent directory", dest.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix("couplet-clone")
        .tempdir_in(parent)
        .context("failed to create a staging directory")?;
    let checkout_path = staging.path().join("checkout");

    let repository = Repository::clone(url.as_str(), &checkout_path)
        .with_context(|| format!("failed to clone {}", url))?;
    checkout(&repository, reference)
        .with_context(|| format!("failed to check out {} of {}", reference, repo))?;
    drop(repository);

    std::fs::rename(&checkout_path, dest).with_context(|| {
        format!(
            "failed to move {} to {}",
            checkout_path.display(),
            dest.display()
        )
    })?;
    Ok(())
}

fn checkout(repo: &Repository, reference: &GitReference) -> Result<()> {
    let commit = match reference {
        GitReference::DefaultBranch => return Ok(()),
        GitReference::Tag(tag) => repo
            .find_reference(&format!("refs/tags/{}", tag))?
            .peel_to_commit()?,
        GitReference::Rev(rev) => {
            let oid = git2::Oid::from_str(rev)?;
            repo.find_commit(oid)?
        }
    };

    tracing::trace!("resetting to {}", commit.id());
    repo.reset(commit.as_object(), ResetType::Hard, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        std::fs::write(workdir.join(name), contents).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("Couplet", "couplet@example.com").unwrap();

        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_checkout_rev() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path().join("origin")).unwrap();
        let first = commit_file(&repo, "stb_image.h", "v1", "first");
        commit_file(&repo, "stb_image.h", "v2", "second");

        checkout(&repo, &GitReference::Rev(first.to_string())).unwrap();

        let contents =
            std::fs::read_to_string(repo.workdir().unwrap().join("stb_image.h")).unwrap();
        assert_eq!(contents, "v1");
    }

    #[test]
    fn test_checkout_tag() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path().join("origin")).unwrap();
        let first = commit_file(&repo, "version.txt", "3.3.2", "release");
        let object = repo.find_object(first, None).unwrap();
        repo.tag_lightweight("3.3.2", &object, false).unwrap();
        commit_file(&repo, "version.txt", "3.4.0-dev", "next");

        checkout(&repo, &GitReference::Tag("3.3.2".to_string())).unwrap();

        let contents =
            std::fs::read_to_string(repo.workdir().unwrap().join("version.txt")).unwrap();
        assert_eq!(contents, "3.3.2");
    }
}
