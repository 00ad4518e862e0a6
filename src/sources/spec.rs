//! Descriptions of where a source tree comes from.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// A repository hosted on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

impl GitHubRepo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        GitHubRepo {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// HTTPS clone URL of the repository.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("https://github.com/{}/{}.git", self.owner, self.name))
    }

    /// REST API URL of the release with the given tag.
    pub fn release_api_url(&self, tag: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "https://api.github.com/repos/{}/{}/releases/tags/{}",
            self.owner, self.name, tag
        ))
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for GitHubRepo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(GitHubRepo::new(owner, name))
            }
            _ => Err(format!(
                "invalid repository '{}'; expected 'owner/name'",
                s
            )),
        }
    }
}

/// Which commit of a git repository to check out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GitReference {
    DefaultBranch,
    Tag(String),
    Rev(String),
}

impl fmt::Display for GitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitReference::DefaultBranch => f.write_str("default branch"),
            GitReference::Tag(tag) => write!(f, "tag {}", tag),
            GitReference::Rev(rev) => {
                write!(f, "commit {}", rev.chars().take(10).collect::<String>())
            }
        }
    }
}

/// Where to obtain a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A git checkout.
    Git {
        repo: GitHubRepo,
        reference: GitReference,
    },

    /// A `.tar.gz` asset attached to a GitHub release. The archive's single
    /// top-level directory becomes the source tree.
    ReleaseAsset {
        repo: GitHubRepo,
        tag: String,
        asset: String,
        sha256: Option<String>,
    },
}

impl SourceSpec {
    pub fn git_tag(repo: GitHubRepo, tag: impl Into<String>) -> Self {
        SourceSpec::Git {
            repo,
            reference: GitReference::Tag(tag.into()),
        }
    }

    pub fn git_rev(repo: GitHubRepo, rev: impl Into<String>) -> Self {
        SourceSpec::Git {
            repo,
            reference: GitReference::Rev(rev.into()),
        }
    }

    pub fn repo(&self) -> &GitHubRepo {
        match self {
            SourceSpec::Git { repo, .. } | SourceSpec::ReleaseAsset { repo, .. } => repo,
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Git { repo, reference } => write!(f, "{} ({})", repo, reference),
            SourceSpec::ReleaseAsset {
                repo, tag, asset, ..
            } => write!(f, "{} from {} {}", asset, repo, tag),
        }
    }
}

/// Credentials sent to the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubAuth {
    pub user_agent: String,
    pub api_token: Option<String>,
}

impl GitHubAuth {
    pub const DEFAULT_USER_AGENT: &'static str = "couplet-composer";

    pub fn new(user_agent: Option<String>, api_token: Option<String>) -> Self {
        GitHubAuth {
            user_agent: user_agent.unwrap_or_else(|| Self::DEFAULT_USER_AGENT.to_string()),
            api_token: api_token.filter(|t| !t.is_empty()),
        }
    }
}

impl Default for GitHubAuth {
    fn default() -> Self {
        GitHubAuth::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        let repo: GitHubRepo = "glfw/glfw".parse().unwrap();
        assert_eq!(repo, GitHubRepo::new("glfw", "glfw"));
        assert_eq!(repo.url().unwrap().as_str(), "https://github.com/glfw/glfw.git");

        assert!("glfw".parse::<GitHubRepo>().is_err());
        assert!("/glfw".parse::<GitHubRepo>().is_err());
        assert!("a/b/c".parse::<GitHubRepo>().is_err());
    }

    #[test]
    fn test_release_api_url() {
        let repo = GitHubRepo::new("Kitware", "CMake");
        assert_eq!(
            repo.release_api_url("v3.16.4").unwrap().as_str(),
            "https://api.github.com/repos/Kitware/CMake/releases/tags/v3.16.4"
        );
    }

    #[test]
    fn test_auth_defaults() {
        let auth = GitHubAuth::new(None, Some(String::new()));
        assert_eq!(auth.user_agent, "couplet-composer");
        assert!(auth.api_token.is_none());
    }
}
