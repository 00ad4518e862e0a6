//! Source fetching.
//!
//! Dependency and tool sources come from GitHub, either as git checkouts or
//! as release archives.

pub mod git;
pub mod release;
pub mod source;
pub mod spec;

pub use source::{GitHubFetcher, SourceFetcher};
pub use spec::{GitHubAuth, GitHubRepo, GitReference, SourceSpec};
