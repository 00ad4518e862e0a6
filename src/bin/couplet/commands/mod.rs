//! Command implementations

pub mod completions;
pub mod compose;
pub mod configure;
pub mod preset;
pub mod status;

use couplet::sources::GitHubAuth;
use couplet::util::config::Config;

use crate::cli::Cli;

/// Environment variable read when no API token is given otherwise.
const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Resolve the GitHub credentials: CLI > config > environment.
pub fn github_auth(cli: &Cli, config: &Config) -> GitHubAuth {
    let user_agent = cli
        .github_user_agent
        .clone()
        .or_else(|| config.github.user_agent.clone());
    let api_token = cli
        .github_api_token
        .clone()
        .or_else(|| config.github.api_token.clone())
        .or_else(|| std::env::var(TOKEN_ENV).ok());
    GitHubAuth::new(user_agent, api_token)
}

/// Resolve the number of build jobs: CLI > config > available cores.
pub fn jobs(cli: &Cli, config: &Config) -> usize {
    cli.jobs
        .or(config.build.jobs)
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
}
