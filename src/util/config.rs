//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.couplet/config.toml` - User-wide defaults
//! - Project: `<source root>/.couplet/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::options::{BuildVariant, CmakeGenerator, CompilerToolchain};

/// Couplet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// GitHub API settings
    pub github: GitHubConfig,

    /// Path overrides
    pub paths: PathsConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = number of CPUs)
    pub jobs: Option<usize>,

    /// Default build variant (debug, release, ...)
    pub build_variant: Option<String>,

    /// Default CMake generator (ninja, make)
    pub cmake_generator: Option<String>,

    /// Default compiler toolchain (clang, gcc)
    pub compiler_toolchain: Option<String>,
}

/// GitHub API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// User agent sent with API requests
    pub user_agent: Option<String>,

    /// OAuth token for API requests
    pub api_token: Option<String>,
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Build root, relative paths are resolved against the source root
    pub build_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't
    /// exist or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.build_variant.is_some() {
            self.build.build_variant = other.build.build_variant;
        }
        if other.build.cmake_generator.is_some() {
            self.build.cmake_generator = other.build.cmake_generator;
        }
        if other.build.compiler_toolchain.is_some() {
            self.build.compiler_toolchain = other.build.compiler_toolchain;
        }

        if other.github.user_agent.is_some() {
            self.github.user_agent = other.github.user_agent;
        }
        if other.github.api_token.is_some() {
            self.github.api_token = other.github.api_token;
        }

        if other.paths.build_root.is_some() {
            self.paths.build_root = other.paths.build_root;
        }
    }

    /// Parse the build variant, ignoring unknown values with a warning.
    pub fn build_variant(&self) -> Option<BuildVariant> {
        parse_setting("build.build_variant", self.build.build_variant.as_deref())
    }

    /// Parse the CMake generator, ignoring unknown values with a warning.
    pub fn cmake_generator(&self) -> Option<CmakeGenerator> {
        parse_setting("build.cmake_generator", self.build.cmake_generator.as_deref())
    }

    /// Parse the compiler toolchain, ignoring unknown values with a warning.
    pub fn compiler_toolchain(&self) -> Option<CompilerToolchain> {
        parse_setting(
            "build.compiler_toolchain",
            self.build.compiler_toolchain.as_deref(),
        )
    }
}

fn parse_setting<T>(name: &str, value: Option<&str>) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("ignoring config value `{}`: {}", name, e);
            None
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.couplet/config.toml)
/// 2. Global config (~/.couplet/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global couplet config directory (~/.couplet).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".couplet"))
}

/// Get the global config path (~/.couplet/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.couplet/config.toml).
pub fn project_config_path(source_root: &Path) -> PathBuf {
    source_root.join(".couplet").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.jobs.is_none());
        assert!(config.github.api_token.is_none());
        assert!(config.paths.build_root.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
jobs = 8
build_variant = "release"
cmake_generator = "make"

[github]
user_agent = "couplet-ci"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.build_variant(), Some(BuildVariant::Release));
        assert_eq!(config.cmake_generator(), Some(CmakeGenerator::Make));
        assert_eq!(config.github.user_agent.as_deref(), Some("couplet-ci"));
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\njobs = ").unwrap();

        let config = Config::load_or_default(&config_path);
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_unknown_setting_value_is_ignored() {
        let mut config = Config::default();
        config.build.compiler_toolchain = Some("msvc".to_string());

        assert_eq!(config.compiler_toolchain(), None);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
jobs = 2
build_variant = "debug"

[github]
api_token = "global-token"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[build]
build_variant = "release"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert_eq!(config.build_variant(), Some(BuildVariant::Release));
        assert_eq!(config.build.jobs, Some(2));
        assert_eq!(config.github.api_token.as_deref(), Some("global-token"));
    }
}
