//! Build target and host system identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The system a build runs on.
///
/// Selects the strategy used to look tools up from the host and the
/// layout of locally installed tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostSystem {
    Darwin,
    Linux,
    Windows,
    /// Any other system; host tool lookup always fails on these.
    Other(String),
}

impl HostSystem {
    /// Detect the system this process runs on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust `target_os` name to a host system.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "darwin" => HostSystem::Darwin,
            "linux" => HostSystem::Linux,
            "windows" => HostSystem::Windows,
            other => HostSystem::Other(other.to_string()),
        }
    }

    /// Get the system name as used in target identifiers.
    pub fn as_str(&self) -> &str {
        match self {
            HostSystem::Darwin => "darwin",
            HostSystem::Linux => "linux",
            HostSystem::Windows => "windows",
            HostSystem::Other(name) => name,
        }
    }

    /// Suffix appended to executable file names.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            HostSystem::Windows => ".exe",
            _ => "",
        }
    }

    /// Append the executable suffix to a tool name.
    pub fn exe_name(&self, name: &str) -> String {
        format!("{}{}", name, self.exe_suffix())
    }
}

impl fmt::Display for HostSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the platform a build or tool artifact is produced for.
///
/// Host-resolved identifiers have the form `<system>-<arch>`, e.g.
/// `linux-x86_64`. Identifiers given on the command line are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Create a target identifier from a string.
    pub fn new(id: impl Into<String>) -> Self {
        TargetId(id.into())
    }

    /// Resolve the target of the running host.
    pub fn host() -> Self {
        TargetId(format!(
            "{}-{}",
            HostSystem::current().as_str(),
            std::env::consts::ARCH
        ))
    }

    /// Get the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The system component (text before the first `-`).
    pub fn system(&self) -> &str {
        self.0.split_once('-').map(|(s, _)| s).unwrap_or(&self.0)
    }

    /// The architecture component (text after the first `-`), if any.
    pub fn arch(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, a)| a)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("target must not be empty".to_string());
        }
        if s.chars().any(char::is_whitespace) {
            return Err(format!("invalid target '{}': contains whitespace", s));
        }
        Ok(TargetId(s.to_string()))
    }
}
