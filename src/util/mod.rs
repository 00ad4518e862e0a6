//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::{GlobalContext, WorkspaceLayout};
pub use diagnostic::Diagnostic;
pub use fs::FileSystem;
pub use process::{ProcessBuilder, Runner};
pub use shell::Shell;
