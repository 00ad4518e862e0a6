//! Dependency pass error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error raised while assembling the registry or running a dependency pass.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DependencyError {
    #[error("the source of {name} is missing: {}", path.display())]
    #[diagnostic(code(couplet::deps::missing_source))]
    MissingSource { name: String, path: PathBuf },

    #[error("dependency cycle detected: {}", path.join(" -> "))]
    #[diagnostic(code(couplet::deps::cycle))]
    Cycle { path: Vec<String> },

    #[error("`{dependent}` requires unknown dependency `{key}`")]
    #[diagnostic(code(couplet::deps::unknown))]
    UnknownDependency { key: String, dependent: String },

    #[error("dependency `{key}` is declared more than once")]
    #[diagnostic(code(couplet::deps::duplicate))]
    DuplicateKey { key: String },

    #[error("failed to build {name}")]
    #[diagnostic(code(couplet::deps::build_failed))]
    BuildStepFailure {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("the version file {} is malformed", path.display())]
    #[diagnostic(code(couplet::deps::malformed_ledger))]
    MalformedLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize the dependency versions for {}", path.display())]
    #[diagnostic(code(couplet::deps::ledger_serialize))]
    LedgerSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} records `{key}` in its version data, which names a ledger field")]
    #[diagnostic(code(couplet::deps::reserved_version_data))]
    ReservedVersionData { name: String, key: String },

    #[error("failed to access the version file {}", path.display())]
    #[diagnostic(code(couplet::deps::ledger_io))]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DependencyError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DependencyError::MissingSource { name, path } => {
                Diagnostic::error(format!("the source of {} is missing", name))
                    .with_location(path)
                    .with_suggestion("Run the invocation again without `--dry-run` to fetch it")
                    .with_suggestion("Remove the temporary directory under the build root")
            }

            DependencyError::Cycle { path } => {
                Diagnostic::error("dependency cycle detected")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_suggestion("Remove one of the prerequisite declarations in the cycle")
            }

            DependencyError::UnknownDependency { key, dependent } => Diagnostic::error(format!(
                "`{}` requires `{}`, which is not declared",
                dependent, key
            ))
            .with_suggestion(format!("Declare `{}` in the dependency registry", key)),

            DependencyError::DuplicateKey { key } => {
                Diagnostic::error(format!("dependency `{}` is declared more than once", key))
            }

            DependencyError::BuildStepFailure { name, source } => {
                Diagnostic::error(format!("failed to build {}", name))
                    .with_context(source.to_string())
                    .with_suggestion("Run again with `--print-debug` to see the commands")
            }

            DependencyError::MalformedLedger { path, source } => {
                Diagnostic::error("the dependency version file is malformed")
                    .with_location(path)
                    .with_context(source.to_string())
                    .with_suggestion("Fix the file or remove it to rebuild every dependency")
            }

            DependencyError::LedgerSerialize { path, source } => {
                Diagnostic::error("failed to serialize the dependency versions")
                    .with_location(path)
                    .with_context(source.to_string())
            }

            DependencyError::ReservedVersionData { name, key } => Diagnostic::error(format!(
                "{} records `{}` in its version data",
                name, key
            ))
            .with_context("`version` and `targets` are fields of every ledger entry")
            .with_suggestion(format!("Rename the `{}` key of {}", key, name)),

            DependencyError::LedgerIo { path, source } => {
                Diagnostic::error("failed to access the dependency version file")
                    .with_location(path)
                    .with_context(source.to_string())
            }
        }
    }
}
