//! Header-only dependencies.

use anyhow::{Context, Result};

use crate::builder::context::BuildContext;
use crate::core::dependency::{DependencyDescriptor, DependencyKey, VersionData};
use crate::sources::SourceSpec;

/// A dependency installed by copying headers into the include directory
/// of the dependencies root.
#[derive(Debug, Clone)]
pub struct HeaderOnlyDependency {
    key: DependencyKey,
    name: String,
    version: String,
    source: SourceSpec,
    headers: Vec<String>,
}

impl HeaderOnlyDependency {
    pub fn new(
        key: &str,
        name: impl Into<String>,
        version: impl Into<String>,
        source: SourceSpec,
    ) -> Self {
        HeaderOnlyDependency {
            key: DependencyKey::new(key),
            name: name.into(),
            version: version.into(),
            source,
            headers: Vec::new(),
        }
    }

    /// Add a header, relative to the source root, to install.
    pub fn header(mut self, path: impl Into<String>) -> Self {
        self.headers.push(path.into());
        self
    }
}

impl DependencyDescriptor for HeaderOnlyDependency {
    fn key(&self) -> &DependencyKey {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn source(&self) -> Option<SourceSpec> {
        Some(self.source.clone())
    }

    fn build(&self, ctx: &BuildContext) -> Result<Option<VersionData>> {
        let source_dir = ctx.layout.dependency_source_dir(&self.key, &self.version);
        let include_dir = ctx.layout.dependencies_root.join("include");
        ctx.fs.makedirs(&include_dir)?;

        for header in &self.headers {
            let file_name = std::path::Path::new(header)
                .file_name()
                .with_context(|| format!("invalid header path `{}`", header))?;
            ctx.fs
                .copy(&source_dir.join(header), &include_dir.join(file_name))
                .with_context(|| format!("failed to install {}", header))?;
        }

        Ok(None)
    }
}
