//! CMake package dependencies.

use anyhow::Result;

use crate::builder::cmake::CMakeBuilder;
use crate::builder::context::BuildContext;
use crate::core::dependency::{DependencyDescriptor, DependencyKey, VersionData};
use crate::sources::SourceSpec;

/// A dependency configured, built and installed with CMake into the
/// dependencies root.
#[derive(Debug, Clone)]
pub struct CMakeDependency {
    key: DependencyKey,
    name: String,
    version: String,
    source: SourceSpec,
    definitions: Vec<(String, String)>,
    version_data: Option<VersionData>,
}

impl CMakeDependency {
    pub fn new(
        key: &str,
        name: impl Into<String>,
        version: impl Into<String>,
        source: SourceSpec,
    ) -> Self {
        CMakeDependency {
            key: DependencyKey::new(key),
            name: name.into(),
            version: version.into(),
            source,
            definitions: Vec::new(),
            version_data: None,
        }
    }

    /// Pass a `-D<name>=<value>` cache entry to the configure step.
    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.push((name.into(), value.into()));
        self
    }

    /// Record a value next to the version; a change in it forces a rebuild.
    pub fn version_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.version_data
            .get_or_insert_with(VersionData::new)
            .insert(key.into(), value.into());
        self
    }
}

impl DependencyDescriptor for CMakeDependency {
    fn key(&self) -> &DependencyKey {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn custom_version_data(&self) -> Option<VersionData> {
        self.version_data.clone()
    }

    fn source(&self) -> Option<SourceSpec> {
        Some(self.source.clone())
    }

    fn build(&self, ctx: &BuildContext) -> Result<Option<VersionData>> {
        let build_dir = ctx.layout.dependency_build_dir(&self.key);
        ctx.fs.remove_tree(&build_dir)?;

        CMakeBuilder::new(
            ctx,
            ctx.layout.dependency_source_dir(&self.key, &self.version),
            &build_dir,
        )
        .install_prefix(&ctx.layout.dependencies_root)
        .defines(self.definitions.iter().cloned())
        .configure_build_install()?;

        Ok(self.version_data.clone())
    }
}
