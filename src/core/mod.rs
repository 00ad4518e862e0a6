//! Core data types: targets, build options, dependency descriptors and
//! the registry that holds them.

pub mod dependency;
pub mod options;
pub mod registry;
pub mod target;

pub use dependency::{DependencyDescriptor, DependencyKey, VersionData};
pub use options::{BuildVariant, CmakeGenerator, CompilerToolchain};
pub use registry::DependencyRegistry;
pub use target::{HostSystem, TargetId};
