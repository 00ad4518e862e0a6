//! The dependency graph walker.
//!
//! Walks the registry in declaration order and builds every dependency the
//! ledger does not satisfy for the current target. Prerequisites are built
//! depth-first on demand, so a dependency is always built after the
//! dependencies it requires. Each dependency is built at most once per
//! pass, and the ledger is flushed after every build and once more at the
//! end of the pass.

use std::collections::HashSet;

use crate::builder::context::BuildContext;
use crate::core::dependency::{DependencyDescriptor, DependencyKey};
use crate::core::registry::DependencyRegistry;
use crate::deps::ledger::{check_version_data, LedgerStore, VersionLedger, VersionRecord};
use crate::deps::DependencyError;
use crate::util::shell::Status;

/// One dependency pass over a registry.
pub struct DependencyWalker<'a, S: LedgerStore> {
    registry: &'a DependencyRegistry,
    ctx: &'a BuildContext,
    store: &'a mut S,
    /// Dependencies finished during this pass (built or skipped)
    built: HashSet<DependencyKey>,
    /// Dependencies whose prerequisites are being walked
    visiting: Vec<DependencyKey>,
}

impl<'a, S: LedgerStore> DependencyWalker<'a, S> {
    pub fn new(registry: &'a DependencyRegistry, ctx: &'a BuildContext, store: &'a mut S) -> Self {
        DependencyWalker {
            registry,
            ctx,
            store,
            built: HashSet::new(),
            visiting: Vec::new(),
        }
    }

    /// Run the pass and return the updated ledger.
    ///
    /// The first failing build aborts the pass; dependencies built before
    /// it stay recorded in the persisted ledger.
    pub fn run(mut self, mut ledger: VersionLedger) -> Result<VersionLedger, DependencyError> {
        tracing::debug!("starting to build the dependencies");

        let registry = self.registry;
        for descriptor in registry.iter() {
            self.build_one(descriptor, &mut ledger)?;
        }

        self.store.flush(&ledger, true)?;
        Ok(ledger)
    }

    fn build_one(
        &mut self,
        descriptor: &dyn DependencyDescriptor,
        ledger: &mut VersionLedger,
    ) -> Result<(), DependencyError> {
        let key = descriptor.key();

        if self.built.contains(key) {
            tracing::debug!("{} is already built", descriptor.display_name());
            return Ok(());
        }

        if let Some(start) = self.visiting.iter().position(|k| k == key) {
            let mut path: Vec<String> = self.visiting[start..]
                .iter()
                .map(|k| k.to_string())
                .collect();
            path.push(key.to_string());
            return Err(DependencyError::Cycle { path });
        }

        let target = &self.ctx.target;
        if descriptor.is_satisfied(ledger.get(key), target) {
            tracing::debug!(
                "{} {} is already built for {}",
                descriptor.display_name(),
                descriptor.version(),
                target
            );
            self.ctx.shell.status(
                Status::Skipped,
                format!("{} {}", descriptor.display_name(), descriptor.version()),
            );
        } else {
            self.build_missing(descriptor, ledger)?;
        }

        self.built.insert(key.clone());
        Ok(())
    }

    fn build_missing(
        &mut self,
        descriptor: &dyn DependencyDescriptor,
        ledger: &mut VersionLedger,
    ) -> Result<(), DependencyError> {
        let key = descriptor.key();

        if !descriptor.source_available(self.ctx) {
            return Err(DependencyError::MissingSource {
                name: descriptor.display_name().to_string(),
                path: self
                    .ctx
                    .layout
                    .dependency_source_dir(key, descriptor.version()),
            });
        }

        let prerequisites = descriptor.prerequisites();
        if !prerequisites.is_empty() {
            tracing::debug!(
                "{} depends on {}",
                descriptor.display_name(),
                prerequisites
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        self.visiting.push(key.clone());
        for prerequisite in prerequisites {
            if self.built.contains(prerequisite) {
                tracing::trace!("{} is already built", prerequisite);
                continue;
            }
            tracing::trace!("{} isn't built yet", prerequisite);

            let registry = self.registry;
            let required = registry.get(prerequisite).ok_or_else(|| {
                DependencyError::UnknownDependency {
                    key: prerequisite.to_string(),
                    dependent: key.to_string(),
                }
            })?;
            self.build_one(required, ledger)?;
        }
        self.visiting.pop();

        self.ctx.shell.status(
            Status::Building,
            format!("{} {}", descriptor.display_name(), descriptor.version()),
        );

        let extra = descriptor
            .build(self.ctx)
            .map_err(|e| DependencyError::BuildStepFailure {
                name: descriptor.display_name().to_string(),
                source: e.into(),
            })?;

        if let Some(extra) = &extra {
            check_version_data(descriptor.display_name(), extra)?;
            for (name, value) in extra {
                tracing::trace!("adding `{}` with the value {} to the version data", name, value);
            }
        }

        ledger.record(
            key.clone(),
            VersionRecord::new(descriptor.version(), self.ctx.target.clone(), extra),
        );
        self.store.flush(ledger, false)
    }
}

/// Run a dependency pass: load the ledger, walk the registry and persist
/// the result.
pub fn run_dependency_pass<S: LedgerStore>(
    registry: &DependencyRegistry,
    ctx: &BuildContext,
    store: &mut S,
) -> Result<VersionLedger, DependencyError> {
    let ledger = store.load()?;
    DependencyWalker::new(registry, ctx, store).run(ledger)
}
