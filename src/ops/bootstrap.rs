//! The dependency bootstrap: fetch the sources of out-of-date dependencies
//! and run the dependency pass.

use anyhow::{Context, Result};

use crate::builder::context::BuildContext;
use crate::core::registry::DependencyRegistry;
use crate::deps::{DependencyWalker, LedgerStore, VersionLedger};
use crate::util::shell::Status;

/// Fetch the source of every dependency the ledger doesn't satisfy and
/// that has no source tree yet.
pub fn fetch_sources(
    registry: &DependencyRegistry,
    ledger: &VersionLedger,
    ctx: &BuildContext,
) -> Result<usize> {
    let mut fetched = 0;

    for descriptor in registry.iter() {
        let key = descriptor.key();
        if descriptor.is_satisfied(ledger.get(key), &ctx.target) {
            continue;
        }

        let Some(spec) = descriptor.source() else {
            continue;
        };
        let dest = ctx.layout.dependency_source_dir(key, descriptor.version());
        if dest.exists() {
            tracing::debug!(
                "the source of {} is already at {}",
                descriptor.display_name(),
                dest.display()
            );
            continue;
        }

        ctx.fetcher
            .fetch(&spec, &dest, &ctx.auth)
            .with_context(|| format!("failed to fetch the source of {}", descriptor.display_name()))?;
        fetched += 1;
    }

    Ok(fetched)
}

/// Bring every declared dependency up to date for the context's target.
pub fn bootstrap<S: LedgerStore>(
    registry: &DependencyRegistry,
    ctx: &BuildContext,
    store: &mut S,
) -> Result<VersionLedger> {
    let span = ctx.shell.span(Status::Building, "dependencies");

    let ledger = store.load()?;
    fetch_sources(registry, &ledger, ctx)?;
    let ledger = DependencyWalker::new(registry, ctx, store).run(ledger)?;

    span.finish_with_message(format!("{} dependencies", ledger.len()));
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::{DependencyDescriptor, DependencyKey, VersionData};
    use crate::core::target::TargetId;
    use crate::deps::VersionRecord;
    use crate::sources::{GitHubRepo, SourceSpec};
    use crate::deps::JsonLedgerFile;
    use crate::test_support::{
        test_context, test_context_with_fetcher, CheckoutFetcher, NoopFetcher, RecordingStore,
        ScriptedDependency,
    };
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// A scripted dependency that also declares a source.
    struct Fetchable(ScriptedDependency);

    impl DependencyDescriptor for Fetchable {
        fn key(&self) -> &DependencyKey {
            self.0.key()
        }

        fn display_name(&self) -> &str {
            self.0.display_name()
        }

        fn version(&self) -> &str {
            self.0.version()
        }

        fn source(&self) -> Option<SourceSpec> {
            Some(SourceSpec::git_tag(
                GitHubRepo::new("example", self.0.key().as_str()),
                self.0.version(),
            ))
        }

        fn build(&self, ctx: &BuildContext) -> anyhow::Result<Option<VersionData>> {
            self.0.build(ctx)
        }
    }

    #[test]
    fn test_only_unsatisfied_sources_are_fetched() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(NoopFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());

        let registry = DependencyRegistry::new(vec![
            Box::new(Fetchable(ScriptedDependency::new("glfw", "3.3.2"))),
            Box::new(Fetchable(ScriptedDependency::new("glad", "0.1.33"))),
        ])
        .unwrap();

        let mut ledger = VersionLedger::new();
        ledger.record(
            "glfw".into(),
            VersionRecord::new("3.3.2", TargetId::new("linux-x86_64"), None),
        );

        let fetched = fetch_sources(&registry, &ledger, &ctx).unwrap();

        assert_eq!(fetched, 1);
        let requests = fetcher.fetched();
        assert_eq!(
            requests[0].1,
            ctx.layout.dependency_source_dir(&"glad".into(), "0.1.33")
        );
    }

    #[test]
    fn test_present_sources_are_not_refetched() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(NoopFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());
        std::fs::create_dir_all(ctx.layout.dependency_source_dir(&"glad".into(), "0.1.33"))
            .unwrap();

        let registry = DependencyRegistry::new(vec![Box::new(Fetchable(
            ScriptedDependency::new("glad", "0.1.33"),
        ))])
        .unwrap();

        assert_eq!(fetch_sources(&registry, &VersionLedger::new(), &ctx).unwrap(), 0);
        assert!(fetcher.fetched().is_empty());
    }

    /// A dependency whose build reads the `SOURCE` stamp of its checkout.
    struct Checkout {
        key: DependencyKey,
        version: String,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Checkout {
        fn new(key: &str, version: &str, seen: &Arc<Mutex<Vec<String>>>) -> Self {
            Checkout {
                key: key.into(),
                version: version.to_string(),
                seen: Arc::clone(seen),
            }
        }
    }

    impl DependencyDescriptor for Checkout {
        fn key(&self) -> &DependencyKey {
            &self.key
        }

        fn display_name(&self) -> &str {
            self.key.as_str()
        }

        fn version(&self) -> &str {
            &self.version
        }

        fn source(&self) -> Option<SourceSpec> {
            Some(SourceSpec::git_tag(
                GitHubRepo::new("example", self.key.as_str()),
                self.version.as_str(),
            ))
        }

        fn build(&self, ctx: &BuildContext) -> anyhow::Result<Option<VersionData>> {
            let stamp = ctx
                .layout
                .dependency_source_dir(&self.key, &self.version)
                .join("SOURCE");
            self.seen.lock().unwrap().push(std::fs::read_to_string(stamp)?);
            Ok(None)
        }
    }

    #[test]
    fn test_version_bump_fetches_new_source() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(NoopFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());
        std::fs::create_dir_all(ctx.layout.dependency_source_dir(&"glfw".into(), "3.3.1"))
            .unwrap();

        let registry = DependencyRegistry::new(vec![Box::new(Fetchable(
            ScriptedDependency::new("glfw", "3.3.2"),
        ))])
        .unwrap();
        let mut ledger = VersionLedger::new();
        ledger.record(
            "glfw".into(),
            VersionRecord::new("3.3.1", TargetId::new("linux-x86_64"), None),
        );

        assert_eq!(fetch_sources(&registry, &ledger, &ctx).unwrap(), 1);
        assert_eq!(
            fetcher.fetched()[0].1,
            ctx.layout.dependency_source_dir(&"glfw".into(), "3.3.2")
        );
    }

    #[test]
    fn test_rerun_after_version_bump_builds_new_checkout() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(CheckoutFetcher::default());
        let ctx = test_context_with_fetcher(tmp.path(), "linux-x86_64", fetcher.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = DependencyRegistry::new(vec![Box::new(Checkout::new("glfw", "3.3.1", &seen))])
            .unwrap();
        let mut store = JsonLedgerFile::new(&ctx.layout.ledger_path);
        bootstrap(&first, &ctx, &mut store).unwrap();

        let second = DependencyRegistry::new(vec![Box::new(Checkout::new("glfw", "3.3.2", &seen))])
            .unwrap();
        let mut store = JsonLedgerFile::new(&ctx.layout.ledger_path);
        let ledger = bootstrap(&second, &ctx, &mut store).unwrap();

        assert_eq!(fetcher.fetched().len(), 2);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("tag 3.3.1"));
        assert!(seen[1].contains("tag 3.3.2"));

        let reloaded = JsonLedgerFile::new(&ctx.layout.ledger_path).load().unwrap();
        assert_eq!(reloaded.get(&"glfw".into()).map(|r| r.version.as_str()), Some("3.3.2"));
        assert_eq!(reloaded, ledger);
    }

    #[test]
    fn test_bootstrap_builds_and_records() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_context(tmp.path(), "linux-x86_64");
        let lib = ScriptedDependency::new("liba", "1.0");
        let builds = lib.build_counter();
        let registry = DependencyRegistry::new(vec![lib.boxed()]).unwrap();

        let mut store = RecordingStore::default();
        let ledger = bootstrap(&registry, &ctx, &mut store).unwrap();

        assert_eq!(builds.get(), 1);
        assert!(ledger.get(&"liba".into()).is_some());
        assert_eq!(store.flushes().len(), 2);
    }
}
