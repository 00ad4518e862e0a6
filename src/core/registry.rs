//! The dependency registry.
//!
//! An explicit, ordered table of descriptors assembled once per run. The
//! declaration order is the order the dependency pass walks in.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::dependency::{DependencyDescriptor, DependencyKey};
use crate::deps::ledger::check_version_data;
use crate::deps::DependencyError;

/// Registry of all declared dependencies.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    descriptors: Vec<Box<dyn DependencyDescriptor>>,
    index: HashMap<DependencyKey, usize>,
}

impl DependencyRegistry {
    /// Assemble a registry from descriptors in declaration order.
    ///
    /// Fails on duplicate keys, on prerequisite keys that no descriptor
    /// declares and on version data that uses a reserved ledger key.
    pub fn new(descriptors: Vec<Box<dyn DependencyDescriptor>>) -> Result<Self, DependencyError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.key().clone(), i).is_some() {
                return Err(DependencyError::DuplicateKey {
                    key: descriptor.key().to_string(),
                });
            }
        }

        for descriptor in &descriptors {
            for prerequisite in descriptor.prerequisites() {
                if !index.contains_key(prerequisite) {
                    return Err(DependencyError::UnknownDependency {
                        key: prerequisite.to_string(),
                        dependent: descriptor.key().to_string(),
                    });
                }
            }
            if let Some(data) = descriptor.custom_version_data() {
                check_version_data(descriptor.display_name(), &data)?;
            }
        }

        Ok(DependencyRegistry { descriptors, index })
    }

    /// Look a descriptor up by key.
    pub fn get(&self, key: &DependencyKey) -> Option<&dyn DependencyDescriptor> {
        self.index.get(key).map(|&i| self.descriptors[i].as_ref())
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn DependencyDescriptor> {
        self.descriptors.iter().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Compute an order in which every dependency comes after its
    /// prerequisites.
    pub fn build_order(&self) -> Result<Vec<&dyn DependencyDescriptor>, DependencyError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.descriptors.len())
            .map(|i| graph.add_node(i))
            .collect();

        for (i, descriptor) in self.descriptors.iter().enumerate() {
            for prerequisite in descriptor.prerequisites() {
                let &p = self.index.get(prerequisite).ok_or_else(|| {
                    DependencyError::UnknownDependency {
                        key: prerequisite.to_string(),
                        dependent: descriptor.key().to_string(),
                    }
                })?;
                graph.add_edge(nodes[p], nodes[i], ());
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| DependencyError::Cycle {
            path: self.cycle_path(graph[cycle.node_id()]),
        })?;

        Ok(sorted
            .into_iter()
            .map(|node| self.descriptors[graph[node]].as_ref())
            .collect())
    }

    /// Follow prerequisites from `start` back to itself, giving the keys
    /// along the way with `start` at both ends.
    fn cycle_path(&self, start: usize) -> Vec<String> {
        let mut path = vec![start];
        let mut visited = HashSet::from([start]);
        if !self.find_path_back(start, &mut path, &mut visited) {
            path.truncate(1);
        }
        path.push(start);
        path.into_iter()
            .map(|i| self.descriptors[i].key().to_string())
            .collect()
    }

    fn find_path_back(
        &self,
        start: usize,
        path: &mut Vec<usize>,
        visited: &mut HashSet<usize>,
    ) -> bool {
        let Some(&current) = path.last() else {
            return false;
        };
        for prerequisite in self.descriptors[current].prerequisites() {
            let Some(&next) = self.index.get(prerequisite) else {
                continue;
            };
            if next == start {
                return true;
            }
            if visited.insert(next) {
                path.push(next);
                if self.find_path_back(start, path, visited) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedDependency;

    #[test]
    fn test_registry_lookup_and_order() {
        let registry = DependencyRegistry::new(vec![
            ScriptedDependency::new("liba", "1.0").boxed(),
            ScriptedDependency::new("libb", "2.0").boxed(),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&"libb".into()).is_some());
        assert!(registry.get(&"libc".into()).is_none());

        let keys: Vec<_> = registry.iter().map(|d| d.key().to_string()).collect();
        assert_eq!(keys, vec!["liba", "libb"]);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let result = DependencyRegistry::new(vec![
            ScriptedDependency::new("liba", "1.0").boxed(),
            ScriptedDependency::new("liba", "2.0").boxed(),
        ]);
        assert!(matches!(result, Err(DependencyError::DuplicateKey { .. })));
    }

    #[test]
    fn test_registry_rejects_unknown_prerequisite() {
        let result = DependencyRegistry::new(vec![ScriptedDependency::new("liba", "1.0")
            .requires("missing")
            .boxed()]);
        assert!(matches!(
            result,
            Err(DependencyError::UnknownDependency { ref key, .. }) if key == "missing"
        ));
    }

    #[test]
    fn test_build_order_puts_prerequisites_first() {
        let registry = DependencyRegistry::new(vec![
            ScriptedDependency::new("app", "1.0").requires("glfw").boxed(),
            ScriptedDependency::new("glfw", "3.3").boxed(),
        ])
        .unwrap();

        let order: Vec<_> = registry
            .build_order()
            .unwrap()
            .into_iter()
            .map(|d| d.key().to_string())
            .collect();
        assert_eq!(order, vec!["glfw", "app"]);
    }

    #[test]
    fn test_build_order_reports_cycle() {
        let registry = DependencyRegistry::new(vec![
            ScriptedDependency::new("a", "1").requires("b").boxed(),
            ScriptedDependency::new("b", "1").requires("a").boxed(),
        ])
        .unwrap();

        let Err(DependencyError::Cycle { path }) = registry.build_order() else {
            panic!("expected a cycle error");
        };
        assert!(path == ["a", "b", "a"] || path == ["b", "a", "b"], "{:?}", path);
    }

    #[test]
    fn test_build_order_reports_whole_cycle_behind_a_dependent() {
        let registry = DependencyRegistry::new(vec![
            ScriptedDependency::new("app", "1").requires("a").boxed(),
            ScriptedDependency::new("a", "1").requires("b").boxed(),
            ScriptedDependency::new("b", "1").requires("c").boxed(),
            ScriptedDependency::new("c", "1").requires("a").boxed(),
        ])
        .unwrap();

        let Err(DependencyError::Cycle { path }) = registry.build_order() else {
            panic!("expected a cycle error");
        };
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), path.last());
        assert!(!path.contains(&"app".to_string()));
        for key in ["a", "b", "c"] {
            assert!(path.contains(&key.to_string()));
        }
    }

    #[test]
    fn test_registry_rejects_reserved_version_data() {
        let result = DependencyRegistry::new(vec![ScriptedDependency::new("glfw", "3.3.2")
            .with_extra("version", "3.3.1")
            .boxed()]);
        assert!(matches!(
            result,
            Err(DependencyError::ReservedVersionData { ref key, .. }) if key == "version"
        ));
    }
}
