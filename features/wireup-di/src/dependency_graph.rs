use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    binding::DuplicatePolicy,
    container::DiContainer,
    registry::Registry,
    types::{DependencyInfo, Key},
};

/// Where the effective binding of a key lives, seen from one container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The container's own registry
    Local,
    /// The parent at this index in the container's parent list
    Parent(usize),
}

/// Linked graph of one container
///
/// Knows the dependencies of every own binding and which container provides every visible key.
/// Used to check for cycles, missing and conflicting bindings before anything is constructed.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    entries: HashMap<Key, DependencyGraphEntry>,
    origins: HashMap<Key, Origin>,
    /// Keys bound by conflicting sibling parents, already reported as such
    conflicted: HashSet<Key>,
}
impl DependencyGraph {
    /// Links a registry against its parents
    ///
    /// Returns every issue found, not only the first one
    pub fn link(registry: &Registry, parents: &[DiContainer]) -> Result<Self, DependencyGraphErrors> {
        let mut graph = Self::default();
        let mut errors = Vec::new();

        for binding in registry.bindings() {
            let key = binding.key();
            graph.entries.insert(
                key,
                DependencyGraphEntry {
                    dependencies: binding.dependencies().to_vec(),
                    scoped: binding.is_scoped(),
                },
            );
            graph.origins.insert(key, Origin::Local);
        }

        for (key, candidates) in inherited_candidates(&graph, parents) {
            match pick_candidate(&candidates) {
                Some(candidate) => {
                    graph.origins.insert(key, Origin::Parent(candidate.parent));
                }
                None => {
                    graph.conflicted.insert(key);
                    errors.push(DependencyGraphError::ConflictingBinding {
                        key,
                        containers: candidates
                            .iter()
                            .map(|candidate| candidate.owner.label().to_string())
                            .collect(),
                    });
                }
            }
        }

        if let Err(check_errors) = graph.check() {
            errors.extend(check_errors.errors);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        tracing::debug!(
            "Linked graph with {} own and {} visible bindings",
            graph.entries.len(),
            graph.origins.len()
        );

        Ok(graph)
    }

    /// Validate the own bindings of the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut walk = Walk::new(self);
        for key in self.sorted_keys() {
            walk.visit(key);
        }
        walk.finish().map(|_| ())
    }

    /// Resolves a single root key through its dependencies
    ///
    /// Returns the own bindings needed for the root, dependencies before dependents.
    /// Bindings provided by parents are not part of the order, they were linked with their parent.
    pub fn link_root(&self, root: &Key) -> Result<Vec<Key>, DependencyGraphErrors> {
        if !self.origins.contains_key(root) {
            return Err(DependencyGraphErrors {
                errors: vec![DependencyGraphError::MissingBinding {
                    dependency: *root,
                    required_by: None,
                }],
            });
        }

        let mut walk = Walk::new(self);
        walk.visit(*root);
        walk.finish()
    }

    /// Every own binding, dependencies before dependents
    pub fn construction_order(&self) -> Result<Vec<Key>, DependencyGraphErrors> {
        let mut walk = Walk::new(self);
        for key in self.sorted_keys() {
            walk.visit(key);
        }
        walk.finish()
    }

    pub fn origin(&self, key: &Key) -> Option<Origin> {
        self.origins.get(key).copied()
    }

    /// All keys that can be resolved through this graph
    pub fn visible_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.origins.keys().copied()
    }

    pub fn dependencies_of(&self, key: &Key) -> Option<&[DependencyInfo]> {
        self.entries
            .get(key)
            .map(|entry| entry.dependencies.as_slice())
    }

    pub fn is_scoped(&self, key: &Key) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.scoped)
    }

    /// Own bindings and their dependencies
    pub fn entries(&self) -> impl Iterator<Item = (&Key, &[DependencyInfo])> + '_ {
        self.entries
            .iter()
            .map(|(key, entry)| (key, entry.dependencies.as_slice()))
    }

    fn sorted_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.entries.keys().copied().collect();
        keys.sort_by_cached_key(Key::to_string);
        keys
    }
}
impl std::fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for key in self.sorted_keys() {
            write!(f, "{key}")?;
            let dependencies = self.dependencies_of(&key).unwrap_or_default();
            for (i, dependency) in dependencies.iter().enumerate() {
                f.write_str(if i == 0 { " -> " } else { ", " })?;
                write!(f, "{}", dependency.key)?;
                if dependency.lazy {
                    f.write_str(" (lazy)")?;
                }
                if dependency.optional {
                    f.write_str(" (optional)")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct DependencyGraphEntry {
    dependencies: Vec<DependencyInfo>,
    scoped: bool,
}

/// A parent able to provide an inherited key
struct Candidate {
    parent: usize,
    owner: DiContainer,
    policy: DuplicatePolicy,
}

/// Collects, per key not bound locally, the distinct containers able to provide it
fn inherited_candidates(
    graph: &DependencyGraph,
    parents: &[DiContainer],
) -> HashMap<Key, Vec<Candidate>> {
    let mut candidates: HashMap<Key, Vec<Candidate>> = HashMap::new();
    for (index, parent) in parents.iter().enumerate() {
        for key in parent.graph().visible_keys() {
            if graph.origins.contains_key(&key) {
                tracing::debug!("{key} from '{}' is shadowed", parent.label());
                continue;
            }
            let Some((owner, binding)) = parent.owner_of(&key) else {
                continue;
            };

            let entry = candidates.entry(key).or_default();
            // Same binding reached through a shared ancestor
            if entry.iter().any(|candidate| candidate.owner.ptr_eq(owner)) {
                continue;
            }
            entry.push(Candidate {
                parent: index,
                owner: owner.clone(),
                policy: binding.duplicate_policy(),
            });
        }
    }
    candidates
}

/// One overriding candidate wins, otherwise the only one not ignoring
fn pick_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    if let [only] = candidates {
        return Some(only);
    }

    let mut overriding = candidates
        .iter()
        .filter(|candidate| candidate.policy == DuplicatePolicy::Override);
    if let (Some(candidate), None) = (overriding.next(), overriding.next()) {
        return Some(candidate);
    }

    let mut kept = candidates
        .iter()
        .filter(|candidate| candidate.policy != DuplicatePolicy::Ignore);
    match (kept.next(), kept.next()) {
        (Some(candidate), None) => Some(candidate),
        _ => None,
    }
}

/// Depth first walk over own bindings
struct Walk<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<Key>,
    chain: Vec<Key>,
    order: Vec<Key>,
    errors: Vec<DependencyGraphError>,
}
impl<'g> Walk<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Walk {
            graph,
            visited: HashSet::new(),
            chain: Vec::new(),
            order: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn visit(&mut self, key: Key) {
        let graph = self.graph;
        // Inherited keys were checked when their container was linked
        let Some(entry) = graph.entries.get(&key) else {
            return;
        };

        // Circular Dependency Check
        if let Some(start) = self.chain.iter().position(|k| *k == key) {
            let from = *self.chain.last().unwrap_or(&key);
            let mut chain = self.chain[start..].to_vec();
            chain.push(key); // Add current so chain is complete

            self.errors.push(DependencyGraphError::CyclicDependency {
                from,
                to: key,
                chain,
            });
            return;
        }

        // Skip other checks if already checked
        if !self.visited.insert(key) {
            return;
        }

        self.chain.push(key);

        for dependency in &entry.dependencies {
            if !graph.origins.contains_key(&dependency.key) {
                if !dependency.optional && !graph.conflicted.contains(&dependency.key) {
                    self.errors.push(DependencyGraphError::MissingBinding {
                        dependency: dependency.key,
                        required_by: Some(key),
                    });
                }
                continue;
            }

            if dependency.lazy {
                // Don't recurse, this will be checked by itself
                continue;
            }

            self.visit(dependency.key);
        }

        self.chain.pop();
        self.order.push(key);
    }

    fn finish(self) -> Result<Vec<Key>, DependencyGraphErrors> {
        if !self.errors.is_empty() {
            return Err(DependencyGraphErrors {
                errors: self.errors,
            });
        }
        Ok(self.order)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("{}", describe_missing(dependency, required_by))]
    MissingBinding {
        dependency: Key,
        required_by: Option<Key>,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {} - Consider using `Lazy`", describe_chain(chain))]
    CyclicDependency { from: Key, to: Key, chain: Vec<Key> },
    #[error("'{key}' is bound by sibling parents {containers:?} and none of them overrides the others")]
    ConflictingBinding { key: Key, containers: Vec<String> },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

fn describe_missing(dependency: &Key, required_by: &Option<Key>) -> String {
    match required_by {
        Some(required_by) => format!("'{required_by}' needs '{dependency}' but it is missing"),
        None => format!("'{dependency}' has no binding"),
    }
}

fn describe_chain(chain: &[Key]) -> String {
    chain
        .iter()
        .map(Key::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{binding::Binding, types::DynError};

    struct A;
    struct B;
    struct C;

    fn bind<T: Send + Sync + 'static>(make: fn() -> T) -> Binding {
        Binding::provider(move |_| Ok::<_, DynError>(make()))
    }

    fn registry(bindings: Vec<Binding>) -> Registry {
        let mut registry = Registry::new();
        for binding in bindings {
            registry.register(binding).unwrap();
        }
        registry
    }

    #[test]
    fn root_order_puts_dependencies_first() {
        let registry = registry(vec![
            bind(|| A).depends_on(DependencyInfo::required(Key::of::<B>())),
            bind(|| B).depends_on(DependencyInfo::required(Key::of::<C>())),
            bind(|| C),
        ]);
        let graph = DependencyGraph::link(&registry, &[]).unwrap();

        let order = graph.link_root(&Key::of::<A>()).unwrap();
        assert_eq!(order, vec![Key::of::<C>(), Key::of::<B>(), Key::of::<A>()]);
    }

    #[test]
    fn cycle_names_the_whole_chain() {
        let registry = registry(vec![
            bind(|| A).depends_on(DependencyInfo::required(Key::of::<B>())),
            bind(|| B).depends_on(DependencyInfo::required(Key::of::<A>())),
        ]);

        let errors = DependencyGraph::link(&registry, &[]).unwrap_err().errors;
        assert_eq!(errors.len(), 1);
        let DependencyGraphError::CyclicDependency { chain, from, to } = &errors[0] else {
            panic!("expected a cycle, got {errors:?}");
        };
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), chain.last());
        assert_eq!(chain.first(), Some(to));
        assert_eq!(chain[1], *from);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let registry =
            registry(vec![bind(|| A).depends_on(DependencyInfo::required(Key::of::<A>()))]);

        let errors = DependencyGraph::link(&registry, &[]).unwrap_err().errors;
        assert!(matches!(
            errors[0],
            DependencyGraphError::CyclicDependency { ref chain, .. } if chain.len() == 2
        ));
    }

    #[test]
    fn lazy_edge_breaks_cycle() {
        let registry = registry(vec![
            bind(|| A).depends_on(DependencyInfo::required(Key::of::<B>())),
            bind(|| B).depends_on(DependencyInfo::lazy(Key::of::<A>())),
        ]);

        assert!(DependencyGraph::link(&registry, &[]).is_ok());
    }

    #[test]
    fn missing_and_optional_dependencies() {
        let registry = registry(vec![
            bind(|| A).depends_on(DependencyInfo::required(Key::of::<B>())),
            bind(|| C).depends_on(DependencyInfo::optional(Key::of::<B>())),
        ]);

        let errors = DependencyGraph::link(&registry, &[]).unwrap_err().errors;
        assert_eq!(
            errors,
            vec![DependencyGraphError::MissingBinding {
                dependency: Key::of::<B>(),
                required_by: Some(Key::of::<A>()),
            }]
        );
    }

    #[test]
    fn lazy_dependency_must_exist() {
        let registry =
            registry(vec![bind(|| A).depends_on(DependencyInfo::lazy(Key::of::<B>()))]);

        assert!(DependencyGraph::link(&registry, &[]).is_err());
    }

    #[test]
    fn unknown_root_is_missing() {
        let graph = DependencyGraph::link(&Registry::new(), &[]).unwrap();

        let errors = graph.link_root(&Key::of::<A>()).unwrap_err().errors;
        assert_eq!(
            errors,
            vec![DependencyGraphError::MissingBinding {
                dependency: Key::of::<A>(),
                required_by: None,
            }]
        );
    }

    #[test]
    fn all_errors_are_reported() {
        let registry = registry(vec![
            bind(|| A).depends_on(DependencyInfo::required(Key::of::<A>())),
            bind(|| B).depends_on(DependencyInfo::required(Key::named::<C>("missing"))),
        ]);

        let errors = DependencyGraph::link(&registry, &[]).unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.to_string().starts_with("The dependency graph had one or more errors:"));
    }

    #[test]
    fn conflicting_dependency_is_only_reported_as_conflict() {
        let parent = |label: &'static str| {
            crate::builder::DiBuilder::new()
                .label(label)
                .add_instance(1_u32)
                .build()
                .unwrap()
        };
        let registry = registry(vec![
            bind(|| 2_u64).depends_on(DependencyInfo::required(Key::of::<u32>())),
        ]);

        let errors = DependencyGraph::link(&registry, &[parent("l"), parent("r")])
            .unwrap_err()
            .errors;
        assert_eq!(
            errors,
            vec![DependencyGraphError::ConflictingBinding {
                key: Key::of::<u32>(),
                containers: vec!["l".to_string(), "r".to_string()],
            }]
        );
    }

    #[test]
    fn display_lists_edges() {
        let registry = registry(vec![
            bind(|| 1_u8).depends_on(DependencyInfo::lazy(Key::of::<u16>())),
            bind(|| 2_u16),
        ]);
        let graph = DependencyGraph::link(&registry, &[]).unwrap();

        assert_eq!(graph.to_string(), "u16\nu8 -> u16 (lazy)\n");
    }
}
