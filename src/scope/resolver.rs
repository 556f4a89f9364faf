//! Name Resolver - Resolves names against the scope graph
//!
//! Resolution algorithm:
//! 1. Collect the same-key run directly inside the starting scope
//! 2. If the run is non-empty → the lowest bias wins
//! 3. Otherwise walk outward through enclosing scopes up to the root
//! 4. Nothing found → `Error::NotFound`
//!
//! Inherited members always carry a higher bias than local declarations of
//! the same name, so they only win when nothing local exists.

use std::borrow::Borrow;
use std::fmt;

use super::entry::EntryId;
use super::graph::ScopeGraph;
use crate::{Error, Result};

impl<'v, K, V> ScopeGraph<'v, K, V> {
    /// Resolve `key` as seen from inside `scope`, returning the bound value
    pub fn get_from<Q>(&self, key: &Q, scope: EntryId) -> Result<&'v V>
    where
        K: Borrow<Q>,
        Q: Eq + fmt::Display + ?Sized,
    {
        let id = self.resolve(key, scope)?;
        Ok(self.node(id).value())
    }

    /// Resolve `key` from `scope` outward, returning the winning entry
    pub fn resolve<Q>(&self, key: &Q, scope: EntryId) -> Result<EntryId>
    where
        K: Borrow<Q>,
        Q: Eq + fmt::Display + ?Sized,
    {
        self.check(scope)?;
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(id) = self.lookup_local(key, s) {
                return Ok(id);
            }
            current = self.node(s).parent();
        }

        tracing::debug!("Unresolved name {} from {}", key, scope);
        Err(Error::NotFound {
            key: key.to_string(),
        })
    }

    /// Look up `key` directly inside `scope` without walking parents
    pub fn lookup_local<Q>(&self, key: &Q, scope: EntryId) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.children(scope)
            .filter(|&id| key == self.node(id).key().borrow())
            .min_by_key(|&id| self.node(id).bias())
    }

    /// All same-key entries of the nearest scope that declares `key`,
    /// ordered by bias.
    ///
    /// Callers use this to disambiguate overloads themselves.
    pub fn overloads<Q>(&self, key: &Q, scope: EntryId) -> Result<Vec<EntryId>>
    where
        K: Borrow<Q>,
        Q: Eq + fmt::Display + ?Sized,
    {
        self.check(scope)?;
        for s in std::iter::once(scope).chain(self.ancestors(scope)) {
            let mut run = self.run_of(s, key);
            if !run.is_empty() {
                run.sort_by_key(|&id| self.node(id).bias());
                return Ok(run);
            }
        }
        Err(Error::NotFound {
            key: key.to_string(),
        })
    }

    /// Resolve a qualified path such as `Outer.Inner.name`.
    ///
    /// The first segment resolves outward from `scope`, every later segment
    /// only inside the scope opened by the previous one.
    pub fn resolve_path<'p, Q, I>(&self, path: I, scope: EntryId) -> Result<EntryId>
    where
        K: Borrow<Q>,
        Q: Eq + fmt::Display + ?Sized + 'p,
        I: IntoIterator<Item = &'p Q>,
    {
        let mut segments = path.into_iter();
        let Some(first) = segments.next() else {
            self.check(scope)?;
            return Ok(scope);
        };

        let mut current = self.resolve(first, scope)?;
        for segment in segments {
            current = self
                .lookup_local(segment, current)
                .ok_or_else(|| Error::NotFound {
                    key: segment.to_string(),
                })?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Entry;

    fn graph<'v>() -> ScopeGraph<'v, String, &'static str> {
        ScopeGraph::new(|entry: &Entry<'_, String, &'static str>| {
            entry.key().starts_with(|c: char| c.is_ascii_uppercase())
        })
    }

    fn entry<'v>(key: &str, value: &'v &'static str) -> Entry<'v, String, &'static str> {
        Entry::new(key.to_string(), value)
    }

    #[test]
    fn test_not_found_on_empty_graph() {
        let root_value = "root";
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &root_value)).unwrap();

        let err = graph.get_from("undeclared", root).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref key } if key == "undeclared"));
    }

    #[test]
    fn test_redeclared_name_keeps_first_value() {
        let (first, second) = ("first", "second");
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &first)).unwrap();

        graph.enter(entry("X", &first), root, false).unwrap();
        assert!(graph.enter(entry("X", &second), root, false).is_err());

        assert_eq!(*graph.get_from("X", root).unwrap(), "first");
    }

    #[test]
    fn test_overload_resolves_to_lowest_bias() {
        let (first, second) = ("f0", "f1");
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &first)).unwrap();

        let f0 = graph.enter(entry("f", &first), root, false).unwrap();
        let f1 = graph.enter(entry("f", &second), root, false).unwrap();

        assert_eq!(graph.entry(f1).unwrap().bias(), 1);
        assert_eq!(*graph.get_from("f", root).unwrap(), "f0");
        assert_eq!(graph.overloads("f", root).unwrap(), vec![f0, f1]);
    }

    #[test]
    fn test_outward_resolution() {
        let (outer, inner) = ("outer", "inner");
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &outer)).unwrap();

        graph.enter(entry("x", &outer), root, false).unwrap();
        let class = graph.enter(entry("Class", &outer), root, false).unwrap();
        let method = graph.enter(entry("method", &inner), class, false).unwrap();
        let block = graph.enter(entry("block", &inner), method, false).unwrap();

        assert_eq!(*graph.get_from("x", block).unwrap(), "outer");
        assert_eq!(graph.resolve("method", block).unwrap(), method);
        assert_eq!(graph.lookup_local("x", block), None);
        assert!(graph.get_from("y", block).is_err());
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let (outer, inner) = ("outer", "inner");
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &outer)).unwrap();

        graph.enter(entry("x", &outer), root, false).unwrap();
        let scope = graph.enter(entry("scope", &outer), root, false).unwrap();
        graph.enter(entry("x", &inner), scope, false).unwrap();

        assert_eq!(*graph.get_from("x", scope).unwrap(), "inner");
        assert_eq!(*graph.get_from("x", root).unwrap(), "outer");
    }

    #[test]
    fn test_inherited_member_until_overridden() {
        let (base_m, derived_m) = ("Base.m", "Derived.m");
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &base_m)).unwrap();

        let base = graph.enter(entry("Base", &base_m), root, false).unwrap();
        graph.enter(entry("m", &base_m), base, false).unwrap();
        let derived = graph.enter(entry("Derived", &derived_m), root, false).unwrap();

        graph.enter(entry("m", &base_m), derived, true).unwrap();
        assert_eq!(*graph.get_from("m", derived).unwrap(), "Base.m");

        graph.enter(entry("m", &derived_m), derived, false).unwrap();
        assert_eq!(*graph.get_from("m", derived).unwrap(), "Derived.m");
        assert_eq!(graph.overloads("m", derived).unwrap().len(), 2);
    }

    #[test]
    fn test_overloads_use_nearest_scope() {
        let value = "v";
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &value)).unwrap();

        graph.enter(entry("f", &value), root, false).unwrap();
        graph.enter(entry("f", &value), root, false).unwrap();
        let scope = graph.enter(entry("scope", &value), root, false).unwrap();
        let local = graph.enter(entry("f", &value), scope, false).unwrap();

        assert_eq!(graph.overloads("f", scope).unwrap(), vec![local]);
        assert_eq!(graph.overloads("f", root).unwrap().len(), 2);
        assert!(graph.overloads("g", scope).is_err());
    }

    #[test]
    fn test_resolve_path() {
        let value = "v";
        let mut graph = graph();
        let root = graph.set_root(entry("<root>", &value)).unwrap();

        let outer = graph.enter(entry("Outer", &value), root, false).unwrap();
        let inner = graph.enter(entry("Inner", &value), outer, false).unwrap();
        let leaf = graph.enter(entry("leaf", &value), inner, false).unwrap();

        assert_eq!(graph.resolve_path(["Outer", "Inner", "leaf"], leaf).unwrap(), leaf);
        assert_eq!(graph.resolve_path(Vec::<&str>::new(), inner).unwrap(), inner);
        // Later segments never climb outward
        assert!(graph.resolve_path(["Inner", "Outer"], leaf).is_err());
    }
}
