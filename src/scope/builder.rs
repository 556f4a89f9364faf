//! Scope Builder - construction cursors for the external parser
//!
//! The builder tracks which scope is currently open and which base scope,
//! if any, is being merged in as inherited members. Keeping these cursors
//! outside the graph lets independent builders populate separate graphs.

use std::collections::HashSet;
use std::fmt;

use super::entry::{Entry, EntryId};
use super::graph::ScopeGraph;
use crate::Result;

/// Cursor state threaded through graph construction
#[derive(Debug, Clone)]
pub struct ScopeBuilder {
    /// Scope receiving new declarations
    current: EntryId,
    /// Scopes opened before `current`, innermost last
    enclosing: Vec<EntryId>,
    /// Base scope whose members are being copied, set only while `inherit` runs
    super_scope: Option<EntryId>,
}

impl ScopeBuilder {
    /// Start building inside `root`
    pub fn new(root: EntryId) -> Self {
        Self {
            current: root,
            enclosing: Vec::new(),
            super_scope: None,
        }
    }

    pub fn current(&self) -> EntryId {
        self.current
    }

    /// Nesting depth of the open scope, 0 at the starting scope
    pub fn depth(&self) -> usize {
        self.enclosing.len()
    }

    /// Declare `entry` inside the open scope without opening it
    pub fn declare<'v, K, V>(
        &self,
        graph: &mut ScopeGraph<'v, K, V>,
        entry: Entry<'v, K, V>,
    ) -> Result<EntryId>
    where
        K: Eq + fmt::Display,
    {
        graph.enter(entry, self.current, false)
    }

    /// Declare `entry` and make it the open scope
    pub fn open<'v, K, V>(
        &mut self,
        graph: &mut ScopeGraph<'v, K, V>,
        entry: Entry<'v, K, V>,
    ) -> Result<EntryId>
    where
        K: Eq + fmt::Display,
    {
        let id = graph.enter(entry, self.current, false)?;
        self.enclosing.push(self.current);
        self.current = id;
        Ok(id)
    }

    /// Return to the enclosing scope. Closing the starting scope does nothing.
    ///
    /// Returns the scope that was closed.
    pub fn close(&mut self) -> Option<EntryId> {
        let parent = self.enclosing.pop()?;
        let closed = self.current;
        self.current = parent;
        Some(closed)
    }

    /// Merge the members of `base` into the open scope as inherited entries.
    ///
    /// Nested scopes are copied too: each inherited copy of a base scope
    /// receives inherited copies of that scope's members, so qualified paths
    /// through the base also work through the derived scope. Copies share the
    /// base entries' values and rank below any local declaration of the same
    /// name. A base member that encloses the open scope is skipped.
    ///
    /// Returns every inherited entry created, grouped by the base scope it was
    /// copied from.
    pub fn inherit<'v, K, V>(
        &mut self,
        graph: &mut ScopeGraph<'v, K, V>,
        base: EntryId,
    ) -> Result<Vec<EntryId>>
    where
        K: Eq + Clone + fmt::Display,
    {
        graph.check(base)?;
        let enclosing: HashSet<EntryId> = std::iter::once(self.current)
            .chain(graph.ancestors(self.current))
            .collect();

        let mut inherited = Vec::new();
        let mut pending = vec![(base, self.current)];
        while let Some((source, target)) = pending.pop() {
            self.super_scope = Some(source);
            let members: Vec<(EntryId, K, &'v V)> = graph
                .children(source)
                .filter(|id| !enclosing.contains(id))
                .map(|id| {
                    let entry = graph.node(id);
                    (id, entry.key().clone(), entry.value())
                })
                .collect();

            let mut nested = Vec::new();
            for (member, key, value) in members {
                let copy = match graph.enter(Entry::new(key, value), target, true) {
                    Ok(id) => id,
                    Err(e) => {
                        self.super_scope = None;
                        return Err(e);
                    }
                };
                inherited.push(copy);
                if graph.node(member).child().is_some() {
                    nested.push((member, copy));
                }
            }
            pending.extend(nested.into_iter().rev());
        }
        self.super_scope = None;

        tracing::debug!(
            "Inherited {} entries of {} into {}",
            inherited.len(),
            base,
            self.current
        );
        Ok(inherited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph<'v>() -> ScopeGraph<'v, &'static str, u32> {
        ScopeGraph::new(|entry: &Entry<'_, &'static str, u32>| {
            entry.key().starts_with(|c: char| c.is_ascii_uppercase())
        })
    }

    #[test]
    fn test_open_and_close_track_current() {
        let value = 0;
        let mut graph = graph();
        let root = graph.set_root(Entry::new("<root>", &value)).unwrap();
        let mut builder = ScopeBuilder::new(root);

        let class = builder.open(&mut graph, Entry::new("Class", &value)).unwrap();
        assert_eq!(builder.current(), class);

        let method = builder.open(&mut graph, Entry::new("method", &value)).unwrap();
        let local = builder.declare(&mut graph, Entry::new("local", &value)).unwrap();
        assert_eq!(builder.current(), method);
        assert_eq!(builder.depth(), 2);
        assert_eq!(graph.entry(local).unwrap().parent(), Some(method));

        assert_eq!(builder.close(), Some(method));
        assert_eq!(builder.close(), Some(class));
        assert_eq!(builder.close(), None);
        assert_eq!(builder.current(), root);
    }

    #[test]
    fn test_failed_open_keeps_cursor() {
        let value = 0;
        let mut graph = graph();
        let root = graph.set_root(Entry::new("<root>", &value)).unwrap();
        let mut builder = ScopeBuilder::new(root);

        builder.open(&mut graph, Entry::new("Class", &value)).unwrap();
        builder.close();

        assert!(builder.open(&mut graph, Entry::new("Class", &value)).is_err());
        assert_eq!(builder.current(), root);
        assert_eq!(builder.depth(), 0);
    }

    #[test]
    fn test_inherit_merges_base_members() {
        let (base_m, base_n, derived_m) = (1, 2, 3);
        let mut graph = graph();
        let root = graph.set_root(Entry::new("<root>", &base_m)).unwrap();
        let mut builder = ScopeBuilder::new(root);

        let base = builder.open(&mut graph, Entry::new("Base", &base_m)).unwrap();
        builder.declare(&mut graph, Entry::new("m", &base_m)).unwrap();
        builder.declare(&mut graph, Entry::new("n", &base_n)).unwrap();
        builder.close();

        let derived = builder.open(&mut graph, Entry::new("Derived", &derived_m)).unwrap();
        let inherited = builder.inherit(&mut graph, base).unwrap();
        assert_eq!(inherited.len(), 2);
        assert_eq!(builder.super_scope, None);
        assert!(inherited.iter().all(|&id| graph.entry(id).unwrap().is_super()));

        assert_eq!(*graph.get_from("m", derived).unwrap(), 1);

        builder.declare(&mut graph, Entry::new("m", &derived_m)).unwrap();
        assert_eq!(*graph.get_from("m", derived).unwrap(), 3);
        assert_eq!(*graph.get_from("n", derived).unwrap(), 2);
    }

    #[test]
    fn test_inherit_copies_nested_scopes() {
        let (base_v, inner_v, x_v, derived_v) = (1, 2, 3, 4);
        let mut graph = graph();
        let root = graph.set_root(Entry::new("<root>", &base_v)).unwrap();
        let mut builder = ScopeBuilder::new(root);

        let base = builder.open(&mut graph, Entry::new("Base", &base_v)).unwrap();
        builder.open(&mut graph, Entry::new("Inner", &inner_v)).unwrap();
        builder.declare(&mut graph, Entry::new("x", &x_v)).unwrap();
        builder.close();
        builder.close();

        let derived = builder.open(&mut graph, Entry::new("Derived", &derived_v)).unwrap();
        let inherited = builder.inherit(&mut graph, base).unwrap();
        assert_eq!(inherited.len(), 2);
        assert_eq!(builder.super_scope, None);

        let x = graph.resolve_path(["Inner", "x"], derived).unwrap();
        assert_eq!(*graph.entry(x).unwrap().value(), 3);
        assert!(graph.entry(x).unwrap().is_super());
        let inner = graph.entry(x).unwrap().parent().unwrap();
        assert_eq!(graph.entry(inner).unwrap().parent(), Some(derived));

        // The base keeps its own members
        assert_ne!(graph.resolve_path(["Inner", "x"], base).unwrap(), x);
    }

    #[test]
    fn test_inherit_skips_enclosing_scope() {
        let value = 0;
        let mut graph = graph();
        let root = graph.set_root(Entry::new("<root>", &value)).unwrap();
        let mut builder = ScopeBuilder::new(root);

        let outer = builder.open(&mut graph, Entry::new("Outer", &value)).unwrap();
        builder.declare(&mut graph, Entry::new("helper", &value)).unwrap();
        let inner = builder.open(&mut graph, Entry::new("Inner", &value)).unwrap();

        let inherited = builder.inherit(&mut graph, outer).unwrap();
        assert_eq!(inherited.len(), 1);
        assert_eq!(graph.children(inner).count(), 1);
        assert!(graph.lookup_local("Inner", inner).is_none());
    }

    #[test]
    fn test_independent_builders() {
        let value = 0;
        let mut left = graph();
        let mut right = graph();
        let left_root = left.set_root(Entry::new("<root>", &value)).unwrap();
        let right_root = right.set_root(Entry::new("<root>", &value)).unwrap();

        let mut a = ScopeBuilder::new(left_root);
        let mut b = ScopeBuilder::new(right_root);
        a.open(&mut left, Entry::new("A", &value)).unwrap();
        b.open(&mut right, Entry::new("A", &value)).unwrap();

        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
    }
}
