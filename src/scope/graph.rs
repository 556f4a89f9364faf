//! Scope Graph data structure for name binding
//!
//! The scope graph tracks:
//! - Scope hierarchy (every entry is also the scope it opens)
//! - Declaration order within a scope (sibling chain)
//! - Same-name declarations ranked by bias (overloads, inherited members)
//!
//! Entries are stored in an arena and addressed by [`EntryId`]. Removing an
//! entry frees its whole subtree and leaves any outstanding handles stale;
//! freed slots are recycled under a new generation.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::entry::{Bias, Entry, EntryId};
use crate::{Error, Result};

/// Classifies an entry's kind as one that must be unique within its scope
pub type CanBeBiaslessFn<'v, K, V> = Box<dyn Fn(&Entry<'v, K, V>) -> bool + 'v>;

/// One arena cell
#[derive(Debug)]
struct Slot<'v, K, V> {
    /// Bumped every time the slot is freed
    generation: u32,
    entry: Option<Entry<'v, K, V>>,
}

/// Arena-backed scope tree with first-child / next-sibling links
pub struct ScopeGraph<'v, K, V> {
    slots: Vec<Slot<'v, K, V>>,
    /// Indices of empty slots, reused before the arena grows
    free: Vec<u32>,
    /// Outermost scope
    root: Option<EntryId>,
    /// Number of live entries
    live: usize,
    can_be_biasless: CanBeBiaslessFn<'v, K, V>,
}

impl<'v, K, V> ScopeGraph<'v, K, V> {
    /// Create an empty graph with the given kind classifier.
    ///
    /// The classifier must be a pure function of the entry's semantic kind,
    /// never of its position in the tree.
    pub fn new(can_be_biasless: impl Fn(&Entry<'v, K, V>) -> bool + 'v) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            live: 0,
            can_be_biasless: Box::new(can_be_biasless),
        }
    }

    /// Install the synthetic outermost entry.
    ///
    /// An existing tree is destroyed first; its handles become stale.
    pub fn set_root(&mut self, mut entry: Entry<'v, K, V>) -> Result<EntryId> {
        if let Some(old) = self.root.take() {
            self.destroy(old);
        }
        entry.unlink();
        entry.set_bias(0);
        entry.mark_super(false);
        let id = self.alloc(entry)?;
        self.root = Some(id);
        tracing::debug!("Installed root scope {}", id);
        Ok(id)
    }

    pub fn root(&self) -> Option<EntryId> {
        self.root
    }

    /// Get a live entry by handle
    pub fn entry(&self, id: EntryId) -> Option<&Entry<'v, K, V>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of live entries, root included
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Evaluate the injected classifier against a live entry
    pub fn can_be_biasless(&self, id: EntryId) -> Result<bool> {
        let entry = self.entry(id).ok_or(Error::StaleEntry(id))?;
        Ok((self.can_be_biasless)(entry))
    }

    /// Iterate the entries declared directly inside `scope`, in chain order
    pub fn children(&self, scope: EntryId) -> Children<'_, 'v, K, V> {
        Children {
            graph: self,
            cursor: self.entry(scope).and_then(Entry::child),
        }
    }

    /// Iterate the enclosing scopes of `id`, nearest first
    pub fn ancestors(&self, id: EntryId) -> Ancestors<'_, 'v, K, V> {
        Ancestors {
            graph: self,
            cursor: self.entry(id).and_then(Entry::parent),
        }
    }

    /// Remove an entry together with everything declared inside it.
    ///
    /// Later same-key siblings move up one bias so their run stays dense.
    /// Returns the number of entries freed.
    pub fn remove(&mut self, id: EntryId) -> Result<usize>
    where
        K: Eq,
    {
        let entry = self.entry(id).ok_or(Error::StaleEntry(id))?;
        let bias = entry.bias();

        if let Some(parent) = entry.parent() {
            let shifted: Vec<EntryId> = self
                .run_of(parent, entry.key())
                .into_iter()
                .filter(|&sibling| self.node(sibling).bias() > bias)
                .collect();
            for sibling in shifted {
                self.node_mut(sibling).decrease_bias();
            }
        }

        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(self.destroy(id))
    }

    /// Get statistics about the graph.
    ///
    /// Every live entry hangs off the root, so one preorder walk sees them all.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            entries: self.live,
            ..GraphStats::default()
        };

        let mut stack: Vec<(EntryId, usize)> = self.root.into_iter().map(|id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let entry = self.node(id);
            stats.max_depth = stats.max_depth.max(depth);
            stack.extend(self.children(id).map(|child| (child, depth + 1)));
            if entry.child().is_some() {
                stats.scopes += 1;
            }
            if entry.is_super() {
                stats.super_entries += 1;
            }
            // Every run with more than one member has exactly one bias-1 entry
            if entry.bias() == 1 {
                stats.overloaded_keys += 1;
            }
        }

        stats
    }

    /// Build a nested, serialisable dump of the tree under the root.
    ///
    /// Walks with an explicit stack so deep nesting cannot overflow.
    pub fn tree(&self) -> Option<TreeNode>
    where
        K: fmt::Display,
    {
        let root = self.root?;
        let mut preorder = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            preorder.push(id);
            stack.extend(self.children(id));
        }

        let mut built: HashMap<EntryId, TreeNode> = HashMap::new();
        for &id in preorder.iter().rev() {
            let entry = self.node(id);
            let children = self
                .children(id)
                .filter_map(|child| built.remove(&child))
                .collect();
            built.insert(
                id,
                TreeNode {
                    id,
                    key: entry.key().to_string(),
                    bias: entry.bias(),
                    is_super: entry.is_super(),
                    children,
                },
            );
        }
        built.remove(&root)
    }

    pub(crate) fn check(&self, id: EntryId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::StaleEntry(id))
        }
    }

    /// Same-key entries directly inside `scope`, in chain order.
    ///
    /// Chain order within a run always matches bias order.
    pub(crate) fn run_of<Q>(&self, scope: EntryId, key: &Q) -> Vec<EntryId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.children(scope)
            .filter(|&id| key == self.node(id).key().borrow())
            .collect()
    }

    /// Live entry behind an internal link. A dangling link is a bug in the graph.
    pub(crate) fn node(&self, id: EntryId) -> &Entry<'v, K, V> {
        match self.entry(id) {
            Some(entry) => entry,
            None => panic!("scope graph link points at freed entry {}", id),
        }
    }

    fn node_mut(&mut self, id: EntryId) -> &mut Entry<'v, K, V> {
        match self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_mut())
        {
            Some(entry) => entry,
            None => panic!("scope graph link points at freed entry {}", id),
        }
    }

    fn alloc(&mut self, entry: Entry<'v, K, V>) -> Result<EntryId> {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                EntryId::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| Error::CapacityExceeded(self.slots.len()))?;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                EntryId::new(index, 0)
            }
        };
        self.live += 1;
        Ok(id)
    }

    /// Link `next` directly after `at` in its sibling chain
    fn append(&mut self, at: EntryId, next: EntryId) {
        let old_next = self.node(at).next();
        {
            let entry = self.node_mut(next);
            entry.set_prior(Some(at));
            entry.set_next(old_next);
        }
        self.node_mut(at).set_next(Some(next));
        if let Some(old_next) = old_next {
            self.node_mut(old_next).set_prior(Some(next));
        }
    }

    /// Link `prior` directly before `at`, taking over as chain head if needed
    fn prepend(&mut self, at: EntryId, prior: EntryId) {
        let old_prior = self.node(at).prior();
        {
            let entry = self.node_mut(prior);
            entry.set_prior(old_prior);
            entry.set_next(Some(at));
        }
        self.node_mut(at).set_prior(Some(prior));
        match old_prior {
            Some(old_prior) => self.node_mut(old_prior).set_next(Some(prior)),
            None => {
                if let Some(parent) = self.node(at).parent() {
                    self.node_mut(parent).set_child(Some(prior));
                }
            }
        }
    }

    /// Unlink `id` from its chain, reconnecting its neighbours
    fn detach(&mut self, id: EntryId) {
        let (prior, next, parent) = {
            let entry = self.node(id);
            (entry.prior(), entry.next(), entry.parent())
        };

        match prior {
            Some(prior) => self.node_mut(prior).set_next(next),
            None => {
                if let Some(parent) = parent {
                    if self.node(parent).child() == Some(id) {
                        self.node_mut(parent).set_child(next);
                    }
                }
            }
        }
        if let Some(next) = next {
            self.node_mut(next).set_prior(prior);
        }

        let entry = self.node_mut(id);
        entry.set_prior(None);
        entry.set_next(None);
    }

    /// Free `id` and its subtree depth-first with a work-list
    fn destroy(&mut self, id: EntryId) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            let slot = &mut self.slots[current.index()];
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index() as u32);
            self.live -= 1;
            freed += 1;
        }
        freed
    }
}

impl<'v, K, V> ScopeGraph<'v, K, V>
where
    K: Eq + fmt::Display,
{
    /// Insert `entry` as a declaration inside the scope opened by `parent`.
    ///
    /// - No same-key sibling: linked at the chain tail with bias 0.
    /// - `is_super`: linked after the whole run with the highest bias; never
    ///   conflicts, always shadowed by local declarations.
    /// - Otherwise: rejected with [`Error::Redeclaration`] when the bias-0
    ///   local declaration is biasless, else ranked after the existing local
    ///   declarations and ahead of every inherited one.
    pub fn enter(
        &mut self,
        mut entry: Entry<'v, K, V>,
        parent: EntryId,
        is_super: bool,
    ) -> Result<EntryId> {
        self.check(parent)?;
        let run = self.run_of(parent, entry.key());

        entry.unlink();
        entry.set_parent(Some(parent));
        entry.mark_super(is_super);

        if run.is_empty() {
            entry.set_bias(0);
            let tail = self.children(parent).last();
            let id = self.alloc(entry)?;
            match tail {
                Some(tail) => self.append(tail, id),
                None => self.node_mut(parent).set_child(Some(id)),
            }
            tracing::debug!("Entered {} under {}", self.node(id).key(), parent);
            return Ok(id);
        }

        if is_super {
            let last = run[run.len() - 1];
            entry.set_bias(self.node(last).bias() + 1);
            let id = self.alloc(entry)?;
            self.append(last, id);
            tracing::debug!(
                "Entered inherited {} under {} (bias {})",
                self.node(id).key(),
                parent,
                self.node(id).bias()
            );
            return Ok(id);
        }

        let split = run
            .iter()
            .position(|&id| self.node(id).is_super())
            .unwrap_or(run.len());
        let (locals, supers) = run.split_at(split);

        if let Some(&first) = locals.first() {
            if (self.can_be_biasless)(self.node(first)) {
                tracing::debug!("Rejected redeclaration of {} under {}", entry.key(), parent);
                return Err(Error::Redeclaration {
                    key: entry.key().to_string(),
                });
            }
        }

        entry.set_bias(locals.len() as Bias);
        let id = self.alloc(entry)?;
        match locals.last() {
            Some(&last) => self.append(last, id),
            // The run is all inherited members; the new local goes in front
            None => self.prepend(run[0], id),
        }
        for &inherited in supers {
            self.node_mut(inherited).increase_bias();
        }

        tracing::debug!(
            "Entered {} under {} (bias {})",
            self.node(id).key(),
            parent,
            self.node(id).bias()
        );
        Ok(id)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ScopeGraph<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGraph")
            .field("root", &self.root)
            .field("live", &self.live)
            .field("free", &self.free.len())
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Iterator over a sibling chain
pub struct Children<'g, 'v, K, V> {
    graph: &'g ScopeGraph<'v, K, V>,
    cursor: Option<EntryId>,
}

impl<K, V> Iterator for Children<'_, '_, K, V> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let current = self.cursor?;
        self.cursor = self.graph.node(current).next();
        Some(current)
    }
}

/// Iterator over enclosing scopes
pub struct Ancestors<'g, 'v, K, V> {
    graph: &'g ScopeGraph<'v, K, V>,
    cursor: Option<EntryId>,
}

impl<K, V> Iterator for Ancestors<'_, '_, K, V> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let current = self.cursor?;
        self.cursor = self.graph.node(current).parent();
        Some(current)
    }
}

/// Serialisable snapshot of one entry and its scope
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: EntryId,
    pub key: String,
    pub bias: Bias,
    pub is_super: bool,
    pub children: Vec<TreeNode>,
}

/// Statistics about a scope graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub entries: usize,
    /// Entries with at least one declaration inside them
    pub scopes: usize,
    pub super_entries: usize,
    /// Runs holding more than one same-key entry
    pub overloaded_keys: usize,
    pub max_depth: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scope Graph Statistics:")?;
        writeln!(f, "  Entries: {} (inherited: {})", self.entries, self.super_entries)?;
        writeln!(f, "  Scopes: {}", self.scopes)?;
        writeln!(f, "  Overloaded names: {}", self.overloaded_keys)?;
        writeln!(f, "  Max depth: {}", self.max_depth)
    }
}
