//! Entry - a single declaration that is also the scope it opens
//!
//! Entries declared in the same scope form a doubly-linked sibling chain:
//! the enclosing entry points at the head through `child`, and each entry
//! links to its neighbours through `prior` / `next`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank used to order same-key entries within one scope. Lower wins lookup.
pub type Bias = u32;

/// Handle to an entry stored in a [`ScopeGraph`](super::ScopeGraph).
///
/// Slots are reused once their entry is freed; the generation tells a live
/// handle apart from one left over from an earlier occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

impl EntryId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

/// A declared symbol.
///
/// The entry owns its `key` but only borrows its `value`: the payload belongs
/// to whoever built the graph and must live at least as long as `'v`.
#[derive(Debug)]
pub struct Entry<'v, K, V> {
    key: K,
    value: &'v V,
    parent: Option<EntryId>,
    child: Option<EntryId>,
    prior: Option<EntryId>,
    next: Option<EntryId>,
    bias: Bias,
    is_super: bool,
}

impl<'v, K, V> Entry<'v, K, V> {
    /// Create an unlinked entry. Its bias is assigned when it is entered.
    pub fn new(key: K, value: &'v V) -> Self {
        Self {
            key,
            value,
            parent: None,
            child: None,
            prior: None,
            next: None,
            bias: 0,
            is_super: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &'v V {
        self.value
    }

    /// Enclosing scope, `None` for the root
    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    /// First entry declared inside this scope
    pub fn child(&self) -> Option<EntryId> {
        self.child
    }

    pub fn prior(&self) -> Option<EntryId> {
        self.prior
    }

    pub fn next(&self) -> Option<EntryId> {
        self.next
    }

    pub fn bias(&self) -> Bias {
        self.bias
    }

    /// Whether this entry stands for an inherited member
    pub fn is_super(&self) -> bool {
        self.is_super
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntryId>) {
        self.parent = parent;
    }

    pub(crate) fn set_child(&mut self, child: Option<EntryId>) {
        self.child = child;
    }

    pub(crate) fn set_prior(&mut self, prior: Option<EntryId>) {
        self.prior = prior;
    }

    pub(crate) fn set_next(&mut self, next: Option<EntryId>) {
        self.next = next;
    }

    pub(crate) fn set_bias(&mut self, bias: Bias) {
        self.bias = bias;
    }

    pub(crate) fn mark_super(&mut self, is_super: bool) {
        self.is_super = is_super;
    }

    pub(crate) fn increase_bias(&mut self) {
        self.bias += 1;
    }

    pub(crate) fn decrease_bias(&mut self) {
        self.bias = self.bias.saturating_sub(1);
    }

    /// Clear parent and sibling links before the entry is linked in
    pub(crate) fn unlink(&mut self) {
        self.parent = None;
        self.prior = None;
        self.next = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_unlinked() {
        let value = 7;
        let entry = Entry::new("x", &value);

        assert_eq!(*entry.key(), "x");
        assert_eq!(*entry.value(), 7);
        assert_eq!(entry.parent(), None);
        assert_eq!(entry.child(), None);
        assert_eq!(entry.prior(), None);
        assert_eq!(entry.next(), None);
        assert_eq!(entry.bias(), 0);
        assert!(!entry.is_super());
    }

    #[test]
    fn test_bias_adjustment() {
        let value = ();
        let mut entry = Entry::new("f", &value);

        entry.increase_bias();
        entry.increase_bias();
        assert_eq!(entry.bias(), 2);

        entry.decrease_bias();
        assert_eq!(entry.bias(), 1);

        entry.decrease_bias();
        entry.decrease_bias();
        assert_eq!(entry.bias(), 0);
    }

    #[test]
    fn test_entry_id_display() {
        assert_eq!(EntryId::new(12, 0).to_string(), "#12");
        assert_eq!(EntryId::new(12, 3).to_string(), "#12v3");
        assert_ne!(EntryId::new(12, 0), EntryId::new(12, 1));
    }
}
