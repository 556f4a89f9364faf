//! Scope Graph - hierarchical symbol table
//!
//! A front end enters declarations into nested scopes and resolves names
//! outward from any scope. Same-name declarations within one scope are
//! ranked by bias, with inherited members always ranked last.

pub mod builder;
pub mod entry;
pub mod graph;
pub mod resolver;

pub use builder::ScopeBuilder;
pub use entry::{Bias, Entry, EntryId};
pub use graph::{CanBeBiaslessFn, GraphStats, ScopeGraph, TreeNode};
