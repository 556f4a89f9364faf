//! # Scopegraph - hierarchical symbol table for language front ends
//!
//! Scopegraph provides:
//! - An arena-backed scope tree where every declaration also opens a scope
//! - Bias-ranked same-name declarations (overloads, inherited members)
//! - Outward name resolution with redeclaration and not-found errors
//! - A builder that carries the parser's scope cursors explicitly
//! - A TOML declaration script format and replay harness for the CLI

pub mod scope;
pub mod symbol;
pub mod script;
pub mod output;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use scope::{Entry, EntryId, ScopeBuilder, ScopeGraph};
pub use symbol::{Symbol, SymbolKind};
pub use script::{ReplayReport, Script};

/// Result type alias for Scopegraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Scopegraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Redeclaration of `{key}` in the same scope")]
    Redeclaration { key: String },

    #[error("Name not found: {key}")]
    NotFound { key: String },

    #[error("Stale entry handle: {0}")]
    StaleEntry(EntryId),

    #[error("Scope graph is full ({0} entry slots)")]
    CapacityExceeded(usize),

    #[error("Unknown symbol kind: {0}")]
    UnknownKind(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
