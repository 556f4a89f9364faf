//! Symbol types - payloads bound to scope graph entries
//!
//! Declarations are mapped into four kinds:
//! - `Namespace`: File, module, package
//! - `Container`: Class, struct, trait, object
//! - `Callable`: Function, method, constructor, macro
//! - `Value`: Field, variable, constant
//!
//! Only callables may share a name with a sibling by default; every other
//! kind must be unique within its scope.

use crate::{Error, Result};
use crate::scope::Entry;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Declaration kinds understood by the replay harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SymbolKind {
    /// File, module, package - the organizational unit
    Namespace,
    /// Class, struct, trait, object - types that contain other symbols
    Container,
    /// Function, method, constructor, macro - may be overloaded
    Callable,
    /// Field, variable, constant - data holders
    Value,
}

impl SymbolKind {
    /// Get the string representation of the symbol kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Namespace => "namespace",
            SymbolKind::Container => "container",
            SymbolKind::Callable => "callable",
            SymbolKind::Value => "value",
        }
    }

    /// Get all symbol kinds
    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Namespace,
            SymbolKind::Container,
            SymbolKind::Callable,
            SymbolKind::Value,
        ]
    }

    /// Kinds that must be unique within their scope unless configured otherwise
    pub fn default_biasless() -> Vec<SymbolKind> {
        vec![SymbolKind::Namespace, SymbolKind::Container, SymbolKind::Value]
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "namespace" | "ns" | "module" | "package" | "file" => Ok(SymbolKind::Namespace),
            "container" | "class" | "struct" | "trait" | "interface" => Ok(SymbolKind::Container),
            "callable" | "function" | "method" | "fn" | "def" => Ok(SymbolKind::Callable),
            "value" | "field" | "variable" | "var" | "const" | "let" => Ok(SymbolKind::Value),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for SymbolKind {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared symbol, owned by the caller and borrowed by graph entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Dotted path from the outermost scope, e.g. `Base.method`
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// Source line of the declaration (1-indexed, 0 when unknown)
    pub line: u32,
    /// Function/method signature (for callables)
    pub signature: Option<String>,
}

impl Symbol {
    pub fn new(qualified_name: impl Into<String>, kind: SymbolKind, line: u32) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            line,
            signature: None,
        }
    }

    /// Set the signature
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Get a short description for display
    pub fn short_description(&self) -> String {
        if let Some(sig) = &self.signature {
            format!("{} {}{}", self.kind, self.qualified_name, sig)
        } else {
            format!("{} {}", self.kind, self.qualified_name)
        }
    }
}

/// Build the `can_be_biasless` classifier for symbol-valued graphs.
///
/// Classification depends only on the symbol's kind.
pub fn biasless_classifier<'v, K>(
    biasless: Vec<SymbolKind>,
) -> impl Fn(&Entry<'v, K, Symbol>) -> bool + 'v {
    move |entry: &Entry<'v, K, Symbol>| biasless.contains(&entry.value().kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_roundtrip() {
        for kind in SymbolKind::all() {
            let parsed: SymbolKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_symbol_kind_aliases() {
        assert_eq!(SymbolKind::from_str("class").unwrap(), SymbolKind::Container);
        assert_eq!(SymbolKind::from_str("function").unwrap(), SymbolKind::Callable);
        assert_eq!(SymbolKind::from_str("module").unwrap(), SymbolKind::Namespace);
        assert_eq!(SymbolKind::from_str("const").unwrap(), SymbolKind::Value);
        assert!(matches!(SymbolKind::from_str("macro"), Err(Error::UnknownKind(_))));
    }

    #[test]
    fn test_symbol_kind_deserializes_aliases() {
        let kinds: Vec<SymbolKind> = serde_json::from_str(r#"["class", "fn", "value"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![SymbolKind::Container, SymbolKind::Callable, SymbolKind::Value]
        );
        assert_eq!(serde_json::to_string(&SymbolKind::Container).unwrap(), r#""container""#);
    }

    #[test]
    fn test_default_classifier() {
        let class = Symbol::new("Point", SymbolKind::Container, 1);
        let method = Symbol::new("Point.norm", SymbolKind::Callable, 2)
            .with_signature("(self) -> f64");
        let classify = biasless_classifier::<String>(SymbolKind::default_biasless());

        assert!(classify(&Entry::new("Point".to_string(), &class)));
        assert!(!classify(&Entry::new("norm".to_string(), &method)));
        assert_eq!(method.short_description(), "callable Point.norm(self) -> f64");
    }
}
