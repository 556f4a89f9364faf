//! Declaration scripts - replay a parsed program into a scope graph
//!
//! A script stands in for the front end: it lists nested declarations and
//! the name references to resolve against them.
//!
//! ```toml
//! [[decl]]
//! name = "Base"
//! kind = "class"
//!
//!   [[decl.member]]
//!   name = "area"
//!   kind = "method"
//!
//! [[decl]]
//! name = "Square"
//! kind = "class"
//! extends = ["Base"]
//!
//! [[lookup]]
//! scope = "Square"
//! name = "area"
//! expect = "Base.area"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scope::{Bias, Entry, GraphStats, ScopeBuilder, ScopeGraph, TreeNode};
use crate::symbol::{biasless_classifier, Symbol, SymbolKind};
use crate::{Error, Result};

/// `expect` value for a lookup that must not resolve
pub const MISSING: &str = "missing";

const ROOT_KEY: &str = "<root>";

/// A parsed declaration script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, rename = "decl")]
    pub decls: Vec<Decl>,
    #[serde(default, rename = "lookup")]
    pub lookups: Vec<Lookup>,
}

/// One declaration and the declarations nested inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default)]
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Dotted paths of scopes whose members are inherited
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default, rename = "member", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Decl>,
}

impl Decl {
    /// Number of declarations in this subtree, itself included
    fn subtree_len(&self) -> usize {
        1 + self.members.iter().map(Decl::subtree_len).sum::<usize>()
    }
}

/// A name reference to resolve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lookup {
    /// Dotted path of the scope the name appears in; empty for the root
    #[serde(default)]
    pub scope: String,
    pub name: String,
    /// Qualified name of the expected target, or `"missing"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
}

/// What happened to a single script step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Declared {
        path: String,
        kind: SymbolKind,
        bias: Bias,
    },
    Rejected {
        path: String,
        reason: String,
        skipped_members: usize,
    },
    Inherited {
        scope: String,
        base: String,
        members: usize,
    },
    MissingBase {
        scope: String,
        base: String,
    },
    Resolved {
        scope: String,
        name: String,
        target: String,
        kind: SymbolKind,
        line: u32,
        /// Kind, qualified name and signature of the target
        description: String,
        /// Size of the overload run the target was picked from
        candidates: usize,
        expectation_met: Option<bool>,
    },
    Unresolved {
        scope: String,
        name: String,
        expectation_met: Option<bool>,
    },
}

/// Outcomes of a replay plus a snapshot of the resulting graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<Outcome>,
    pub stats: GraphStats,
    pub tree: Option<TreeNode>,
}

impl ReplayReport {
    pub fn declared(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Declared { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Rejected { .. }))
    }

    pub fn resolved(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Resolved { .. }))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unresolved { .. }))
    }

    /// Lookups whose `expect` did not match
    pub fn failed_expectations(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                Outcome::Resolved { expectation_met: Some(false), .. }
                    | Outcome::Unresolved { expectation_met: Some(false), .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

impl Script {
    /// Parse a script from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a script from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Build a graph from the declarations, then resolve every lookup.
    ///
    /// Redeclarations and unresolved names are recorded, never fatal.
    pub fn replay(&self, biasless: &[SymbolKind]) -> Result<ReplayReport> {
        // Payloads are created up front so they outlive the graph that borrows them
        let symbols = self.symbols();
        let root_symbol = symbols
            .first()
            .ok_or_else(|| Error::Script("missing root symbol".to_string()))?;

        let mut graph = ScopeGraph::new(biasless_classifier(biasless.to_vec()));
        let root = graph.set_root(Entry::new(ROOT_KEY.to_string(), root_symbol))?;
        let mut builder = ScopeBuilder::new(root);
        let mut report = ReplayReport::default();

        let mut next = 1;
        for decl in &self.decls {
            replay_decl(decl, &symbols, &mut next, &mut graph, &mut builder, &mut report)?;
        }

        for lookup in &self.lookups {
            report.outcomes.push(resolve_lookup(lookup, &graph, root)?);
        }

        report.stats = graph.stats();
        report.tree = graph.tree();
        tracing::info!(
            "Replayed {} declarations and {} lookups ({} rejected, {} unresolved)",
            report.declared(),
            self.lookups.len(),
            report.rejected(),
            report.unresolved()
        );
        Ok(report)
    }

    /// Symbol payloads in declaration preorder, the synthetic root first
    fn symbols(&self) -> Vec<Symbol> {
        let mut symbols = vec![Symbol::new(ROOT_KEY, SymbolKind::Namespace, 0)];
        let mut stack: Vec<(&Decl, String)> = self
            .decls
            .iter()
            .rev()
            .map(|decl| (decl, String::new()))
            .collect();

        while let Some((decl, prefix)) = stack.pop() {
            let qualified = if prefix.is_empty() {
                decl.name.clone()
            } else {
                format!("{}.{}", prefix, decl.name)
            };
            let mut symbol = Symbol::new(qualified.as_str(), decl.kind, decl.line);
            if let Some(sig) = &decl.signature {
                symbol = symbol.with_signature(sig.as_str());
            }
            symbols.push(symbol);
            stack.extend(decl.members.iter().rev().map(|m| (m, qualified.clone())));
        }

        symbols
    }
}

fn replay_decl<'v>(
    decl: &Decl,
    symbols: &'v [Symbol],
    next: &mut usize,
    graph: &mut ScopeGraph<'v, String, Symbol>,
    builder: &mut ScopeBuilder,
    report: &mut ReplayReport,
) -> Result<()> {
    let symbol = symbols
        .get(*next)
        .ok_or_else(|| Error::Script(format!("no payload for declaration {}", decl.name)))?;
    *next += 1;
    let path = symbol.qualified_name.clone();

    match builder.open(graph, Entry::new(decl.name.clone(), symbol)) {
        Ok(id) => {
            let bias = graph.entry(id).map(Entry::bias).unwrap_or_default();
            report.outcomes.push(Outcome::Declared {
                path: path.clone(),
                kind: symbol.kind,
                bias,
            });
        }
        Err(e @ Error::Redeclaration { .. }) => {
            let skipped_members = decl.subtree_len() - 1;
            *next += skipped_members;
            tracing::warn!("Rejected {}: {}", path, e);
            report.outcomes.push(Outcome::Rejected {
                path,
                reason: e.to_string(),
                skipped_members,
            });
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    // Bases resolve from the enclosing scope so members merged by an earlier
    // base cannot shadow a later one
    let derived = builder.current();
    let outer = graph.entry(derived).and_then(Entry::parent).unwrap_or(derived);
    for base in &decl.extends {
        match graph.resolve_path(base.split('.'), outer) {
            Ok(base_id) => {
                let members = builder.inherit(graph, base_id)?.len();
                report.outcomes.push(Outcome::Inherited {
                    scope: path.clone(),
                    base: base.clone(),
                    members,
                });
            }
            Err(Error::NotFound { .. }) => {
                tracing::warn!("Base {} of {} not found", base, path);
                report.outcomes.push(Outcome::MissingBase {
                    scope: path.clone(),
                    base: base.clone(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    for member in &decl.members {
        replay_decl(member, symbols, next, graph, builder, report)?;
    }

    builder.close();
    Ok(())
}

fn resolve_lookup(
    lookup: &Lookup,
    graph: &ScopeGraph<'_, String, Symbol>,
    root: crate::EntryId,
) -> Result<Outcome> {
    let segments = lookup.scope.split('.').filter(|s| !s.is_empty());
    let resolved = graph
        .resolve_path(segments, root)
        .and_then(|scope| Ok((graph.get_from(lookup.name.as_str(), scope)?, scope)));

    match resolved {
        Ok((symbol, scope)) => {
            let candidates = graph.overloads(lookup.name.as_str(), scope)?.len();
            Ok(Outcome::Resolved {
                scope: lookup.scope.clone(),
                name: lookup.name.clone(),
                target: symbol.qualified_name.clone(),
                kind: symbol.kind,
                line: symbol.line,
                description: symbol.short_description(),
                candidates,
                expectation_met: lookup
                    .expect
                    .as_ref()
                    .map(|expected| *expected == symbol.qualified_name),
            })
        }
        Err(Error::NotFound { key }) => {
            tracing::debug!("Lookup of {} in {:?} failed at {}", lookup.name, lookup.scope, key);
            Ok(Outcome::Unresolved {
                scope: lookup.scope.clone(),
                name: lookup.name.clone(),
                expectation_met: lookup.expect.as_ref().map(|expected| expected == MISSING),
            })
        }
        Err(e) => Err(e),
    }
}
