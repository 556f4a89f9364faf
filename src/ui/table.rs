use tabled::{settings::Style, Table, Tabled};

use crate::scope::GraphStats;
use crate::script::Outcome;

#[derive(Tabled)]
pub struct StatRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct DeclarationRow {
    #[tabled(rename = "Declaration")]
    pub path: String,
    #[tabled(rename = "Result")]
    pub result: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

#[derive(Tabled)]
pub struct LookupRow {
    #[tabled(rename = "Scope")]
    pub scope: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Resolved To")]
    pub target: String,
    #[tabled(rename = "Candidates")]
    pub candidates: String,
    #[tabled(rename = "Expected")]
    pub expected: String,
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn expectation(met: Option<bool>) -> String {
    match met {
        Some(true) => "ok".to_string(),
        Some(false) => "MISMATCH".to_string(),
        None => "-".to_string(),
    }
}

fn scope_label(scope: &str) -> String {
    if scope.is_empty() {
        "<root>".to_string()
    } else {
        scope.to_string()
    }
}

/// Declaration-side outcomes: declared, rejected, inheritance
pub fn declarations_table(outcomes: &[Outcome]) -> String {
    let rows: Vec<DeclarationRow> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Declared { path, kind, bias } => Some(DeclarationRow {
                path: path.clone(),
                result: "declared".to_string(),
                detail: format!("{} (bias {})", kind, bias),
            }),
            Outcome::Rejected { path, reason, skipped_members } => Some(DeclarationRow {
                path: path.clone(),
                result: "rejected".to_string(),
                detail: if *skipped_members > 0 {
                    format!("{} ({} members skipped)", reason, skipped_members)
                } else {
                    reason.clone()
                },
            }),
            Outcome::Inherited { scope, base, members } => Some(DeclarationRow {
                path: scope.clone(),
                result: "inherits".to_string(),
                detail: format!("{} members from {}", members, base),
            }),
            Outcome::MissingBase { scope, base } => Some(DeclarationRow {
                path: scope.clone(),
                result: "missing base".to_string(),
                detail: base.clone(),
            }),
            _ => None,
        })
        .collect();
    render(&rows)
}

/// Lookup outcomes
pub fn lookups_table(outcomes: &[Outcome]) -> String {
    let rows: Vec<LookupRow> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Resolved {
                scope,
                name,
                line,
                description,
                candidates,
                expectation_met,
                ..
            } => Some(LookupRow {
                scope: scope_label(scope),
                name: name.clone(),
                target: format!("{} @{}", description, line),
                candidates: candidates.to_string(),
                expected: expectation(*expectation_met),
            }),
            Outcome::Unresolved { scope, name, expectation_met } => Some(LookupRow {
                scope: scope_label(scope),
                name: name.clone(),
                target: "(not found)".to_string(),
                candidates: "0".to_string(),
                expected: expectation(*expectation_met),
            }),
            _ => None,
        })
        .collect();
    render(&rows)
}

pub fn stats_table(stats: &GraphStats) -> String {
    let rows = [
        ("Entries", stats.entries),
        ("Scopes", stats.scopes),
        ("Inherited entries", stats.super_entries),
        ("Overloaded names", stats.overloaded_keys),
        ("Max depth", stats.max_depth),
    ]
    .into_iter()
    .map(|(metric, value)| StatRow {
        metric: metric.to_string(),
        value: value.to_string(),
    })
    .collect::<Vec<_>>();
    render(&rows)
}
