use std::path::Path;

use owo_colors::OwoColorize;
use scopegraph::config::{self, OutputFormat, ScopegraphConfig};
use scopegraph::scope::TreeNode;
use scopegraph::ui::{self, theme, Icons};
use scopegraph::{Script, SymbolKind};

pub fn run_replay(
    script_path: &Path,
    biasless: &[SymbolKind],
    format: OutputFormat,
    strict: bool,
) -> anyhow::Result<()> {
    tracing::info!("Replaying {}", script_path.display());
    let script = Script::load(script_path)?;
    let report = script.replay(biasless)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            ui::header(&format!("Replay of {}", script_path.display()));
            let kinds: Vec<&str> = biasless.iter().map(SymbolKind::as_str).collect();
            ui::info("Unique per scope", &kinds.join(", "));

            let declarations = ui::declarations_table(&report.outcomes);
            if !declarations.is_empty() {
                ui::section("Declarations");
                println!("{}", declarations);
            }

            let lookups = ui::lookups_table(&report.outcomes);
            if !lookups.is_empty() {
                ui::section("Lookups");
                println!("{}", lookups);
            }

            ui::section("Summary");
            println!("{}", ui::stats_table(&report.stats));
            ui::summary_row("Declared:", &report.declared().to_string());
            ui::summary_row("Rejected:", &report.rejected().to_string());
            ui::summary_row("Resolved:", &report.resolved().to_string());
            ui::summary_row("Unresolved:", &report.unresolved().to_string());

            if report.rejected() > 0 {
                ui::warn(&format!("{} redeclarations were rejected", report.rejected()));
            }
        }
    }

    let failed = report.failed_expectations();
    if failed > 0 {
        if strict {
            anyhow::bail!("{} lookups did not resolve as expected", failed);
        }
        ui::warn(&format!("{} lookups did not resolve as expected", failed));
    } else if format == OutputFormat::Text {
        ui::success("All expectations met");
    }

    Ok(())
}

pub fn run_tree(
    script_path: &Path,
    biasless: &[SymbolKind],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let script = Script::load(script_path)?;
    let report = script.replay(biasless)?;
    let Some(tree) = report.tree else {
        anyhow::bail!("script produced an empty graph");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
        OutputFormat::Text => {
            ui::header(&format!("{} Scope tree of {}", Icons::TREE, script_path.display()));
            print_tree(&tree);
            println!();
            println!("{} {}", Icons::STATS, report.stats);
        }
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    let config = ScopegraphConfig {
        format: Some(OutputFormat::Text),
        biasless_kinds: Some(SymbolKind::default_biasless()),
    };
    config::write_config(path, &config, force)?;
    ui::success(&format!("Wrote {}", path.display()));
    Ok(())
}

/// Indented dump; explicit stack so deeply nested trees print fine
fn print_tree(root: &TreeNode) {
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let bias = ui::muted(&format!("[bias {}]", node.bias));
        if node.is_super {
            println!(
                "{}{} {} {}",
                indent,
                node.key.style(theme().inherited.clone()),
                bias,
                Icons::LINK
            );
        } else {
            println!("{}{} {}", indent, node.key, bias);
        }
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}
