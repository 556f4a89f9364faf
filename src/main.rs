//! Scopegraph CLI - replay declaration scripts through the scope graph

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use scopegraph::config::{self, OutputFormat};
use scopegraph::ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "scopegraph")]
#[command(version)]
#[command(about = "Hierarchical symbol table with bias-ranked overloads and inherited members")]
#[command(long_about = r#"
Scopegraph replays a declaration script (TOML) into a scope graph, enabling:
  • Redeclaration checks per scope
  • Overload ranking by declaration order
  • Inherited members that local declarations always shadow
  • Outward name resolution from any scope

Example usage:
  scopegraph replay shapes.toml
  scopegraph replay shapes.toml --format json
  scopegraph tree shapes.toml
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph from a script and resolve its lookups
    Replay {
        /// Declaration script
        script: PathBuf,

        /// Output format (overrides the config file)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Exit with an error when any lookup misses its expectation
        #[arg(long)]
        strict: bool,
    },

    /// Print the scope tree built from a script
    Tree {
        /// Declaration script
        script: PathBuf,

        /// Output format (overrides the config file)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Write a default scopegraph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Replay { script, format, strict } => {
            let format = format.or(settings.format).unwrap_or_default();
            commands::run_replay(&script, &settings.biasless_kinds(), format, strict)
        }
        Commands::Tree { script, format } => {
            let format = format.or(settings.format).unwrap_or_default();
            commands::run_tree(&script, &settings.biasless_kinds(), format)
        }
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            commands::run_init(&path, force)
        }
    }
}
