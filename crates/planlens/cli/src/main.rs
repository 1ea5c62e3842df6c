//! PlanLens CLI
//!
//! Command-line interface for exploring PostgreSQL plans through planner
//! hints and what-if scenarios.

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::CommandContext;
use config::PlanLensConfig;
use planlens_common::ExecutionError;
use planlens_core::PipelineError;
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "planlens", about = "PlanLens - query plan hints and what-if analysis")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database name (overrides $PLANLENS_DATABASE)
    #[arg(long, short = 'd', global = true)]
    pub database: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a plan comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PlanInput {
    /// Saved EXPLAIN (FORMAT JSON) output
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Query to explain against the database
    #[arg(long)]
    pub query: Option<String>,
}

/// Scenario selection for a rewrite
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Query to rewrite, with its hint block
    pub query: String,

    /// Scenario question, as printed by `questions` (repeatable)
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Plan node selection as '<hint>=<Node Type>' (repeatable)
    #[arg(long = "instance")]
    pub instances: Vec<String>,
}

/// Subcommands for configuration inspection
#[derive(Subcommand, Debug)]
#[command(about = "Inspect CLI configuration")]
pub enum ConfigCommands {
    /// Show current effective configuration
    Show,
}

/// Top-level commands for planlens
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the hints that reproduce a plan
    Hints {
        #[command(flatten)]
        input: PlanInput,
    },

    /// Print the what-if questions for a plan
    Questions {
        #[command(flatten)]
        input: PlanInput,
    },

    /// Rewrite a query for the selected scenarios without running it
    Rewrite(ScenarioArgs),

    /// Rewrite a query and compare its plan against the original
    Whatif(ScenarioArgs),

    /// Explain a query and report hints, questions and block usage
    Analyze {
        /// SQL query
        query: String,
    },

    /// Show which blocks of each relation a query reads
    Blocks {
        /// SQL query
        query: String,
    },

    /// Print the rows stored in one block of a relation
    InspectBlock {
        /// Relation name
        relation: String,
        /// Block index
        block: u64,
    },

    /// List the tables of the public schema
    Tables,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Fixed message for engine failures, so detail stays in the logs.
fn user_message(e: &anyhow::Error) -> Option<&'static str> {
    if let Some(exec) = e.downcast_ref::<ExecutionError>() {
        return Some(exec.user_message());
    }
    e.downcast_ref::<PipelineError>().and_then(PipelineError::execution).map(ExecutionError::user_message)
}

fn run(cli: Cli) -> Result<()> {
    let config = PlanLensConfig::resolve_config(cli.config, cli.database)?;
    let ctx = CommandContext::new(config, cli.json);

    match cli.command {
        Commands::Hints { input } => commands::plan::show_hints(&ctx, input.plan.as_deref(), input.query.as_deref()),
        Commands::Questions { input } => commands::plan::show_questions(&ctx, input.plan.as_deref(), input.query.as_deref()),
        Commands::Rewrite(args) => commands::whatif::rewrite_query(&ctx, &args.query, &args.scenarios, &args.instances),
        Commands::Whatif(args) => commands::whatif::run_what_if(&ctx, &args.query, &args.scenarios, &args.instances),
        Commands::Analyze { query } => commands::plan::analyze_query(&ctx, &query),
        Commands::Blocks { query } => commands::blocks::show_blocks(&ctx, &query),
        Commands::InspectBlock { relation, block } => commands::blocks::inspect_block(&ctx, &relation, block),
        Commands::Tables => commands::blocks::list_tables(&ctx),
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show_config(&ctx),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        error!("Command failed: {:#}", e);
        eprintln!("{}", user_message(&e).map_or_else(|| format!("Error: {e:#}"), str::to_string));
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_input_is_exclusive() {
        assert!(Cli::try_parse_from(["planlens", "hints", "--plan", "plan.json"]).is_ok());
        assert!(Cli::try_parse_from(["planlens", "hints"]).is_err());
        assert!(Cli::try_parse_from(["planlens", "hints", "--plan", "plan.json", "--query", "SELECT 1"]).is_err());
    }

    #[test]
    fn test_rewrite_arguments() {
        let cli = Cli::try_parse_from([
            "planlens",
            "rewrite",
            "/*+ SeqScan(nation) */ SELECT * FROM nation",
            "--scenario",
            "What happens if I prevent the use of Sequential Scan for table nation?",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Rewrite(args) => {
                assert_eq!(args.scenarios.len(), 1);
                assert!(args.instances.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_user_message_for_engine_errors() {
        let err = anyhow::Error::new(PipelineError::Execution(ExecutionError::unavailable("connection refused")));
        assert!(user_message(&err).is_some_and(|m| m.contains("Failed to connect")));
        let err = anyhow::Error::new(ExecutionError::invalid_query("syntax error"));
        assert_eq!(user_message(&err), Some("Invalid SQL query!"));
        assert_eq!(user_message(&anyhow::anyhow!("other")), None);
    }
}
