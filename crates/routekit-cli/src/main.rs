mod cmd_list;
mod cmd_parse;
mod cmd_patch;
mod cmd_render;
mod cmd_validate;
mod files;
mod formatter;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use routekit::v1::{Config, Schema};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "routekit")]
#[command(about = "Render, parse, and patch fluent-builder route files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// TOML configuration layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entity schema to read and write with
    #[arg(long, global = true, default_value = "route")]
    schema: String,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a JSON forest as a route file
    Render(cmd_render::RenderArgs),
    /// Read a route file and print its forest as JSON
    Parse {
        /// Route file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Replace one entity's block in a route file
    Patch(cmd_patch::PatchArgs),
    /// Remove one entity's block (and its subtree) from a route file
    Remove(cmd_patch::RemoveArgs),
    /// Check that a route file (or JSON forest) is well formed
    Validate {
        /// Route file, or a .json forest
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the entity ids of a route file as a tree
    List {
        /// Route file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Settings shared by every command.
pub struct Context {
    pub config: Config,
    pub schema_name: String,
    pub pretty: bool,
}

impl Context {
    pub fn schema(&self) -> Result<&Schema> {
        self.config
            .schema(&self.schema_name)
            .with_context(|| format!("no schema named {:?} in configuration", self.schema_name))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(Some(path))
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::builtin().context("failed to load built-in configuration")?,
    };
    let ctx = Context {
        config,
        schema_name: cli.schema,
        pretty: cli.pretty,
    };

    match cli.command {
        Commands::Render(args) => cmd_render::run(&ctx, args),
        Commands::Parse { input } => cmd_parse::run(&ctx, input),
        Commands::Patch(args) => cmd_patch::run_patch(&ctx, args),
        Commands::Remove(args) => cmd_patch::run_remove(&ctx, args),
        Commands::Validate { input } => cmd_validate::run(&ctx, input),
        Commands::List { input, json } => cmd_list::run(&ctx, input, json),
    }
}
