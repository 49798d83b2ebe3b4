//! SchemaPack CLI
//!
//! Command-line interface for portable schema packages

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use schemapack_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "schemapack")]
#[command(about = "SchemaPack - Portable schema packages, drift and library", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand
#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// SQLite store holding documents and the library
    #[arg(long, global = true, env = "SCHEMAPACK_DB", default_value = ".schemapack/store.db")]
    pub db: PathBuf,

    /// Document to operate on
    #[arg(long, global = true, env = "SCHEMAPACK_DOCUMENT", default_value = "default")]
    pub document: String,

    /// Directory of bundled package definitions
    #[arg(
        long,
        global = true,
        env = "SCHEMAPACK_PACKAGES",
        default_value = ".schemapack/packages"
    )]
    pub packages: PathBuf,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the content hash of a definition file
    Hash(commands::package::FileArgs),
    /// Validate a definition file
    Validate(commands::package::FileArgs),
    /// Install a bundled package into the document
    Apply(commands::package::PackageArgs),
    /// Remove an installed package from the document
    Uninstall(commands::package::PackageArgs),
    /// Check whether an installed package was modified
    Drift(commands::package::DriftArgs),
    /// Diff an installed package against its snapshot
    Diff(commands::package::DiffArgs),
    /// Publish an installed package to the library
    Publish(commands::library::PublishArgs),
    /// Library operations
    Library(commands::library::LibraryArgs),
}

fn main() {
    let cli = Cli::parse();

    init(match cli.global.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Hash(args) => commands::package::hash(args),
        Commands::Validate(args) => commands::package::validate(args),
        Commands::Apply(args) => commands::package::apply(&cli.global, args),
        Commands::Uninstall(args) => commands::package::uninstall(&cli.global, args),
        Commands::Drift(args) => commands::package::drift(&cli.global, args),
        Commands::Diff(args) => commands::package::diff(&cli.global, args),
        Commands::Publish(args) => commands::library::publish(&cli.global, args),
        Commands::Library(args) => commands::library::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
