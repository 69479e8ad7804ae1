//! # tyrpc
//!
//! Generate typed RPC clients from an app definition.
//!
//! ## Usage
//!
//! ```bash
//! # Run every generator in tyrpc.toml
//! tyrpc generate
//!
//! # Use another definition file and preview the output
//! tyrpc generate --definition api/app_definition.json --dry-run
//!
//! # Write a starter configuration
//! tyrpc init
//!
//! # Validate a definition
//! tyrpc check --definition app_definition.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use tyrpc_cli::{
    config::{CliArgs, ConfigManager, CONFIG_FILENAME},
    error::CliError,
    generator::render_all,
    loader::load_definition,
};

#[derive(Parser)]
#[command(name = "tyrpc")]
#[command(author, version, about = "Generate typed RPC clients from app definitions", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured client generators
    Generate {
        /// App definition JSON file
        #[arg(short, long)]
        definition: Option<PathBuf>,

        /// Directory generator output is resolved against
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preview output without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize a new tyrpc configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Validate an app definition
    Check {
        /// App definition JSON file
        #[arg(short, long)]
        definition: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            if e.is_invalid_definition() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            definition,
            output,
            config,
            dry_run,
        } => cmd_generate(definition, output, config, dry_run),

        Commands::Init { output, force } => cmd_init(output, force),

        Commands::Check { definition } => cmd_check(definition),
    }
}

/// Generate command implementation.
fn cmd_generate(
    definition: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), CliError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    let config = ConfigManager::merge_cli_args(config, &CliArgs { definition, output });

    if config.generators.is_empty() {
        println!(
            "{} No generators configured. Run 'tyrpc init' to create {}.",
            "Warning:".yellow(),
            CONFIG_FILENAME
        );
        return Ok(());
    }

    println!(
        "{} {}",
        "Loading definition".cyan(),
        config.input.definition.display()
    );
    let app = load_definition(&config.input.definition)?;
    println!(
        "  Found {} procedure(s) and {} model(s)",
        app.procedures.len().to_string().green(),
        app.models.len().to_string().green()
    );

    println!("{}", "Running generators...".cyan());
    let runs = render_all(&app, &config);
    let total = runs.len();
    let mut failed = 0;

    for outcome in runs {
        let files = match outcome.result {
            Ok(files) => files,
            Err(e) => {
                failed += 1;
                eprintln!(
                    "{} {} ({}): {}",
                    "✗".red(),
                    outcome.client_name,
                    outcome.kind.as_str(),
                    e
                );
                continue;
            }
        };

        for file in files {
            if dry_run {
                println!(
                    "{} Would write to {}:",
                    "[dry-run]".yellow(),
                    file.path.display()
                );
                println!("{}", "─".repeat(60).dimmed());
                println!("{}", file.contents);
                println!("{}", "─".repeat(60).dimmed());
                continue;
            }
            file.write()?;
            println!(
                "{} {} ({}): wrote {} bytes to {}",
                "✓".green(),
                outcome.client_name,
                outcome.kind.as_str(),
                file.contents.len(),
                file.path.display()
            );
        }
    }

    if failed > 0 {
        return Err(CliError::Generators { failed, total });
    }
    Ok(())
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        println!("  Use --force to overwrite");
        return Err(CliError::Usage(format!(
            "Configuration file already exists: {}",
            output.display()
        )));
    }

    std::fs::write(&output, ConfigManager::default_config_content())?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Check command implementation.
fn cmd_check(definition: PathBuf) -> Result<(), CliError> {
    let app = load_definition(&definition)?;
    let tree = app.service_tree().map_err(|e| {
        CliError::Load(tyrpc_cli::error::LoadError::Invalid {
            path: definition.clone(),
            source: e,
        })
    })?;

    println!("{} {} is valid", "✓".green(), definition.display());
    println!("  Schema version: {}", app.schema_version);
    println!(
        "  Procedures: {} ({} top-level)",
        app.procedures.len().to_string().green(),
        tree.len()
    );
    println!("  Models: {}", app.models.len().to_string().green());

    Ok(())
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
