//! brrr-fragcheck CLI - verify embedded C/C++ fragments before generation.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brrr_fragcheck::{load_config, FrontEndKind, Project, Verifier, VerifierConfig, VerifyError};

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Verify embedded C/C++ fragments of a modeling project.
#[derive(Parser)]
#[command(
    name = "brrr-fragcheck",
    version,
    about = "Semantic verifier for embedded C/C++ fragments",
    long_about = r#"
Semantic verifier for embedded C/C++ fragments.

Examples:
    brrr-fragcheck verify project.json              # Check every fragment and type
    brrr-fragcheck verify project.json --format json
    brrr-fragcheck unit project.json                # Print the synthesized unit
    brrr-fragcheck init > fragcheck.toml            # Write a default config

Configuration:
    fragcheck.toml is searched upward from the manifest directory.
    Use --config to point at a specific file.

Exit codes:
    0  verification passed
    1  verification failed
    2  usage or configuration error
"#
)]
struct Cli {
    /// Config file (default: nearest fragcheck.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured front end
    #[arg(long, global = true, value_enum)]
    frontend: Option<FrontEndArg>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FrontEndArg {
    /// External compiler (g++/clang++) plus tree-sitter declarations
    Compiler,
    /// tree-sitter only, syntax errors and declarations
    Syntax,
}

impl From<FrontEndArg> for FrontEndKind {
    fn from(arg: FrontEndArg) -> Self {
        match arg {
            FrontEndArg::Compiler => FrontEndKind::Compiler,
            FrontEndArg::Syntax => FrontEndKind::Syntax,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify all fragments and checks of a project manifest
    Verify {
        /// Project manifest (JSON)
        project: PathBuf,
    },

    /// Print the translation unit a verification would parse
    Unit {
        /// Project manifest (JSON)
        project: PathBuf,
    },

    /// Print a default fragcheck.toml
    Init,
}

// =============================================================================
// COMMANDS
// =============================================================================

const EXIT_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn load_verifier(cli: &Cli, project_path: &Path) -> Result<Verifier> {
    let start_dir = match project_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().context("Failed to read current directory")?,
    };
    let mut config: VerifierConfig =
        load_config(cli.config.as_deref(), &start_dir).context("Failed to load config")?;
    if let Some(frontend) = cli.frontend {
        config.frontend = frontend.into();
    }

    let project = Project::load(project_path)
        .with_context(|| format!("Failed to load project {}", project_path.display()))?;

    let mut verifier = Verifier::from_config(config);
    project.apply(&mut verifier);
    Ok(verifier)
}

fn is_verification_failure(error: &VerifyError) -> bool {
    matches!(
        error,
        VerifyError::Unattributable { .. }
            | VerifyError::ForeignFile { .. }
            | VerifyError::CapabilityMissing { .. }
            | VerifyError::Expression { .. }
    )
}

fn report(format: OutputFormat, outcome: &std::result::Result<(), VerifyError>) -> Result<()> {
    match format {
        OutputFormat::Text => match outcome {
            Ok(()) => println!("ok"),
            Err(e) => println!("{}", e),
        },
        OutputFormat::Json => {
            let value = match outcome {
                Ok(()) => json!({ "ok": true }),
                Err(e) => json!({
                    "ok": false,
                    "kind": e.kind(),
                    "locator": e.locator().map(|l| l.as_str()),
                    "message": e.message(),
                    "error": e.to_string(),
                }),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&value).context("Failed to serialize JSON")?
            );
        }
    }
    Ok(())
}

fn cmd_verify(cli: &Cli, project_path: &Path) -> Result<ExitCode> {
    let verifier = load_verifier(cli, project_path)?;
    let outcome = match verifier.verify() {
        Err(e) if !is_verification_failure(&e) => {
            return Err(anyhow::Error::new(e).context("Verification aborted"));
        }
        outcome => outcome,
    };

    match &outcome {
        Err(e) => info!(kind = e.kind(), "verification failed"),
        Ok(()) => info!("verification passed"),
    }

    report(cli.format, &outcome)?;
    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(EXIT_FAILED),
    })
}

fn cmd_unit(cli: &Cli, project_path: &Path) -> Result<ExitCode> {
    let verifier = load_verifier(cli, project_path)?;
    print!("{}", verifier.render_unit());
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Verify { project } => cmd_verify(cli, project),
        Commands::Unit { project } => cmd_unit(cli, project),
        Commands::Init => {
            print!("{}", VerifierConfig::default_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}
