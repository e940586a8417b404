//! confsig: content-addressed compose configs for Docker Swarm.
//!
//! # Usage
//!
//! ```text
//! confsig digest -n <namespace> [-f <manifest>...] [--format env|dotenv|json] [--output <path>]
//! confsig prune  -n <namespace> [-f <manifest>...] [--dry-run] [--json] [--docker <bin>] [--host <host>]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{digest::DigestArgs, prune::PruneArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "confsig",
    version,
    about = "Version compose configs by content and prune the stale ones",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute content digests for every `csig_` config and print the bindings.
    Digest(DigestArgs),

    /// Remove configs left behind by earlier deployments.
    Prune(PruneArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Digest(args) => args.run(),
        Commands::Prune(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
