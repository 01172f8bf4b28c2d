//! jitplat CLI: inspect device platform and compiler resolution.

mod commands;
mod topology;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "jitplat", version, about = "Device platform and JIT compiler resolution")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a visible device list (e.g. "0,2")
    ParseVisible {
        /// Comma-separated device ordinals
        list: String,
    },
    /// Resolve platform info, compiler, and allocator for each device
    Resolve {
        /// Topology file describing platforms and devices
        #[arg(long)]
        topology: PathBuf,
        /// Only resolve the named device
        #[arg(long)]
        device: Option<String>,
        /// JIT flags file (TOML)
        #[arg(long)]
        flags: Option<PathBuf>,
        /// Report format (human, json)
        #[arg(long, default_value = "human")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::ParseVisible { list } => commands::parse::run(&list),
        Commands::Resolve {
            topology,
            device,
            flags,
            format,
        } => commands::resolve::run(&topology, device.as_deref(), flags.as_deref(), &format),
    }
}
