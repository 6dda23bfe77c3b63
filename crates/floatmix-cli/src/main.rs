//! floatmix CLI - mix mono WAV files through the floatmix node.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "floatmix")]
#[command(author, version, about = "Real-time float mixing node CLI", long_about = None)]
struct Cli {
    /// Raise log verbosity to debug (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix WAV files, or the inputs of a session, into one file
    Mix(commands::mix::MixArgs),

    /// Show the parameters a port advertises
    Caps(commands::caps::CapsArgs),

    /// Display WAV file information
    Info(commands::info::InfoArgs),

    /// Create, check and list session files
    Session(commands::session::SessionArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mix(args) => commands::mix::run(args),
        Commands::Caps(args) => commands::caps::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Session(args) => commands::session::run(args),
    }
}
