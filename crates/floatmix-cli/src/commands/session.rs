//! Session file management.

use clap::{Args, Subcommand};
use floatmix_config::{
    ConfigError, Session, ensure_user_sessions_dir, find_session, list_user_sessions,
    session_name_from_path,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    action: SessionAction,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Write a new session file
    Init {
        /// Session file path, or a bare name to create it in the user sessions directory
        target: String,

        /// Input WAV files in port order
        #[arg(value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 48000)]
        rate: u32,

        /// Samples per node cycle
        #[arg(long, default_value_t = 1024)]
        block_size: usize,

        /// Buffers installed per port
        #[arg(long, default_value_t = 3)]
        buffers: u32,

        /// Output WAV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate a session
    Check {
        /// Session file path or name
        session: String,
    },

    /// List sessions in the user sessions directory
    List,
}

/// Run the session command.
pub fn run(args: SessionArgs) -> anyhow::Result<()> {
    match args.action {
        SessionAction::Init {
            target,
            inputs,
            rate,
            block_size,
            buffers,
            output,
            force,
        } => {
            let path = if target.contains(std::path::MAIN_SEPARATOR) || target.ends_with(".toml") {
                PathBuf::from(&target)
            } else {
                ensure_user_sessions_dir()?.join(format!("{target}.toml"))
            };
            if path.exists() && !force {
                anyhow::bail!("{} exists; pass --force to overwrite", path.display());
            }

            let name = session_name_from_path(&path).unwrap_or(target);
            let mut session = Session::new(name);
            session.format.rate = rate;
            session.node.block_size = block_size;
            session.node.buffers = buffers;
            for input in inputs {
                session.add_input(input);
            }
            if let Some(output) = output {
                session.output.path = output;
            }

            if let Err(e) = session.validate() {
                println!("Warning: {e}");
            }
            session.save(&path)?;
            println!("Wrote {}", path.display());
        }
        SessionAction::Check { session } => {
            let path = find_session(&session).ok_or(ConfigError::SessionNotFound(session))?;
            let loaded = Session::load(&path)?;
            loaded.validate()?;

            println!("{}: ok", path.display());
            println!("  Name:    {}", loaded.name);
            if let Some(description) = &loaded.description {
                println!("  About:   {description}");
            }
            println!(
                "  Format:  {} Hz, {} channel(s)",
                loaded.format.rate, loaded.format.channels
            );
            println!(
                "  Node:    {} buffers of {} samples",
                loaded.node.buffers, loaded.node.block_size
            );
            for (port, input) in loaded.input_paths().enumerate() {
                println!("  Input {port}: {}", input.display());
            }
            println!(
                "  Output:  {} ({}-bit)",
                loaded.output.path.display(),
                loaded.output.bit_depth
            );
        }
        SessionAction::List => {
            let sessions = list_user_sessions();
            if sessions.is_empty() {
                println!("No sessions found.");
            }
            for path in sessions {
                let name = session_name_from_path(&path).unwrap_or_default();
                match Session::load(&path) {
                    Ok(session) => println!("  {name:<24} {} input(s)", session.inputs.len()),
                    Err(e) => println!("  {name:<24} unreadable: {e}"),
                }
            }
        }
    }

    Ok(())
}
