//! Offline mixing command.

use anyhow::Context;
use clap::Args;
use floatmix_config::{Session, find_session};
use floatmix_io::{Error as IoError, MixHost, WavSpec, read_wav, write_wav};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct MixArgs {
    /// Input WAV files, one per input port in port order
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output WAV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Session file or name to take inputs and settings from
    #[arg(short, long, conflicts_with = "inputs")]
    session: Option<String>,

    /// Samples per node cycle
    #[arg(long)]
    block_size: Option<usize>,

    /// Buffers installed per port
    #[arg(long)]
    buffers: Option<u32>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long)]
    bit_depth: Option<u16>,
}

/// Run the mix command.
pub fn run(args: MixArgs) -> anyhow::Result<()> {
    let (mut session, rate_from_session) = match &args.session {
        Some(name) => {
            let path = find_session(name)
                .ok_or_else(|| floatmix_config::ConfigError::SessionNotFound(name.clone()))?;
            let mut session = Session::load(&path)?;
            if let Some(dir) = path.parent() {
                session.resolve_paths(dir);
            }
            println!("Session: {}", session.name);
            (session, true)
        }
        None => {
            if args.inputs.is_empty() {
                anyhow::bail!("No inputs. Pass WAV files or --session");
            }
            let mut session = Session::new("command line");
            for input in &args.inputs {
                session.add_input(input.clone());
            }
            (session, false)
        }
    };

    if let Some(output) = args.output {
        session.output.path = output;
    }
    if let Some(block_size) = args.block_size {
        session.node.block_size = block_size;
    }
    if let Some(buffers) = args.buffers {
        session.node.buffers = buffers;
    }
    if let Some(bit_depth) = args.bit_depth {
        session.output.bit_depth = bit_depth;
    }

    let mut tracks = Vec::with_capacity(session.inputs.len());
    for (port, input) in session.inputs.iter().enumerate() {
        let (samples, spec) =
            read_wav(&input.path).with_context(|| format!("reading {}", input.path.display()))?;
        if port == 0 && !rate_from_session {
            session.format.rate = spec.sample_rate;
        }
        if spec.sample_rate != session.format.rate {
            return Err(IoError::SampleRateMismatch {
                expected: session.format.rate,
                actual: spec.sample_rate,
            })
            .with_context(|| format!("input {port}: {}", input.path.display()));
        }
        println!(
            "  port {port}: {} ({} samples)",
            input.path.display(),
            samples.len()
        );
        tracks.push(samples);
    }

    session.validate()?;

    let mut host = MixHost::new(
        session.format.audio_info(),
        tracks.len(),
        session.node.buffers,
        session.node.block_size,
    )?;

    let total = tracks.iter().map(Vec::len).max().unwrap_or(0);
    println!(
        "Mixing {} input(s) at {} Hz, {} samples/cycle...",
        tracks.len(),
        session.format.rate,
        session.node.block_size
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    let report = host.mix_with(&tracks, |pos| pb.set_position(pos as u64))?;
    pb.finish_with_message("done");

    println!("\nStats:");
    println!(
        "  Cycles: {} ({} summed, {} passthrough)",
        report.cycles, report.mixed_cycles, report.passthrough_cycles
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&report.samples)),
        linear_to_db(peak(&report.samples))
    );
    if session.output.bit_depth != 32 && peak(&report.samples) > 1.0 {
        println!(
            "  Warning: peak above full scale will clip at {}-bit",
            session.output.bit_depth
        );
    }

    let out_spec = WavSpec {
        channels: 1,
        sample_rate: session.format.rate,
        bits_per_sample: session.output.bit_depth,
    };

    println!("\nWriting {}...", session.output.path.display());
    write_wav(&session.output.path, &report.samples, out_spec)?;
    println!("Done!");

    Ok(())
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
