//! Embed command implementation.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use framemark_core::frame::probe;
use framemark_core::{
    payload_len, EmbeddingPipeline, ImageSequenceSink, ImageSequenceSource, LsbCodec,
};
use tracing::{info, warn};

use crate::utils::{build_config, load_key};

pub struct EmbedArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub text: String,
    pub strength: Option<f32>,
    pub auth_len: Option<usize>,
    pub batch_size: Option<usize>,
    pub key_file: Option<PathBuf>,
}

/// Execute the embed command.
pub fn execute(args: EmbedArgs, quiet: bool) -> Result<()> {
    let key = load_key(args.key_file.as_deref())?;
    let config = build_config(args.auth_len, None, |mut config| {
        if let Some(strength) = args.strength {
            config = config.with_strength(strength);
        }
        if let Some(batch_size) = args.batch_size {
            config = config.with_batch_size(batch_size);
        }
        config
    })?;

    // The sink clears earlier frame_*.png output before writing.
    if same_directory(&args.input, &args.output) {
        anyhow::bail!("Invalid argument: output directory must differ from the input directory");
    }

    let total = probe(&args.input)
        .with_context(|| format!("Failed to read frames: {}", args.input.display()))?
        .frame_count;
    info!(input = %args.input.display(), frames = total, "Embedding watermark");

    let mut pipeline = EmbeddingPipeline::new(LsbCodec, key, config.clone());
    if !quiet && std::io::stderr().is_terminal() {
        pipeline = pipeline.on_progress(move |written| {
            eprint!("\r   Embedding frame {written}/{total}");
            let _ = std::io::stderr().flush();
        });
    }

    let mut sink = ImageSequenceSink::new(&args.output);
    let report = pipeline
        .embed(ImageSequenceSource::new(&args.input), &mut sink, &args.text)
        .context("Embedding failed")?;

    for skipped in &report.skipped {
        warn!(frame = skipped.index, reason = %skipped.reason, "Frame copied without watermark");
    }

    if !quiet {
        if std::io::stderr().is_terminal() {
            eprintln!();
        }
        println!();
        println!("{}", "Watermark embedded".green().bold());
        println!();
        println!("   {} {}", "Output:".dimmed(), args.output.display());
        println!(
            "   {} {}/{}",
            "Frames watermarked:".dimmed(),
            report.frames_watermarked,
            report.frames_written
        );
        println!(
            "   {} {} ({} auth code chars)",
            "Payload length:".dimmed(),
            payload_len(args.text.len(), config.auth_len),
            config.auth_len
        );
        if !report.skipped.is_empty() {
            println!(
                "   {} {}",
                "Copied unmarked:".dimmed(),
                report
                    .skipped
                    .iter()
                    .map(|s| s.index.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .yellow()
            );
        }
    }

    Ok(())
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
