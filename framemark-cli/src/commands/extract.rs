//! Extract command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use framemark_core::{payload, ExtractionPipeline, ImageSequenceSource, LsbCodec};
use tracing::info;

use crate::utils::{build_config, resolve_payload_len};

pub struct ExtractArgs {
    pub input: PathBuf,
    pub text: Option<String>,
    pub text_len: Option<usize>,
    pub stride: Option<u64>,
    pub auth_len: Option<usize>,
    pub max_votes: Option<usize>,
    pub json: bool,
}

/// Execute the extract command.
pub fn execute(args: ExtractArgs, quiet: bool) -> Result<()> {
    let config = build_config(args.auth_len, args.stride, |mut config| {
        if let Some(max_votes) = args.max_votes {
            config = config.with_max_votes(max_votes);
        }
        config
    })?;
    let payload_len = resolve_payload_len(args.text.as_deref(), args.text_len, config.auth_len)?;

    let tally = ExtractionPipeline::new(LsbCodec, config)
        .tally(ImageSequenceSource::new(&args.input), payload_len)
        .with_context(|| format!("Failed to read frames: {}", args.input.display()))?;

    let Some((winner, votes)) = tally.winner() else {
        bail!(
            "No watermark found in {} frame(s) read",
            tally.frames_read
        );
    };
    info!(votes, ballots = tally.ballots, "Recovered watermark");

    // The winner is the whole payload; split it when it is well formed.
    let decoded = payload::decode(winner).ok();

    if args.json {
        let json = serde_json::json!({
            "payload": winner,
            "text": decoded.as_ref().map(|p| p.text.as_str()),
            "auth_code": decoded.as_ref().map(|p| p.auth_code.as_str()),
            "votes": votes,
            "ballots": tally.ballots,
            "frames_read": tally.frames_read,
        });
        let json = serde_json::to_string_pretty(&json).context("Failed to serialize result")?;
        println!("{json}");
    } else if quiet {
        println!("{winner}");
    } else {
        println!();
        match &decoded {
            Some(payload) => {
                println!("   {} {}", "Watermark:".dimmed(), payload.text.bold());
                println!("   {} {}", "Auth code:".dimmed(), payload.auth_code);
            }
            None => {
                println!("   {} {}", "Payload:".dimmed(), winner.bold());
                println!("   {} {}", "Note:".dimmed(), "payload has no valid delimiter".yellow());
            }
        }
        println!(
            "   {} {}/{} ({} distinct)",
            "Votes:".dimmed(),
            votes,
            tally.ballots,
            tally.counts().len()
        );
    }

    Ok(())
}
