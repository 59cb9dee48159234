//! Info command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use framemark_core::frame::probe;
use framemark_core::PipelineConfig;

/// Execute the info command.
pub fn execute(input: PathBuf, json: bool) -> Result<()> {
    let info = probe(&input)
        .with_context(|| format!("Failed to read frames: {}", input.display()))?;
    let config = PipelineConfig::from_env();

    // One payload bit per pixel in the LSB codec.
    let capacity = info.width as usize * info.height as usize / 8;
    let max_text = capacity
        .saturating_sub(1 + config.auth_len)
        .min(config.max_text_len);
    let sampled = info.frame_count.div_ceil(config.sample_stride.max(1) as usize);

    if json {
        let json = serde_json::json!({
            "frame_count": info.frame_count,
            "width": info.width,
            "height": info.height,
            "payload_capacity": capacity,
            "max_text_len": max_text,
            "sampled_frames": sampled,
        });
        let json = serde_json::to_string_pretty(&json).context("Failed to serialize info")?;
        println!("{json}");
        return Ok(());
    }

    println!();
    println!("   {} {}", "Sequence:".dimmed(), input.display());
    println!("   {} {}", "Frames:".dimmed(), info.frame_count);
    println!("   {} {}x{}", "Dimensions:".dimmed(), info.width, info.height);
    println!("   {} {} bytes", "Payload capacity:".dimmed(), capacity);
    println!("   {} {} bytes", "Longest watermark:".dimmed(), max_text);
    println!(
        "   {} {} (every {} frames)",
        "Frames verified:".dimmed(),
        sampled,
        config.sample_stride
    );

    Ok(())
}
