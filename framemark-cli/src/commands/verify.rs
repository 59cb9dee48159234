//! Verify command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use framemark_core::{ImageSequenceSource, LsbCodec, TamperReport, VerificationPipeline};
use tracing::{error, info};

use crate::utils::{build_config, load_key, print_banner, resolve_payload_len};

pub struct VerifyArgs {
    pub input: PathBuf,
    pub text: Option<String>,
    pub text_len: Option<usize>,
    pub stride: Option<u64>,
    pub auth_len: Option<usize>,
    pub key_file: Option<PathBuf>,
    pub lenient: bool,
    pub json: bool,
}

/// Execute the verify command.
pub fn execute(args: VerifyArgs, quiet: bool) -> Result<()> {
    let key = load_key(args.key_file.as_deref())?;
    let config = build_config(args.auth_len, args.stride, |config| {
        if args.lenient {
            config.with_flag_malformed_payloads(false)
        } else {
            config
        }
    })?;
    let payload_len = resolve_payload_len(args.text.as_deref(), args.text_len, config.auth_len)?;

    info!(
        input = %args.input.display(),
        payload_len,
        stride = config.sample_stride,
        "Verifying frames"
    );

    let pipeline = VerificationPipeline::new(LsbCodec, key, config);
    let report = pipeline
        .verify(ImageSequenceSource::new(&args.input), payload_len)
        .with_context(|| format!("Failed to read frames: {}", args.input.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else if !quiet {
        print_report(&report);
    }

    if report.is_authentic() {
        info!(frames_sampled = report.frames_sampled, "Verification successful");
        Ok(())
    } else {
        error!(tampered = ?report.indices(), "Tampered frames detected");
        bail!(
            "Verification failed: {} of {} sampled frame(s) tampered",
            report.tampered.len(),
            report.frames_sampled
        )
    }
}

fn print_report(report: &TamperReport) {
    if report.is_authentic() {
        print_banner("AUTHENTIC", true);
        println!(
            "   {} {} of {} read",
            "Frames sampled:".dimmed(),
            report.frames_sampled,
            report.frames_read
        );
        println!("   {} {}", "Auth codes:".dimmed(), "All match".green());
        return;
    }

    print_banner("TAMPERED", false);
    println!(
        "   {} {} of {} read",
        "Frames sampled:".dimmed(),
        report.frames_sampled,
        report.frames_read
    );
    println!(
        "   {} {}",
        "Tampered frames:".dimmed(),
        report.tampered.len().to_string().red()
    );
    for frame in &report.tampered {
        println!("     {} {}", format!("#{}", frame.index).red(), frame.reason);
    }
}
