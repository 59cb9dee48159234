//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use framemark_core::{payload_len, PipelineConfig, SecretKey};
use tracing::debug;

/// Environment variable holding the secret key when no key file is given.
pub const SECRET_KEY_ENV: &str = "FRAMEMARK_SECRET_KEY";

/// Load the secret key from `--key-file`, falling back to the environment.
pub fn load_key(key_file: Option<&Path>) -> Result<SecretKey> {
    if let Some(path) = key_file {
        let key = SecretKey::from_file(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        debug!(source = "file", "Loaded secret key");
        return Ok(key);
    }

    match std::env::var(SECRET_KEY_ENV) {
        Ok(value) if !value.is_empty() => {
            debug!(source = "env", "Loaded secret key");
            Ok(SecretKey::new(value.into_bytes())?)
        }
        _ => bail!("No secret key: pass --key-file or set {SECRET_KEY_ENV}"),
    }
}

/// Payload length to extract, from either the watermark text or its length.
pub fn resolve_payload_len(
    text: Option<&str>,
    text_len: Option<usize>,
    auth_len: usize,
) -> Result<usize> {
    let text_len = match (text, text_len) {
        (Some(text), _) => text.len(),
        (None, Some(len)) => len,
        (None, None) => bail!("Invalid argument: pass --text or --text-len"),
    };
    if text_len == 0 {
        bail!("Invalid argument: watermark text length must be at least 1");
    }
    Ok(payload_len(text_len, auth_len))
}

/// Environment configuration with command-line overrides applied.
pub fn build_config(
    auth_len: Option<usize>,
    sample_stride: Option<u64>,
    apply: impl FnOnce(PipelineConfig) -> PipelineConfig,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env();
    if let Some(auth_len) = auth_len {
        config = config.with_auth_len(auth_len);
    }
    if let Some(stride) = sample_stride {
        config = config.with_sample_stride(stride);
    }
    let config = apply(config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid argument: {e}"))?;
    debug!(?config, "Resolved pipeline configuration");
    Ok(config)
}

/// Print a framed status banner, green for `ok` and red otherwise.
pub fn print_banner(label: &str, ok: bool) {
    let border = "═".repeat(40);
    let lines = [
        format!("╔{border}╗"),
        format!("║{label:^40}║"),
        format!("╚{border}╝"),
    ];

    println!();
    for (i, line) in lines.iter().enumerate() {
        let styled = if ok { line.green() } else { line.red() };
        if i == 1 {
            println!("{}", styled.bold());
        } else {
            println!("{}", styled);
        }
    }
    println!();
}
