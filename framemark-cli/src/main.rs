//! Framemark CLI - tamper-evident watermarks for video frame sequences.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use framemark_core::HashAlgorithm;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use commands::embed::EmbedArgs;
use commands::extract::ExtractArgs;
use commands::verify::VerifyArgs;
use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success (verify: no tampered frames)
  1   General error
  64  Usage error (invalid arguments, missing key)
  65  Tampered frames detected or no watermark found
  66  Input frames cannot be read
  74  Output frames cannot be written

Environment:
  FRAMEMARK_SECRET_KEY  Secret key when --key-file is not given
  RUST_LOG              Log filter (overrides -v)";

#[derive(Parser)]
#[command(name = "framemark")]
#[command(author, version, about = "Tamper-evident watermarks for video frames", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Only print essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed "<text>|<auth code>" into every frame of an image sequence
    Embed {
        /// Directory of input frames (png, jpg)
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Directory to write watermarked PNG frames to
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Watermark text (must not contain '|')
        #[arg(short, long)]
        text: String,

        /// Embedding strength passed to the codec
        #[arg(long)]
        strength: Option<f32>,

        /// Auth code length in hex characters (1-64)
        #[arg(long)]
        auth_len: Option<usize>,

        /// Frames processed per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// File containing the secret key
        #[arg(short, long, value_name = "FILE")]
        key_file: Option<PathBuf>,
    },

    /// Check sampled frames for tampering
    Verify {
        /// Directory of watermarked frames
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Watermark text that was embedded
        #[arg(short, long, required_unless_present = "text_len", conflicts_with = "text_len")]
        text: Option<String>,

        /// Length in bytes of the embedded watermark text
        #[arg(long)]
        text_len: Option<usize>,

        /// Verify every N-th frame, starting at frame 0
        #[arg(short, long)]
        stride: Option<u64>,

        /// Auth code length in hex characters (must match embedding)
        #[arg(long)]
        auth_len: Option<usize>,

        /// File containing the secret key
        #[arg(short, long, value_name = "FILE")]
        key_file: Option<PathBuf>,

        /// Ignore payloads without a delimiter instead of reporting them
        #[arg(long)]
        lenient: bool,

        /// Print the tamper report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recover the watermark by majority vote over sampled frames
    Extract {
        /// Directory of watermarked frames
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Expected watermark text (only its length is used)
        #[arg(short, long, required_unless_present = "text_len", conflicts_with = "text_len")]
        text: Option<String>,

        /// Length in bytes of the embedded watermark text
        #[arg(long)]
        text_len: Option<usize>,

        /// Read every N-th frame, starting at frame 0
        #[arg(short, long)]
        stride: Option<u64>,

        /// Auth code length in hex characters (must match embedding)
        #[arg(long)]
        auth_len: Option<usize>,

        /// Stop after this many successful extractions
        #[arg(long)]
        max_votes: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print perceptual fingerprints of images
    Fingerprint {
        /// Image files; distances are relative to the first one
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Hash algorithm (phash, mean, gradient, blockhash)
        #[arg(short, long, default_value = "phash")]
        algorithm: HashAlgorithm,
    },

    /// Show frame count, dimensions and payload capacity of a sequence
    Info {
        /// Directory of frames
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, quiet: bool) -> Result<()> {
    match command {
        Commands::Embed {
            input,
            output,
            text,
            strength,
            auth_len,
            batch_size,
            key_file,
        } => commands::embed::execute(
            EmbedArgs {
                input,
                output,
                text,
                strength,
                auth_len,
                batch_size,
                key_file,
            },
            quiet,
        ),
        Commands::Verify {
            input,
            text,
            text_len,
            stride,
            auth_len,
            key_file,
            lenient,
            json,
        } => commands::verify::execute(
            VerifyArgs {
                input,
                text,
                text_len,
                stride,
                auth_len,
                key_file,
                lenient,
                json,
            },
            quiet,
        ),
        Commands::Extract {
            input,
            text,
            text_len,
            stride,
            auth_len,
            max_votes,
            json,
        } => commands::extract::execute(
            ExtractArgs {
                input,
                text,
                text_len,
                stride,
                auth_len,
                max_votes,
                json,
            },
            quiet,
        ),
        Commands::Fingerprint { images, algorithm } => {
            commands::fingerprint::execute(images, algorithm, quiet)
        }
        Commands::Info { input, json } => commands::info::execute(input, json),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version go to stdout and succeed
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli.command, cli.quiet) {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
