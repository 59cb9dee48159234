//! Example showing the pipelines' tracing output on a synthetic clip.
//!
//! Run with: cargo run -p framemark-core --example pipeline_tracing

use framemark_core::{
    payload_len, EmbeddingPipeline, ExtractionPipeline, Frame, LsbCodec, MemorySink,
    MemorySource, PipelineConfig, SecretKey, VerificationPipeline,
};
use image::{Rgb, RgbImage};
use tracing_subscriber::{fmt, EnvFilter};

const TEXT: &str = "MyWatermark";

fn clip(frames: u64) -> Vec<Frame> {
    (0..frames)
        .map(|i| {
            let image = RgbImage::from_fn(96, 64, |x, y| {
                let shift = i as u32 * 6;
                Rgb([((x + shift) * 2) as u8, (y * 3) as u8, ((x ^ y) * 4) as u8])
            });
            Frame::from_rgb_image(i, image)
        })
        .collect()
}

fn main() {
    // Per-frame events are logged at debug level
    fmt()
        .with_env_filter(EnvFilter::new("framemark_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Framemark Pipeline Tracing Demo ===\n");

    let key = match SecretKey::new(b"demo-key".to_vec()) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Invalid key: {}", e);
            return;
        }
    };
    let config = PipelineConfig::default().with_sample_stride(4);
    println!("Config: {:?}", config);
    println!("Key: {:?}\n", key);

    let mut sink = MemorySink::new();
    let embedder = EmbeddingPipeline::new(LsbCodec, key.clone(), config.clone());
    match embedder.embed(MemorySource::new(clip(12)), &mut sink, TEXT) {
        Ok(report) => println!("\nEmbedded: {:?}\n", report),
        Err(e) => {
            eprintln!("Embedding failed: {}", e);
            return;
        }
    }

    // Tamper with one sampled frame
    let mut frames = sink.into_frames();
    let edited: Vec<u8> = frames[8].pixels().iter().map(|p| p ^ 0x40).collect();
    if let Ok(frame) = frames[8].with_pixels(edited) {
        frames[8] = frame;
    }

    let len = payload_len(TEXT.len(), config.auth_len);
    let verifier = VerificationPipeline::new(LsbCodec, key, config.clone());
    match verifier.verify(MemorySource::new(frames.clone()), len) {
        Ok(report) => println!("\nTampered frames: {:?}\n", report.indices()),
        Err(e) => eprintln!("Verification failed: {}", e),
    }

    let extractor = ExtractionPipeline::new(LsbCodec, config);
    match extractor.extract_text(MemorySource::new(frames), len) {
        Ok(Some(payload)) => println!("\nRecovered payload: {}", payload),
        Ok(None) => println!("\nNo watermark recovered"),
        Err(e) => eprintln!("Extraction failed: {}", e),
    }
}
