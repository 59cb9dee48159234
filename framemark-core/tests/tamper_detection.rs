//! End-to-end tests of the payload protocol: embed, tamper, verify, extract.

mod common;

use common::{
    invert_keeping_watermark, key, synthetic_frame, synthetic_video, ScriptedCodec, TEXT,
};
use framemark_core::{
    payload_len, AuthCodeGenerator, EmbeddingPipeline, ExtractionPipeline, Frame,
    FrameSink, ImageSequenceSink, ImageSequenceSource, LsbCodec, MemorySink, MemorySource,
    PipelineConfig, SecretKey, TamperReason, VerificationPipeline, VerifyError,
};
use tempfile::TempDir;

fn embed_in_memory(frames: Vec<Frame>, config: &PipelineConfig) -> Vec<Frame> {
    let pipeline = EmbeddingPipeline::new(LsbCodec, key(), config.clone());
    let mut sink = MemorySink::new();
    let report = pipeline
        .embed(MemorySource::new(frames), &mut sink, TEXT)
        .expect("embedding failed");
    assert!(report.is_complete(), "every frame should be marked: {report:?}");
    sink.into_frames()
}

fn verifier(config: &PipelineConfig) -> VerificationPipeline<LsbCodec> {
    VerificationPipeline::new(LsbCodec, key(), config.clone())
}

fn every_frame() -> PipelineConfig {
    PipelineConfig::default().with_sample_stride(1)
}

fn text_payload_len(config: &PipelineConfig) -> usize {
    payload_len(TEXT.len(), config.auth_len)
}

// ============================================================================
// Scenario A / B
// ============================================================================

#[test]
fn test_untouched_video_verifies_clean() {
    let config = every_frame();
    let marked = embed_in_memory(synthetic_video(10), &config);

    let report = verifier(&config)
        .verify(MemorySource::new(marked), text_payload_len(&config))
        .unwrap();

    assert_eq!(report.frames_read, 10);
    assert_eq!(report.frames_sampled, 10);
    assert!(report.indices().is_empty(), "unexpected: {:?}", report.tampered);
}

#[test]
fn test_overwritten_frame_is_reported() {
    let config = every_frame();
    let mut marked = embed_in_memory(synthetic_video(10), &config);

    // Replace frame 3 with unrelated content.
    marked[3] = synthetic_frame(3, 64, 48)
        .with_pixels(vec![200; 64 * 48 * 3])
        .unwrap();

    let report = verifier(&config)
        .verify(MemorySource::new(marked), text_payload_len(&config))
        .unwrap();

    assert_eq!(report.indices(), vec![3]);
}

#[test]
fn test_region_edit_keeping_watermark_is_auth_code_mismatch() {
    let config = every_frame();
    let mut marked = embed_in_memory(synthetic_video(10), &config);
    marked[6] = invert_keeping_watermark(&marked[6]);

    let report = verifier(&config)
        .verify(MemorySource::new(marked), text_payload_len(&config))
        .unwrap();

    assert_eq!(report.indices(), vec![6]);
    assert_eq!(report.tampered[0].reason, TamperReason::AuthCodeMismatch);
}

#[test]
fn test_unmarked_video_is_tampered_everywhere_sampled() {
    let config = PipelineConfig::default().with_sample_stride(4);
    let report = verifier(&config)
        .verify(MemorySource::new(synthetic_video(10)), text_payload_len(&config))
        .unwrap();

    assert_eq!(report.indices(), vec![0, 4, 8]);
}

#[test]
fn test_wrong_key_flags_every_sampled_frame() {
    let config = every_frame();
    let marked = embed_in_memory(synthetic_video(5), &config);

    let pipeline = VerificationPipeline::new(
        LsbCodec,
        SecretKey::new(b"not-the-secret".to_vec()).unwrap(),
        config.clone(),
    );
    let report = pipeline
        .verify(MemorySource::new(marked), text_payload_len(&config))
        .unwrap();

    assert_eq!(report.indices(), vec![0, 1, 2, 3, 4]);
    assert!(report
        .tampered
        .iter()
        .all(|t| t.reason == TamperReason::AuthCodeMismatch));
}

#[test]
fn test_auth_len_must_match_between_sides() {
    let embed_config = every_frame().with_auth_len(24);
    let marked = embed_in_memory(synthetic_video(3), &embed_config);

    // Same auth_len on both sides verifies.
    let report = verifier(&embed_config)
        .verify(MemorySource::new(marked.clone()), text_payload_len(&embed_config))
        .unwrap();
    assert!(report.is_authentic());

    // A verifier expecting 16 characters compares them to the 24 embedded ones.
    let default_config = every_frame();
    let report = verifier(&default_config)
        .verify(MemorySource::new(marked), text_payload_len(&embed_config))
        .unwrap();
    assert_eq!(report.indices(), vec![0, 1, 2]);
}

// ============================================================================
// Sensitivity properties
// ============================================================================

#[test]
fn test_distinct_frames_get_distinct_codes() {
    let generator = AuthCodeGenerator::new(key());
    let original = synthetic_frame(0, 64, 48);
    let edited = invert_keeping_watermark(&original);

    assert_ne!(
        generator.hasher().fingerprint(&original).unwrap(),
        generator.hasher().fingerprint(&edited).unwrap()
    );
    assert_ne!(
        generator.generate(&original, 16).unwrap(),
        generator.generate(&edited, 16).unwrap()
    );
}

#[test]
fn test_watermarking_does_not_move_the_code() {
    let config = PipelineConfig::default();
    let generator = AuthCodeGenerator::new(key());
    let original = synthetic_frame(2, 64, 48);
    let marked = embed_in_memory(vec![original.clone()], &config).remove(0);

    assert_ne!(marked, original);
    assert_eq!(
        generator.generate(&original, 16).unwrap(),
        generator.generate(&marked, 16).unwrap()
    );
}

// ============================================================================
// Majority vote
// ============================================================================

#[test]
fn test_majority_vote_picks_seven_of_ten() {
    let winner = "MyWatermark|abc123def4567890".to_string();
    let mut outputs: Vec<(u64, String)> = (0..7).map(|i| (i, winner.clone())).collect();
    outputs.push((7, "MyWatermark|zzz".to_string()));
    outputs.push((8, "MyWaterm@rk|abc123def4567890".to_string()));
    outputs.push((9, "garbage".to_string()));

    let pipeline = ExtractionPipeline::new(
        ScriptedCodec::new(outputs),
        PipelineConfig::default().with_sample_stride(1),
    );
    let text = pipeline
        .extract_text(MemorySource::new(synthetic_video(10)), winner.len())
        .unwrap();

    assert_eq!(text, Some(winner));
}

#[test]
fn test_majority_vote_stops_after_max_votes() {
    let outputs = (0..20).map(|i| (i, format!("value-{}", i % 2)));
    let pipeline = ExtractionPipeline::new(
        ScriptedCodec::new(outputs),
        PipelineConfig::default()
            .with_sample_stride(1)
            .with_max_votes(4),
    );

    let tally = pipeline
        .tally(MemorySource::new(synthetic_video(20)), 7)
        .unwrap();

    assert_eq!(tally.ballots, 4);
    assert_eq!(tally.frames_read, 4);
    // Two votes each: the first value seen wins the tie.
    assert_eq!(tally.winner(), Some(("value-0", 2)));
}

#[test]
fn test_majority_vote_skips_failed_extractions_and_unsampled_frames() {
    // Only frames 0, 3, 6 and 9 are sampled; 3 has no signal.
    let outputs = [0u64, 1, 2, 6, 9].map(|i| (i, format!("frame-{}", i.min(6))));
    let pipeline = ExtractionPipeline::new(
        ScriptedCodec::new(outputs),
        PipelineConfig::default().with_sample_stride(3),
    );

    let tally = pipeline
        .tally(MemorySource::new(synthetic_video(10)), 7)
        .unwrap();

    assert_eq!(tally.ballots, 3);
    assert_eq!(tally.frames_read, 10);
    assert_eq!(tally.winner(), Some(("frame-6", 2)));
}

#[test]
fn test_majority_vote_with_no_signal_is_none() {
    let pipeline = ExtractionPipeline::new(
        ScriptedCodec::new(Vec::new()),
        PipelineConfig::default(),
    );
    let text = pipeline
        .extract_text(MemorySource::new(synthetic_video(5)), 10)
        .unwrap();
    assert_eq!(text, None);
}

#[test]
fn test_extraction_keeps_auth_code_in_the_payload() {
    let config = PipelineConfig::default();
    let marked = embed_in_memory(synthetic_video(3), &config);

    let text = ExtractionPipeline::new(LsbCodec, config.clone())
        .extract_text(MemorySource::new(marked), text_payload_len(&config))
        .unwrap()
        .expect("frame 0 carries a payload");

    let expected_code = AuthCodeGenerator::new(key())
        .generate(&synthetic_frame(0, 64, 48), config.auth_len)
        .unwrap();
    assert_eq!(text, format!("{TEXT}|{expected_code}"));
}

// ============================================================================
// Image sequences on disk
// ============================================================================

#[test]
fn test_image_sequence_roundtrip_and_corruption() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");

    let mut writer = ImageSequenceSink::new(&input);
    writer.open().unwrap();
    for frame in synthetic_video(6) {
        writer.write_frame(&frame).unwrap();
    }
    writer.finish().unwrap();

    let config = every_frame();
    let mut sink = ImageSequenceSink::new(&output);
    let report = EmbeddingPipeline::new(LsbCodec, key(), config.clone())
        .embed(ImageSequenceSource::new(&input), &mut sink, TEXT)
        .unwrap();
    assert_eq!(report.frames_written, 6);

    let clean = verifier(&config)
        .verify(ImageSequenceSource::new(&output), text_payload_len(&config))
        .unwrap();
    assert!(clean.is_authentic(), "unexpected: {:?}", clean.tampered);

    std::fs::write(sink.frame_path(4), b"truncated").unwrap();
    let corrupted = verifier(&config)
        .verify(ImageSequenceSource::new(&output), text_payload_len(&config))
        .unwrap();
    assert_eq!(corrupted.indices(), vec![4]);
    assert_eq!(corrupted.tampered[0].reason, TamperReason::FrameUnreadable);
}

// ============================================================================
// Fatal open
// ============================================================================

#[test]
fn test_missing_source_is_source_unreadable() {
    let temp = TempDir::new().unwrap();
    let config = PipelineConfig::default();

    let result = verifier(&config).verify(
        ImageSequenceSource::new(temp.path().join("does-not-exist")),
        text_payload_len(&config),
    );
    assert!(matches!(result, Err(VerifyError::SourceUnreadable(_))));
}

#[test]
fn test_file_instead_of_directory_is_source_unreadable() {
    let temp = TempDir::new().unwrap();
    let bogus = temp.path().join("video.mp4");
    std::fs::write(&bogus, b"not a frame directory").unwrap();
    let config = PipelineConfig::default();

    let result = verifier(&config).verify(ImageSequenceSource::new(&bogus), 28);
    assert!(matches!(result, Err(VerifyError::SourceUnreadable(_))));

    let result =
        ExtractionPipeline::new(LsbCodec, config).extract_text(ImageSequenceSource::new(&bogus), 28);
    assert!(matches!(result, Err(VerifyError::SourceUnreadable(_))));
}

#[test]
fn test_directory_without_frames_is_fatal() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("clip.mp4"), b"container, not frames").unwrap();
    let config = PipelineConfig::default();

    let result = verifier(&config).verify(
        ImageSequenceSource::new(temp.path()),
        text_payload_len(&config),
    );
    assert!(matches!(result, Err(VerifyError::NoFrames)));

    let result = verifier(&config).verify(MemorySource::new(vec![]), text_payload_len(&config));
    assert!(matches!(result, Err(VerifyError::NoFrames)));

    let result = ExtractionPipeline::new(LsbCodec, config.clone())
        .extract_text(ImageSequenceSource::new(temp.path()), text_payload_len(&config));
    assert!(matches!(result, Err(VerifyError::NoFrames)));
}
