//! Integration tests for the analysis pipeline and timeline editing
//!
//! These tests drive the public API end to end:
//! - Classifier + Smoother on hand-built feature sequences
//! - The full pipeline on synthetic WAV files read through `WavSource`
//! - Timeline edits on pipeline output
//! - Session publishing with concurrent re-analysis

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rehearsal_timeline::config::{ClassifierConfig, FeatureConfig};
use rehearsal_timeline::{
    run_pipeline, AppConfig, CancellationToken, Classifier, FeaturePoint, PipelineOutcome,
    SegmentList, SegmentType, Session, Smoother, WavSource,
};

fn point(time: f64, rms: f32, low: f32, high: f32, centroid: f32, zcr: f32) -> FeaturePoint {
    FeaturePoint {
        time,
        rms,
        low_band_energy: low,
        high_band_energy: high,
        spectral_centroid: centroid,
        zero_crossing_rate: zcr,
    }
}

/// Silence for t in {0..4}, performance for t in {4.1..8}, speech for t in {8.1..12}
fn rehearsal_features() -> Vec<FeaturePoint> {
    let mut features: Vec<FeaturePoint> = (0..=4)
        .map(|t| point(t as f64, 0.0001, 0.0, 0.0, 0.0, 0.0))
        .collect();
    features.extend((41..=80).map(|t| point(t as f64 / 10.0, 0.1, 1.0, 1.0, 6000.0, 0.4)));
    features.extend((81..=120).map(|t| point(t as f64 / 10.0, 0.02, 10.0, 1.0, 1500.0, 0.1)));
    features
}

fn classify_and_smooth(features: &[FeaturePoint], config: ClassifierConfig) -> SegmentList {
    let raw = Classifier::new(config).classify(features);
    SegmentList::from_raw(&Smoother::new(3.0).smooth(&raw))
}

fn assert_timeline_invariants(list: &SegmentList, total: f64) {
    let segments = list.segments();
    assert!(!segments.is_empty());
    assert_eq!(segments[0].start_time, 0.0);
    assert_eq!(segments[segments.len() - 1].end_time, total);
    for s in segments {
        assert!(s.end_time > s.start_time);
    }
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end_time, pair[1].start_time);
    }
}

#[test]
fn test_rehearsal_scenario_yields_three_segments() {
    // Speech points sit at rms 0.02; the performance threshold must be above
    // that for them to reach the spectral rules
    let config = ClassifierConfig {
        performance_threshold: 0.025,
        ..ClassifierConfig::default()
    };
    let list = classify_and_smooth(&rehearsal_features(), config);
    let segments = list.segments();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].segment_type, SegmentType::Silence);
    assert_eq!(segments[1].segment_type, SegmentType::Performance);
    assert_eq!(segments[2].segment_type, SegmentType::Conversation);
    assert_eq!((segments[0].start_time, segments[0].end_time), (0.0, 4.1));
    assert_eq!((segments[1].start_time, segments[1].end_time), (4.1, 8.1));
    assert_eq!((segments[2].start_time, segments[2].end_time), (8.1, 12.0));
    assert_timeline_invariants(&list, 12.0);
}

#[test]
fn test_rehearsal_scenario_with_default_thresholds() {
    // rms 0.02 > 0.015, so the speech points count as performance
    let list = classify_and_smooth(&rehearsal_features(), ClassifierConfig::default());
    let segments = list.segments();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].segment_type, SegmentType::Silence);
    assert_eq!(segments[1].segment_type, SegmentType::Performance);
    assert_eq!(segments[1].end_time, 12.0);
}

#[test]
fn test_random_feature_sequences_produce_valid_timelines() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let classifier = Classifier::new(ClassifierConfig::default());
    let smoother = Smoother::new(3.0);

    for _ in 0..200 {
        let count = rng.gen_range(2..300);
        let hop = rng.gen_range(0.01..0.5);
        let features: Vec<FeaturePoint> = (0..count)
            .map(|i| {
                point(
                    i as f64 * hop,
                    rng.gen_range(0.0..0.05),
                    rng.gen_range(0.0..20.0),
                    rng.gen_range(0.0..20.0),
                    rng.gen_range(0.0..8000.0),
                    rng.gen_range(0.0..1.0),
                )
            })
            .collect();
        let end = (count - 1) as f64 * hop + rng.gen_range(0.0..1.0);

        let smoothed = smoother.smooth(&classifier.classify_until(&features, end));
        let list = SegmentList::from_raw(&smoothed);
        assert_timeline_invariants(&list, end);

        let last = list.len() - 1;
        for (index, segment) in list.iter().enumerate() {
            assert!(
                segment.duration() >= 3.0 || index == 0 || index == last,
                "short interior segment {:?}",
                segment
            );
        }
        for pair in list.segments().windows(2) {
            assert_ne!(pair[0].segment_type, pair[1].segment_type);
        }

        // Smoothing is a fixed point
        assert_eq!(smoother.smooth(&smoothed), smoothed);
    }
}

fn write_wav(name: &str, sample_rate: u32, samples: &[f32]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "rehearsal_timeline_it_{}_{}.wav",
        name,
        std::process::id()
    ));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// 4 s silence, 6 s loud bright tone, 5 s quiet speech-band tone
fn rehearsal_recording(sample_rate: u32) -> Vec<f32> {
    let tone = |seconds: u32, frequency: f32, amplitude: f32| -> Vec<f32> {
        (0..seconds * sample_rate)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    };
    let mut samples = vec![0.0; (4 * sample_rate) as usize];
    samples.extend(tone(6, 5000.0, 0.5));
    samples.extend(tone(5, 800.0, 0.008));
    samples
}

#[test]
fn test_pipeline_on_wav_file() {
    let sample_rate = 16000;
    let path = write_wav("pipeline", sample_rate, &rehearsal_recording(sample_rate));
    let source = WavSource::open(&path).unwrap();

    let mut config = AppConfig::default();
    config.features = FeatureConfig {
        window_size: 2048,
        hop_size: 1024,
    };

    let snapshot = match run_pipeline(&source, &config, &CancellationToken::new()) {
        PipelineOutcome::Completed(snapshot) => snapshot,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(snapshot.duration, 15.0);
    assert_eq!(snapshot.waveform.len(), 1000);
    for column in &snapshot.waveform {
        assert!(column.min <= column.max);
        assert!(column.min >= -1.0 && column.max <= 1.0);
    }

    let types: Vec<SegmentType> = snapshot.segments.iter().map(|s| s.segment_type).collect();
    assert_eq!(
        types,
        vec![
            SegmentType::Silence,
            SegmentType::Performance,
            SegmentType::Conversation
        ]
    );
    let segments = snapshot.segments.segments();
    assert!((segments[1].start_time - 4.0).abs() < 0.2);
    assert!((segments[2].start_time - 10.0).abs() < 0.2);
    assert_timeline_invariants(&snapshot.segments, 15.0);
}

#[test]
fn test_edits_on_pipeline_output() {
    let sample_rate = 8000;
    let mut session = Session::new(AppConfig::default());
    session
        .load_source(Arc::new(rehearsal_memory_source(sample_rate)))
        .unwrap();
    session.wait_for_analysis().unwrap();

    let total = session.segments().total_duration();
    let original_len = session.segments().len();
    assert!(original_len >= 2);

    let first = session.segments().segments()[0].clone();
    let boundary = first.end_time;
    session.update_transcription(first.id, Some("count-in".to_string()));

    assert!(session.move_boundary(0, boundary + 1.0));
    assert!(session.move_boundary(0, boundary));
    assert_eq!(session.segments().segments()[0], {
        let mut expected = first.clone();
        expected.transcription = Some("count-in".to_string());
        expected
    });

    assert!(session.split_segment(first.start_time + 1.0));
    assert_eq!(session.segments().len(), original_len + 1);
    let left = session.segments().segments()[0].id;
    assert!(session.merge_with_next(left));
    assert_eq!(session.segments().len(), original_len);
    assert_timeline_invariants(session.segments(), total);
}

fn rehearsal_memory_source(sample_rate: u32) -> rehearsal_timeline::MemorySource {
    rehearsal_timeline::MemorySource::mono(rehearsal_recording(sample_rate), sample_rate)
}

#[test]
fn test_persisted_timeline_round_trip() {
    let mut session = Session::new(AppConfig::default());
    session
        .load_source(Arc::new(rehearsal_memory_source(8000)))
        .unwrap();
    session.wait_for_analysis().unwrap();
    let id = session.segments().segments()[0].id;
    session.update_label(id, "Warmup");
    session.update_export_exclusion(id, true);

    let json = serde_json::to_string(session.segments()).unwrap();
    let restored: SegmentList = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.segments(), session.segments().segments());

    let mut other = Session::new(AppConfig::default());
    other.restore_segments(restored).unwrap();
    assert_eq!(other.segments().get(id).unwrap().label.as_deref(), Some("Warmup"));
    assert!(other.export_plan(None).unwrap().ranges.iter().all(|r| r.segment_id != id));
}
