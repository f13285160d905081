use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_timeline_cli"))
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "rehearsal_timeline_cli_{}_{}",
        std::process::id(),
        name
    ))
}

/// 4 s of silence followed by 5 s of a loud tone
fn write_recording(name: &str) -> PathBuf {
    let path = temp_file(name);
    let sample_rate = 16000;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(9 * sample_rate) {
        let sample = if i < 4 * sample_rate {
            0.0
        } else {
            0.4 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin()
        };
        writer.write_sample(sample).unwrap();
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn analyze_prints_segment_report() {
    let input = write_recording("analyze.wav");
    let output = cli()
        .args(["analyze", "--input"])
        .arg(&input)
        .output()
        .expect("failed to run timeline_cli analyze");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("analysis report JSON payload");
    assert_eq!(json["sample_rate"], 16000);
    assert_eq!(json["channels"], 2);
    assert_eq!(json["duration"], 9.0);
    assert_eq!(json["segment_count"], 2);
    assert_eq!(json["segments"][0]["type"], "silence");
    assert_eq!(json["segments"][1]["type"], "performance");
    assert_eq!(json["segments"][1]["end_time"], 9.0);
    assert!(json.get("waveform").is_none());
}

#[test]
fn analyze_writes_output_file_with_waveform() {
    let input = write_recording("analyze_output.wav");
    let report = temp_file("report.json");
    let status = cli()
        .args(["analyze", "--include-waveform", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&report)
        .status()
        .expect("failed to run timeline_cli analyze --output");
    assert!(status.success());

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).expect("report JSON");
    assert_eq!(json["waveform"].as_array().map(Vec::len), Some(1000));
}

#[test]
fn features_streams_one_point_per_line() {
    let input = write_recording("features.wav");
    let output = cli()
        .args(["features", "--input"])
        .arg(&input)
        .output()
        .expect("failed to run timeline_cli features");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let points: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("feature point JSON"))
        .collect();
    // (144000 - 4096) / 2048 + 1 windows
    assert_eq!(points.len(), 69);
    assert_eq!(points[0]["time"], 0.0);
    assert_eq!(points[0]["rms"], 0.0);
}

#[test]
fn waveform_respects_sample_count() {
    let input = write_recording("waveform.wav");
    let output = cli()
        .args(["waveform", "--samples", "50", "--input"])
        .arg(&input)
        .output()
        .expect("failed to run timeline_cli waveform");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("waveform JSON");
    let columns = json.as_array().expect("array of columns");
    assert_eq!(columns.len(), 50);
    assert_eq!(columns[0]["min"], 0.0);
    assert_eq!(columns[0]["max"], 0.0);
}

#[test]
fn export_writes_selected_segments() {
    let input = write_recording("export_in.wav");
    let exported = temp_file("export_out.wav");
    let status = cli()
        .args(["export", "--segment-type", "performance", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&exported)
        .status()
        .expect("failed to run timeline_cli export");
    assert!(status.success());

    let reader = hound::WavReader::open(&exported).expect("exported WAV");
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 16000);
    assert!(reader.duration() > 4 * 16000);
}

#[test]
fn missing_input_fails() {
    let output = cli()
        .args(["analyze", "--input", "/nonexistent/recording.wav"])
        .output()
        .expect("failed to run timeline_cli");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("Error"), "unexpected stderr {stderr}");
}
