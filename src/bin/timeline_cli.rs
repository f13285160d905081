use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rehearsal_timeline::analysis::cancel::CancellationToken;
use rehearsal_timeline::analysis::features::extract_features;
use rehearsal_timeline::analysis::waveform::downsample_source;
use rehearsal_timeline::{
    init_logging, AppConfig, FeaturePoint, NormalizationMode, Segment, SegmentType, Session,
    WavSource, WaveformSample,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "timeline_cli",
    about = "Segment rehearsal recordings into silence, performance and conversation"
)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted or unreadable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and print the segment timeline as JSON
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Normalize loudness before analysing
        #[arg(long, value_enum)]
        normalize: Option<NormalizeArg>,
        #[arg(long)]
        include_waveform: bool,
        #[arg(long)]
        include_features: bool,
    },
    /// Print the (min, max) waveform overview
    Waveform {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        samples: Option<usize>,
    },
    /// Print one feature point per analysis window, one JSON object per line
    Features {
        #[arg(long)]
        input: PathBuf,
    },
    /// Analyse and write the selected segments to a WAV file
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Only export segments of this type
        #[arg(long, value_enum)]
        segment_type: Option<SegmentTypeArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NormalizeArg {
    Peak,
    Rms,
}

impl From<NormalizeArg> for NormalizationMode {
    fn from(value: NormalizeArg) -> Self {
        match value {
            NormalizeArg::Peak => NormalizationMode::Peak,
            NormalizeArg::Rms => NormalizationMode::Rms,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SegmentTypeArg {
    Performance,
    Conversation,
    Silence,
}

impl From<SegmentTypeArg> for SegmentType {
    fn from(value: SegmentTypeArg) -> Self {
        match value {
            SegmentTypeArg::Performance => SegmentType::Performance,
            SegmentTypeArg::Conversation => SegmentType::Conversation,
            SegmentTypeArg::Silence => SegmentType::Silence,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    config.validate().context("validating configuration")?;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            normalize,
            include_waveform,
            include_features,
        } => run_analyze(
            config,
            &input,
            output,
            normalize,
            include_waveform,
            include_features,
        ),
        Commands::Waveform { input, samples } => run_waveform(config, &input, samples),
        Commands::Features { input } => run_features(config, &input),
        Commands::Export {
            input,
            output,
            segment_type,
        } => run_export(config, &input, &output, segment_type.map(SegmentType::from)),
    }
}

fn open_source(input: &Path) -> Result<WavSource> {
    WavSource::open(input).with_context(|| format!("opening {}", input.display()))
}

fn analyse(
    config: AppConfig,
    input: &Path,
    normalize: Option<NormalizeArg>,
) -> Result<Session> {
    let source = open_source(input)?;
    let mut session = Session::new(config);
    session.load_source(Arc::new(source))?;
    session
        .wait_for_analysis()
        .with_context(|| format!("analysing {}", input.display()))?;

    if let Some(mode) = normalize {
        session.normalize_and_reanalyze(mode.into())?;
        session
            .wait_for_analysis()
            .with_context(|| format!("analysing normalized {}", input.display()))?;
    }
    Ok(session)
}

fn run_analyze(
    config: AppConfig,
    input: &Path,
    output_path: Option<PathBuf>,
    normalize: Option<NormalizeArg>,
    include_waveform: bool,
    include_features: bool,
) -> Result<ExitCode> {
    let session = analyse(config, input, normalize)?;
    let snapshot = session
        .snapshot()
        .context("analysis finished without a result")?;

    let report = AnalysisReport {
        input: input.display().to_string(),
        sample_rate: snapshot.sample_rate,
        channels: snapshot.channels,
        duration: snapshot.duration,
        segment_count: session.segments().len(),
        segments: session.segments().segments(),
        waveform: if include_waveform { session.waveform() } else { &[] },
        features: if include_features { session.features() } else { &[] },
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(ExitCode::from(0))
}

fn run_waveform(config: AppConfig, input: &Path, samples: Option<usize>) -> Result<ExitCode> {
    let source = open_source(input)?;
    let target = samples.unwrap_or(config.waveform.target_sample_count);
    let waveform = downsample_source(
        &source,
        target,
        config.waveform.chunk_frames,
        &CancellationToken::new(),
    )
    .with_context(|| format!("downsampling {}", input.display()))?;

    println!("{}", serde_json::to_string(&waveform)?);
    Ok(ExitCode::from(0))
}

fn run_features(config: AppConfig, input: &Path) -> Result<ExitCode> {
    let source = open_source(input)?;
    let points = extract_features(&source, &config.features, &CancellationToken::new())
        .with_context(|| format!("extracting features from {}", input.display()))?;

    for point in points {
        println!("{}", serde_json::to_string(&point)?);
    }
    Ok(ExitCode::from(0))
}

fn run_export(
    config: AppConfig,
    input: &Path,
    output: &Path,
    filter: Option<SegmentType>,
) -> Result<ExitCode> {
    let session = analyse(config, input, None)?;
    let frames = session
        .export_wav(filter, output)
        .with_context(|| format!("exporting to {}", output.display()))?;

    eprintln!("Wrote {} frames to {}", frames, output.display());
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    input: String,
    sample_rate: u32,
    channels: usize,
    duration: f64,
    segment_count: usize,
    segments: &'a [Segment],
    #[serde(skip_serializing_if = "slice_empty")]
    waveform: &'a [WaveformSample],
    #[serde(skip_serializing_if = "slice_empty")]
    features: &'a [FeaturePoint],
}

fn slice_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}
