//! resplice - Re-sequence a recording to a new duration
//!
//! Usage: resplice <input_wav> <output_wav> --duration <seconds>

use anyhow::{Context, Result};
use clap::Parser;
use resplice_core::{
    find_cuts, resequence_with_cuts, CostParams, Cut, CutConfig, MinCutLength, Path as SplicePath,
    Request, StrategyConfig,
};
use resplice_cli::output::{print_json_output, ResequenceOutput, SegmentOutput};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "resplice")]
#[command(about = "Re-sequence audio to a new duration via seamless splices", long_about = None)]
struct Args {
    /// Input WAV file path
    input_wav_path: String,

    /// Output WAV file path
    output_wav_path: String,

    /// Desired output duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Keypoint mapping "source:target" in seconds; repeat for multiple.
    /// Overrides --duration. The first pair must map to target 0.
    #[arg(short, long = "keypoint")]
    keypoints: Vec<String>,

    /// Search strategy: greedy, loops, genetic, breadth or depth_first
    #[arg(short, long, default_value = "greedy")]
    strategy: String,

    /// Candidate cuts kept per analysis level
    #[arg(long, default_value_t = 256)]
    num_cuts: usize,

    /// Cuts kept after the final ranking
    #[arg(long, default_value_t = 40)]
    num_keep: usize,

    /// Minimum jump length in seconds; unset allows any genuine jump
    #[arg(long)]
    min_cut_length: Option<f64>,

    /// Integer factor by which the analysis block length shrinks per level
    #[arg(long, default_value_t = 16)]
    shrink: usize,

    /// Number of analysis levels; derived from the buffer length when unset
    #[arg(long)]
    levels: Option<usize>,

    /// Per-level weight multiplier for accumulated cut costs
    #[arg(long, default_value_t = 1.2)]
    weight_factor: f64,

    /// Seed for the randomized strategies
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Weight of the squared duration error in the path cost
    #[arg(long, default_value_t = 1e2)]
    duration_penalty: f64,

    /// Weight of the summed splice costs in the path cost
    #[arg(long, default_value_t = 1e1)]
    cut_penalty: f64,

    /// Weight of the repetition measure in the path cost
    #[arg(long, default_value_t = 1e3)]
    repetition_penalty: f64,

    /// Skip the .cuts cache and re-run the analysis
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    run_resplice(&args)
}

fn run_resplice(args: &Args) -> Result<()> {
    let input_path = Path::new(&args.input_wav_path);
    let output_path = Path::new(&args.output_wav_path);
    if !input_path.exists() {
        anyhow::bail!("Input file not found: {}", input_path.display());
    }

    let start = std::time::Instant::now();
    let (samples, sample_rate) = read_mono_wav(input_path)?;
    log::info!(
        "Decoded audio: {:.1}s duration, {} samples @ {}Hz",
        samples.len() as f64 / sample_rate as f64,
        samples.len(),
        sample_rate
    );

    let cut_config = CutConfig {
        num_cuts: args.num_cuts,
        num_keep: Some(args.num_keep),
        block_length_shrink: args.shrink,
        num_levels: args.levels,
        weight_factor: args.weight_factor,
        min_cut_length: match args.min_cut_length {
            Some(seconds) => MinCutLength::Samples((seconds * sample_rate as f64) as usize),
            None => MinCutLength::Block,
        },
        ..CutConfig::default()
    };
    cut_config.validate()?;

    let (cuts, cache_status) = load_or_detect_cuts(args, input_path, &samples, &cut_config)?;
    log::info!("Using {} cuts ({})", cuts.len(), cache_status);

    let request = build_request(args, samples.len(), sample_rate)?;
    let mut strategy = StrategyConfig::from_name(&args.strategy)?;
    match &mut strategy {
        StrategyConfig::Loops(config) => config.seed = args.seed,
        StrategyConfig::Genetic(config) => config.seed = args.seed,
        _ => {}
    }
    let cost = CostParams {
        duration_penalty: args.duration_penalty,
        cut_penalty: args.cut_penalty,
        repetition_penalty: args.repetition_penalty,
    };
    let path = resequence_with_cuts(samples.len(), &cuts, &strategy, cost, &request)?;
    log::info!(
        "Composed {} segments, {} samples for a {} sample target",
        path.segments().len(),
        path.duration(),
        request.target_duration()
    );

    write_mono_wav(output_path, &render(&samples, &path), sample_rate)?;
    let elapsed = start.elapsed();

    let (segments, num_splices, total_splice_cost): (Vec<SegmentOutput>, usize, f64) =
        ResequenceOutput::from_path(&path, sample_rate);
    print_json_output(&ResequenceOutput {
        status: "success".to_string(),
        input_file: input_path.display().to_string(),
        output_file: output_path.display().to_string(),
        strategy: args.strategy.clone(),
        cache: cache_status,
        num_cuts: cuts.len(),
        num_segments: path.segments().len(),
        num_splices,
        target_duration_s: request.target_duration() as f64 / sample_rate as f64,
        output_duration_s: path.duration() as f64 / sample_rate as f64,
        total_splice_cost,
        processing_time_seconds: elapsed.as_secs_f64(),
        segments,
    });
    Ok(())
}

/// Probe the .cuts cache next to the input, falling back to a fresh
/// analysis that refreshes the cache.
fn load_or_detect_cuts(
    args: &Args,
    input_path: &Path,
    samples: &[f64],
    config: &CutConfig,
) -> Result<(Vec<Cut>, String)> {
    let cache_path: PathBuf = input_path.with_extension("cuts");
    if !args.no_cache {
        if let Some(cuts) = resplice_cache::probe(&cache_path, samples.len(), config)? {
            return Ok((cuts, "cache hit".to_string()));
        }
    }

    let cuts = find_cuts(samples, config)?;
    if args.no_cache {
        return Ok((cuts, "cache disabled".to_string()));
    }
    resplice_cache::store(&cache_path, samples.len(), config, &cuts)
        .with_context(|| format!("Failed to write cache file: {}", cache_path.display()))?;
    Ok((cuts, "cache miss".to_string()))
}

fn build_request(args: &Args, num_samples: usize, sample_rate: u32) -> Result<Request> {
    let rate = sample_rate as f64;
    if !args.keypoints.is_empty() {
        let mut sources = Vec::with_capacity(args.keypoints.len());
        let mut targets = Vec::with_capacity(args.keypoints.len());
        for pair in &args.keypoints {
            let (source, target) = pair
                .split_once(':')
                .with_context(|| format!("Invalid keypoint '{pair}', expected source:target"))?;
            let source: f64 = source
                .parse()
                .with_context(|| format!("Invalid keypoint source in '{pair}'"))?;
            let target: f64 = target
                .parse()
                .with_context(|| format!("Invalid keypoint target in '{pair}'"))?;
            sources.push((source * rate) as usize);
            targets.push((target * rate) as usize);
        }
        return Ok(Request::from_positions(&sources, &targets)?);
    }
    let duration = args
        .duration
        .context("Either --duration or --keypoint is required")?;
    let target = (duration * rate) as usize;
    Ok(Request::from_positions(&[0, num_samples], &[0, target])?)
}

/// Decode a WAV file to mono f64 samples in [-1, 1].
fn read_mono_wav(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f64>() / channels as f64);
    }
    Ok((mono, spec.sample_rate))
}

fn write_mono_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Concatenate the source slices the path plays.
fn render(samples: &[f64], path: &SplicePath) -> Vec<f64> {
    let mut out = Vec::with_capacity(path.duration());
    for segment in path.segments() {
        out.extend_from_slice(&samples[segment.start..segment.end]);
    }
    out
}
