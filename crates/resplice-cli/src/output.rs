//! JSON output formatting

use resplice_core::Path;
use serde::Serialize;

/// One played segment, in seconds of source material.
#[derive(Serialize)]
pub struct SegmentOutput {
    pub source_start_s: f64,
    pub source_end_s: f64,
    /// Cost paid on the splice entering this segment; 0.0 means playback
    /// simply continued.
    pub splice_cost: f64,
}

#[derive(Serialize)]
pub struct ResequenceOutput {
    pub status: String,
    pub input_file: String,
    pub output_file: String,
    pub strategy: String,
    pub cache: String,
    pub num_cuts: usize,
    pub num_segments: usize,
    pub num_splices: usize,
    pub target_duration_s: f64,
    pub output_duration_s: f64,
    pub total_splice_cost: f64,
    pub processing_time_seconds: f64,
    pub segments: Vec<SegmentOutput>,
}

impl ResequenceOutput {
    pub fn from_path(path: &Path, sample_rate: u32) -> (Vec<SegmentOutput>, usize, f64) {
        let rate = sample_rate as f64;
        let segments: Vec<SegmentOutput> = path
            .segments()
            .iter()
            .zip(path.edge_costs())
            .map(|(segment, &cost)| SegmentOutput {
                source_start_s: segment.start as f64 / rate,
                source_end_s: segment.end as f64 / rate,
                splice_cost: cost,
            })
            .collect();
        // A splice is any boundary where playback does not simply continue.
        let num_splices = path
            .segments()
            .windows(2)
            .filter(|pair| pair[0].end != pair[1].start)
            .count();
        (segments, num_splices, path.cut_cost())
    }
}

/// Print the run summary as pretty JSON on stdout.
pub fn print_json_output(output: &ResequenceOutput) {
    match serde_json::to_string_pretty(output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}
