//! Per-episode statistics and the postcard training-summary format.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::tile_value;

/// Outcome of one self-play episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeStat {
    pub score: u64,
    pub moves: u32,
    pub max_rank: u8,
}

/// A whole training run, written after the last episode when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub alpha: f32,
    pub episodes: u32,
    pub stats: Vec<EpisodeStat>,
}

#[derive(thiserror::Error, Debug)]
pub enum SummaryError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard serialize error: {0}")]
    Postcard(#[from] postcard::Error),
}

/// Encode a summary to postcard bytes.
pub fn to_postcard_bytes(summary: &TrainingSummary) -> Result<Vec<u8>, SummaryError> {
    Ok(postcard::to_allocvec(summary)?)
}

/// Decode a summary from postcard bytes.
pub fn from_postcard_bytes(bytes: &[u8]) -> Result<TrainingSummary, SummaryError> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Write a postcard-encoded summary to a file.
pub fn write_summary_to_path<P: AsRef<Path>>(
    path: P,
    summary: &TrainingSummary,
) -> Result<(), SummaryError> {
    let bytes = to_postcard_bytes(summary)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a postcard-encoded summary from a file.
pub fn read_summary_from_path<P: AsRef<Path>>(path: P) -> Result<TrainingSummary, SummaryError> {
    let bytes = fs::read(path)?;
    from_postcard_bytes(&bytes)
}

/// Render one statistics block: mean and max score on the first line, then
/// the distribution of top tiles reached, highest first, with the share of
/// episodes peaking at that tile and the cumulative share reaching it.
pub fn block_report(last_episode: u32, stats: &[EpisodeStat]) -> String {
    let count = stats.len().max(1) as f64;
    let mean = stats.iter().map(|s| s.score).sum::<u64>() as f64 / count;
    let max = stats.iter().map(|s| s.score).max().unwrap_or(0);
    let mut report = format!("episode {:>7}  avg = {:.1}  max = {}", last_episode, mean, max);

    let mut peaks = [0u32; 16];
    for stat in stats {
        peaks[stat.max_rank as usize] += 1;
    }
    let mut reached = 0u32;
    for rank in (1..16usize).rev() {
        if peaks[rank] == 0 {
            continue;
        }
        reached += peaks[rank];
        report.push_str(&format!(
            "\n\t{:>6}  {:>5.1}%  ({:>5.1}%)",
            tile_value(rank as u8),
            peaks[rank] as f64 / count * 100.0,
            reached as f64 / count * 100.0,
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_stats() -> Vec<EpisodeStat> {
        vec![
            EpisodeStat { score: 100, moves: 40, max_rank: 7 },
            EpisodeStat { score: 300, moves: 80, max_rank: 8 },
            EpisodeStat { score: 200, moves: 60, max_rank: 7 },
            EpisodeStat { score: 400, moves: 90, max_rank: 9 },
        ]
    }

    #[test]
    fn round_trip_bytes() {
        let summary = TrainingSummary { alpha: 0.1, episodes: 4, stats: make_stats() };
        let bytes = to_postcard_bytes(&summary).unwrap();
        let loaded = from_postcard_bytes(&bytes).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn round_trip_file() {
        let summary = TrainingSummary { alpha: 0.0025, episodes: 4, stats: make_stats() };
        let tmp = NamedTempFile::new().unwrap();
        write_summary_to_path(tmp.path(), &summary).unwrap();
        let loaded = read_summary_from_path(tmp.path()).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn round_trip_empty_run() {
        let summary = TrainingSummary { alpha: 0.1, episodes: 0, stats: vec![] };
        let bytes = to_postcard_bytes(&summary).unwrap();
        assert_eq!(from_postcard_bytes(&bytes).unwrap(), summary);
    }

    #[test]
    fn report_aggregates_scores() {
        let report = block_report(400, &make_stats());
        assert!(report.starts_with("episode     400  avg = 250.0  max = 400"));
        // Highest tile first; rank 9 is tile 192, reached by 25% of runs.
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("192") && lines[1].contains("( 25.0%)"));
        // Rank 7 (tile 48) peaks half the runs; everything reached it.
        assert!(lines[3].contains("48") && lines[3].contains("(100.0%)"));
    }

    #[test]
    fn report_handles_empty_block() {
        let report = block_report(0, &[]);
        assert!(report.contains("avg = 0.0"));
    }
}
