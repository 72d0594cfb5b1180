use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use skyshift_core::buffer::LumaImageF32;
use skyshift_core::config::{BackendPreference, CorrelationConfig};
use skyshift_core::correlate::CpuCorrelator;
use skyshift_core::estimator::{
    create_estimator, track_sequence_with_progress, PairShift, SequenceTrack,
};

use super::{load_frame, GlobalOptions};
use crate::summary::print_track;

#[derive(Args)]
pub struct TrackArgs {
    /// Frames in capture order (at least two)
    #[arg(required = true, num_args = 2..)]
    pub frames: Vec<PathBuf>,
}

pub fn run(args: &TrackArgs, options: &GlobalOptions) -> Result<()> {
    if args.frames.len() < 2 {
        bail!("Need at least two frames, got {}", args.frames.len());
    }
    let config = options.resolve()?;

    let frames = args
        .frames
        .par_iter()
        .map(|path| load_frame(path))
        .collect::<Result<Vec<_>>>()?;

    let pb = ProgressBar::new((frames.len() - 1) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Tracking [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let (backend_name, track) = if config.backend == BackendPreference::Cpu {
        ("CPU (parallel)".to_string(), track_parallel(&frames, &config, &pb))
    } else {
        let mut estimator = create_estimator(&config)?;
        let track = track_sequence_with_progress(estimator.as_mut(), &frames, |done, _total| {
            pb.set_position(done as u64);
        });
        (estimator.name().to_string(), track)
    };
    pb.finish_and_clear();

    print_track(&args.frames, &backend_name, &track);
    Ok(())
}

/// One CPU correlator per rayon worker, pairs in any order. Debug dumps
/// from concurrent pairs land in the same directory; the last write wins.
fn track_parallel(
    frames: &[LumaImageF32],
    config: &CorrelationConfig,
    pb: &ProgressBar,
) -> SequenceTrack {
    let pairs: Vec<PairShift> = (0..frames.len() - 1)
        .into_par_iter()
        .map_init(
            || {
                CpuCorrelator::from_config(config).unwrap_or_else(|e| {
                    tracing::warn!("Debug dumps off for this worker: {e}");
                    CpuCorrelator::new(config.degenerate_epsilon)
                })
            },
            |cpu, index| {
                let outcome = cpu.correlate(&frames[index], &frames[index + 1]);
                if let Err(e) = &outcome {
                    tracing::warn!("Frame pair {}-{} failed: {e}", index, index + 1);
                }
                pb.inc(1);
                PairShift { index, outcome }
            },
        )
        .collect();
    SequenceTrack::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: usize, height: usize, star_x: usize) -> LumaImageF32 {
        let mut frame = LumaImageF32::zeros(width, height).unwrap();
        frame.data[[3, star_x]] = 255.0;
        frame.data[[9, star_x / 2]] = 128.0;
        frame
    }

    #[test]
    fn test_parallel_track_keeps_debug_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let config = CorrelationConfig {
            backend: BackendPreference::Cpu,
            debug_dump_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let frames = vec![frame(16, 16, 4), frame(16, 16, 6)];

        let track = track_parallel(&frames, &config, &ProgressBar::hidden());
        assert_eq!(track.pairs.len(), 1);
        assert!(track.pairs[0].outcome.is_ok());
        assert!(dir.path().join("correlation.png").exists());
    }
}
