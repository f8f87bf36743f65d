use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::codec::ImageCodec;
use super::config::PipelineConfig;
use super::content_index::ContentIndex;
use super::deduplicator::{FrameOutcome, FrameRemapper};
use super::error::PipelineError;
use super::frame::{discover_frames, FrameFile, FramePosition};
use super::remap::RemapArray;
use super::source::FrameSource;
use super::state_machine::{PipelineState, StageOutcome, StateMachine};
use super::workspace::Workspace;

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub remap: RemapArray,
    pub canonical_frames: usize,
    pub duplicate_frames: usize,
    pub omitted: Vec<FramePosition>,
    pub index_path: PathBuf,
    pub states: Vec<PipelineState>,
    /// Intermediate directories cleanup could not remove
    pub left_behind: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn total_frames(&self) -> usize {
        self.remap.len()
    }
}

/// A failed run. Cleanup has already been attempted.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunError {
    #[source]
    pub error: PipelineError,
    pub states: Vec<PipelineState>,
    pub left_behind: Vec<PathBuf>,
}

struct DedupSummary {
    remap: RemapArray,
    canonical: usize,
    duplicates: usize,
}

/// Single-use orchestrator: extract → encode + dedup → write index → clean up.
pub struct Pipeline<S: FrameSource, C: ImageCodec> {
    config: PipelineConfig,
    source: S,
    codec: C,
    machine: StateMachine,
}

impl<S: FrameSource, C: ImageCodec> Pipeline<S, C> {
    pub fn new(config: PipelineConfig, source: S, codec: C) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            codec,
            machine: StateMachine::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(mut self) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let workspace = Workspace::from_config(&self.config);

        let result = self.run_stages(&workspace);
        if let Err(e) = &result {
            error!("❌ Pipeline failed in {:?}: {}", self.machine.current_state(), e);
            self.machine.advance(StageOutcome::Failed);
        }

        info!("🧹 Cleaning up...");
        let left_behind = workspace.cleanup();
        let cleanup_outcome = if left_behind.is_empty() {
            StageOutcome::Succeeded
        } else {
            StageOutcome::Failed
        };
        self.machine.advance(cleanup_outcome);

        let states = self.machine.history().to_vec();
        match result {
            Ok(summary) => {
                let elapsed = started.elapsed();
                let omitted = summary.remap.omitted_positions();
                info!(
                    "✅ Done! {} frames → {} unique ({} omitted) in {:.2?}",
                    summary.remap.len(),
                    summary.canonical,
                    omitted.len(),
                    elapsed
                );
                Ok(RunReport {
                    remap: summary.remap,
                    canonical_frames: summary.canonical,
                    duplicate_frames: summary.duplicates,
                    omitted,
                    index_path: self.config.index_path(),
                    states,
                    left_behind,
                    elapsed,
                })
            }
            Err(error) => Err(RunError {
                error,
                states,
                left_behind,
            }),
        }
    }

    fn run_stages(&mut self, workspace: &Workspace) -> Result<DedupSummary, PipelineError> {
        self.machine.advance(StageOutcome::Succeeded);
        info!("🎬 Extracting frames...");
        workspace.prepare(self.codec.extension(), &self.config.index_file_name)?;
        self.source.extract(&self.config.input, &workspace.raw_dir)?;
        let frames = discover_frames(&workspace.raw_dir, self.source.extension())?;
        info!("🎞️ Extracted {} frames", frames.len());

        self.machine.advance(StageOutcome::Succeeded);
        info!("🧠 Deduplicating frames...");
        let summary = self.deduplicate(&frames, workspace)?;

        self.machine.advance(StageOutcome::Succeeded);
        let index_path = self.config.index_path();
        info!("📄 Writing frame map to {:?}...", index_path);
        summary.remap.write_to(&index_path)?;

        self.machine.advance(StageOutcome::Succeeded);
        Ok(summary)
    }

    /// Runs one unit per frame on a pool of `max_concurrency` threads and
    /// waits for all of them. Unit results land in their own slot.
    fn deduplicate(
        &self,
        frames: &[FrameFile],
        workspace: &Workspace,
    ) -> Result<DedupSummary, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrency)
            .thread_name(|idx| format!("frame-dedup-{}", idx))
            .build()?;

        let index = ContentIndex::with_capacity(frames.len());
        let remapper = FrameRemapper::new(
            &self.codec,
            &index,
            &workspace.encoded_dir,
            &workspace.output_dir,
        );

        let outcomes: Vec<Result<FrameOutcome, PipelineError>> =
            pool.install(|| frames.par_iter().map(|f| remapper.process(f)).collect());

        let len = frames.last().map(|f| f.position as usize).unwrap_or(0);
        let mut remap = RemapArray::with_len(len);
        let mut canonical = 0;
        let mut duplicates = 0;
        let mut fatal = None;

        for outcome in outcomes {
            match outcome {
                Ok(outcome) => {
                    match &outcome {
                        FrameOutcome::Canonical { .. } => canonical += 1,
                        FrameOutcome::Duplicate { .. } => duplicates += 1,
                        FrameOutcome::Omitted { position, reason } => {
                            warn!("⚠️ Frame {} omitted from map: {}", position, reason);
                        }
                    }
                    if let Some(target) = outcome.target() {
                        remap.set(outcome.position(), target);
                    }
                }
                Err(e) => {
                    error!("❌ {}", e);
                    fatal.get_or_insert(e);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        remap.check_consistency()?;

        Ok(DedupSummary {
            remap,
            canonical,
            duplicates,
        })
    }
}
