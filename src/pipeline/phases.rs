use super::VendorPipeline;
use crate::models::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Started at `Phase::None`; nothing ran.
    Skipped,
    Completed,
    Failed(Phase),
}

/// Run `pipeline` from `start` through `DbInsertion`, stopping at the first
/// phase that reports failure.
///
/// `Phase::All` first rebuilds the working directories. A failed rebuild is
/// reported as a failure at `Phase::All` so the next attempt repeats it.
pub async fn run_sequence(pipeline: &dyn VendorPipeline, start: Phase) -> PhaseOutcome {
    if start == Phase::None {
        return PhaseOutcome::Skipped;
    }

    let dirs = pipeline.dirs();
    if start == Phase::All {
        if let Err(e) = dirs.prepare() {
            tracing::error!("Preparing working directories failed: {}", e);
            return PhaseOutcome::Failed(Phase::All);
        }
    }

    for &phase in start.remaining() {
        tracing::info!("Phase {}: starting", phase);
        let succeeded = match phase {
            Phase::DataRetrieval => pipeline.data_retrieval(&dirs.base).await,
            Phase::PreProcess => pipeline.pre_process(&dirs.base).await,
            Phase::Sanitization => pipeline.sanitize(&dirs.uncleaned).await,
            Phase::S3Upload => pipeline.s3_upload(&dirs.cleaned).await,
            Phase::DbInsertion => pipeline.db_insertion(&dirs.cleaned).await,
            Phase::All | Phase::None => true,
        };
        if !succeeded {
            tracing::error!("Phase {}: failed", phase);
            return PhaseOutcome::Failed(phase);
        }
        tracing::info!("Phase {}: done", phase);
    }

    PhaseOutcome::Completed
}
