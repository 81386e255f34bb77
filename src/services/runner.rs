use crate::collaborators::Notifier;
use crate::models::Phase;
use crate::pipeline::{PhaseOutcome, VendorPipeline, run_sequence};
use crate::repository::FailureStateRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

#[derive(Clone)]
pub struct PipelineRunner {
    failures: FailureStateRepository,
    notifier: Arc<dyn Notifier>,
}

impl PipelineRunner {
    pub fn new(failures: FailureStateRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self { failures, notifier }
    }

    pub fn failures(&self) -> &FailureStateRepository {
        &self.failures
    }

    /// Run one pipeline from `start`.
    ///
    /// A failure is notified and recorded, and the working directories are
    /// kept so a later attempt can resume. A full success removes them, clears
    /// the pipeline's failure state and sends a success notification.
    pub async fn run(&self, pipeline: &dyn VendorPipeline, start: Phase) -> PhaseOutcome {
        let name = pipeline.name();
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", pipeline = %name, %run_id);

        async move {
            if start == Phase::None {
                tracing::info!("Skipping pipeline");
                return PhaseOutcome::Skipped;
            }

            tracing::info!("Starting pipeline at phase {}", start);
            let started = Instant::now();
            let outcome = run_sequence(pipeline, start).await;

            match outcome {
                PhaseOutcome::Failed(phase) => {
                    self.notifier.notify_failure(name, phase).await;
                    if let Err(e) = self.failures.record_failure(name, phase, Utc::now()).await {
                        tracing::error!("Recording failure state failed: {}", e);
                    }
                }
                PhaseOutcome::Completed => {
                    if let Err(e) = pipeline.dirs().remove() {
                        tracing::warn!("Removing working directories failed: {}", e);
                    }
                    if let Err(e) = self.failures.clear(name).await {
                        tracing::error!("Clearing failure state failed: {}", e);
                    }
                    let elapsed = started.elapsed();
                    tracing::info!("Pipeline completed in {:?}", elapsed);
                    self.notifier.notify_success(name, elapsed).await;
                }
                PhaseOutcome::Skipped => {}
            }

            outcome
        }
        .instrument(span)
        .await
    }
}
