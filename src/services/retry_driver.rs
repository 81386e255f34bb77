use super::PipelineRunner;
use crate::models::{Phase, PipelineName, PipelineRunRequest};
use crate::pipeline::{PhaseOutcome, PipelineRegistry};
use std::collections::BTreeMap;

/// Outcome of a whole driver invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverReport {
    pub attempts: u32,
    /// Pipelines still failing after the last attempt, with the phase they
    /// failed at.
    pub outstanding: BTreeMap<PipelineName, Phase>,
}

impl DriverReport {
    pub fn succeeded(&self) -> bool {
        self.outstanding.is_empty()
    }
}

#[derive(Debug)]
enum DriverState {
    Init,
    Running(PipelineRunRequest),
    Evaluating(Vec<(PipelineName, Phase)>),
    Retrying(PipelineRunRequest),
    Done(PipelineRunRequest),
}

/// Runs every requested pipeline, then re-runs failed pipelines from their
/// recorded phase until nothing fails or `max_retries` retries are spent.
pub struct RetryDriver {
    runner: PipelineRunner,
    registry: PipelineRegistry,
    max_retries: u32,
}

impl RetryDriver {
    pub fn new(runner: PipelineRunner, registry: PipelineRegistry, max_retries: u32) -> Self {
        Self {
            runner,
            registry,
            max_retries,
        }
    }

    pub async fn run(&self, initial: PipelineRunRequest) -> DriverReport {
        let mut initial = Some(initial);
        let mut retries = 0;
        let mut attempts = 0;
        let mut state = DriverState::Init;

        loop {
            state = match state {
                DriverState::Init => {
                    DriverState::Running(initial.take().unwrap_or_default())
                }
                DriverState::Running(request) => {
                    attempts += 1;
                    tracing::info!(attempt = attempts, "Running {} pipelines", request.len());
                    let failed = self.run_all(&request).await;
                    DriverState::Evaluating(failed)
                }
                DriverState::Evaluating(failed) => {
                    let failures = self.outstanding(&failed).await;
                    if failures.is_empty() || retries >= self.max_retries {
                        DriverState::Done(failures)
                    } else {
                        DriverState::Retrying(failures)
                    }
                }
                DriverState::Retrying(request) => {
                    retries += 1;
                    tracing::warn!(
                        "Retry {} of {} for {} failed pipelines",
                        retries,
                        self.max_retries,
                        request.len()
                    );
                    DriverState::Running(request)
                }
                DriverState::Done(failures) => {
                    for (pipeline, phase) in failures.iter() {
                        tracing::error!("Pipeline {} still failing at phase {}", pipeline, phase);
                    }
                    return DriverReport {
                        attempts,
                        outstanding: failures.into_map(),
                    };
                }
            };
        }
    }

    /// Run each requested pipeline and return the ones that failed this pass.
    async fn run_all(&self, request: &PipelineRunRequest) -> Vec<(PipelineName, Phase)> {
        let mut failed = Vec::new();
        for (name, phase) in request.iter() {
            let Some(pipeline) = self.registry.get(name) else {
                tracing::warn!("Pipeline {} is not configured, skipping", name);
                continue;
            };
            if let PhaseOutcome::Failed(at) = self.runner.run(pipeline.as_ref(), phase).await {
                failed.push((name, at));
            }
        }
        failed
    }

    /// The next request, rebuilt from the failure store.
    ///
    /// A pipeline that failed this pass but has no stored record (the write or
    /// the read failed) restarts from `DataRetrieval`, or from `All` when its
    /// workspace setup failed.
    async fn outstanding(&self, failed: &[(PipelineName, Phase)]) -> PipelineRunRequest {
        let mut request = match self.runner.failures().list_failures().await {
            Ok(records) => PipelineRunRequest::from_failures(&records),
            Err(e) => {
                tracing::error!("Reading failure state failed: {}", e);
                PipelineRunRequest::new()
            }
        };

        for &(name, phase) in failed {
            if request.get(name).is_some() {
                continue;
            }
            let restart = if phase == Phase::All {
                Phase::All
            } else {
                Phase::DataRetrieval
            };
            tracing::warn!(
                "No stored failure for {} (failed at {}), restarting at {}",
                name,
                phase,
                restart
            );
            request = request.with(name, restart);
        }
        request
    }
}
