use super::{Phase, PipelineName};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// "Pipeline X last failed at phase Y."
#[derive(Debug, Clone, PartialEq)]
pub struct FailureStateRecord {
    pub pipeline: PipelineName,
    pub phase: Phase,
    pub observed_at: DateTime<Utc>,
}

/// Starting phase per pipeline for one pass of the retry driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRunRequest {
    phases: BTreeMap<PipelineName, Phase>,
}

impl PipelineRunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pipeline: PipelineName, phase: Phase) -> Self {
        self.phases.insert(pipeline, phase);
        self
    }

    /// Rebuild a request from stored failures. When a pipeline has more than
    /// one record the most recent one wins.
    pub fn from_failures(records: &[FailureStateRecord]) -> Self {
        let mut latest: BTreeMap<PipelineName, &FailureStateRecord> = BTreeMap::new();
        for record in records {
            match latest.get(&record.pipeline) {
                Some(existing) if existing.observed_at > record.observed_at => {}
                _ => {
                    latest.insert(record.pipeline, record);
                }
            }
        }

        Self {
            phases: latest
                .into_iter()
                .map(|(pipeline, record)| (pipeline, record.phase))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn get(&self, pipeline: PipelineName) -> Option<Phase> {
        self.phases.get(&pipeline).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PipelineName, Phase)> + '_ {
        self.phases.iter().map(|(pipeline, phase)| (*pipeline, *phase))
    }

    /// Pipelines that will do work, i.e. not requested with `NONE`.
    pub fn active(&self) -> impl Iterator<Item = PipelineName> + '_ {
        self.iter()
            .filter(|(_, phase)| *phase != Phase::None)
            .map(|(pipeline, _)| pipeline)
    }

    pub fn into_map(self) -> BTreeMap<PipelineName, Phase> {
        self.phases
    }
}
