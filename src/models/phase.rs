use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;

/// A stage of a vendor pipeline, plus the `All` and `None` control values.
///
/// The derived ordering follows declaration order, so the real phases compare
/// `DataRetrieval < PreProcess < Sanitization < S3Upload < DbInsertion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    All,
    DataRetrieval,
    PreProcess,
    Sanitization,
    S3Upload,
    DbInsertion,
    None,
}

impl Phase {
    /// The real phases in execution order.
    pub const SEQUENCE: [Phase; 5] = [
        Phase::DataRetrieval,
        Phase::PreProcess,
        Phase::Sanitization,
        Phase::S3Upload,
        Phase::DbInsertion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::All => "ALL",
            Phase::DataRetrieval => "DATA_RETRIEVAL",
            Phase::PreProcess => "PREPROCESS",
            Phase::Sanitization => "SANITIZATION",
            Phase::S3Upload => "S3_UPLOAD",
            Phase::DbInsertion => "DB_INSERTION",
            Phase::None => "NONE",
        }
    }

    /// Phases executed when a run starts here. `All` yields every phase,
    /// `None` yields nothing.
    pub fn remaining(self) -> &'static [Phase] {
        match self {
            Phase::All => &Self::SEQUENCE,
            Phase::None => &[],
            phase => {
                let start = Self::SEQUENCE
                    .iter()
                    .position(|candidate| *candidate == phase)
                    .unwrap_or(Self::SEQUENCE.len());
                &Self::SEQUENCE[start..]
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        let phase = match raw.trim().to_ascii_uppercase().as_str() {
            "ALL" => Phase::All,
            "DATA_RETRIEVAL" => Phase::DataRetrieval,
            "PREPROCESS" => Phase::PreProcess,
            "SANITIZATION" => Phase::Sanitization,
            "S3_UPLOAD" => Phase::S3Upload,
            "DB_INSERTION" => Phase::DbInsertion,
            "NONE" => Phase::None,
            _ => return Err(AppError::InvalidPhase(raw.to_string())),
        };
        Ok(phase)
    }
}

/// Identifier of a vendor pipeline. Used as the failure-state partition key
/// and in working directory and object key paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineName {
    BestBuy,
    WalMart,
}

impl PipelineName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineName::BestBuy => "BESTBUY",
            PipelineName::WalMart => "WALMART",
        }
    }

    /// Lower-case form used for directory names and object keys.
    pub fn slug(&self) -> &'static str {
        match self {
            PipelineName::BestBuy => "bestbuy",
            PipelineName::WalMart => "walmart",
        }
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineName {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BESTBUY" => Ok(PipelineName::BestBuy),
            "WALMART" => Ok(PipelineName::WalMart),
            _ => Err(AppError::UnknownPipeline(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_phase_names_case_insensitively() {
        assert_eq!("s3_upload".parse::<Phase>().unwrap(), Phase::S3Upload);
        assert_eq!("PREPROCESS".parse::<Phase>().unwrap(), Phase::PreProcess);
        assert_eq!(" none ".parse::<Phase>().unwrap(), Phase::None);
    }

    #[test]
    fn rejects_unknown_phase_names() {
        let err = "DATARETRIEVAL".parse::<Phase>().unwrap_err();
        assert!(matches!(err, AppError::InvalidPhase(name) if name == "DATARETRIEVAL"));
    }

    #[test]
    fn real_phases_are_totally_ordered() {
        let mut sorted = Phase::SEQUENCE;
        sorted.sort();
        assert_eq!(sorted, Phase::SEQUENCE);
        assert!(Phase::DataRetrieval < Phase::DbInsertion);
    }

    #[test]
    fn remaining_starts_at_requested_phase() {
        assert_eq!(Phase::All.remaining(), &Phase::SEQUENCE);
        assert!(Phase::None.remaining().is_empty());
        assert_eq!(
            Phase::Sanitization.remaining(),
            &[Phase::Sanitization, Phase::S3Upload, Phase::DbInsertion]
        );
        assert_eq!(Phase::DbInsertion.remaining(), &[Phase::DbInsertion]);
    }

    #[test]
    fn pipeline_names_use_stable_strings() {
        assert_eq!(PipelineName::BestBuy.to_string(), "BESTBUY");
        assert_eq!("walmart".parse::<PipelineName>().unwrap(), PipelineName::WalMart);
        assert!("AMAZON".parse::<PipelineName>().is_err());
    }
}
