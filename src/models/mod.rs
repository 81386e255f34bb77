pub mod failure_state;
pub mod phase;
pub mod product;

pub use failure_state::{FailureStateRecord, PipelineRunRequest};
pub use phase::{Phase, PipelineName};
pub use product::{OutputCategory, ProductInfo, ProductPrice};
