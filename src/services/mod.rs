pub mod retry_driver;
pub mod runner;

pub use retry_driver::RetryDriver;
pub use runner::PipelineRunner;
