pub mod config;
pub mod driver;
mod orchestrator;
mod types;

pub use config::BenchmarkConfig;
pub use driver::run_benchmark;
pub use orchestrator::{
    run_on_image, run_pipeline, run_pipeline_reported, run_pipeline_with, BenchmarkReport,
};
pub use types::{
    BenchmarkOutcome, BenchmarkPlan, LaunchCheck, NoOpReporter, PipelineStage, ProgressReporter,
    RunPhase, Timing,
};
