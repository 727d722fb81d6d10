//! Command-line entry points

pub mod orchestration;

pub use orchestration::{build_plan, run_release_workflow, ReleaseWorkflowArgs};
