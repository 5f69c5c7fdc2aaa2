//! Report generators
//!
//! A report generator turns a run's assembled content into one keyed output. The
//! orchestrator invokes every generator in a [`GeneratorRegistry`] once per run,
//! each on its own task, and waits for all of them before finalizing the run.
//!
//! - [`traits`] - The [`ReportGenerator`] plugin trait and its output type
//! - [`task`] - One generator bound to one run's content
//! - [`registry`] - The fixed, ordered set of generators
//! - [`sample`] - Parsing encoded lines back into typed samples
//! - [`errors`] / [`overview`] - Built-in generators

pub mod errors;
pub mod overview;
pub mod registry;
pub mod sample;
pub mod task;
pub mod traits;

pub use errors::ErrorsReport;
pub use overview::OverviewReport;
pub use registry::GeneratorRegistry;
pub use sample::{ParsedContent, SampleLine};
pub use task::GeneratorTask;
pub use traits::{ReportGenerator, ReportOutput};
