//! Request processing

mod pipeline;

pub use pipeline::{QaPipeline, RunOutcome};
