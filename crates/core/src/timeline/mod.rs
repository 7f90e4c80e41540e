pub mod engine;

pub use engine::{CompletionKind, CompletionPlan, CompletionRequest, TimelineEngine};
