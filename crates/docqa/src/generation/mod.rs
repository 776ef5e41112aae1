//! Answer generation: prompts, backend fallback, and output formatting

mod composer;
mod formatter;
mod prompt;

pub use composer::{AnswerComposer, Generation, ALL_FAILED};
pub use formatter::{classify, format_answers, parse_structured_answers, split_numbered_answers, MISSING_ANSWER};
pub use prompt::{PromptBuilder, CONTEXT_SEPARATOR, NOT_AVAILABLE};
