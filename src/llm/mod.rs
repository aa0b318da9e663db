//! LLM-powered SQL generation: prompt, completion client, retry policy.

pub mod generator;
pub mod prompt;
pub mod retry;

pub use generator::{strip_markdown, LlmProvider, LlmQueryGenerator, QueryGenerator};
pub use prompt::{PromptBuilder, NO_ANSWER, RULES};
pub use retry::{RetryPolicy, RetryingGenerator};
