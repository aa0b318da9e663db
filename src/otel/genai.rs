//! LLM call and pipeline instrumentation.

use tracing::{span, Level, Span};
use uuid::Uuid;

/// Create a span for one completion request.
///
/// # Arguments
///
/// * `system` - `gen_ai.system` value (`ollama`, `openai`, `anthropic`)
/// * `model` - `gen_ai.request.model` value
pub fn llm_span(system: &str, model: &str) -> Span {
    span!(
        Level::INFO,
        "gen_ai.chat",
        otel.name = %format!("chat {}", model),
        otel.kind = "client",
        gen_ai.operation.name = "chat",
        gen_ai.system = system,
        gen_ai.request.model = model,
    )
}

/// Create the root span for one question.
pub fn pipeline_span(request_id: Uuid) -> Span {
    span!(
        Level::INFO,
        "pipeline.answer",
        otel.kind = "internal",
        request.id = %request_id,
    )
}
