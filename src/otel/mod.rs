//! Tracing instrumentation and subscriber setup.
//!
//! Span attributes follow OpenTelemetry semantic conventions:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//! - https://opentelemetry.io/docs/specs/semconv/gen-ai/gen-ai-spans/
//!
//! # Spans
//!
//! - `pipeline.answer` - one per question, carries `request.id`
//! - `gen_ai.chat` - the completion call (`gen_ai.system`, `gen_ai.request.model`)
//! - `db.query` - statement execution (`db.system.name`, `db.query.text`)
//!
//! # Example
//!
//! ```rust,ignore
//! use nlsql::otel::db_query_span;
//!
//! let span = db_query_span("mysql", "SELECT COUNT(*) FROM customer_info");
//! let _guard = span.entered();
//! ```

pub mod db;
pub mod genai;
pub mod init;

pub use db::{db_query_span, record_db_metrics};
pub use genai::{llm_span, pipeline_span};
pub use init::{init_tracing, LogFormat};
