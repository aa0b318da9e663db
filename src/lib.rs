//! nlsql - natural-language questions over a relational store
//!
//! Turns a question into one SQL query with an LLM, checks it is read-only,
//! runs it and returns display-ready rows:
//! - Schema catalog rendered once and embedded in every prompt
//! - Ollama, OpenAI and Anthropic completion backends
//! - MySQL and SQLite execution through `sqlx`
//! - Rate/percentage columns rendered as `45.67%`
//!
//! # Example
//!
//! ```rust,ignore
//! use nlsql::{Config, Pipeline};
//!
//! let config = Config::load(None)?.with_env();
//! let pipeline = Pipeline::from_config(&config)?;
//! let result = pipeline.answer("How many customers are there?").await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod config;
pub mod llm;
pub mod otel;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod types;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineResult};
pub use types::{Error, ExecutionError, GenerationError, GuardViolation, Result};
