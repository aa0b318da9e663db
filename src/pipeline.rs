//! Question → SQL → rows orchestration.
//!
//! One `answer` call runs:
//!
//! 1. prompt build + completion (`generation_failed` on error)
//! 2. unanswerable sentinel check (`unanswerable`, nothing executed)
//! 3. read-only guard (`rejected`, nothing executed)
//! 4. execution (`execution_failed` on error)
//! 5. formatting (`success`)
//!
//! Generator output is trimmed and unfenced before step 2. Every outcome that
//! reached step 3 carries the generated SQL.

use crate::config::Config;
use crate::llm::{
    strip_markdown, LlmQueryGenerator, PromptBuilder, QueryGenerator, RetryingGenerator,
};
use crate::query::{is_unanswerable, QueryExecutor, ResultFormatter, SqlGuard, SqlxExecutor};
use crate::schema::SchemaCatalog;
use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Explanation attached to `PipelineResult::Unanswerable`.
pub const UNANSWERABLE_REASON: &str =
    "The question cannot be answered from the available tables";

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResult {
    /// Completion service failed; no SQL exists
    GenerationFailed {
        /// Failure description
        error: String,
    },

    /// Model declared the question out of scope
    Unanswerable {
        /// Explanation for display
        reason: String,
    },

    /// Generated SQL is not a single read-only query
    Rejected {
        /// Generated SQL
        sql: String,
        /// Guard violation
        error: String,
    },

    /// Store rejected the SQL
    ExecutionFailed {
        /// Generated SQL
        sql: String,
        /// Engine error detail
        error: String,
    },

    /// Rows returned and formatted
    Success {
        /// Generated SQL
        sql: String,
        /// Column names in result order
        columns: Vec<String>,
        /// Formatted rows
        rows: Vec<Vec<Value>>,
    },
}

impl PipelineResult {
    /// Generated SQL, when the outcome has one.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Rejected { sql, .. }
            | Self::ExecutionFailed { sql, .. }
            | Self::Success { sql, .. } => Some(sql),
            Self::GenerationFailed { .. } | Self::Unanswerable { .. } => None,
        }
    }

    /// Error text for failed outcomes.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::GenerationFailed { error }
            | Self::Rejected { error, .. }
            | Self::ExecutionFailed { error, .. } => Some(error),
            Self::Unanswerable { .. } | Self::Success { .. } => None,
        }
    }

    /// Whether rows were returned.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `status` tag value.
    pub fn status(&self) -> &'static str {
        match self {
            Self::GenerationFailed { .. } => "generation_failed",
            Self::Unanswerable { .. } => "unanswerable",
            Self::Rejected { .. } => "rejected",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Success { .. } => "success",
        }
    }
}

/// Natural-language question answering over a relational store.
///
/// Holds only immutable state, so one instance can serve concurrent callers.
pub struct Pipeline {
    generator: Arc<dyn QueryGenerator>,
    executor: Arc<dyn QueryExecutor>,
    catalog: Arc<SchemaCatalog>,
    prompt: PromptBuilder,
    guard: Option<SqlGuard>,
    formatter: ResultFormatter,
}

impl Pipeline {
    /// Assemble a pipeline from parts.
    ///
    /// The read-only guard is enabled for the prompt's dialect; use
    /// `without_guard` to turn it off.
    pub fn new(
        generator: Arc<dyn QueryGenerator>,
        executor: Arc<dyn QueryExecutor>,
        catalog: Arc<SchemaCatalog>,
        prompt: PromptBuilder,
    ) -> Self {
        let guard = Some(SqlGuard::new(prompt.dialect()));
        Self {
            generator,
            executor,
            catalog,
            prompt,
            guard,
            formatter: ResultFormatter::default(),
        }
    }

    /// Replace the result formatter.
    pub fn with_formatter(mut self, formatter: ResultFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Execute generated SQL without the read-only check.
    pub fn without_guard(mut self) -> Self {
        self.guard = None;
        self
    }

    /// Build the production pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error` if the config is invalid, the schema file cannot be
    /// loaded, or the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let catalog = config.pipeline.load_catalog()?;

        let llm = &config.llm;
        let client = LlmQueryGenerator::new(
            llm.resolved_provider(),
            llm.model.clone(),
            llm.endpoint.clone(),
            llm.api_key.clone(),
            llm.timeout(),
        )?
        .with_temperature(llm.temperature)
        .with_max_tokens(llm.max_tokens);

        let generator: Arc<dyn QueryGenerator> = if llm.retry.is_enabled() {
            Arc::new(RetryingGenerator::new(client, llm.retry.clone()))
        } else {
            Arc::new(client)
        };

        let db = &config.database;
        let executor = SqlxExecutor::new(
            db.connection_url()?,
            db.connect_timeout(),
            db.query_timeout(),
        )
        .map_err(|e| Error::config(e.to_string()))?;

        let dialect = db.resolved_dialect()?;
        tracing::info!(
            backend = executor.backend().as_str(),
            dialect = dialect.display_name(),
            model = %llm.model,
            provider = llm.resolved_provider().as_str(),
            schema = %catalog.descriptor().version,
            "Pipeline configured"
        );

        let mut pipeline = Self::new(
            generator,
            Arc::new(executor),
            Arc::new(catalog),
            PromptBuilder::new(dialect),
        )
        .with_formatter(ResultFormatter::new(&config.pipeline.percent_markers));

        if !config.pipeline.enforce_read_only {
            tracing::warn!("Read-only guard disabled; generated SQL runs unchecked");
            pipeline = pipeline.without_guard();
        }

        Ok(pipeline)
    }

    /// Schema catalog in use.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Prompt that `answer` would send for `question`.
    pub fn prompt_for(&self, question: &str) -> String {
        self.prompt.build(question, self.catalog.render())
    }

    /// Answer one question.
    ///
    /// Never fails: every problem is reported as a `PipelineResult` variant.
    pub async fn answer(&self, question: &str) -> PipelineResult {
        let request_id = Uuid::new_v4();
        self.run(question)
            .instrument(crate::otel::pipeline_span(request_id))
            .await
    }

    async fn run(&self, question: &str) -> PipelineResult {
        let prompt = self.prompt_for(question);

        let text = match self.generator.generate(&prompt).await {
            Ok(text) => strip_markdown(&text),
            Err(e) => {
                tracing::warn!(error = %e, "SQL generation failed");
                return PipelineResult::GenerationFailed {
                    error: e.to_string(),
                };
            }
        };

        if is_unanswerable(&text) {
            tracing::info!("Model declared question unanswerable");
            return PipelineResult::Unanswerable {
                reason: UNANSWERABLE_REASON.to_string(),
            };
        }

        let sql = text;
        tracing::debug!(sql = %sql, "Generated SQL");

        if let Some(guard) = &self.guard {
            if let Err(violation) = guard.check(&sql) {
                tracing::warn!(error = %violation, sql = %sql, "Generated SQL rejected");
                return PipelineResult::Rejected {
                    sql,
                    error: violation.to_string(),
                };
            }
        }

        match self.executor.execute(&sql).await {
            Ok(output) => {
                let rows = self.formatter.format(&output.columns, output.rows);
                tracing::info!(rows = rows.len(), "Question answered");
                PipelineResult::Success {
                    sql,
                    columns: output.columns,
                    rows,
                }
            }
            Err(e) => PipelineResult::ExecutionFailed {
                sql,
                error: e.to_string(),
            },
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("model", &self.generator.model_name())
            .field("schema", &self.catalog.descriptor().version)
            .field("prompt", &self.prompt)
            .field("guard", &self.guard.is_some())
            .finish()
    }
}
