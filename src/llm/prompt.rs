//! Prompt construction for SQL generation.
//!
//! The model gets no execution feedback, so every convention the generated SQL
//! must follow lives here, in a fixed rule list that is embedded verbatim in
//! every prompt. The same question and schema always produce the same prompt.

use crate::query::SqlDialect;

/// Literal the model must answer with when the schema cannot express the question.
pub const NO_ANSWER: &str = "No answer";

/// Fixed rule set, embedded verbatim and unconditionally.
pub const RULES: &[&str] = &[
    "Respond with ONLY the SQL query. No explanations, no comments, no markdown code fences.",
    "When only one non-key attribute is requested, also return the PRIMARY KEY of that table alongside it.",
    "When the question asks for all data of an entity, return every column of that table in the same order as listed in the schema.",
    "When the question asks for a count or total number, return only the numeric aggregate and no other columns.",
    "If the question cannot be answered with the given schema, respond with exactly: No answer",
    "Join tables only on the declared PRIMARY KEY / REFERENCES relationships. Every aggregate must have the correct GROUP BY. Filter date ranges with the relevant start and end date columns. Compute derived metrics (for example promotion effectiveness or revenue) from the raw columns instead of assuming precomputed values.",
];

/// Builds the instruction prompt sent to the completion service.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    dialect: SqlDialect,
}

impl PromptBuilder {
    /// Create a builder targeting a SQL dialect.
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Dialect named in the prompt.
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Compose the prompt for one question.
    ///
    /// # Arguments
    ///
    /// * `question` - User question, trimmed before embedding
    /// * `schema_render` - Output of `SchemaCatalog::render`
    pub fn build(&self, question: &str, schema_render: &str) -> String {
        let dialect = self.dialect.display_name();

        let rules = RULES
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a helpful assistant that converts natural language questions into {dialect} queries.
Go through the schema carefully before generating the SQL query.
Answers must stay within the scope of the schema provided.

RULES:
{rules}

CONVENTIONS:
- Follow the column notes in the schema (for example how dates are stored) when filtering or comparing values.
- Return rates and percentages as fractions between 0 and 1 in a column whose alias contains "rate" or "percentage". They are converted to percentages for display; never multiply by 100 yourself.

Use this schema:

{schema}
Translate the question into SQL:
Question: {question}
SQL:"#,
            dialect = dialect,
            rules = rules,
            schema = schema_render.trim_end(),
            question = question.trim(),
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(SqlDialect::default())
    }
}
