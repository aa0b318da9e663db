//! nlsql CLI
//!
//! Ask questions about the retail database in plain English.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use nlsql::llm::PromptBuilder;
use nlsql::otel::{init_tracing, LogFormat};
use nlsql::query::{redact_url, SqlGuard};
use nlsql::{Config, Pipeline, PipelineResult};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

/// nlsql - natural-language questions over a relational store
#[derive(Parser)]
#[command(name = "nlsql")]
#[command(about = "Translate questions into SQL with an LLM and run them", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (YAML or JSON); defaults to ~/.nlsql/config.yaml
    #[arg(long, env = "NLSQL_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question (prompts on stdin when omitted)
    Ask {
        /// Question text
        question: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Print the generated SQL before the rows
        #[arg(long)]
        show_sql: bool,
    },

    /// Print the prompt that would be sent for a question
    Prompt {
        /// Question text
        question: String,
    },

    /// Print the schema rendering embedded in every prompt
    Schema {
        /// Print the descriptor as JSON instead of the prompt rendering
        #[arg(long)]
        json: bool,
    },

    /// Run generated-style SQL through the read-only guard
    Check {
        /// SQL text
        sql: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing("nlsql=warn", log_format);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_env();

    match cli.command {
        Commands::Ask {
            question,
            format,
            show_sql,
        } => cmd_ask(&config, question, format, show_sql).await?,
        Commands::Prompt { question } => cmd_prompt(&config, &question)?,
        Commands::Schema { json } => cmd_schema(&config, json)?,
        Commands::Check { sql } => cmd_check(&config, &sql)?,
    }

    Ok(())
}

async fn cmd_ask(
    config: &Config,
    question: Option<String>,
    format: OutputFormat,
    show_sql: bool,
) -> anyhow::Result<()> {
    let question = match question {
        Some(q) => q,
        None => read_question()?,
    };
    if question.trim().is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
    tracing::debug!(
        database = %redact_url(&config.database.connection_url()?),
        "Answering question"
    );

    let started = Instant::now();
    let result = pipeline.answer(&question).await;
    let elapsed = started.elapsed();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Csv => match &result {
            PipelineResult::Success { columns, rows, .. } => write_csv(columns, rows)?,
            other => print_outcome(other, show_sql),
        },
        OutputFormat::Table => {
            print_outcome(&result, show_sql);
            eprintln!("Processing time: {:.2}s", elapsed.as_secs_f64());
        }
    }

    if result.error_message().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_prompt(config: &Config, question: &str) -> anyhow::Result<()> {
    let catalog = config.pipeline.load_catalog()?;
    let dialect = config.database.resolved_dialect().unwrap_or_default();
    println!("{}", PromptBuilder::new(dialect).build(question, catalog.render()));
    Ok(())
}

fn cmd_schema(config: &Config, json: bool) -> anyhow::Result<()> {
    let catalog = config.pipeline.load_catalog()?;
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.descriptor())?);
    } else {
        println!("{}", catalog.render());
    }
    Ok(())
}

fn cmd_check(config: &Config, sql: &str) -> anyhow::Result<()> {
    let dialect = config.database.resolved_dialect().unwrap_or_default();

    match SqlGuard::new(dialect).check(sql) {
        Ok(()) => {
            println!("✓ Read-only query ({})", dialect.display_name());
            Ok(())
        }
        Err(violation) => {
            println!("✗ Rejected: {}", violation);
            std::process::exit(1);
        }
    }
}

fn read_question() -> anyhow::Result<String> {
    eprint!("Enter your question: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_outcome(result: &PipelineResult, show_sql: bool) {
    match result {
        PipelineResult::GenerationFailed { error } => {
            println!("Error generating SQL: {}", error);
        }
        PipelineResult::Unanswerable { .. } => {
            println!("Sorry, I don't know the answer to your question.");
        }
        PipelineResult::Rejected { sql, error } => {
            println!("Generated SQL Query: {}", sql);
            println!("Refused to execute: {}", error);
        }
        PipelineResult::ExecutionFailed { sql, error } => {
            println!("Generated SQL Query: {}", sql);
            println!("Error executing SQL query: {}", error);
        }
        PipelineResult::Success { sql, columns, rows } => {
            if show_sql {
                println!("Generated SQL Query: {}\n", sql);
            }
            print_table(columns, rows);
        }
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_table(columns: &[String], rows: &[Vec<Value>]) {
    if rows.is_empty() {
        println!("No results found.");
        return;
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(columns));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        println!("{}", line(row.as_slice()));
    }
    println!("\n({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" });
}

fn write_csv(columns: &[String], rows: &[Vec<Value>]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row.iter().map(|c| match c {
            Value::Null => String::new(),
            other => cell_text(other),
        }))?;
    }
    writer.flush()?;
    Ok(())
}
