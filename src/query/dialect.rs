//! SQL dialect selection shared by the prompt and the guard.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// MySQL / MariaDB
    #[default]
    MySql,
    /// SQLite
    Sqlite,
    /// PostgreSQL
    Postgres,
    /// ANSI-ish fallback
    Generic,
}

impl SqlDialect {
    /// Infer the dialect from a database URL scheme.
    ///
    /// # Examples
    ///
    /// - `mysql://root@localhost/retail` → `MySql`
    /// - `sqlite://retail.db` → `Sqlite`
    /// - `unknown://` → `Generic`
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Self::MySql,
            "sqlite" => Self::Sqlite,
            "postgres" | "postgresql" => Self::Postgres,
            _ => Self::Generic,
        }
    }

    /// Human-readable name used in the prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL",
            Self::Generic => "standard SQL",
        }
    }

    /// Matching `sqlparser` dialect.
    pub fn parser_dialect(&self) -> Box<dyn Dialect + Send + Sync> {
        match self {
            Self::MySql => Box::new(MySqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Generic => Box::new(GenericDialect {}),
        }
    }
}
