//! Read-only allow-list for generated SQL.
//!
//! Model output is executed directly against a live store, so it must parse
//! as exactly one query statement in the target dialect. Anything else
//! (DML, DDL, session commands, `SELECT ... INTO`, `FOR UPDATE` locking reads,
//! stacked statements) is refused before a connection is opened.
//!
//! Acceptance is bounded by what `sqlparser` understands for the dialect.
//! MySQL's `GROUP BY ... WITH ROLLUP` does not parse and is refused as a
//! parse error, even though it is read-only.

use super::dialect::SqlDialect;
use crate::types::GuardViolation;
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::Dialect;
use sqlparser::parser::Parser;

/// Validates generated SQL against the read-only allow-list.
pub struct SqlGuard {
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl SqlGuard {
    /// Create a guard for a dialect.
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect: dialect.parser_dialect(),
        }
    }

    /// Check that `sql` is a single read-only query.
    ///
    /// # Errors
    ///
    /// Returns the first `GuardViolation` found
    pub fn check(&self, sql: &str) -> Result<(), GuardViolation> {
        if sql.trim().trim_end_matches(';').trim().is_empty() {
            return Err(GuardViolation::Empty);
        }

        let statements = Parser::parse_sql(&*self.dialect, sql)
            .map_err(|e| GuardViolation::Parse(e.to_string()))?;

        match statements.as_slice() {
            [] => Err(GuardViolation::Empty),
            [Statement::Query(query)] => check_query(query),
            [_] => Err(GuardViolation::NotReadOnly(leading_keyword(sql))),
            many => Err(GuardViolation::MultipleStatements(many.len())),
        }
    }
}

impl std::fmt::Debug for SqlGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlGuard")
            .field("dialect", &self.dialect)
            .finish()
    }
}

fn check_query(query: &Query) -> Result<(), GuardViolation> {
    if !query.locks.is_empty() {
        return Err(GuardViolation::LockingRead);
    }
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            check_query(&cte.query)?;
        }
    }
    check_set_expr(&query.body)
}

fn check_set_expr(expr: &SetExpr) -> Result<(), GuardViolation> {
    match expr {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                Err(GuardViolation::SelectInto)
            } else {
                Ok(())
            }
        }
        SetExpr::Query(query) => check_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => Ok(()),
        SetExpr::Insert(_) => Err(GuardViolation::NotReadOnly("INSERT".to_string())),
        SetExpr::Update(_) => Err(GuardViolation::NotReadOnly("UPDATE".to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(GuardViolation::NotReadOnly("non-SELECT query body".to_string())),
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(';')
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> SqlGuard {
        SqlGuard::new(SqlDialect::MySql)
    }

    #[test]
    fn test_allows_read_only_queries() {
        let g = guard();
        assert!(g.check("SELECT COUNT(*) FROM customer_info;").is_ok());
        assert!(g.check("SELECT customer_id, age FROM customer_info WHERE age > 30").is_ok());
        assert!(g
            .check(
                "SELECT t.customer_id, SUM(t.quantity * t.unit_price) AS revenue \
                 FROM transaction_data t JOIN customer_info c ON c.customer_id = t.customer_id \
                 GROUP BY t.customer_id ORDER BY revenue DESC LIMIT 5"
            )
            .is_ok());
        assert!(g
            .check("SELECT customer_id FROM sales_data UNION SELECT customer_id FROM customer_info")
            .is_ok());
        assert!(g
            .check("WITH big AS (SELECT * FROM sales_data WHERE total_sales > 1000) SELECT COUNT(*) FROM big")
            .is_ok());
    }

    #[test]
    fn test_rejects_mutations() {
        let g = guard();
        assert_eq!(
            g.check("DELETE FROM customer_info"),
            Err(GuardViolation::NotReadOnly("DELETE".to_string()))
        );
        assert_eq!(
            g.check("drop table customer_info;"),
            Err(GuardViolation::NotReadOnly("DROP".to_string()))
        );
        assert_eq!(
            g.check("UPDATE sales_data SET total_sales = 0"),
            Err(GuardViolation::NotReadOnly("UPDATE".to_string()))
        );
        assert!(matches!(
            g.check("INSERT INTO customer_info (customer_id) VALUES (1)"),
            Err(GuardViolation::NotReadOnly(_))
        ));
    }

    #[test]
    fn test_rejects_multiple_statements() {
        assert_eq!(
            guard().check("SELECT 1; DROP TABLE customer_info;"),
            Err(GuardViolation::MultipleStatements(2))
        );
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        let g = guard();
        assert_eq!(g.check("   "), Err(GuardViolation::Empty));
        assert_eq!(g.check(";"), Err(GuardViolation::Empty));
        assert!(matches!(
            g.check("Here is your query: SELECT 1"),
            Err(GuardViolation::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_select_into() {
        let g = SqlGuard::new(SqlDialect::Postgres);
        assert_eq!(
            g.check("SELECT * INTO backup FROM customer_info"),
            Err(GuardViolation::SelectInto)
        );
    }

    #[test]
    fn test_rejects_locking_reads() {
        let g = guard();
        assert_eq!(
            g.check("SELECT * FROM customer_info FOR UPDATE"),
            Err(GuardViolation::LockingRead)
        );
        assert_eq!(
            g.check("SELECT age FROM customer_info WHERE customer_id = 1 FOR SHARE"),
            Err(GuardViolation::LockingRead)
        );
    }

    #[test]
    fn test_group_by_with_rollup_is_a_parse_error() {
        let result = guard().check(
            "SELECT promotion_type, COUNT(*) FROM promotional_data \
             GROUP BY promotion_type WITH ROLLUP",
        );
        assert!(matches!(result, Err(GuardViolation::Parse(_))));
    }

    #[test]
    fn test_unknown_columns_still_pass() {
        // Existence of identifiers is the store's job, not the guard's.
        assert!(guard().check("SELECT nonexistent_col FROM customer_info;").is_ok());
    }
}
