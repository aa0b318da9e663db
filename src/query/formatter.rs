//! Result post-processing for display.
//!
//! Two responsibilities:
//! - recognise the model's "No answer" sentinel
//! - render rate/percentage columns as `45.67%`
//!
//! Formatting never fails. A cell that cannot be read as a number is passed
//! through untouched.

use serde_json::Value;

/// Case-insensitive substrings marking a column as a rate/percentage.
pub const DEFAULT_PERCENT_MARKERS: &[&str] = &["percentage", "rate"];

/// Check whether generated text is the unanswerable sentinel.
///
/// Compares the trimmed text case-insensitively with `no answer`.
pub fn is_unanswerable(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(crate::llm::NO_ANSWER)
}

/// Reformats rate/percentage-like columns.
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    markers: Vec<String>,
}

impl ResultFormatter {
    /// Create a formatter with custom column-name markers.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether a column name marks a rate/percentage column.
    pub fn is_percent_column(&self, column: &str) -> bool {
        let name = column.to_lowercase();
        self.markers.iter().any(|m| name.contains(m.as_str()))
    }

    /// Format rows for display.
    ///
    /// Rows shorter than `columns` are left as they are past their end.
    pub fn format(&self, columns: &[String], rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
        let percent_columns: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, name)| self.is_percent_column(name))
            .map(|(i, _)| i)
            .collect();

        if percent_columns.is_empty() {
            return rows;
        }

        rows.into_iter()
            .map(|mut row| {
                for &i in &percent_columns {
                    if let Some(cell) = row.get_mut(i) {
                        if let Some(formatted) = format_percent(cell) {
                            *cell = formatted;
                        }
                    }
                }
                row
            })
            .collect()
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PERCENT_MARKERS)
    }
}

/// `0.4567` → `"45.67%"`. `None` for non-numeric cells.
fn format_percent(cell: &Value) -> Option<Value> {
    let v = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !v.is_finite() {
        return None;
    }
    Some(Value::String(format!("{:.2}%", v * 100.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_unanswerable() {
        assert!(is_unanswerable("No answer"));
        assert!(is_unanswerable("  no ANSWER \n"));
        assert!(!is_unanswerable("No answer."));
        assert!(!is_unanswerable("SELECT 'No answer'"));
        assert!(!is_unanswerable(""));
    }

    #[test]
    fn test_formats_rate_column() {
        let rows = ResultFormatter::default().format(
            &cols(&["promotion_id", "promotion_effectiveness_rate"]),
            vec![vec![json!(3), json!(0.4567)]],
        );
        assert_eq!(rows, vec![vec![json!(3), json!("45.67%")]]);
    }

    #[test]
    fn test_marker_match_is_case_insensitive() {
        let f = ResultFormatter::default();
        assert!(f.is_percent_column("Discount_Percentage"));
        assert!(f.is_percent_column("PRODUCT_RETURN_RATE"));
        assert!(!f.is_percent_column("total_sales"));
    }

    #[test]
    fn test_numeric_strings_and_integers() {
        let rows = ResultFormatter::default().format(
            &cols(&["churn_rate", "win_percentage"]),
            vec![vec![json!("0.125"), json!(1)]],
        );
        assert_eq!(rows, vec![vec![json!("12.50%"), json!("100.00%")]]);
    }

    #[test]
    fn test_non_numeric_cells_pass_through() {
        let input = vec![
            vec![json!("High"), Value::Null],
            vec![json!(true), json!([1, 2])],
        ];
        let rows = ResultFormatter::default()
            .format(&cols(&["promotion_rate", "success_rate"]), input.clone());
        assert_eq!(rows, input);
    }

    #[test]
    fn test_empty_result() {
        let rows = ResultFormatter::default().format(&cols(&["return_rate"]), vec![]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_short_rows_do_not_panic() {
        let rows = ResultFormatter::default()
            .format(&cols(&["id", "return_rate"]), vec![vec![json!(1)]]);
        assert_eq!(rows, vec![vec![json!(1)]]);
    }

    fn cell() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::from),
            "[a-z ]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_plain_columns_pass_through(
            rows in prop::collection::vec(prop::collection::vec(cell(), 3), 0..20)
        ) {
            let columns = cols(&["customer_id", "total_sales", "gender"]);
            let out = ResultFormatter::default().format(&columns, rows.clone());
            prop_assert_eq!(out, rows);
        }

        #[test]
        fn prop_fraction_renders_two_decimals(v in 0.0f64..1.0) {
            let out = ResultFormatter::default()
                .format(&cols(&["conversion_rate"]), vec![vec![Value::from(v)]]);
            let rendered = out[0][0].as_str().unwrap().to_string();
            prop_assert!(rendered.ends_with('%'));
            let digits = rendered.trim_end_matches('%');
            let decimals = digits.split('.').nth(1).unwrap();
            prop_assert_eq!(decimals.len(), 2);
        }
    }
}
