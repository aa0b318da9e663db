//! Schema descriptors and their LLM-facing rendering.

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

/// Declared column type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers
    Integer,
    /// Floating point numbers
    Float,
    /// Free text
    Text,
    /// Calendar date
    Date,
}

impl ColumnType {
    /// SQL type name used in the rendering.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INT",
            Self::Float => "DOUBLE",
            Self::Text => "TEXT",
            Self::Date => "DATE",
        }
    }
}

/// Single column of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub data_type: ColumnType,

    /// Whether NULL is allowed
    #[serde(default)]
    pub nullable: bool,

    /// Legal string values, if the column is enumerated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,

    /// Unit or semantic hint (e.g. "fraction 0-1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ColumnDescriptor {
    /// Create a NOT NULL column.
    pub fn new(name: &str, data_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable: false,
            domain: None,
            hint: None,
        }
    }

    /// Allow NULL values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Restrict the column to an enumerated set of values.
    pub fn domain(mut self, values: &[&str]) -> Self {
        self.domain = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Attach a unit or semantic hint.
    pub fn hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

/// Declared key relationship between two tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeignKey {
    /// Column in the owning table
    pub column: String,

    /// Referenced table
    pub references_table: String,

    /// Referenced column
    pub references_column: String,
}

/// Single table of the schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,

    /// Optional description shown to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column name(s)
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Declared foreign keys
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDescriptor {
    /// Create a table with a single-column primary key.
    pub fn new(name: &str, primary_key: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            columns,
            primary_key: vec![primary_key.to_string()],
            foreign_keys: Vec::new(),
        }
    }

    /// Attach a description.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Declare a foreign key `column -> table.column`.
    pub fn references(mut self, column: &str, table: &str, table_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            references_table: table.to_string(),
            references_column: table_column.to_string(),
        });
        self
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k == column)
    }

    fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

/// Full schema: versioned, ordered list of tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDescriptor {
    /// Schema version (shown in the rendering)
    pub version: String,

    /// Tables in declaration order
    pub tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Check name uniqueness and key references.
    ///
    /// # Errors
    ///
    /// Returns `Error::SchemaError` naming the first offending table or column
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(Error::schema("schema declares no tables"));
        }

        let mut table_names = HashSet::new();
        for table in &self.tables {
            if !table_names.insert(table.name.as_str()) {
                return Err(Error::schema(format!("duplicate table '{}'", table.name)));
            }
            if table.columns.is_empty() {
                return Err(Error::schema(format!("table '{}' has no columns", table.name)));
            }

            let mut column_names = HashSet::new();
            for column in &table.columns {
                if !column_names.insert(column.name.as_str()) {
                    return Err(Error::schema(format!(
                        "duplicate column '{}.{}'",
                        table.name, column.name
                    )));
                }
            }

            for key in &table.primary_key {
                if !column_names.contains(key.as_str()) {
                    return Err(Error::schema(format!(
                        "primary key '{}' is not a column of '{}'",
                        key, table.name
                    )));
                }
            }
        }

        for table in &self.tables {
            for fk in &table.foreign_keys {
                if table.column(&fk.column).is_none() {
                    return Err(Error::schema(format!(
                        "foreign key column '{}.{}' does not exist",
                        table.name, fk.column
                    )));
                }
                let target = self.table(&fk.references_table).ok_or_else(|| {
                    Error::schema(format!(
                        "'{}.{}' references unknown table '{}'",
                        table.name, fk.column, fk.references_table
                    ))
                })?;
                if target.column(&fk.references_column).is_none() {
                    return Err(Error::schema(format!(
                        "'{}.{}' references unknown column '{}.{}'",
                        table.name, fk.column, fk.references_table, fk.references_column
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Validated, immutable schema with its pre-computed rendering.
///
/// The rendering is produced once at construction, so every prompt built from
/// the same catalog embeds byte-identical schema text.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    descriptor: SchemaDescriptor,
    rendered: String,
}

impl SchemaCatalog {
    /// Validate a descriptor and render it.
    ///
    /// # Errors
    ///
    /// Returns `Error::SchemaError` if the descriptor is inconsistent
    pub fn new(descriptor: SchemaDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let rendered = render_descriptor(&descriptor);
        Ok(Self { descriptor, rendered })
    }

    /// Load a descriptor from a YAML or JSON file.
    ///
    /// Format is chosen by extension (`.yaml`/`.yml` → YAML, anything else → JSON).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let descriptor: SchemaDescriptor = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        tracing::debug!(
            path = %path.display(),
            tables = descriptor.tables.len(),
            "Loaded schema descriptor"
        );
        Self::new(descriptor)
    }

    /// Deterministic text rendering sent to the model.
    pub fn render(&self) -> &str {
        &self.rendered
    }

    /// Underlying descriptor.
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }
}

fn render_descriptor(schema: &SchemaDescriptor) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Schema version: {}", schema.version);

    for table in &schema.tables {
        let _ = writeln!(out);
        let _ = writeln!(out, "Table: {}", table.name);
        if let Some(description) = &table.description {
            let _ = writeln!(out, "Description: {}", description);
        }
        if !table.primary_key.is_empty() {
            let _ = writeln!(out, "Primary key: {}", table.primary_key.join(", "));
        }
        let _ = writeln!(out, "Columns:");

        for column in &table.columns {
            let mut markers = vec![column.data_type.as_sql().to_string()];
            markers.push(if column.nullable { "NULL" } else { "NOT NULL" }.to_string());
            if table.is_primary_key(&column.name) {
                markers.push("PRIMARY KEY".to_string());
            }
            if let Some(fk) = table.foreign_key(&column.name) {
                markers.push(format!(
                    "REFERENCES {}.{}",
                    fk.references_table, fk.references_column
                ));
            }

            let _ = write!(out, "- {} ({})", column.name, markers.join(", "));

            let mut notes = Vec::new();
            if let Some(domain) = &column.domain {
                let values = domain
                    .iter()
                    .map(|v| format!("'{}'", v))
                    .collect::<Vec<_>>()
                    .join(", ");
                notes.push(format!("one of: {}", values));
            }
            if let Some(hint) = &column.hint {
                notes.push(hint.clone());
            }
            if !notes.is_empty() {
                let _ = write!(out, " -- {}", notes.join("; "));
            }
            let _ = writeln!(out);
        }
    }

    out
}
