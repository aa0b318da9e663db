//! Schema catalog: the single source of truth injected into every prompt.

pub mod builtin;
pub mod catalog;

pub use builtin::retail_schema;
pub use catalog::{
    ColumnDescriptor, ColumnType, ForeignKey, SchemaCatalog, SchemaDescriptor, TableDescriptor,
};
