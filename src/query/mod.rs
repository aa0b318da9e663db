//! Query guarding, execution and result formatting.

pub mod dialect;
pub mod executor;
pub mod formatter;
pub mod guard;

pub use dialect::SqlDialect;
pub use executor::{redact_url, Backend, QueryExecutor, QueryOutput, SqlxExecutor};
pub use formatter::{is_unanswerable, ResultFormatter, DEFAULT_PERCENT_MARKERS};
pub use guard::SqlGuard;
