//! Result type alias for setup operations.

use super::error::Error;

/// Convenient result type for configuration and schema loading.
pub type Result<T> = std::result::Result<T, Error>;
