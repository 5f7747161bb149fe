//! Configuration errors: malformed TOML/JSON, or a field outside its valid
//! range.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("field `{field}` out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: String,
    },
}
