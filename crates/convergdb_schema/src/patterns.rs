//! Patterns specific to deployment nodes.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// Supported storage formats
pub static STORAGE_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"^(parquet|json|csv)$"));

/// Column data types understood by the generator
pub static DATA_TYPE: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)^(varchar\(\d+\)|char\(\d+\)|text|boolean|smallint|integer|int|bigint|float|double|date|timestamp|numeric\(\d+,\s*\d+\))$",
    )
});

/// S3 bucket name
pub static BUCKET_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$"));
