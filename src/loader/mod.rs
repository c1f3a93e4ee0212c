use chrono::NaiveDateTime;
use thiserror::Error;

pub mod csv_loader;

pub use csv_loader::load_orders;

/// Errors raised at the load boundary
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("missing header line")]
    MissingHeader,

    #[error("missing column: {0}")]
    MissingColumn(String),
}

/// Outcome of a load: how many rows made it into the table and which source
/// rows were rejected
#[derive(Debug)]
pub struct ParseSummary {
    pub rows_loaded: usize,
    pub errors: Vec<ParseError>,
}

/// A rejected source row.
///
/// Malformed rows are dropped here so the aggregation core can assume every
/// record carries a valid timestamp and amount.
#[derive(Debug)]
pub struct ParseError {
    /// 1-based line number in the source file, counting the header
    pub row: usize,
    pub column: String,
    pub value: String,
    pub reason: String,
}

/// Parse a purchase timestamp in the dataset's format, with either a space
/// or a `T` separator.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDateTime::parse_from_str("2018-01-05 08:26:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(parse_timestamp("2018-01-05 08:26:00"), Some(expected));
        assert_eq!(parse_timestamp("2018-01-05T08:26:00"), Some(expected));
        assert_eq!(parse_timestamp("2018-01-05"), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
