use chrono::NaiveDateTime;
use thiserror::Error;

pub mod report;
pub mod rfm;
pub mod rollups;
pub mod table;

/// Error type used across the aggregation core
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    /// The filtered view holds no rows, so the RFM reference date (a maximum
    /// over the view) does not exist.
    #[error("empty input: no rows in the filtered table")]
    EmptyInput,
}

/// Closed interval over `order_purchase_timestamp`, the filter parameter of
/// one computation cycle.
///
/// An inverted range (`start > end`) is not an error: it simply matches no
/// rows. Interactive callers hit this mid-selection and expect an empty
/// result, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange { start, end }
    }

    /// Range spanning the whole dataset, the default when the caller picked
    /// no bounds. `None` for an empty table.
    pub fn full(table: &table::OrderTable) -> Option<Self> {
        let start = table.min_timestamp()?;
        let end = table.max_timestamp()?;
        Some(DateRange { start, end })
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}
