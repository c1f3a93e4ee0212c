use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::analytics::table::FilteredTable;
use crate::analytics::AnalyticsError;

/// Per-customer Recency-Frequency-Monetary score
#[derive(Debug, Clone, PartialEq)]
pub struct RfmScore {
    pub customer_unique_id: String,
    /// Count of distinct orders placed by the customer
    pub frequency: u64,
    /// Sum of `payment_value` over the customer's rows
    pub monetary: f64,
    /// Whole days between the customer's latest order date and the reference
    /// date; zero for the customer holding the most recent order
    pub recency_days: i64,
}

/// Computes RFM scores for every customer in the view.
///
/// The recency anchor is the latest purchase *date* (time of day discarded)
/// across the entire view, computed once and shared by all customers, so
/// `recency_days` is always non-negative.
///
/// # Errors
/// Returns [`AnalyticsError::EmptyInput`] for an empty view: the reference
/// date is a maximum over the rows and does not exist for zero of them.
pub fn rfm_scores(view: &FilteredTable) -> Result<Vec<RfmScore>, AnalyticsError> {
    let reference_date: NaiveDate = view
        .records()
        .map(|r| r.order_purchase_timestamp.date())
        .max()
        .ok_or(AnalyticsError::EmptyInput)?;

    struct Group<'a> {
        last_order: NaiveDate,
        orders: HashSet<&'a str>,
        monetary: f64,
    }

    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for rec in view.records() {
        let day = rec.order_purchase_timestamp.date();
        let group = groups
            .entry(rec.customer_unique_id.as_str())
            .or_insert_with(|| Group {
                last_order: day,
                orders: HashSet::new(),
                monetary: 0.0,
            });
        if day > group.last_order {
            group.last_order = day;
        }
        group.orders.insert(rec.order_id.as_str());
        group.monetary += rec.payment_value;
    }

    Ok(groups
        .into_iter()
        .map(|(customer, group)| RfmScore {
            customer_unique_id: customer.to_string(),
            frequency: group.orders.len() as u64,
            monetary: group.monetary,
            recency_days: (reference_date - group.last_order).num_days(),
        })
        .collect())
}
