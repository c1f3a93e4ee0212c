use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::analytics::table::{FilteredTable, OrderRecord};

/// One calendar month of the trend series.
///
/// `month` is the last day of the bucket's month, so chronological and
/// lexical ordering agree.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    pub month: NaiveDate,
    pub order_count: u64,
    pub revenue: f64,
}

/// Sales rollup keyed by product category
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySales {
    pub product_category_name: String,
    pub order_count: u64,
    pub revenue: f64,
}

/// Sales rollup keyed by seller
#[derive(Debug, Clone, PartialEq)]
pub struct SellerSales {
    pub seller_id: String,
    pub order_count: u64,
    pub revenue: f64,
}

/// Sales rollup keyed by customer state
#[derive(Debug, Clone, PartialEq)]
pub struct StateSales {
    pub customer_state: String,
    pub order_count: u64,
    pub revenue: f64,
}

/// Distinct customers per state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCustomers {
    pub customer_state: String,
    pub customers: u64,
}

/// Distinct sellers per state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSellers {
    pub seller_state: String,
    pub sellers: u64,
}

/// Groups the view by calendar month of the purchase timestamp and computes
/// order count and revenue per bucket.
///
/// Output is ascending by month, which downstream line charts rely on for a
/// monotonic x-axis. Months with no matching rows are absent; there are no
/// zero-filled gap buckets.
pub fn monthly_orders(view: &FilteredTable) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for rec in view.records() {
        let entry = buckets
            .entry(month_end(rec.order_purchase_timestamp.date()))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += rec.payment_value;
    }
    buckets
        .into_iter()
        .map(|(month, (order_count, revenue))| MonthlyBucket {
            month,
            order_count,
            revenue,
        })
        .collect()
}

/// Order count and revenue per product category, descending by order count
pub fn category_sales(view: &FilteredTable) -> Vec<CategorySales> {
    keyed_rollup(view, |r| r.product_category_name.as_str())
        .into_iter()
        .map(|(key, order_count, revenue)| CategorySales {
            product_category_name: key,
            order_count,
            revenue,
        })
        .collect()
}

/// Order count and revenue per seller, descending by order count
pub fn seller_sales(view: &FilteredTable) -> Vec<SellerSales> {
    keyed_rollup(view, |r| r.seller_id.as_str())
        .into_iter()
        .map(|(key, order_count, revenue)| SellerSales {
            seller_id: key,
            order_count,
            revenue,
        })
        .collect()
}

/// Order count and revenue per customer state, descending by order count
pub fn state_sales(view: &FilteredTable) -> Vec<StateSales> {
    keyed_rollup(view, |r| r.customer_state.as_str())
        .into_iter()
        .map(|(key, order_count, revenue)| StateSales {
            customer_state: key,
            order_count,
            revenue,
        })
        .collect()
}

/// Exact distinct `customer_unique_id` count per customer state.
///
/// Emitted ascending by state code; top-N views sort on the count
/// caller-side.
pub fn customers_by_state(view: &FilteredTable) -> Vec<StateCustomers> {
    distinct_by_state(view, |r| (r.customer_state.as_str(), r.customer_unique_id.as_str()))
        .into_iter()
        .map(|(state, count)| StateCustomers {
            customer_state: state,
            customers: count,
        })
        .collect()
}

/// Exact distinct `seller_id` count per seller state
pub fn sellers_by_state(view: &FilteredTable) -> Vec<StateSellers> {
    distinct_by_state(view, |r| (r.seller_state.as_str(), r.seller_id.as_str()))
        .into_iter()
        .map(|(state, count)| StateSellers {
            seller_state: state,
            sellers: count,
        })
        .collect()
}

/// Single-key rollup shared by the entity aggregations: row count plus
/// revenue sum per key, sorted descending by count with the key as a
/// deterministic tie-break.
fn keyed_rollup(
    view: &FilteredTable,
    key: impl for<'r> Fn(&'r OrderRecord) -> &'r str,
) -> Vec<(String, u64, f64)> {
    let mut groups: HashMap<&str, (u64, f64)> = HashMap::new();
    for rec in view.records() {
        let entry = groups.entry(key(rec)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += rec.payment_value;
    }

    let mut out: Vec<(String, u64, f64)> = groups
        .into_iter()
        .map(|(key, (count, revenue))| (key.to_string(), count, revenue))
        .collect();
    out.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

fn distinct_by_state(
    view: &FilteredTable,
    key: impl for<'r> Fn(&'r OrderRecord) -> (&'r str, &'r str),
) -> Vec<(String, u64)> {
    let mut sets: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for rec in view.records() {
        let (state, id) = key(rec);
        sets.entry(state).or_default().insert(id);
    }
    sets.into_iter()
        .map(|(state, ids)| (state.to_string(), ids.len() as u64))
        .collect()
}

/// Last day of the month containing `day`, the bucket key for the monthly
/// rollup
fn month_end(day: NaiveDate) -> NaiveDate {
    let (year, month) = (day.year(), day.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .expect("month boundaries are representable")
}
