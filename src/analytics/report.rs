use std::cell::RefCell;
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;

use crate::analytics::rfm::{rfm_scores, RfmScore};
use crate::analytics::rollups::{
    category_sales, customers_by_state, monthly_orders, seller_sales, sellers_by_state,
    state_sales, CategorySales, MonthlyBucket, SellerSales, StateCustomers, StateSales,
    StateSellers,
};
use crate::analytics::table::OrderTable;
use crate::analytics::{AnalyticsError, DateRange};

/// Every derived table of one filter cycle.
///
/// Owned by the caller; nothing is shared with the source table or with other
/// reports.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<CategorySales>,
    pub sellers: Vec<SellerSales>,
    pub customer_states: Vec<StateCustomers>,
    pub seller_states: Vec<StateSellers>,
    pub state_sales: Vec<StateSales>,
    pub rfm: Vec<RfmScore>,
}

impl AnalyticsReport {
    /// Total orders in the filtered range, summed over the monthly rollup
    pub fn total_orders(&self) -> u64 {
        self.monthly.iter().map(|m| m.order_count).sum()
    }

    /// Total revenue in the filtered range
    pub fn total_revenue(&self) -> f64 {
        self.monthly.iter().map(|m| m.revenue).sum()
    }

    /// Mean recency/frequency/monetary over all scored customers, `None`
    /// when no customers were scored
    pub fn average_rfm(&self) -> Option<RfmAverages> {
        if self.rfm.is_empty() {
            return None;
        }
        let n = self.rfm.len() as f64;
        Some(RfmAverages {
            recency_days: self.rfm.iter().map(|s| s.recency_days as f64).sum::<f64>() / n,
            frequency: self.rfm.iter().map(|s| s.frequency as f64).sum::<f64>() / n,
            monetary: self.rfm.iter().map(|s| s.monetary).sum::<f64>() / n,
        })
    }
}

/// Mean RFM metrics across the scored customers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmAverages {
    pub recency_days: f64,
    pub frequency: f64,
    pub monetary: f64,
}

/// Rollup rows that carry an order count and a revenue sum.
///
/// The seam for the top-N helpers, so rankings work uniformly across the
/// category, seller, and state rollups.
pub trait SalesRow {
    fn order_count(&self) -> u64;
    fn revenue(&self) -> f64;
}

impl SalesRow for CategorySales {
    fn order_count(&self) -> u64 {
        self.order_count
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
}

impl SalesRow for SellerSales {
    fn order_count(&self) -> u64 {
        self.order_count
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
}

impl SalesRow for StateSales {
    fn order_count(&self) -> u64 {
        self.order_count
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
}

/// Top `n` rollup rows by revenue, over the full rollup.
///
/// Rankings by revenue re-sort the whole grouped result rather than a
/// top-N-by-count window, so a high-revenue key with few orders still ranks.
pub fn top_by_revenue<T: SalesRow + Clone>(rows: &[T], n: usize) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.revenue()
            .partial_cmp(&a.revenue())
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

/// Bottom `n` rollup rows by revenue
pub fn bottom_by_revenue<T: SalesRow + Clone>(rows: &[T], n: usize) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        a.revenue()
            .partial_cmp(&b.revenue())
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

/// Format an amount in the dataset's fixed currency, e.g. `BRL 1,234.56`.
///
/// Display formatting only; no conversion.
pub fn format_brl(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}BRL {grouped}.{frac:02}")
}

/// LRU memo of full reports, keyed by the filter bounds.
///
/// A pure optimization for interactive range selection: a cache hit returns
/// the identical report that a recomputation would produce.
#[derive(Debug)]
pub struct ReportCache {
    cache: RefCell<LruCache<DateRange, Rc<AnalyticsReport>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(32).expect("cache capacity is non-zero"),
            )),
        }
    }

    pub fn get(&self, range: &DateRange) -> Option<Rc<AnalyticsReport>> {
        self.cache.borrow_mut().get(range).cloned()
    }

    pub fn put(&self, range: DateRange, report: Rc<AnalyticsReport>) {
        self.cache.borrow_mut().put(range, report);
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Report pipeline over one order table.
///
/// Filters once, then runs the six aggregations over the same immutable
/// view; none depends on another's output.
#[derive(Debug)]
pub struct Dashboard {
    table: Rc<OrderTable>,
    cache: Option<Rc<ReportCache>>,
}

impl Dashboard {
    pub fn new(table: Rc<OrderTable>) -> Self {
        Self { table, cache: None }
    }

    pub fn with_cache(table: Rc<OrderTable>, cache: Rc<ReportCache>) -> Self {
        Self {
            table,
            cache: Some(cache),
        }
    }

    /// Build the full report for the given bounds.
    ///
    /// # Errors
    /// [`AnalyticsError::EmptyInput`] when no rows fall inside the range,
    /// since the RFM table cannot be computed over zero rows. An inverted
    /// range surfaces the same way.
    pub fn report(&self, range: &DateRange) -> Result<Rc<AnalyticsReport>, AnalyticsError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(range) {
                return Ok(hit);
            }
        }

        let view = self.table.filter_by_date_range(range);
        let report = Rc::new(AnalyticsReport {
            monthly: monthly_orders(&view),
            categories: category_sales(&view),
            sellers: seller_sales(&view),
            customer_states: customers_by_state(&view),
            seller_states: sellers_by_state(&view),
            state_sales: state_sales(&view),
            rfm: rfm_scores(&view)?,
        });

        if let Some(cache) = &self.cache {
            cache.put(*range, Rc::clone(&report));
        }
        Ok(report)
    }
}

impl OrderTable {
    pub fn dashboard(self: &Rc<Self>) -> Dashboard {
        Dashboard::new(Rc::clone(self))
    }

    pub fn dashboard_with_cache(self: &Rc<Self>, cache: &Rc<ReportCache>) -> Dashboard {
        Dashboard::with_cache(Rc::clone(self), Rc::clone(cache))
    }
}
