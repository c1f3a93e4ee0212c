//! # OrderAnalytics
//!
//! `order-analytics` is an in-memory analytics engine for e-commerce
//! order-line data. It turns a flat transaction table into the derived views
//! behind a sales dashboard:
//!
//! - Monthly order/revenue trend (calendar-month buckets)
//! - Product category, seller, and customer-state performance rollups
//! - Distinct customer/seller counts per state
//! - Per-customer RFM (Recency-Frequency-Monetary) segmentation scores
//!
//! # Features
//!
//! - **Typed records**: fixed-schema [`OrderRecord`] rows, no dynamic columns
//! - **Date-range filtering**: closed-interval views over the purchase timestamp
//! - **Pure aggregations**: every rollup is a pure function over a filtered view
//! - **Cached reports**: LRU memoization keyed on the filter bounds
//! - **Parallel CSV loading**: memory-mapped input, chunks parsed with Rayon
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::rc::Rc;
//! use order_analytics::{load_orders, DateRange};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (table, summary) = load_orders(Path::new("data/orders.csv"))?;
//!     println!("loaded {} rows, rejected {}", table.len(), summary.errors.len());
//!
//!     let range = DateRange::full(&table).ok_or("empty dataset")?;
//!     let report = Rc::new(table).dashboard().report(&range)?;
//!
//!     println!("total orders: {}", report.total_orders());
//!     for bucket in &report.monthly {
//!         println!("{} => {} orders", bucket.month, bucket.order_count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod loader;

// Re-export public items for easier access
pub use analytics::report::{
    bottom_by_revenue, format_brl, top_by_revenue, AnalyticsReport, Dashboard, ReportCache,
    RfmAverages, SalesRow,
};
pub use analytics::rfm::{rfm_scores, RfmScore};
pub use analytics::rollups::{
    category_sales, customers_by_state, monthly_orders, seller_sales, sellers_by_state,
    state_sales, CategorySales, MonthlyBucket, SellerSales, StateCustomers, StateSales,
    StateSellers,
};
pub use analytics::table::{FilteredTable, OrderRecord, OrderTable};
pub use analytics::{AnalyticsError, DateRange};
pub use loader::{load_orders, LoaderError, ParseError, ParseSummary};
