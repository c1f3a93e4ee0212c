//! Text dashboard over an order-line CSV: loads the data, applies the
//! selected date range, and prints every derived view of the report.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;

use order_analytics::{
    bottom_by_revenue, format_brl, load_orders, top_by_revenue, AnalyticsError, AnalyticsReport,
    DateRange, RfmScore,
};

/// Sales analytics dashboard over e-commerce order data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the order-lines CSV file
    #[arg(short, long, default_value = "data/orders.csv")]
    input: PathBuf,

    /// Start of the reporting window (YYYY-MM-DD, default: first order date)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the reporting window (YYYY-MM-DD, default: last order date)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Number of entries shown in each ranking
    #[arg(short, long, default_value = "5")]
    top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (table, summary) = load_orders(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;

    if args.verbose {
        println!(
            "Loaded {} rows, rejected {}",
            table.len(),
            summary.errors.len()
        );
        for err in summary.errors.iter().take(10) {
            println!("  row {}: {} ({:?})", err.row, err.reason, err.value);
        }
    }

    let Some(full) = DateRange::full(&table) else {
        println!("No orders found in {}", args.input.display());
        return Ok(());
    };

    let start = args
        .start
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(full.start);
    let end = args.end.map(end_of_day).unwrap_or(full.end);
    let range = DateRange::new(start, end);

    let table = Rc::new(table);
    match table.dashboard().report(&range) {
        Ok(report) => render(&report, args.top),
        Err(AnalyticsError::EmptyInput) => {
            println!("No orders between {} and {}.", range.start, range.end);
        }
    }

    Ok(())
}

/// Last second of the day, so an end date selects the whole day
fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("valid time of day"))
}

fn render(report: &AnalyticsReport, top: usize) {
    println!("=== E-Commerce Sales Dashboard ===\n");

    println!("--- Monthly Orders ---");
    println!("Total orders:  {}", report.total_orders());
    println!("Total revenue: {}", format_brl(report.total_revenue()));
    for bucket in &report.monthly {
        println!(
            "  {}  orders={:<6} revenue={}",
            bucket.month,
            bucket.order_count,
            format_brl(bucket.revenue)
        );
    }

    println!("\n--- Best & Worst Performing Products ---");
    for cat in top_by_revenue(&report.categories, top) {
        println!(
            "  + {:<30} {}",
            cat.product_category_name,
            format_brl(cat.revenue)
        );
    }
    for cat in bottom_by_revenue(&report.categories, top) {
        println!(
            "  - {:<30} {}",
            cat.product_category_name,
            format_brl(cat.revenue)
        );
    }

    println!("\n--- Best Performing Sellers ---");
    for seller in report.sellers.iter().take(top) {
        println!("  {:<36} {} orders", seller.seller_id, seller.order_count);
    }
    for seller in top_by_revenue(&report.sellers, top) {
        println!("  {:<36} {}", seller.seller_id, format_brl(seller.revenue));
    }

    println!("\n--- Customer Demographics ---");
    let mut customer_states = report.customer_states.clone();
    customer_states.sort_by(|a, b| b.customers.cmp(&a.customers));
    for state in customer_states.iter().take(top) {
        println!("  {:<4} {} customers", state.customer_state, state.customers);
    }

    let mut seller_states = report.seller_states.clone();
    seller_states.sort_by(|a, b| b.sellers.cmp(&a.sellers));
    for state in seller_states.iter().take(top) {
        println!("  {:<4} {} sellers", state.seller_state, state.sellers);
    }

    println!("\n--- Orders & Revenue by Customer State ---");
    for state in report.state_sales.iter().take(top) {
        println!("  {:<4} {} orders", state.customer_state, state.order_count);
    }
    for state in top_by_revenue(&report.state_sales, top) {
        println!("  {:<4} {}", state.customer_state, format_brl(state.revenue));
    }

    println!("\n--- Best Customers by RFM ---");
    if let Some(avg) = report.average_rfm() {
        println!("Average recency:   {:.1} days", avg.recency_days);
        println!("Average frequency: {:.2}", avg.frequency);
        println!("Average monetary:  {}", format_brl(avg.monetary));
    }

    let by_recency = sorted_rfm(&report.rfm, |a, b| a.recency_days.cmp(&b.recency_days));
    println!("By recency (days):");
    for score in by_recency.iter().take(top) {
        println!("  {:<36} {}", score.customer_unique_id, score.recency_days);
    }

    let by_frequency = sorted_rfm(&report.rfm, |a, b| b.frequency.cmp(&a.frequency));
    println!("By frequency:");
    for score in by_frequency.iter().take(top) {
        println!("  {:<36} {}", score.customer_unique_id, score.frequency);
    }

    let by_monetary = sorted_rfm(&report.rfm, |a, b| {
        b.monetary
            .partial_cmp(&a.monetary)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    println!("By monetary:");
    for score in by_monetary.iter().take(top) {
        println!(
            "  {:<36} {}",
            score.customer_unique_id,
            format_brl(score.monetary)
        );
    }
}

fn sorted_rfm(
    scores: &[RfmScore],
    cmp: impl FnMut(&RfmScore, &RfmScore) -> std::cmp::Ordering,
) -> Vec<RfmScore> {
    let mut sorted = scores.to_vec();
    sorted.sort_by(cmp);
    sorted
}
