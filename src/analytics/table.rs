use chrono::NaiveDateTime;

use crate::analytics::DateRange;

/// One line of the source order table.
///
/// Rows reach this type only through the load boundary, so the timestamp is
/// always well-defined and `payment_value` is a non-negative amount in the
/// dataset's single currency.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub customer_unique_id: String,
    pub seller_id: String,
    pub product_category_name: String,
    pub customer_state: String,
    pub seller_state: String,
    pub order_purchase_timestamp: NaiveDateTime,
    pub payment_value: f64,
}

/// In-memory order dataset holding fully typed rows
///
/// # Examples
///
/// ```
/// use order_analytics::{DateRange, OrderTable};
///
/// let table = OrderTable::new(Vec::new());
/// assert!(table.is_empty());
/// assert_eq!(DateRange::full(&table), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrderTable {
    rows: Vec<OrderRecord>,
}

impl OrderTable {
    pub fn new(rows: Vec<OrderRecord>) -> Self {
        OrderTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[OrderRecord] {
        &self.rows
    }

    /// Earliest purchase timestamp in the dataset, `None` when empty
    pub fn min_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.order_purchase_timestamp).min()
    }

    /// Latest purchase timestamp in the dataset, `None` when empty
    pub fn max_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.order_purchase_timestamp).max()
    }

    /// Rows whose purchase timestamp lies within the closed interval, as a
    /// borrowed view in source order
    ///
    /// Does not mutate or copy the underlying rows. An inverted range yields
    /// an empty view.
    pub fn filter_by_date_range(&self, range: &DateRange) -> FilteredTable<'_> {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| range.contains(r.order_purchase_timestamp))
            .map(|(i, _)| i)
            .collect();
        FilteredTable { table: self, rows }
    }

    /// View over every row, equivalent to filtering with the full range
    pub fn all(&self) -> FilteredTable<'_> {
        FilteredTable {
            table: self,
            rows: (0..self.rows.len()).collect(),
        }
    }
}

/// Borrowed subset of an [`OrderTable`] selected by a filter.
///
/// Stores row indices rather than copies; every aggregation reads the same
/// immutable snapshot through one of these.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    table: &'a OrderTable,
    rows: Vec<usize>,
}

impl FilteredTable<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// Iterate the selected records in source order
    pub fn records(&self) -> impl Iterator<Item = &OrderRecord> + '_ {
        self.rows.iter().map(move |&i| &self.table.rows[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn rec(order_id: &str, timestamp: &str, value: f64) -> OrderRecord {
        OrderRecord {
            order_id: order_id.to_string(),
            customer_id: "c1".to_string(),
            customer_unique_id: "u1".to_string(),
            seller_id: "s1".to_string(),
            product_category_name: "beleza_saude".to_string(),
            customer_state: "SP".to_string(),
            seller_state: "SP".to_string(),
            order_purchase_timestamp: ts(timestamp),
            payment_value: value,
        }
    }

    fn sample_table() -> OrderTable {
        OrderTable::new(vec![
            rec("o1", "2018-01-05 08:00:00", 10.0),
            rec("o2", "2018-01-20 09:30:00", 20.0),
            rec("o3", "2018-02-10 14:00:00", 5.0),
        ])
    }

    #[test]
    fn test_min_max_timestamp() {
        let table = sample_table();
        assert_eq!(table.min_timestamp(), Some(ts("2018-01-05 08:00:00")));
        assert_eq!(table.max_timestamp(), Some(ts("2018-02-10 14:00:00")));
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let table = sample_table();
        let range = DateRange::new(ts("2018-01-05 08:00:00"), ts("2018-01-20 09:30:00"));
        let view = table.filter_by_date_range(&range);
        assert_eq!(view.row_indices(), &[0, 1]);
    }

    #[test]
    fn test_filter_single_instant() {
        let table = sample_table();
        let instant = ts("2018-01-20 09:30:00");
        let view = table.filter_by_date_range(&DateRange::new(instant, instant));
        assert_eq!(view.len(), 1);
        assert_eq!(view.records().next().unwrap().order_id, "o2");
    }

    #[test]
    fn test_inverted_range_yields_empty_view() {
        let table = sample_table();
        let range = DateRange::new(ts("2018-02-10 14:00:00"), ts("2018-01-05 08:00:00"));
        let view = table.filter_by_date_range(&range);
        assert!(view.is_empty());
    }

    #[test]
    fn test_filter_does_not_mutate_source() {
        let table = sample_table();
        let before = table.rows().to_vec();
        let range = DateRange::new(ts("2018-01-01 00:00:00"), ts("2018-01-31 00:00:00"));
        let _ = table.filter_by_date_range(&range);
        assert_eq!(table.rows(), &before[..]);
    }

    #[test]
    fn test_full_range_defaults_to_dataset_bounds() {
        let table = sample_table();
        let range = DateRange::full(&table).unwrap();
        assert_eq!(range.start, table.min_timestamp().unwrap());
        assert_eq!(range.end, table.max_timestamp().unwrap());
        assert_eq!(table.filter_by_date_range(&range).len(), table.len());
    }

    #[test]
    fn test_all_matches_every_row() {
        let table = sample_table();
        assert_eq!(table.all().len(), 3);
    }
}
