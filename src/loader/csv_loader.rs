use std::fs::File;
use std::path::Path;

use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::analytics::table::{OrderRecord, OrderTable};
use crate::loader::{parse_timestamp, LoaderError, ParseError, ParseSummary};

/// Header positions of the required source columns, resolved by name
struct ColumnIndexes {
    order_id: usize,
    customer_id: usize,
    customer_unique_id: usize,
    seller_id: usize,
    product_category_name: usize,
    customer_state: usize,
    seller_state: usize,
    order_purchase_timestamp: usize,
    payment_value: usize,
}

impl ColumnIndexes {
    fn resolve(headers: &[&str]) -> Result<Self, LoaderError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| LoaderError::MissingColumn(name.to_string()))
        };

        Ok(ColumnIndexes {
            order_id: position("order_id")?,
            customer_id: position("customer_id")?,
            customer_unique_id: position("customer_unique_id")?,
            seller_id: position("seller_id")?,
            product_category_name: position("product_category_name")?,
            customer_state: position("customer_state")?,
            seller_state: position("seller_state")?,
            order_purchase_timestamp: position("order_purchase_timestamp")?,
            payment_value: position("payment_value")?,
        })
    }
}

struct RowBatch {
    records: Vec<OrderRecord>,
    errors: Vec<ParseError>,
}

/// Loads an order-line CSV file into an [`OrderTable`] using memory mapping
///
/// The file is chunked on line boundaries and the chunks are parsed in
/// parallel. Rows with a malformed timestamp, a non-numeric or negative
/// amount, or the wrong field count are rejected and reported in the
/// returned [`ParseSummary`]; they never reach the table.
///
/// # Errors
/// Returns a [`LoaderError`] if the file cannot be opened or mapped, has no
/// header line, or the header lacks a required column.
pub fn load_orders(path: &Path) -> Result<(OrderTable, ParseSummary), LoaderError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let buf: &[u8] = &mmap[..];

    // Parse header
    let header_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(LoaderError::MissingHeader)?;
    let header_line = std::str::from_utf8(&buf[..header_end])?;
    let headers: Vec<&str> = header_line.trim_end_matches('\r').split(',').collect();
    let columns = ColumnIndexes::resolve(&headers)?;

    let data = &buf[header_end + 1..];
    let chunks = find_chunk_boundaries(data, rayon::current_num_threads());

    // First source line of each chunk, for exact error locations
    let mut first_lines = Vec::with_capacity(chunks.len());
    let mut next_line = 2usize; // header is line 1
    for &(start, end) in &chunks {
        first_lines.push(next_line);
        next_line += memchr_iter(b'\n', &data[start..end]).count();
    }

    let batches: Vec<RowBatch> = chunks
        .par_iter()
        .enumerate()
        .map(|(idx, &(start, end))| {
            parse_chunk(&data[start..end], &columns, headers.len(), first_lines[idx])
        })
        .collect();

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for batch in batches {
        records.extend(batch.records);
        errors.extend(batch.errors);
    }

    let summary = ParseSummary {
        rows_loaded: records.len(),
        errors,
    };
    Ok((OrderTable::new(records), summary))
}

/// Split the data region into roughly equal chunks ending on newlines
fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let chunk_size = (data.len() / num_chunks).max(1);
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks.saturating_sub(1) {
        let mut end = ((i + 1) * chunk_size).max(start);

        // Advance to the next newline so no row straddles two chunks
        while end < data.len() && data[end] != b'\n' {
            end += 1;
        }
        if end < data.len() {
            end += 1; // include the newline
        }

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

fn parse_chunk(
    chunk: &[u8],
    columns: &ColumnIndexes,
    num_cols: usize,
    first_line: usize,
) -> RowBatch {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut line_no = first_line;

    let mut start = 0;
    for newline_pos in memchr_iter(b'\n', chunk) {
        consume_line(
            &chunk[start..newline_pos],
            columns,
            num_cols,
            line_no,
            &mut records,
            &mut errors,
        );
        start = newline_pos + 1;
        line_no += 1;
    }
    // A final row without a trailing newline still counts
    if start < chunk.len() {
        consume_line(
            &chunk[start..],
            columns,
            num_cols,
            line_no,
            &mut records,
            &mut errors,
        );
    }

    RowBatch { records, errors }
}

fn consume_line(
    line: &[u8],
    columns: &ColumnIndexes,
    num_cols: usize,
    line_no: usize,
    records: &mut Vec<OrderRecord>,
    errors: &mut Vec<ParseError>,
) {
    let line = strip_cr(line);
    if line.is_empty() {
        return;
    }
    match parse_line(line, columns, num_cols, line_no) {
        Ok(record) => records.push(record),
        Err(err) => errors.push(err),
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn parse_line(
    line: &[u8],
    columns: &ColumnIndexes,
    num_cols: usize,
    line_no: usize,
) -> Result<OrderRecord, ParseError> {
    let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);
    let mut field_start = 0;
    for comma_pos in memchr_iter(b',', line) {
        fields.push(&line[field_start..comma_pos]);
        field_start = comma_pos + 1;
    }
    fields.push(&line[field_start..]);

    if fields.len() != num_cols {
        return Err(ParseError {
            row: line_no,
            column: String::new(),
            value: format!("expected {} fields, got {}", num_cols, fields.len()),
            reason: "field count mismatch".to_string(),
        });
    }

    let text = |idx: usize| String::from_utf8_lossy(fields[idx]).to_string();

    let ts_raw = text(columns.order_purchase_timestamp);
    let order_purchase_timestamp =
        parse_timestamp(ts_raw.trim()).ok_or_else(|| ParseError {
            row: line_no,
            column: "order_purchase_timestamp".to_string(),
            value: ts_raw.clone(),
            reason: "unparseable timestamp".to_string(),
        })?;

    let pay_raw = text(columns.payment_value);
    let payment_value: f64 =
        fast_float::parse(pay_raw.trim().as_bytes()).map_err(|_| ParseError {
            row: line_no,
            column: "payment_value".to_string(),
            value: pay_raw.clone(),
            reason: "non-numeric amount".to_string(),
        })?;
    if !payment_value.is_finite() || payment_value < 0.0 {
        return Err(ParseError {
            row: line_no,
            column: "payment_value".to_string(),
            value: pay_raw,
            reason: "negative or non-finite amount".to_string(),
        });
    }

    Ok(OrderRecord {
        order_id: text(columns.order_id),
        customer_id: text(columns.customer_id),
        customer_unique_id: text(columns.customer_unique_id),
        seller_id: text(columns.seller_id),
        product_category_name: text(columns.product_category_name),
        customer_state: text(columns.customer_state),
        seller_state: text(columns.seller_state),
        order_purchase_timestamp,
        payment_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "order_id,customer_id,customer_unique_id,seller_id,\
product_category_name,customer_state,seller_state,order_purchase_timestamp,payment_value";

    fn load_from_str(csv: &str) -> Result<(OrderTable, ParseSummary), LoaderError> {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();
        load_orders(tmp.path())
    }

    fn row(order: &str, ts: &str, value: &str) -> String {
        format!("{order},c1,u1,s1,beleza_saude,SP,RJ,{ts},{value}")
    }

    #[test]
    fn test_load_valid_rows() {
        let csv = format!(
            "{HEADER}\n{}\n{}\n",
            row("o1", "2018-01-05 08:26:00", "12.50"),
            row("o2", "2018-01-06 10:00:00", "30.00"),
        );
        let (table, summary) = load_from_str(&csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(summary.rows_loaded, 2);
        assert!(summary.errors.is_empty());

        let first = &table.rows()[0];
        assert_eq!(first.order_id, "o1");
        assert_eq!(first.customer_state, "SP");
        assert_eq!(first.seller_state, "RJ");
        assert_eq!(first.payment_value, 12.5);
    }

    #[test]
    fn test_last_row_without_trailing_newline() {
        let csv = format!("{HEADER}\n{}", row("o1", "2018-01-05 08:26:00", "12.50"));
        let (table, _) = load_from_str(&csv).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_malformed_rows_are_rejected_not_fatal() {
        let csv = format!(
            "{HEADER}\n{}\n{}\n{}\n{}\n",
            row("o1", "2018-01-05 08:26:00", "12.50"),
            row("o2", "not-a-date", "30.00"),
            row("o3", "2018-01-07 10:00:00", "abc"),
            row("o4", "2018-01-08 10:00:00", "-5.00"),
        );
        let (table, summary) = load_from_str(&csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(summary.errors.len(), 3);

        let columns: Vec<&str> = summary.errors.iter().map(|e| e.column.as_str()).collect();
        assert!(columns.contains(&"order_purchase_timestamp"));
        assert!(columns.contains(&"payment_value"));
        assert_eq!(summary.errors[0].row, 3);
    }

    #[test]
    fn test_field_count_mismatch_is_rejected() {
        let csv = format!(
            "{HEADER}\n{}\nshort,row\n",
            row("o1", "2018-01-05 08:26:00", "12.50"),
        );
        let (table, summary) = load_from_str(&csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].reason, "field count mismatch");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "order_id,customer_id\no1,c1\n";
        match load_from_str(csv) {
            Err(LoaderError::MissingColumn(name)) => assert_eq!(name, "customer_unique_id"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_header_is_an_error() {
        assert!(matches!(
            load_from_str("no newline at all"),
            Err(LoaderError::MissingHeader)
        ));
    }

    #[test]
    fn test_columns_resolved_by_name_not_position() {
        let csv = "payment_value,order_purchase_timestamp,seller_state,customer_state,\
product_category_name,seller_id,customer_unique_id,customer_id,order_id\n\
42.00,2018-01-05 08:26:00,RJ,SP,esporte_lazer,s1,u1,c1,o1\n";
        let (table, _) = load_from_str(csv).unwrap();
        let rec = &table.rows()[0];
        assert_eq!(rec.order_id, "o1");
        assert_eq!(rec.payment_value, 42.0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = format!("{HEADER}\r\n{}\r\n", row("o1", "2018-01-05 08:26:00", "12.50"));
        let (table, summary) = load_from_str(&csv).unwrap();
        assert_eq!(table.len(), 1);
        assert!(summary.errors.is_empty());
        assert_eq!(table.rows()[0].payment_value, 12.5);
    }

    #[test]
    fn test_chunk_boundaries_cover_all_data() {
        let data = b"a,1\nb,2\nc,3\nd,4\ne,5\n";
        for threads in 1..6 {
            let chunks = find_chunk_boundaries(data, threads);
            assert_eq!(chunks.first().map(|c| c.0), Some(0));
            assert_eq!(chunks.last().map(|c| c.1), Some(data.len()));
            for window in chunks.windows(2) {
                assert_eq!(window[0].1, window[1].0);
            }
        }
    }
}
