use serde_json::{Map, Value};

use crate::category::Category;
use crate::decode::as_f64_any;

/// Suffix marking metrics conceded to opponents.
pub const AGAINST_SUFFIX: &str = "A";

/// Bucket fields that label a row rather than measure it.
const NON_METRIC_FIELDS: [&str; 3] = ["stat", "time", "against"];

#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub bucket: String,
    pub values: Vec<Option<f64>>,
}

/// One category reshaped into bucket rows and for/against metric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub category: Category,
    pub columns: Vec<String>,
    pub rows: Vec<StatRow>,
}

impl StatTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, metric: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == metric)
    }

    pub fn row(&self, bucket: &str) -> Option<&StatRow> {
        self.rows.iter().find(|r| r.bucket == bucket)
    }

    pub fn value(&self, bucket: &str, metric: &str) -> Option<f64> {
        let idx = self.column_index(metric)?;
        self.row(bucket)?.values.get(idx).copied().flatten()
    }

    /// Rows ordered by bucket name, descending. Display order for the dashboard.
    pub fn sorted_by_bucket_desc(&self) -> StatTable {
        let mut sorted = self.clone();
        sorted.rows.sort_by(|a, b| b.bucket.cmp(&a.bucket));
        sorted
    }
}

/// Reshapes `bucket → {metric…, against: {metric…}}` into a [`StatTable`].
///
/// For-side columns come first in first-seen order, then against-side columns
/// suffixed with [`AGAINST_SUFFIX`]. Buckets missing an `against` record, or
/// values that are not numeric, leave empty cells; the table is always built.
pub fn normalize_category(category: Category, section: &Map<String, Value>) -> StatTable {
    let mut for_columns: Vec<String> = Vec::new();
    let mut against_columns: Vec<String> = Vec::new();
    let mut for_cells: Vec<Vec<(usize, f64)>> = Vec::with_capacity(section.len());
    let mut against_cells: Vec<Vec<(usize, f64)>> = Vec::with_capacity(section.len());

    for record in section.values() {
        let Some(record) = record.as_object() else {
            for_cells.push(Vec::new());
            against_cells.push(Vec::new());
            continue;
        };

        let mut cells = Vec::new();
        for (metric, raw) in record {
            if NON_METRIC_FIELDS.contains(&metric.as_str()) {
                continue;
            }
            let idx = column_slot(&mut for_columns, metric);
            if let Some(v) = as_f64_any(raw) {
                cells.push((idx, v));
            }
        }
        for_cells.push(cells);

        let mut cells = Vec::new();
        if let Some(against) = record.get("against").and_then(Value::as_object) {
            for (metric, raw) in against {
                let idx = column_slot(&mut against_columns, metric);
                if let Some(v) = as_f64_any(raw) {
                    cells.push((idx, v));
                }
            }
        }
        against_cells.push(cells);
    }

    let offset = for_columns.len();
    let width = offset + against_columns.len();
    let rows = section
        .keys()
        .zip(for_cells.into_iter().zip(against_cells))
        .map(|(bucket, (fors, againsts))| {
            let mut values = vec![None; width];
            for (idx, v) in fors {
                values[idx] = Some(v);
            }
            for (idx, v) in againsts {
                values[offset + idx] = Some(v);
            }
            StatRow {
                bucket: bucket.clone(),
                values,
            }
        })
        .collect();

    let mut columns = for_columns;
    columns.extend(against_columns.into_iter().map(|m| format!("{m}{AGAINST_SUFFIX}")));

    StatTable {
        category,
        columns,
        rows,
    }
}

fn column_slot(columns: &mut Vec<String>, metric: &str) -> usize {
    if let Some(idx) = columns.iter().position(|c| c == metric) {
        return idx;
    }
    columns.push(metric.to_string());
    columns.len() - 1
}
