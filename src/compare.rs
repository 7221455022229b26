use crate::normalize::StatTable;

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub bucket: String,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

/// Lines up one metric from two tables by bucket.
///
/// Buckets from `left` come first in its row order, then buckets only `right` has.
pub fn compare_metric(left: &StatTable, right: &StatTable, metric: &str) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = left
        .rows
        .iter()
        .map(|r| ComparisonRow {
            bucket: r.bucket.clone(),
            left: left.value(&r.bucket, metric),
            right: right.value(&r.bucket, metric),
        })
        .collect();

    for r in &right.rows {
        if left.row(&r.bucket).is_none() {
            rows.push(ComparisonRow {
                bucket: r.bucket.clone(),
                left: None,
                right: right.value(&r.bucket, metric),
            });
        }
    }
    rows
}

/// Metrics either table offers, left's order first.
pub fn shared_metrics(left: &StatTable, right: &StatTable) -> Vec<String> {
    let mut out = left.columns.clone();
    for c in &right.columns {
        if !out.contains(c) {
            out.push(c.clone());
        }
    }
    out
}

/// Largest absolute value across both sides; the chart scale.
pub fn comparison_max(rows: &[ComparisonRow]) -> f64 {
    rows.iter()
        .flat_map(|r| [r.left, r.right])
        .flatten()
        .map(f64::abs)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::normalize::StatRow;

    fn table(rows: &[(&str, f64)]) -> StatTable {
        StatTable {
            category: Category::GameState,
            columns: vec!["xG".to_string()],
            rows: rows
                .iter()
                .map(|(bucket, v)| StatRow {
                    bucket: bucket.to_string(),
                    values: vec![Some(*v)],
                })
                .collect(),
        }
    }

    #[test]
    fn right_only_buckets_follow_left_order() {
        let left = table(&[("Goal diff 0", 10.0), ("Goal diff +1", 4.0)]);
        let right = table(&[("Goal diff +1", 6.0), ("Goal diff -1", 2.5)]);
        let rows = compare_metric(&left, &right, "xG");

        let buckets: Vec<&str> = rows.iter().map(|r| r.bucket.as_str()).collect();
        assert_eq!(buckets, ["Goal diff 0", "Goal diff +1", "Goal diff -1"]);
        assert_eq!(rows[0].right, None);
        assert_eq!(rows[2].left, None);
        assert_eq!(comparison_max(&rows), 10.0);
    }

    #[test]
    fn unknown_metric_gives_empty_cells() {
        let left = table(&[("Goal diff 0", 1.0)]);
        let rows = compare_metric(&left, &left, "shots");
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].left, rows[0].right), (None, None));
        assert_eq!(comparison_max(&rows), 0.0);
    }
}
