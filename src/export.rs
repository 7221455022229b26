use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::normalize::StatTable;

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

pub struct ExportReport {
    pub sheets: usize,
    pub rows: usize,
}

/// Writes each `(sheet name, table)` pair to its own worksheet.
pub fn export_tables(path: &Path, sheets: &[(String, &StatTable)]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut rows = 0usize;

    for (name, table) in sheets {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(sheet_name(name))
            .with_context(|| format!("invalid sheet name {name}"))?;
        write_table(sheet, table)?;
        rows += table.rows.len();
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        sheets: sheets.len(),
        rows,
    })
}

pub fn sheet_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

fn write_table(worksheet: &mut Worksheet, table: &StatTable) -> Result<()> {
    worksheet
        .write_string(0, 0, table.category.label())
        .context("write header cell")?;
    for (col_idx, column) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, (col_idx + 1) as u16, column)
            .with_context(|| format!("write header ({col_idx})"))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        worksheet
            .write_string(r, 0, &row.bucket)
            .with_context(|| format!("write bucket ({row_idx})"))?;
        for (col_idx, value) in row.values.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            worksheet
                .write_number(r, (col_idx + 1) as u16, *value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
