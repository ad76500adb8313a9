//! Plain-text rendering of parsed reports

use crate::domain::{Column, Report};

/// Characters of the uuid shown in the first column
pub const SHORT_UUID_LEN: usize = 8;

/// Render `report` as an aligned table, header line first
///
/// Multi-line cells (continuations joined with `"\n\t"`) spill onto extra rows
/// under their own column. Returns an empty string for a report with no tasks.
pub fn format_report(report: &Report) -> String {
    if report.tasks.is_empty() {
        return String::new();
    }

    let mut header = vec!["UUID".to_string(), "St".to_string()];
    header.extend(report.printed_columns.iter().map(|c| c.label.clone()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for task in &report.tasks {
        let mut cells: Vec<Vec<&str>> = vec![
            vec![short_uuid(&task.uuid)],
            vec![task.status.code()],
        ];
        cells.extend(
            task.data
                .iter()
                .map(|cell| cell.split('\n').map(|l| l.trim_start_matches('\t')).collect()),
        );

        let height = cells.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            rows.push(
                cells
                    .iter()
                    .map(|c| c.get(line).copied().unwrap_or_default().to_string())
                    .collect(),
            );
        }
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    std::iter::once(&header)
        .chain(rows.iter())
        .map(|row| format_row(row, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a schema as `type  label` lines
pub fn format_columns(columns: &[Column]) -> String {
    let width = columns.iter().map(|c| c.kind.chars().count()).max().unwrap_or(0);
    columns
        .iter()
        .map(|c| format!("{:<width$}  {}", c.kind, c.label, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_uuid(uuid: &str) -> &str {
    match uuid.char_indices().nth(SHORT_UUID_LEN) {
        Some((idx, _)) => &uuid[..idx],
        None => uuid,
    }
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    row.iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}
