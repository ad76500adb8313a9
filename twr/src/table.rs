//! Parser for the executable's fixed-width report output
//!
//! The fetcher forces a layout of the form
//!
//! ```text
//! _tw_uuid                             _tw_status Description      Due
//! ------------------------------------ ---------- ---------------- ----------
//! 5f1c7a1e-3d2b-4c8e-9a61-0b7d2e4f9c10 P          Pay the electric 2024-01-01
//!                                                 bill
//! ```
//!
//! Every space in the ruler (second line) is a cut point. All lines, including
//! the label line, are sliced at the same positions, so cells may contain spaces.
//! A row whose uuid cell is blank continues the previous task: its non-empty
//! cells are appended to the matching data cells after `"\n\t"`.

use tracing::debug;

use crate::domain::{Column, Report, Task, TaskStatus};
use crate::error::ParseError;

/// Number of synthetic columns (uuid, status) ahead of the report's own columns
pub const IDENTITY_COLUMNS: usize = 2;

/// Character positions of every space in `ruler`, followed by its length
pub fn cut_points(ruler: &str) -> Vec<usize> {
    let mut cuts: Vec<usize> = ruler
        .chars()
        .enumerate()
        .filter_map(|(i, c)| (c == ' ').then_some(i))
        .collect();
    cuts.push(ruler.chars().count());
    cuts
}

/// Slice `line` at the character positions in `cuts`
///
/// Yields exactly `cuts.len()` cells: `[0, c0)`, `[c0, c1)`, ... The last cell
/// runs to the end of the line so overlong trailing text is not lost. Positions
/// past the end of a short line produce empty cells.
pub fn slice_cells(line: &str, cuts: &[usize]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut cells = Vec::with_capacity(cuts.len());
    let mut start = 0;

    for (i, &cut) in cuts.iter().enumerate() {
        let end = if i + 1 == cuts.len() { chars.len().max(cut) } else { cut };
        let from = start.min(chars.len());
        let to = end.min(chars.len());
        cells.push(chars[from..to.max(from)].iter().collect());
        start = cut;
    }

    cells
}

/// Parse report output against the resolved schema of the report
pub fn parse_report(output: &str, columns: &[Column]) -> Result<Report, ParseError> {
    debug!(bytes = output.len(), columns = columns.len(), "parse_report: called");
    let mut lines = output
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, label_line) = lines.next().ok_or(ParseError::MissingHeader)?;
    let (_, ruler) = lines.next().ok_or(ParseError::MissingHeader)?;

    let cuts = cut_points(ruler);
    if cuts.len() < IDENTITY_COLUMNS {
        return Err(ParseError::MissingIdentityColumns { cells: cuts.len() });
    }

    let printed_columns = slice_cells(label_line, &cuts)
        .iter()
        .skip(IDENTITY_COLUMNS)
        .map(|label| lookup_column(columns, label.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(printed = printed_columns.len(), "parse_report: resolved printed columns");

    let mut tasks: Vec<Task> = Vec::new();

    for (idx, line) in lines {
        let line_no = idx + 1;
        let mut cells = slice_cells(line, &cuts).into_iter();
        let uuid = cells.next().unwrap_or_default().trim().to_string();
        let status = cells.next().unwrap_or_default();
        let data = cells.map(|c| c.trim().to_string());

        if uuid.is_empty() {
            let prev = tasks
                .last_mut()
                .ok_or(ParseError::OrphanContinuation { line: line_no })?;
            if !status.trim().is_empty() {
                return Err(ParseError::StatusOnContinuation { line: line_no });
            }
            for (cell, extra) in prev.data.iter_mut().zip(data) {
                if !extra.is_empty() {
                    cell.push_str("\n\t");
                    cell.push_str(&extra);
                }
            }
            continue;
        }

        let code = status.trim();
        let status = TaskStatus::from_code(code).ok_or_else(|| ParseError::UnknownStatus {
            uuid: uuid.clone(),
            code: code.to_string(),
        })?;

        tasks.push(Task {
            uuid,
            status,
            data: data.collect(),
        });
    }

    debug!(tasks = tasks.len(), "parse_report: parsed");
    Ok(Report {
        columns: columns.to_vec(),
        tasks,
        printed_columns,
    })
}

fn lookup_column(columns: &[Column], label: &str) -> Result<Column, ParseError> {
    let mut matches = columns.iter().filter(|c| c.label == label);
    match (matches.next(), matches.next()) {
        (Some(column), None) => Ok(column.clone()),
        (Some(_), Some(_)) => Err(ParseError::AmbiguousLabel(label.to_string())),
        (None, _) => Err(ParseError::UnknownLabel(label.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("description", "Description"),
            Column::new("due", "Due"),
        ]
    }

    #[test]
    fn test_cut_points() {
        assert_eq!(cut_points("--- -- ----"), vec![3, 6, 11]);
        assert_eq!(cut_points("----"), vec![4]);
        assert_eq!(cut_points(""), vec![0]);
    }

    #[test]
    fn test_slice_cells_short_and_long_lines() {
        let cuts = cut_points("--- -- ----");
        assert_eq!(slice_cells("abc de fghi", &cuts), vec!["abc", " de", " fghi"]);
        assert_eq!(slice_cells("ab", &cuts), vec!["ab", "", ""]);
        assert_eq!(slice_cells("abc de fghijkl", &cuts), vec!["abc", " de", " fghijkl"]);
        assert_eq!(slice_cells("", &cuts), vec!["", "", ""]);
    }

    #[test]
    fn test_slice_cells_counts_characters_not_bytes() {
        let cuts = cut_points("-- ---");
        assert_eq!(slice_cells("ab écrú", &cuts), vec!["ab", " écrú"]);
        assert_eq!(slice_cells("éé ü", &cuts), vec!["éé", " ü"]);
    }

    #[test]
    fn test_single_task() {
        let output = "\
_tw_uuid _tw_status Description Due
-------- ---------- ----------- ----------
11111111 P          Buy milk    2024-01-01
";
        let report = parse_report(output, &schema()).unwrap();

        assert_eq!(report.columns, schema());
        assert_eq!(
            report.printed_columns,
            vec![Column::new("description", "Description"), Column::new("due", "Due")]
        );
        assert_eq!(
            report.tasks,
            vec![Task {
                uuid: "11111111".to_string(),
                status: TaskStatus::Pending,
                data: vec!["Buy milk".to_string(), "2024-01-01".to_string()],
            }]
        );
    }

    #[test]
    fn test_printed_columns_follow_header_order_not_schema_order() {
        let output = "\
_tw_uuid _tw_status Due        Description
-------- ---------- ---------- -----------
22222222 C          2024-02-02 Walk dog
";
        let report = parse_report(output, &schema()).unwrap();
        assert_eq!(
            report.printed_columns,
            vec![Column::new("due", "Due"), Column::new("description", "Description")]
        );
        assert_eq!(report.tasks[0].status, TaskStatus::Completed);
        assert_eq!(report.tasks[0].data, vec!["2024-02-02", "Walk dog"]);
    }

    #[test]
    fn test_continuation_lines_merge_into_previous_task() {
        let output = "\
_tw_uuid _tw_status Description Due
-------- ---------- ----------- ----------
11111111 P          Pay the     2024-01-01
                    electric
                    bill
22222222 W          Call mom
";
        let report = parse_report(output, &schema()).unwrap();
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].data[0], "Pay the\n\telectric\n\tbill");
        assert_eq!(report.tasks[0].data[1], "2024-01-01");
        assert_eq!(report.tasks[1].status, TaskStatus::Waiting);
        assert_eq!(report.tasks[1].data, vec!["Call mom", ""]);
    }

    #[test]
    fn test_continuation_appends_more_text_to_matching_cell() {
        let output = "\
_tw_uuid _tw_status Description Due
-------- ---------- ----------- ---------
33333333 P          Original    tomorrow
                                more text
";
        let report = parse_report(output, &schema()).unwrap();
        assert_eq!(report.tasks[0].data, vec!["Original", "tomorrow\n\tmore text"]);
    }

    #[test]
    fn test_header_only_output_has_no_tasks() {
        let output = "_tw_uuid _tw_status ID\n-------- ---------- --\n";
        let report = parse_report(output, &schema()).unwrap();
        assert!(report.tasks.is_empty());
        assert_eq!(report.printed_columns, vec![Column::new("id", "ID")]);
    }

    #[test]
    fn test_crlf_and_blank_lines_are_tolerated() {
        let output = "_tw_uuid _tw_status ID\r\n-------- ---------- --\r\n\r\n44444444 R          12\r\n\r\n";
        let report = parse_report(output, &schema()).unwrap();
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].status, TaskStatus::Recurring);
        assert_eq!(report.tasks[0].data, vec!["12"]);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse_report("", &schema()), Err(ParseError::MissingHeader)));
        assert!(matches!(
            parse_report("_tw_uuid _tw_status\n", &schema()),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn test_ruler_without_identity_columns() {
        let err = parse_report("_tw_uuid\n--------\n", &schema()).unwrap_err();
        assert!(matches!(err, ParseError::MissingIdentityColumns { cells: 1 }));
    }

    #[test]
    fn test_unknown_label_is_a_fault() {
        let output = "_tw_uuid _tw_status Urgency\n-------- ---------- -------\n";
        let err = parse_report(output, &schema()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownLabel(ref l) if l == "Urgency"));
    }

    #[test]
    fn test_ambiguous_label() {
        let columns = vec![Column::new("due", "When"), Column::new("scheduled", "When")];
        let output = "_tw_uuid _tw_status When\n-------- ---------- ----\n";
        let err = parse_report(output, &columns).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousLabel(_)));
    }

    #[test]
    fn test_orphan_continuation() {
        let output = "\
_tw_uuid _tw_status ID
-------- ---------- --
                    12
";
        let err = parse_report(output, &schema()).unwrap_err();
        assert!(matches!(err, ParseError::OrphanContinuation { line: 3 }));
    }

    #[test]
    fn test_continuation_with_status_is_misaligned() {
        let output = "\
_tw_uuid _tw_status Description
-------- ---------- -----------
11111111 P          Pay the
         P          bill
";
        let err = parse_report(output, &schema()).unwrap_err();
        assert!(matches!(err, ParseError::StatusOnContinuation { line: 4 }));
    }

    #[test]
    fn test_unknown_status() {
        let output = "\
_tw_uuid _tw_status ID
-------- ---------- --
55555555 X          1
";
        let err = parse_report(output, &schema()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownStatus { ref code, .. } if code == "X"));
    }

    proptest! {
        #[test]
        fn prop_every_line_yields_one_cell_per_column(
            widths in proptest::collection::vec(1usize..12, 0..6),
            line in "[ a-z0-9-]{0,80}",
        ) {
            let mut segments = vec!["-".repeat(8), "-".repeat(2)];
            segments.extend(widths.iter().map(|w| "-".repeat(*w)));
            let ruler = segments.join(" ");
            let cuts = cut_points(&ruler);
            prop_assert_eq!(cuts.len(), widths.len() + IDENTITY_COLUMNS);
            prop_assert_eq!(slice_cells(&line, &cuts).len(), widths.len() + IDENTITY_COLUMNS);
        }
    }
}
