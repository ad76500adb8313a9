//! Report fetching
//!
//! A report is run with its column and label configuration overridden on the
//! command line so that the output is predictable: a long uuid column and a short
//! status column are prepended with reserved labels, colour and pagination are
//! off, columns are separated by exactly one space and word hyphenation is
//! disabled.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Column, Report};
use crate::error::FetchError;
use crate::process::{CommandRunner, Invocation};
use crate::sanitize::{sanitize, sanitize_arguments, sanitize_single_argument};
use crate::schema::SchemaResolver;
use crate::table::parse_report;

/// Reserved header label of the uuid column
pub const UUID_LABEL: &str = "_tw_uuid";

/// Reserved header label of the status column
pub const STATUS_LABEL: &str = "_tw_status";

/// Report names are configuration keys and reach the shell unescaped inside the
/// overrides, so only `[A-Za-z0-9_.-]+` is accepted
pub fn is_valid_report_name(report: &str) -> bool {
    !report.is_empty()
        && report
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Configuration overrides that force the parseable layout for `report`
pub fn report_overrides(report: &str, columns: &[Column]) -> Vec<String> {
    let kinds: Vec<&str> = ["uuid.long", "status.short"]
        .into_iter()
        .chain(columns.iter().map(|c| c.kind.as_str()))
        .collect();
    let labels: Vec<&str> = [UUID_LABEL, STATUS_LABEL]
        .into_iter()
        .chain(columns.iter().map(|c| c.label.as_str()))
        .collect();

    vec![
        format!("rc.report.{}.columns:{}", report, kinds.join(",")),
        format!("rc.report.{}.labels:{}", report, labels.join(",")),
        "rc.verbose:label".to_string(),
        "rc.color:0".to_string(),
        "rc.defaultwidth:0".to_string(),
        "rc.defaultheight:0".to_string(),
        "rc.row.padding:0".to_string(),
        "rc.column.padding:1".to_string(),
        "rc.hyphenate:0".to_string(),
    ]
}

/// Command line for `report`: name, then the sanitized filter, then the overrides
pub fn report_command_line(report: &str, filter: Option<&str>, columns: &[Column]) -> String {
    let mut parts = vec![sanitize_single_argument(report)];
    if let Some(filter) = filter.map(sanitize).filter(|f| !f.is_empty()) {
        parts.push(filter);
    }
    parts.push(sanitize_arguments(&report_overrides(report, columns)));
    parts.join(" ")
}

/// Runs named reports and parses their output
pub struct ReportFetcher {
    runner: Arc<dyn CommandRunner>,
    schema: Arc<SchemaResolver>,
}

impl ReportFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>, schema: Arc<SchemaResolver>) -> Self {
        debug!("ReportFetcher::new: called");
        Self { runner, schema }
    }

    /// Fetch `report`, optionally narrowed by free-form filter text
    ///
    /// A report with no columns is returned empty without running it. A failed
    /// report invocation is read as "no matching tasks": the executable exits
    /// non-zero when nothing matches, and other failures are not told apart.
    pub async fn fetch_report(&self, report: &str, filter: Option<&str>) -> Result<Report, FetchError> {
        debug!(%report, has_filter = filter.is_some(), "ReportFetcher::fetch_report: called");
        if !is_valid_report_name(report) {
            return Err(FetchError::InvalidReportName(report.to_string()));
        }
        let columns = self.schema.resolve_columns(report).await?;
        if columns.is_empty() {
            debug!(%report, "ReportFetcher::fetch_report: report has no columns");
            return Ok(Report::default());
        }

        let invocation = Invocation::line(report_command_line(report, filter, &columns));
        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                warn!(%report, exit_code = ?e.exit_code(), "Report invocation failed, treating as no matches");
                return Ok(Report::empty(columns));
            }
        };

        Ok(parse_report(&output, &columns)?)
    }
}
