//! CSV export of the filtered job records
//!
//! Hand-rolled writer for spreadsheet analysis and machine parsing; the
//! column set is fixed, so no formatter state is needed.

use crate::record::JobRecord;

const HEADER: &[&str] = &[
    "JobID",
    "User",
    "Submit",
    "Start",
    "State",
    "Partition",
    "NNodes",
    "AllocTRES",
    "JobType",
    "WaitSeconds",
];

/// Quote a field when it carries a comma, quote, or newline
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format one record as a CSV row
fn format_record(record: &JobRecord) -> String {
    let fields = [
        escape_field(&record.job_id),
        escape_field(&record.user),
        record.submit.to_rfc3339(),
        record.start.to_rfc3339(),
        escape_field(&record.state),
        escape_field(&record.partition),
        record.nodes.map(|n| n.to_string()).unwrap_or_default(),
        escape_field(record.alloc_tres.as_deref().unwrap_or("")),
        record.job_type.as_str().to_string(),
        format!("{:.2}", record.wait_seconds),
    ];
    fields.join(",")
}

/// Render all records as a CSV document, header first
pub fn to_csv(records: &[JobRecord]) -> String {
    let mut output = String::new();
    output.push_str(&HEADER.join(","));
    output.push('\n');

    for record in records {
        output.push_str(&format_record(record));
        output.push('\n');
    }

    output
}
