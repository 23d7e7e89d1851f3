// src/services/export.rs

use super::leaderboard::StudentResult;

pub const CSV_HEADER: &str = "Name,Correct,Total,Percentage,Score,Average time (s)";

/// Renders ranked results as CSV, one line per student after the header.
pub fn to_csv(results: &[StudentResult]) -> String {
    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for r in results {
        lines.push(format!(
            "{},{},{},{}%,{},{}s",
            escape_field(&r.student_name),
            r.correct,
            r.total,
            r.percentage,
            r.score,
            r.avg_time
        ));
    }
    lines.join("\n")
}

/// Quotes a field when it holds a delimiter, quote or line break (RFC 4180).
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn file_name(room_code: &str) -> String {
    format!("results-{}.csv", room_code)
}
