//! Output file names for rendered documents.

use crate::models::document::present;
use crate::models::StudentRecord;

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `{name}_{admission}` for a student; falls back to `student_{n}` when both are blank.
pub fn student_file_stem(student: &StudentRecord, position: usize) -> String {
    let parts: Vec<&str> = [present(&student.name), present(&student.admission_number)]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        return format!("student_{position}");
    }
    sanitize_file_stem(&parts.join("_"))
}

/// `{subject}_Page_{n}` for blank copies.
pub fn blank_file_stem(subject: &str, position: usize) -> String {
    sanitize_file_stem(&format!("{subject}_Page_{position}"))
}
