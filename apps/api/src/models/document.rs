use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Printed in place of any student field that is blank or not prefilled.
pub const FIELD_PLACEHOLDER: &str = "______________________";

pub const DEFAULT_EXAM_HEADER: &str = "Kenya Certificate of Secondary Examinations";

fn default_header() -> String {
    DEFAULT_EXAM_HEADER.to_string()
}

fn default_true() -> bool {
    true
}

/// Everything printed on a top page that is shared by every student in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default)]
    pub school_name: String,
    pub subject: String,
    pub form_level: String,
    pub term: String,
    pub exam_name: String,
    pub exam_date: NaiveDate,
    pub duration: String,
    #[serde(default)]
    pub paper_code: Option<String>,
    #[serde(default = "default_true")]
    pub include_exam_number: bool,
    #[serde(default = "default_true")]
    pub include_marking_table: bool,
    #[serde(default)]
    pub prefill_student_fields: bool,
    /// Pre-encoded JPEG; only set by in-process callers.
    #[serde(skip)]
    pub logo: Option<Logo>,
}

impl DocumentSpec {
    /// Date line as printed on the page, e.g. `07 March 2025`.
    pub fn formatted_date(&self) -> String {
        self.exam_date.format("%d %B %Y").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Logo {
    pub jpeg: Bytes,
    pub width_px: u32,
    pub height_px: u32,
}

/// Per-student identification fields. Missing values print as [`FIELD_PLACEHOLDER`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admission_number: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub exam_number: Option<String>,
}

impl StudentRecord {
    pub fn name_or_placeholder(&self) -> &str {
        present(&self.name).unwrap_or(FIELD_PLACEHOLDER)
    }

    pub fn admission_or_placeholder(&self) -> &str {
        present(&self.admission_number).unwrap_or(FIELD_PLACEHOLDER)
    }

    pub fn stream_or_placeholder(&self) -> &str {
        present(&self.stream).unwrap_or(FIELD_PLACEHOLDER)
    }

    pub fn exam_number_or_placeholder(&self) -> &str {
        present(&self.exam_number).unwrap_or(FIELD_PLACEHOLDER)
    }
}

/// Returns the trimmed value, treating empty and whitespace-only strings as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Ordered instruction lines, one logical instruction per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionBlock {
    pub lines: Vec<String>,
}

impl InstructionBlock {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Splits free-form text into instructions: one per non-empty trimmed line.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
