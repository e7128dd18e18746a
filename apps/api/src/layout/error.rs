use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input that cannot be laid out. Raised before anything is drawn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(
        "instruction {index} needs {height:.1}pt but a page only has {usable:.1}pt of usable height"
    )]
    InstructionTooLarge { index: usize, height: f32, usable: f32 },

    #[error("marking table needs {required:.1}pt but only {available:.1}pt of width is usable")]
    TableTooWide { required: f32, available: f32 },

    #[error("marking table needs {required:.1}pt but a page only has {available:.1}pt of usable height")]
    TableTooTall { required: f32, available: f32 },

    #[error("invalid marking table: {0}")]
    InvalidTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    ValidationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Marking table requested but it has no data rows; table skipped.
    EmptyTable,
    /// Explicit row heights did not match the row count; uniform height used.
    RowHeightMismatch,
}

/// A non-fatal problem found while laying out a page. Rendering still completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDiagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
}

impl LayoutDiagnostic {
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn validation(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::ValidationError,
            code,
            message: message.into(),
        }
    }
}
