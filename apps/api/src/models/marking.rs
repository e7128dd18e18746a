use serde::{Deserialize, Serialize};

/// First-cell text that marks the summary row of a grid table. Matched case-insensitively.
pub const TOTAL_SCORE_LABEL: &str = "TOTAL SCORE";

pub const DEFAULT_GRID_COLUMNS: [&str; 4] = [
    "SECTION",
    "QUESTION",
    "MAXIMUM SCORE",
    "CANDIDATE'S SCORE",
];

fn default_row_height() -> f32 {
    25.0
}

fn default_section_1() -> u32 {
    16
}

fn default_section_2() -> u32 {
    8
}

fn default_grand_total() -> bool {
    true
}

fn default_scale() -> f32 {
    1.0
}

/// The examiner score sheet printed at the bottom of a top page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum MarkingTableSpec {
    Grid(GridTable),
    Sectioned(SectionedTable),
}

/// Arbitrary rows × columns score sheet with a fixed header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridTable {
    /// Header row; [`DEFAULT_GRID_COLUMNS`] when absent.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Per-column widths in points; the usable width is split evenly when absent.
    #[serde(default)]
    pub column_widths: Option<Vec<f32>>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    /// One height per row including the header row.
    #[serde(default)]
    pub row_heights: Option<Vec<f32>>,
}

impl GridTable {
    pub fn header(&self) -> Vec<String> {
        match &self.columns {
            Some(columns) => columns.clone(),
            None => DEFAULT_GRID_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Header row plus data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }
}

/// Returns true when a grid row is the merged, bold summary row.
pub fn is_total_row(row: &[String]) -> bool {
    row.first()
        .is_some_and(|cell| cell.eq_ignore_ascii_case(TOTAL_SCORE_LABEL))
}

/// Two question ranges (Section I, Section II) with an optional grand-total box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionedTable {
    #[serde(default = "default_section_1")]
    pub section_1_questions: u32,
    #[serde(default = "default_section_2")]
    pub section_2_questions: u32,
    #[serde(default = "default_grand_total")]
    pub grand_total: bool,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for SectionedTable {
    fn default() -> Self {
        Self {
            section_1_questions: default_section_1(),
            section_2_questions: default_section_2(),
            grand_total: default_grand_total(),
            scale: default_scale(),
        }
    }
}
