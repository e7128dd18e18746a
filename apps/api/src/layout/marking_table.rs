//! Marking-table geometry for both table styles.
//!
//! Tables are planned first (validated, widths and heights resolved) and drawn second,
//! so a bad table is rejected before anything reaches the page.

use serde::Serialize;
use tracing::warn;

use crate::layout::error::{DiagnosticCode, LayoutDiagnostic, LayoutError};
use crate::layout::font_metrics::FontFace;
use crate::layout::page::{Page, PageConfig};
use crate::models::marking::is_total_row;
use crate::models::{GridTable, MarkingTableSpec, SectionedTable};

pub const EXAMINER_LABEL: &str = "For Examiner's Use Only";
pub const SECTION_TITLES: [&str; 2] = ["SECTION I", "SECTION II"];
pub const SECTION_TOTAL_LABEL: &str = "TOTAL";
/// Smallest section font size a scaled table may print at.
pub const MIN_SECTION_FONT_SIZE: f32 = 6.0;

// ────────────────────────────────────────────────────────────────────────────
// Plans
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionPlan {
    pub title: &'static str,
    /// Number printed over the first question cell.
    pub first_question: u32,
    /// One width per question cell followed by the section-total cell.
    pub widths: Vec<f32>,
}

impl SectionPlan {
    pub fn width(&self) -> f32 {
        self.widths.iter().sum()
    }

    pub fn question_labels(&self) -> Vec<String> {
        let questions = self.widths.len().saturating_sub(1) as u32;
        (0..questions)
            .map_while(|i| self.first_question.checked_add(i))
            .map(|q| q.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionedPlan {
    pub sections: Vec<SectionPlan>,
    pub row_height: f32,
    pub section_gap: f32,
    pub font_size: f32,
    /// Width of the grand-total box beside the last section, when requested.
    pub grand_total_width: Option<f32>,
    pub grand_total_gap: f32,
}

impl SectionedPlan {
    pub fn height(&self) -> f32 {
        let n = self.sections.len() as f32;
        n * 3.0 * self.row_height + (n - 1.0).max(0.0) * self.section_gap
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPlan {
    pub header: Vec<String>,
    /// Data rows, padded to the column count.
    pub rows: Vec<Vec<String>>,
    pub widths: Vec<f32>,
    /// Header row height first, then one per data row.
    pub heights: Vec<f32>,
    pub font_size: f32,
    pub padding_x: f32,
}

impl GridPlan {
    pub fn height(&self) -> f32 {
        self.heights.iter().sum()
    }

    pub fn width(&self) -> f32 {
        self.widths.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum TablePlan {
    Sectioned(SectionedPlan),
    Grid(GridPlan),
}

impl TablePlan {
    pub fn height(&self) -> f32 {
        match self {
            TablePlan::Sectioned(plan) => plan.height(),
            TablePlan::Grid(plan) => plan.height(),
        }
    }

    /// Draws the table with its top-left corner at `(x, top)`.
    pub fn draw(&self, page: &mut Page, x: f32, top: f32) {
        match self {
            TablePlan::Sectioned(plan) => draw_sectioned(page, plan, x, top),
            TablePlan::Grid(plan) => draw_grid(page, plan, x, top),
        }
    }
}

/// Result of planning: `None` when the table has nothing to draw.
#[derive(Debug)]
pub struct PlannedTable {
    pub plan: Option<TablePlan>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

pub fn plan_table(spec: &MarkingTableSpec, config: &PageConfig) -> Result<PlannedTable, LayoutError> {
    match spec {
        MarkingTableSpec::Sectioned(table) => Ok(PlannedTable {
            plan: Some(TablePlan::Sectioned(plan_sectioned(table, config)?)),
            diagnostics: Vec::new(),
        }),
        MarkingTableSpec::Grid(table) => plan_grid(table, config),
    }
}

/// Width of one section row without allocating its cells.
pub fn section_width(questions: u32, scale: f32, config: &PageConfig) -> f32 {
    (questions as f32 * config.question_cell_width + config.total_cell_width) * scale
}

/// `[question_cell_width] * questions + [total_cell_width]`, scaled uniformly.
/// Only call with a question count that has passed the width check.
pub fn section_column_widths(questions: u32, scale: f32, config: &PageConfig) -> Vec<f32> {
    let mut widths = vec![config.question_cell_width * scale; questions as usize];
    widths.push(config.total_cell_width * scale);
    widths
}

pub fn plan_sectioned(table: &SectionedTable, config: &PageConfig) -> Result<SectionedPlan, LayoutError> {
    if table.section_1_questions == 0 {
        return Err(LayoutError::InvalidTable(
            "section I needs at least one question".to_string(),
        ));
    }
    if !(table.scale.is_finite() && table.scale > 0.0) {
        return Err(LayoutError::InvalidTable(format!(
            "scale must be a positive number, got {}",
            table.scale
        )));
    }
    let scale = table.scale;
    if config.section_font_size * scale < MIN_SECTION_FONT_SIZE {
        return Err(LayoutError::InvalidTable(format!(
            "scale {scale} prints section text below {MIN_SECTION_FONT_SIZE}pt"
        )));
    }

    // checked before any cell is allocated
    let grand_total = if table.grand_total {
        config.grand_total_gap + config.grand_total_width * scale
    } else {
        0.0
    };
    let width_1 = section_width(table.section_1_questions, scale, config);
    let required = if table.section_2_questions > 0 {
        width_1.max(section_width(table.section_2_questions, scale, config) + grand_total)
    } else {
        width_1 + grand_total
    };
    check_width(required, config)?;

    let mut sections = vec![SectionPlan {
        title: SECTION_TITLES[0],
        first_question: 1,
        widths: section_column_widths(table.section_1_questions, scale, config),
    }];
    if table.section_2_questions > 0 {
        let first_question = table.section_1_questions.checked_add(1).ok_or_else(|| {
            LayoutError::InvalidTable("too many questions in section I".to_string())
        })?;
        sections.push(SectionPlan {
            title: SECTION_TITLES[1],
            first_question,
            widths: section_column_widths(table.section_2_questions, scale, config),
        });
    }

    Ok(SectionedPlan {
        sections,
        row_height: config.section_row_height * scale,
        section_gap: config.section_gap,
        font_size: config.section_font_size * scale,
        grand_total_width: table.grand_total.then(|| config.grand_total_width * scale),
        grand_total_gap: config.grand_total_gap,
    })
}

pub fn plan_grid(table: &GridTable, config: &PageConfig) -> Result<PlannedTable, LayoutError> {
    let mut diagnostics = Vec::new();

    if table.rows.is_empty() {
        warn!("Marking table enabled but has no rows; skipping table");
        diagnostics.push(LayoutDiagnostic::warning(
            DiagnosticCode::EmptyTable,
            "marking table has no rows; table skipped",
        ));
        return Ok(PlannedTable {
            plan: None,
            diagnostics,
        });
    }

    let header = table.header();
    let columns = header.len();
    if columns == 0 {
        return Err(LayoutError::InvalidTable(
            "grid table needs at least one column".to_string(),
        ));
    }

    let widths = match &table.column_widths {
        Some(widths) if widths.len() != columns => {
            return Err(LayoutError::InvalidTable(format!(
                "{} column widths given for {columns} columns",
                widths.len()
            )));
        }
        Some(widths) => widths.clone(),
        None => vec![config.usable_width() / columns as f32; columns],
    };
    if widths.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
        return Err(LayoutError::InvalidTable(
            "column widths must be positive".to_string(),
        ));
    }

    if !(table.row_height.is_finite() && table.row_height > 0.0) {
        return Err(LayoutError::InvalidTable(format!(
            "row height must be positive, got {}",
            table.row_height
        )));
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        if row.len() > columns {
            return Err(LayoutError::InvalidTable(format!(
                "row {} has {} cells but the table has {columns} columns",
                i + 1,
                row.len()
            )));
        }
        let mut padded = row.clone();
        padded.resize(columns, String::new());
        rows.push(padded);
    }

    let row_count = table.row_count();
    let heights = match &table.row_heights {
        Some(list) if list.len() == row_count => {
            if list.iter().any(|h| !(h.is_finite() && *h > 0.0)) {
                return Err(LayoutError::InvalidTable(
                    "row heights must be positive".to_string(),
                ));
            }
            list.clone()
        }
        Some(list) => {
            warn!(
                "Row height list has {} entries for {row_count} rows; using uniform {}pt",
                list.len(),
                table.row_height
            );
            diagnostics.push(LayoutDiagnostic::validation(
                DiagnosticCode::RowHeightMismatch,
                format!(
                    "{} row heights given for {row_count} rows (header included); \
                     using uniform height {}",
                    list.len(),
                    table.row_height
                ),
            ));
            vec![table.row_height; row_count]
        }
        None => vec![table.row_height; row_count],
    };

    let plan = GridPlan {
        header,
        rows,
        widths,
        heights,
        font_size: config.table_font_size,
        padding_x: config.cell_padding_x,
    };
    check_width(plan.width(), config)?;

    Ok(PlannedTable {
        plan: Some(TablePlan::Grid(plan)),
        diagnostics,
    })
}

fn check_width(required: f32, config: &PageConfig) -> Result<(), LayoutError> {
    let available = config.usable_width();
    // tolerate rounding from evenly split default widths
    if required > available + 1e-3 {
        return Err(LayoutError::TableTooWide {
            required,
            available,
        });
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Drawing
// ────────────────────────────────────────────────────────────────────────────

/// Baseline offset that vertically centres text of `size` in a row of `height`.
fn baseline_in_row(height: f32, size: f32) -> f32 {
    ((height - size * 0.7) / 2.0).max(1.0)
}

fn draw_sectioned(page: &mut Page, plan: &SectionedPlan, x: f32, top: f32) {
    let rh = plan.row_height;
    let size = plan.font_size;
    let text_dy = baseline_in_row(rh, size);
    let last = plan.sections.len().saturating_sub(1);
    let mut section_top = top;

    for (index, section) in plan.sections.iter().enumerate() {
        let width = section.width();

        // title row spans the whole section
        page.rect(x, section_top - rh, width, rh);
        page.centered_text(x + width / 2.0, section_top - rh + text_dy, section.title, FontFace::Bold, size);

        let labels = section.question_labels();
        let mut cx = x;
        for (i, cell_w) in section.widths.iter().enumerate() {
            let label = labels.get(i).map(String::as_str).unwrap_or(SECTION_TOTAL_LABEL);
            let face = if i < labels.len() { FontFace::Regular } else { FontFace::Bold };
            page.rect(cx, section_top - 2.0 * rh, *cell_w, rh);
            page.centered_text(cx + cell_w / 2.0, section_top - 2.0 * rh + text_dy, label, face, size);
            page.rect(cx, section_top - 3.0 * rh, *cell_w, rh);
            cx += cell_w;
        }

        if let (Some(gw), true) = (plan.grand_total_width, index == last) {
            let gx = x + width + plan.grand_total_gap;
            let center = gx + gw / 2.0;
            page.rect(gx, section_top - 2.0 * rh, gw, 2.0 * rh);
            page.centered_text(center, section_top - rh + text_dy, "GRAND", FontFace::Bold, size);
            page.centered_text(center, section_top - 2.0 * rh + text_dy, "TOTAL", FontFace::Bold, size);
            page.rect(gx, section_top - 3.0 * rh, gw, rh);
        }

        section_top -= 3.0 * rh + plan.section_gap;
    }
}

fn draw_grid(page: &mut Page, plan: &GridPlan, x: f32, top: f32) {
    let size = plan.font_size;
    let mut row_top = top;

    let all_rows = std::iter::once(&plan.header).chain(plan.rows.iter());
    for (r, (row, height)) in all_rows.zip(plan.heights.iter()).enumerate() {
        let bottom = row_top - height;
        let text_y = bottom + baseline_in_row(*height, size);
        let total = r > 0 && is_total_row(row);
        let face = if r == 0 || total { FontFace::Bold } else { FontFace::Regular };

        let mut col = 0;
        let mut cx = x;
        if total && plan.widths.len() >= 2 {
            let merged = plan.widths[0] + plan.widths[1];
            page.rect(cx, bottom, merged, *height);
            page.text(cx + plan.padding_x, text_y, row[0].as_str(), face, size);
            cx += merged;
            col = 2;
        }
        for (cell, w) in row.iter().zip(plan.widths.iter()).skip(col) {
            page.rect(cx, bottom, *w, *height);
            if !cell.is_empty() {
                page.text(cx + plan.padding_x, text_y, cell.as_str(), face, size);
            }
            cx += w;
        }

        row_top = bottom;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::default_page_config;

    fn grid(rows: &[&[&str]]) -> GridTable {
        GridTable {
            columns: None,
            column_widths: Some(vec![80.0, 120.0, 120.0, 150.0]),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            row_height: 25.0,
            row_heights: None,
        }
    }

    fn draw(plan: &TablePlan) -> Page {
        let config = default_page_config();
        let mut page = Page::new(&config);
        plan.draw(&mut page, config.left_margin, 500.0);
        page
    }

    // ── sectioned ───────────────────────────────────────────────────────────

    #[test]
    fn test_section_widths_match_cell_constants() {
        let config = default_page_config();
        let mut expected_1 = vec![20.0_f32; 16];
        expected_1.push(30.0);
        let mut expected_2 = vec![20.0_f32; 8];
        expected_2.push(30.0);
        assert_eq!(section_column_widths(16, 1.0, &config), expected_1);
        assert_eq!(section_column_widths(8, 1.0, &config), expected_2);
    }

    #[test]
    fn test_section_widths_scale_uniformly() {
        let config = default_page_config();
        let widths = section_column_widths(4, 1.5, &config);
        assert_eq!(widths, vec![30.0, 30.0, 30.0, 30.0, 45.0]);
    }

    #[test]
    fn test_section_two_numbering_continues() {
        let config = default_page_config();
        let plan = plan_sectioned(&SectionedTable::default(), &config).unwrap();
        assert_eq!(plan.sections.len(), 2);
        let labels = plan.sections[1].question_labels();
        assert_eq!(labels.first().map(String::as_str), Some("17"));
        assert_eq!(labels.last().map(String::as_str), Some("24"));
        assert_eq!(labels.len(), 8);
    }

    #[test]
    fn test_grand_total_sits_right_of_section_two_top_aligned() {
        let config = default_page_config();
        let plan = plan_sectioned(&SectionedTable::default(), &config).unwrap();
        let page = draw(&TablePlan::Sectioned(plan.clone()));

        let sec2_top = 500.0 - 3.0 * plan.row_height - plan.section_gap;
        let sec2_right = config.left_margin + plan.sections[1].width();
        let gx = sec2_right + config.grand_total_gap;

        let boxes: Vec<_> = page
            .rects()
            .filter(|(x, y, _, h)| (*x - gx).abs() < 1e-3 && y + h <= sec2_top + 1e-3)
            .collect();
        assert_eq!(boxes.len(), 2, "label box and score box");
        let label_box_top = boxes.iter().map(|(_, y, _, h)| y + h).fold(f32::MIN, f32::max);
        assert!((label_box_top - sec2_top).abs() < 1e-3);
        assert!(boxes.iter().all(|(_, _, w, _)| (*w - 60.0).abs() < 1e-3));
    }

    #[test]
    fn test_single_section_when_section_two_is_empty() {
        let config = default_page_config();
        let table = SectionedTable {
            section_2_questions: 0,
            ..SectionedTable::default()
        };
        let plan = plan_sectioned(&table, &config).unwrap();
        assert_eq!(plan.sections.len(), 1);
        assert!((plan.height() - 3.0 * plan.row_height).abs() < 1e-4);
    }

    #[test]
    fn test_sectioned_rejects_zero_questions_and_bad_scale() {
        let config = default_page_config();
        let empty = SectionedTable {
            section_1_questions: 0,
            ..SectionedTable::default()
        };
        assert!(matches!(plan_sectioned(&empty, &config), Err(LayoutError::InvalidTable(_))));

        let negative = SectionedTable {
            scale: -1.0,
            ..SectionedTable::default()
        };
        assert!(matches!(plan_sectioned(&negative, &config), Err(LayoutError::InvalidTable(_))));
    }

    #[test]
    fn test_huge_question_count_is_too_wide_not_allocated() {
        let config = default_page_config();
        for table in [
            SectionedTable {
                section_1_questions: u32::MAX,
                ..SectionedTable::default()
            },
            SectionedTable {
                section_1_questions: 4,
                section_2_questions: u32::MAX,
                ..SectionedTable::default()
            },
        ] {
            assert!(matches!(
                plan_sectioned(&table, &config),
                Err(LayoutError::TableTooWide { .. })
            ));
        }
    }

    #[test]
    fn test_tiny_scale_is_rejected_as_illegible() {
        let config = default_page_config();
        let table = SectionedTable {
            section_1_questions: 2_000_000,
            scale: 1e-5,
            ..SectionedTable::default()
        };
        assert!(matches!(plan_sectioned(&table, &config), Err(LayoutError::InvalidTable(_))));

        let smallest = SectionedTable {
            scale: MIN_SECTION_FONT_SIZE / config.section_font_size,
            ..SectionedTable::default()
        };
        assert!(plan_sectioned(&smallest, &config).is_ok());
    }

    #[test]
    fn test_labels_stop_at_u32_max() {
        let section = SectionPlan {
            title: SECTION_TITLES[1],
            first_question: u32::MAX - 1,
            widths: vec![20.0, 20.0, 20.0, 30.0],
        };
        assert_eq!(section.question_labels(), vec![(u32::MAX - 1).to_string(), u32::MAX.to_string()]);
    }

    #[test]
    fn test_sectioned_too_wide_is_rejected() {
        let config = default_page_config();
        let table = SectionedTable {
            section_1_questions: 30,
            ..SectionedTable::default()
        };
        assert!(matches!(
            plan_sectioned(&table, &config),
            Err(LayoutError::TableTooWide { .. })
        ));
    }

    // ── grid ────────────────────────────────────────────────────────────────

    #[test]
    fn test_total_score_row_merges_first_two_columns() {
        let config = default_page_config();
        let planned = plan_grid(&grid(&[&["A", "1 – 11", "25", ""], &["total score", "", "80", ""]]), &config).unwrap();
        let page = draw(planned.plan.as_ref().unwrap());

        let merged: Vec<_> = page.rects().filter(|(_, _, w, _)| (*w - 200.0).abs() < 1e-3).collect();
        assert_eq!(merged.len(), 1);
        // header (4) + data row (4) + total row (merged + 2)
        assert_eq!(page.rects().count(), 11);
    }

    #[test]
    fn test_other_rows_never_merge() {
        let config = default_page_config();
        let planned = plan_grid(
            &grid(&[&["TOTAL", "", "80", ""], &["", "TOTAL SCORE", "80", ""], &["B", "12", "11", ""]]),
            &config,
        )
        .unwrap();
        let page = draw(planned.plan.as_ref().unwrap());
        assert_eq!(page.rects().filter(|(_, _, w, _)| (*w - 200.0).abs() < 1e-3).count(), 0);
        assert_eq!(page.rects().count(), 16);
    }

    #[test]
    fn test_empty_grid_warns_and_skips() {
        let config = default_page_config();
        let planned = plan_grid(&grid(&[]), &config).unwrap();
        assert!(planned.plan.is_none());
        assert_eq!(planned.diagnostics.len(), 1);
        assert_eq!(planned.diagnostics[0].code, DiagnosticCode::EmptyTable);
    }

    #[test]
    fn test_row_height_mismatch_falls_back_to_uniform() {
        let config = default_page_config();
        let row: &[&str] = &["A", "1", "10", ""];
        let rows = vec![row; 7];
        let mut table = grid(&rows);
        table.row_heights = Some(vec![30.0; 5]);
        let planned = plan_grid(&table, &config).unwrap();

        assert_eq!(planned.diagnostics.len(), 1);
        assert_eq!(planned.diagnostics[0].code, DiagnosticCode::RowHeightMismatch);
        match planned.plan {
            Some(TablePlan::Grid(plan)) => assert_eq!(plan.heights, vec![25.0; 8]),
            other => panic!("expected grid plan, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_row_heights_are_used() {
        let config = default_page_config();
        let mut table = grid(&[&["A", "1", "10", ""]]);
        table.row_heights = Some(vec![30.0, 40.0]);
        let planned = plan_grid(&table, &config).unwrap();
        assert!(planned.diagnostics.is_empty());
        assert!((planned.plan.unwrap().height() - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_rejected() {
        let config = default_page_config();
        let planned = plan_grid(&grid(&[&["A"]]), &config).unwrap();
        match planned.plan {
            Some(TablePlan::Grid(plan)) => assert_eq!(plan.rows[0].len(), 4),
            other => panic!("expected grid plan, got {other:?}"),
        }

        let err = plan_grid(&grid(&[&["A", "1", "2", "3", "4"]]), &config).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidTable(_)));
    }

    #[test]
    fn test_grid_wider_than_page_is_rejected() {
        let config = default_page_config();
        let mut table = grid(&[&["A", "1", "10", ""]]);
        table.column_widths = Some(vec![200.0, 200.0, 200.0, 200.0]);
        assert!(matches!(
            plan_grid(&table, &config),
            Err(LayoutError::TableTooWide { .. })
        ));
    }

    #[test]
    fn test_default_widths_split_usable_width() {
        let config = default_page_config();
        let mut table = grid(&[&["x", "y"]]);
        table.columns = Some(vec!["Q".to_string(), "SCORE".to_string()]);
        table.column_widths = None;
        match plan_grid(&table, &config).unwrap().plan {
            Some(TablePlan::Grid(plan)) => {
                assert!((plan.width() - config.usable_width()).abs() < 1e-3);
            }
            other => panic!("expected grid plan, got {other:?}"),
        }
    }
}
