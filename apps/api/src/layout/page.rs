//! Page geometry and the drawable page surface the engine produces.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner. The layout
//! cursor starts near the top edge and only moves down.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{get_metrics, FontFace};

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Fixed layout constants for one top page. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub left_margin: f32,
    pub right_margin: f32,

    pub school_font_size: f32,
    pub header_font_size: f32,
    pub header_line_step: f32,
    pub logo_size: f32,

    pub header_to_student_gap: f32,
    pub student_font_size: f32,
    pub student_line_step: f32,
    pub student_to_instructions_gap: f32,

    pub label_font_size: f32,
    pub label_to_instructions_gap: f32,
    pub instruction_font_size: f32,
    pub instruction_line_height: f32,
    pub instruction_indent: f32,
    pub instruction_gap: f32,

    pub instructions_to_examiner_gap: f32,
    pub examiner_label_to_table_gap: f32,
    pub table_font_size: f32,
    pub section_font_size: f32,
    pub cell_padding_x: f32,

    pub question_cell_width: f32,
    pub total_cell_width: f32,
    pub section_row_height: f32,
    pub section_gap: f32,
    pub grand_total_width: f32,
    pub grand_total_gap: f32,
}

impl PageConfig {
    /// Cursor position at the top of every page.
    pub fn top_y(&self) -> f32 {
        self.page_height - self.top_margin
    }

    /// Page height minus top and bottom margins.
    pub fn usable_height(&self) -> f32 {
        self.page_height - self.top_margin - self.bottom_margin
    }

    pub fn usable_width(&self) -> f32 {
        self.page_width - self.left_margin - self.right_margin
    }

    /// Width available to wrapped instruction text.
    pub fn instruction_width(&self) -> f32 {
        self.usable_width() - self.instruction_indent
    }

    pub fn center_x(&self) -> f32 {
        self.page_width / 2.0
    }
}

/// A4 portrait with the spacing used on printed KCSE-style top pages.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width: 595.28,
        page_height: 841.89,
        top_margin: 80.0,
        bottom_margin: 60.0,
        left_margin: 60.0,
        right_margin: 60.0,

        school_font_size: 14.0,
        header_font_size: 13.0,
        header_line_step: 20.0,
        logo_size: 60.0,

        header_to_student_gap: 40.0,
        student_font_size: 12.0,
        student_line_step: 20.0,
        student_to_instructions_gap: 20.0,

        label_font_size: 12.0,
        label_to_instructions_gap: 20.0,
        instruction_font_size: 11.0,
        instruction_line_height: 16.0,
        instruction_indent: 10.0,
        instruction_gap: 2.0,

        instructions_to_examiner_gap: 30.0,
        examiner_label_to_table_gap: 25.0,
        table_font_size: 10.0,
        section_font_size: 8.0,
        cell_padding_x: 5.0,

        question_cell_width: 20.0,
        total_cell_width: 30.0,
        section_row_height: 18.0,
        section_gap: 15.0,
        grand_total_width: 60.0,
        grand_total_gap: 10.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page surface
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One primitive on a page. `y` of a text op is its baseline; `y` of a box is its bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        face: FontFace,
        size: f32,
        align: TextAlign,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// A finished fixed-size page: an ordered list of drawing operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(config: &PageConfig) -> Self {
        Self {
            width: config.page_width,
            height: config.page_height,
            ops: Vec::new(),
        }
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, face: FontFace, size: f32) {
        self.push_text(x, y, text.into(), face, size, TextAlign::Left);
    }

    pub fn centered_text(
        &mut self,
        x: f32,
        y: f32,
        text: impl Into<String>,
        face: FontFace,
        size: f32,
    ) {
        self.push_text(x, y, text.into(), face, size, TextAlign::Center);
    }

    pub fn right_text(&mut self, x: f32, y: f32, text: impl Into<String>, face: FontFace, size: f32) {
        self.push_text(x, y, text.into(), face, size, TextAlign::Right);
    }

    fn push_text(&mut self, x: f32, y: f32, text: String, face: FontFace, size: f32, align: TextAlign) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text,
            face,
            size,
            align,
        });
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
        });
    }

    /// All visible text on the page, one op per line, in drawing order.
    #[cfg(test)]
    pub fn text_layer(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Text { .. }))
    }

    #[cfg(test)]
    pub fn rects(&self) -> impl Iterator<Item = (f32, f32, f32, f32)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => Some((*x, *y, *width, *height)),
            _ => None,
        })
    }

    /// Left edge of a text op after alignment, measured with the static font metrics.
    pub fn text_left_edge(op: &DrawOp) -> Option<f32> {
        match op {
            DrawOp::Text {
                x,
                text,
                face,
                size,
                align,
                ..
            } => {
                let width = get_metrics(*face).width_pt(text, *size);
                Some(match align {
                    TextAlign::Left => *x,
                    TextAlign::Center => x - width / 2.0,
                    TextAlign::Right => x - width,
                })
            }
            _ => None,
        }
    }
}
