//! Instruction reflow and the page-break rule.
//!
//! Each logical instruction is wrapped to the instruction width and measured as a whole.
//! A page break happens strictly before an instruction that would cross the bottom
//! margin, so an instruction is never split across pages.

use serde::Serialize;
use tracing::debug;

use crate::layout::error::LayoutError;
use crate::layout::flow::Flow;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::page::PageConfig;
use crate::models::InstructionBlock;

pub const INSTRUCTIONS_LABEL: &str = "Instructions:";

/// One instruction after wrapping, with the vertical space it consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredInstruction {
    pub lines: Vec<String>,
    pub height: f32,
}

/// Wraps every instruction and measures it. Fails if any single instruction is taller
/// than a whole page's usable height, since no page break could ever make it fit.
pub fn measure_instructions(
    block: &InstructionBlock,
    config: &PageConfig,
) -> Result<Vec<MeasuredInstruction>, LayoutError> {
    let metrics = get_metrics(FontFace::Regular);
    let usable = config.usable_height();

    block
        .lines
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let lines = metrics.wrap(
                text,
                config.instruction_width(),
                config.instruction_font_size,
            );
            let height =
                lines.len() as f32 * config.instruction_line_height + config.instruction_gap;
            if height > usable {
                return Err(LayoutError::InstructionTooLarge {
                    index,
                    height,
                    usable,
                });
            }
            Ok(MeasuredInstruction { lines, height })
        })
        .collect()
}

/// Places the label and every instruction, breaking pages as needed.
///
/// The label is kept with the first instruction. Returns the number of page breaks taken.
pub fn place_instructions(flow: &mut Flow<'_>, measured: &[MeasuredInstruction]) -> usize {
    let config = flow.config;
    let mut breaks = 0;

    let Some(first) = measured.first() else {
        return 0;
    };

    if flow.would_overflow(config.label_to_instructions_gap + first.height) && !flow.at_page_top()
    {
        flow.break_page();
        breaks += 1;
    }
    let label_y = flow.y();
    flow.page().text(
        config.left_margin,
        label_y,
        INSTRUCTIONS_LABEL,
        FontFace::Bold,
        config.label_font_size,
    );
    flow.advance(config.label_to_instructions_gap);

    for (index, instruction) in measured.iter().enumerate() {
        if flow.would_overflow(instruction.height) {
            debug!(
                "Instruction {index} ({:.1}pt) overflows at y={:.1}; starting page {}",
                instruction.height,
                flow.y(),
                flow.page_count() + 1
            );
            flow.break_page();
            breaks += 1;
        }

        let top = flow.y();
        let x = config.left_margin + config.instruction_indent;
        for (i, line) in instruction.lines.iter().enumerate() {
            flow.page().text(
                x,
                top - config.instruction_line_height * i as f32,
                line.as_str(),
                FontFace::Regular,
                config.instruction_font_size,
            );
        }
        flow.advance(instruction.height);
    }

    breaks
}
