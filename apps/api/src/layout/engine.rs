//! Page Layout Engine: one top page document from its inputs.
//!
//! Validation runs before any drawing. After that the engine never fails: header and
//! student block sit at fixed offsets, instructions reflow across as many pages as they
//! need, and the examiner block follows.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::layout::error::{LayoutDiagnostic, LayoutError};
use crate::layout::flow::Flow;
use crate::layout::font_metrics::FontFace;
use crate::layout::header::{place_header, place_student_block};
use crate::layout::instructions::{measure_instructions, place_instructions};
use crate::layout::marking_table::{plan_table, TablePlan, EXAMINER_LABEL};
use crate::layout::page::{Page, PageConfig};
use crate::models::{DocumentSpec, InstructionBlock, MarkingTableSpec, StudentRecord};

/// Finished pages plus any non-fatal problems found while laying them out.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub pages: Vec<Page>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

/// Stateless renderer bound to one immutable page configuration.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: Arc<PageConfig>,
}

impl LayoutEngine {
    pub fn new(config: Arc<PageConfig>) -> Self {
        Self { config }
    }

    /// Lays out one document. `table` is ignored unless the document includes a marking table.
    pub fn render(
        &self,
        spec: &DocumentSpec,
        student: &StudentRecord,
        instructions: &InstructionBlock,
        table: &MarkingTableSpec,
    ) -> Result<RenderOutput, LayoutError> {
        let config = self.config.as_ref();

        let measured = measure_instructions(instructions, config)?;
        let mut diagnostics = Vec::new();
        let plan = if spec.include_marking_table {
            let planned = plan_table(table, config)?;
            diagnostics.extend(planned.diagnostics);
            planned.plan
        } else {
            None
        };
        if let Some(plan) = &plan {
            let required = config.examiner_label_to_table_gap + plan.height();
            if required > config.usable_height() {
                return Err(LayoutError::TableTooTall {
                    required,
                    available: config.usable_height(),
                });
            }
        }

        let mut flow = Flow::new(config);
        place_header(&mut flow, spec);
        place_student_block(&mut flow, spec, student);
        let breaks = place_instructions(&mut flow, &measured);
        if let Some(plan) = &plan {
            place_examiner_block(&mut flow, plan);
        }

        let pages = flow.finish();
        debug!(
            "Laid out {} page(s): {} instructions, {breaks} instruction break(s), {} diagnostic(s)",
            pages.len(),
            measured.len(),
            diagnostics.len()
        );
        Ok(RenderOutput { pages, diagnostics })
    }
}

/// Label plus table, kept together; moves to a fresh page when it does not fit below.
fn place_examiner_block(flow: &mut Flow<'_>, plan: &TablePlan) {
    let config = flow.config;
    flow.advance(config.instructions_to_examiner_gap);

    let block_height = config.examiner_label_to_table_gap + plan.height();
    if flow.would_overflow(block_height) {
        debug!("Examiner block ({block_height:.1}pt) does not fit; moving to a new page");
        flow.break_page();
    }

    let label_y = flow.y();
    let page = flow.page();
    page.text(
        config.left_margin,
        label_y,
        EXAMINER_LABEL,
        FontFace::Bold,
        config.label_font_size,
    );
    plan.draw(
        page,
        config.left_margin,
        label_y - config.examiner_label_to_table_gap,
    );
    flow.advance(block_height);
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
