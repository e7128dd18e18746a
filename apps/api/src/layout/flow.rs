//! Top-down placement cursor shared by every layout step.

use crate::layout::page::{Page, PageConfig};

/// Accumulates finished pages while a document is laid out.
///
/// `y` is the baseline (or top edge, for boxes) of the next element. It only decreases
/// within a page and is reset to the top margin when a new page starts.
pub struct Flow<'a> {
    pub config: &'a PageConfig,
    finished: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'a> Flow<'a> {
    pub fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            finished: Vec::new(),
            current: Page::new(config),
            y: config.top_y(),
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Moves the cursor down by `amount` points.
    pub fn advance(&mut self, amount: f32) {
        self.y -= amount;
    }

    /// True when an element of `height` placed at the cursor would cross the bottom margin.
    pub fn would_overflow(&self, height: f32) -> bool {
        self.y - height < self.config.bottom_margin
    }

    /// Emits the current page and continues at the top of a fresh one.
    pub fn break_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Page::new(self.config));
        self.finished.push(done);
        self.y = self.config.top_y();
    }

    /// True when nothing has been drawn on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.current.ops.is_empty()
    }

    pub fn page(&mut self) -> &mut Page {
        &mut self.current
    }

    pub fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    pub fn finish(mut self) -> Vec<Page> {
        self.finished.push(self.current);
        self.finished
    }
}
