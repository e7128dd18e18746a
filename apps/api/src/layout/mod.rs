// Page Layout Engine: fixed header and student block, instruction reflow with page
// breaks, and marking-table geometry. Pure CPU work; callers run it inside
// tokio::task::spawn_blocking.

pub mod engine;
pub mod error;
pub mod flow;
pub mod font_metrics;
pub mod header;
pub mod instructions;
pub mod marking_table;
pub mod page;

// Re-export the public API consumed by the render, batch and route modules.
pub use engine::{LayoutEngine, RenderOutput};
pub use error::{LayoutDiagnostic, LayoutError};
pub use page::{default_page_config, DrawOp, Page};
