pub mod document;
pub mod marking;

pub use document::{DocumentSpec, InstructionBlock, Logo, StudentRecord, FIELD_PLACEHOLDER};
pub use marking::{GridTable, MarkingTableSpec, SectionedTable};
