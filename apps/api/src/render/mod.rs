// Serializes laid-out pages into a downloadable document format.

pub mod encoding;
pub mod pdf;

use thiserror::Error;

use crate::layout::Page;
use crate::models::Logo;

pub use pdf::PdfWriter;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to write: document has no pages")]
    NoPages,

    #[error("logo has invalid dimensions {width}x{height}")]
    InvalidLogo { width: u32, height: u32 },
}

/// Output format for finished pages. PDF is the only format today.
pub trait DocumentWriter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    /// Writes `pages` in order as one document. `logo` backs every image op.
    fn write(&self, pages: &[Page], logo: Option<&Logo>) -> Result<Vec<u8>, RenderError>;
}
