//! PDF output via `pdf-writer`. Text uses the non-embedded base-14 Helvetica faces, so
//! files stay small and content streams are written uncompressed.

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use crate::layout::font_metrics::FontFace;
use crate::layout::{DrawOp, Page};
use crate::models::Logo;
use crate::render::encoding::encode_win_ansi;
use crate::render::{DocumentWriter, RenderError};

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");
const LOGO_IMAGE: Name<'static> = Name(b"Im1");
const STROKE_WIDTH: f32 = 0.75;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn write(&self, pages: &[Page], logo: Option<&Logo>) -> Result<Vec<u8>, RenderError> {
        if pages.is_empty() {
            return Err(RenderError::NoPages);
        }
        if let Some(logo) = logo {
            if logo.width_px == 0 || logo.height_px == 0 {
                return Err(RenderError::InvalidLogo {
                    width: logo.width_px,
                    height: logo.height_px,
                });
            }
        }

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let regular_id = alloc();
        let bold_id = alloc();
        let logo_id = logo.map(|_| alloc());
        let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(pages.len() as i32);

        pdf.type1_font(regular_id)
            .base_font(Name(FontFace::Regular.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(bold_id)
            .base_font(Name(FontFace::Bold.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        if let (Some(logo), Some(id)) = (logo, logo_id) {
            let mut image = pdf.image_xobject(id, &logo.jpeg);
            image.filter(Filter::DctDecode);
            image.width(logo.width_px as i32);
            image.height(logo.height_px as i32);
            image.color_space().device_rgb();
            image.bits_per_component(8);
            image.finish();
        }

        for (i, page) in pages.iter().enumerate() {
            let content = page_content(page, logo_id.is_some());
            pdf.stream(content_ids[i], &content);

            let mut page_writer = pdf.page(page_ids[i]);
            page_writer
                .media_box(Rect::new(0.0, 0.0, page.width, page.height))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page_writer.resources();
            resources
                .fonts()
                .pair(REGULAR_FONT, regular_id)
                .pair(BOLD_FONT, bold_id);
            if let Some(id) = logo_id {
                resources.x_objects().pair(LOGO_IMAGE, id);
            }
            resources.finish();
            page_writer.finish();
        }

        Ok(pdf.finish())
    }
}

fn page_content(page: &Page, has_logo: bool) -> Vec<u8> {
    let mut content = Content::new();
    content.set_line_width(STROKE_WIDTH);

    for op in &page.ops {
        match op {
            DrawOp::Text {
                y,
                text,
                face,
                size,
                ..
            } => {
                let Some(x) = Page::text_left_edge(op) else {
                    continue;
                };
                let font = match face {
                    FontFace::Regular => REGULAR_FONT,
                    FontFace::Bold => BOLD_FONT,
                };
                let encoded = encode_win_ansi(text);
                content
                    .begin_text()
                    .set_font(font, *size)
                    .next_line(x, *y)
                    .show(Str(&encoded))
                    .end_text();
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => {
                content.rect(*x, *y, *width, *height).stroke();
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
            } => {
                if !has_logo {
                    continue;
                }
                content
                    .save_state()
                    .transform([*width, 0.0, 0.0, *height, *x, *y])
                    .x_object(LOGO_IMAGE)
                    .restore_state();
            }
        }
    }

    content.finish()
}
