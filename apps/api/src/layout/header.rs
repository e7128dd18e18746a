//! Fixed-height blocks at the top of the first page: school header and student fields.

use crate::layout::flow::Flow;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::models::document::present;
use crate::models::{DocumentSpec, Logo, StudentRecord, FIELD_PLACEHOLDER};

/// Space kept between the school name and the logo or paper code beside it.
const HEADER_SIDE_GAP: f32 = 10.0;

/// Largest size up to `preferred` at which `text` fits in `max_width`.
pub fn fit_font_size(text: &str, face: FontFace, preferred: f32, max_width: f32) -> f32 {
    let width = get_metrics(face).width_pt(text, preferred);
    if width <= max_width || width <= 0.0 {
        preferred
    } else {
        preferred * max_width.max(1.0) / width
    }
}

/// Logo size inside a `max` x `max` box, keeping the image's aspect ratio.
pub fn fit_logo(logo: &Logo, max: f32) -> (f32, f32) {
    let (w, h) = (logo.width_px as f32, logo.height_px as f32);
    if w <= 0.0 || h <= 0.0 {
        return (max, max);
    }
    if w >= h {
        (max, max * h / w)
    } else {
        (max * w / h, max)
    }
}

/// Draws the logo and the four centred header lines, then moves the cursor to the
/// first student line. Offsets are constants, so the block height never depends on content;
/// text that would not fit its line is set smaller instead.
pub fn place_header(flow: &mut Flow<'_>, spec: &DocumentSpec) {
    let config = flow.config;
    let top = flow.y();
    let step = config.header_line_step;
    let cx = config.center_x();
    let right_edge = config.page_width - config.right_margin;
    let page = flow.page();

    let mut left_bound = config.left_margin;
    if let Some(logo) = &spec.logo {
        let (w, h) = fit_logo(logo, config.logo_size);
        // top edge stays where a full-size square logo would end
        page.image(config.left_margin, top - 10.0 + config.logo_size - h, w, h);
        left_bound += w + HEADER_SIDE_GAP;
    }

    let mut right_bound = right_edge;
    if let Some(code) = present(&spec.paper_code) {
        let size = fit_font_size(
            code,
            FontFace::Bold,
            config.student_font_size,
            config.usable_width() / 3.0,
        );
        page.right_text(right_edge, top, code, FontFace::Bold, size);
        right_bound -= get_metrics(FontFace::Bold).width_pt(code, size) + HEADER_SIDE_GAP;
    }

    let school_width = 2.0 * (cx - left_bound).min(right_bound - cx);
    let school_size = fit_font_size(
        &spec.school_name,
        FontFace::Bold,
        config.school_font_size,
        school_width,
    );
    page.centered_text(cx, top, spec.school_name.as_str(), FontFace::Bold, school_size);

    let lines = [
        format!(
            "{} - {} {}",
            spec.header,
            spec.form_level.to_uppercase(),
            spec.subject.to_uppercase()
        ),
        format!("{} – {}", spec.term, spec.exam_name),
        format!("{} - {}", spec.formatted_date(), spec.duration),
    ];
    for (i, line) in lines.into_iter().enumerate() {
        let size = fit_font_size(
            &line,
            FontFace::Bold,
            config.header_font_size,
            config.usable_width(),
        );
        page.centered_text(cx, top - step * (i as f32 + 1.0), line, FontFace::Bold, size);
    }

    flow.advance(step * 3.0 + config.header_to_student_gap);
}

/// Identification lines in print order. Values are placeholders unless `prefill` is set.
pub fn student_lines(spec: &DocumentSpec, student: &StudentRecord) -> Vec<String> {
    let prefill = spec.prefill_student_fields;
    let value = |v: &str| if prefill { v.to_string() } else { FIELD_PLACEHOLDER.to_string() };
    let school = if spec.school_name.trim().is_empty() {
        FIELD_PLACEHOLDER
    } else {
        spec.school_name.trim()
    };

    let mut lines = vec![
        format!("Name: {}", value(student.name_or_placeholder())),
        format!("Adm/Index No: {}", value(student.admission_or_placeholder())),
        format!("School: {}", value(school)),
        format!("Stream: {}", value(student.stream_or_placeholder())),
        format!("Signature: {FIELD_PLACEHOLDER}"),
        format!("Date: {FIELD_PLACEHOLDER}"),
    ];
    if spec.include_exam_number {
        // Exam numbers are issued per copy, so they print even on blank pages.
        lines.push(format!(
            "Exam Number: {}",
            student.exam_number_or_placeholder()
        ));
    }
    lines
}

/// Draws the student block at a fixed step per line and moves past it.
pub fn place_student_block(flow: &mut Flow<'_>, spec: &DocumentSpec, student: &StudentRecord) {
    let config = flow.config;
    let top = flow.y();
    let lines = student_lines(spec, student);
    let count = lines.len() as f32;
    let page = flow.page();

    for (i, line) in lines.into_iter().enumerate() {
        let size = fit_font_size(
            &line,
            FontFace::Regular,
            config.student_font_size,
            config.usable_width(),
        );
        page.text(
            config.left_margin,
            top - config.student_line_step * i as f32,
            line,
            FontFace::Regular,
            size,
        );
    }

    flow.advance(config.student_line_step * count + config.student_to_instructions_gap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::{default_page_config, DrawOp, Page};
    use bytes::Bytes;
    use chrono::NaiveDate;

    /// `(left, right)` of every text op whose text satisfies `pick`.
    fn extents(page: &Page, pick: impl Fn(&str) -> bool) -> Vec<(f32, f32)> {
        page.texts()
            .filter_map(|op| match op {
                DrawOp::Text { text, face, size, .. } if pick(text.as_str()) => {
                    let left = Page::text_left_edge(op)?;
                    Some((left, left + get_metrics(*face).width_pt(text, *size)))
                }
                _ => None,
            })
            .collect()
    }

    fn make_spec(prefill: bool, exam_number: bool) -> DocumentSpec {
        DocumentSpec {
            header: "Kenya Certificate of Secondary Examinations".to_string(),
            school_name: "ST. JOSEPH'S BOYS - KITALE".to_string(),
            subject: "Physics".to_string(),
            form_level: "Form 3".to_string(),
            term: "Term 2".to_string(),
            exam_name: "Exam 1".to_string(),
            exam_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            duration: "2 HOURS".to_string(),
            paper_code: Some("232/1".to_string()),
            include_exam_number: exam_number,
            include_marking_table: false,
            prefill_student_fields: prefill,
            logo: None,
        }
    }

    fn make_student() -> StudentRecord {
        StudentRecord {
            name: Some("Achieng Otieno".to_string()),
            admission_number: Some("4512".to_string()),
            stream: Some("3 West".to_string()),
            exam_number: Some("K7Q2M9X1AB".to_string()),
        }
    }

    #[test]
    fn test_header_lines_and_fixed_height() {
        let config = default_page_config();
        let mut flow = Flow::new(&config);
        place_header(&mut flow, &make_spec(false, true));

        let expected_y = config.top_y() - 3.0 * config.header_line_step - config.header_to_student_gap;
        assert!((flow.y() - expected_y).abs() < 1e-4);

        let pages = flow.finish();
        let text = pages[0].text_layer();
        assert!(text.contains("ST. JOSEPH'S BOYS - KITALE"));
        assert!(text.contains("Kenya Certificate of Secondary Examinations - FORM 3 PHYSICS"));
        assert!(text.contains("Term 2 – Exam 1"));
        assert!(text.contains("07 March 2025 - 2 HOURS"));
        assert!(text.contains("232/1"));
    }

    #[test]
    fn test_blank_student_block_hides_values() {
        let lines = student_lines(&make_spec(false, false), &make_student());
        let joined = lines.join("\n");
        assert_eq!(lines.len(), 6);
        assert!(!joined.contains("Achieng Otieno"));
        assert!(!joined.contains("4512"));
        assert!(!joined.contains("3 West"));
        assert!(joined.contains(&format!("Name: {FIELD_PLACEHOLDER}")));
    }

    #[test]
    fn test_prefilled_student_block_writes_values_inline() {
        let lines = student_lines(&make_spec(true, true), &make_student());
        assert_eq!(lines[0], "Name: Achieng Otieno");
        assert_eq!(lines[1], "Adm/Index No: 4512");
        assert_eq!(lines[2], "School: ST. JOSEPH'S BOYS - KITALE");
        assert_eq!(lines[3], "Stream: 3 West");
        assert_eq!(lines[6], "Exam Number: K7Q2M9X1AB");
    }

    #[test]
    fn test_prefill_with_missing_value_uses_placeholder() {
        let student = StudentRecord {
            name: Some("Brian Kip".to_string()),
            ..StudentRecord::default()
        };
        let lines = student_lines(&make_spec(true, false), &student);
        assert_eq!(lines[1], format!("Adm/Index No: {FIELD_PLACEHOLDER}"));
    }

    #[test]
    fn test_student_block_advances_by_fixed_step() {
        let config = default_page_config();
        let mut flow = Flow::new(&config);
        let start = flow.y();
        place_student_block(&mut flow, &make_spec(false, true), &StudentRecord::default());
        let expected = start - 7.0 * config.student_line_step - config.student_to_instructions_gap;
        assert!((flow.y() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_long_school_name_shrinks_clear_of_paper_code() {
        let config = default_page_config();
        let mut spec = make_spec(false, true);
        spec.school_name =
            "THE PRESBYTERIAN CHURCH OF EAST AFRICA ST. ANDREW'S GIRLS NATIONAL SECONDARY SCHOOL"
                .to_string();
        spec.paper_code = Some("232/1".to_string());
        let mut flow = Flow::new(&config);
        place_header(&mut flow, &spec);
        let pages = flow.finish();

        let school = extents(&pages[0], |t| t.starts_with("THE PRESBYTERIAN"))[0];
        let code = extents(&pages[0], |t| t == "232/1")[0];
        assert!(school.0 >= config.left_margin - 1e-3);
        assert!(school.1 + HEADER_SIDE_GAP <= code.0 + 1e-3, "{school:?} runs into {code:?}");
        assert!(code.1 <= config.page_width - config.right_margin + 1e-3);
    }

    #[test]
    fn test_header_lines_stay_within_margins() {
        let config = default_page_config();
        let mut spec = make_spec(false, true);
        spec.header = "Kenya Certificate of Secondary Education Joint Mock Evaluation".to_string();
        spec.subject = "Business Studies and Entrepreneurship".to_string();
        let mut flow = Flow::new(&config);
        place_header(&mut flow, &spec);
        let pages = flow.finish();

        for (left, right) in extents(&pages[0], |_| true) {
            assert!(left >= config.left_margin - 1e-3, "starts at {left}");
            assert!(right <= config.page_width - config.right_margin + 1e-3, "ends at {right}");
        }
    }

    #[test]
    fn test_short_header_keeps_preferred_size() {
        assert_eq!(fit_font_size("Term 2 – Exam 1", FontFace::Bold, 13.0, 475.0), 13.0);
    }

    #[test]
    fn test_logo_keeps_aspect_ratio() {
        let wide = Logo {
            jpeg: Bytes::new(),
            width_px: 300,
            height_px: 100,
        };
        let tall = Logo {
            width_px: 50,
            height_px: 200,
            ..wide.clone()
        };
        assert_eq!(fit_logo(&wide, 60.0), (60.0, 20.0));
        assert_eq!(fit_logo(&tall, 60.0), (15.0, 60.0));

        let config = default_page_config();
        let mut spec = make_spec(false, true);
        spec.logo = Some(wide);
        let mut flow = Flow::new(&config);
        let top = flow.y();
        place_header(&mut flow, &spec);
        let pages = flow.finish();
        let image = pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Image { x, y, width, height } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .unwrap();
        assert_eq!(image.2, 60.0);
        assert_eq!(image.3, 20.0);
        assert!((image.1 + image.3 - (top - 10.0 + config.logo_size)).abs() < 1e-3);
    }
}
