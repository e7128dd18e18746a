// Batch orchestration: turns one request into per-student (or blank) documents, issues
// exam numbers, and lays documents out in parallel. One bad record never aborts the rest.

pub mod exam_numbers;
pub mod handlers;
pub mod naming;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::batch::exam_numbers::ExamNumberAllocator;
use crate::batch::naming::{blank_file_stem, student_file_stem};
use crate::config::Config;
use crate::errors::AppError;
use crate::layout::{LayoutEngine, RenderOutput};
use crate::models::{DocumentSpec, InstructionBlock, MarkingTableSpec, StudentRecord};
use crate::presets::{default_marking_table, instructions_for};

pub const DEFAULT_COPIES: u32 = 30;

/// Instructions as either a list of lines or one newline-separated text block.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InstructionsInput {
    Lines(Vec<String>),
    Text(String),
}

impl InstructionsInput {
    fn into_block(self) -> InstructionBlock {
        match self {
            InstructionsInput::Lines(lines) => InstructionBlock::from_text(&lines.join("\n")),
            InstructionsInput::Text(text) => InstructionBlock::from_text(&text),
        }
    }
}

/// Body shared by the layout, preview and batch endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TopPageRequest {
    pub document: DocumentSpec,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub instructions: Option<InstructionsInput>,
    #[serde(default)]
    pub marking_table: Option<MarkingTableSpec>,
    #[serde(default)]
    pub copies: Option<u32>,
}

/// Who the documents are for.
#[derive(Debug, Clone)]
pub enum Recipients {
    Students(Vec<StudentRecord>),
    Blank { copies: u32 },
}

/// A validated request with every default filled in.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub document: DocumentSpec,
    pub instructions: InstructionBlock,
    pub table: MarkingTableSpec,
    pub recipients: Recipients,
}

impl TopPageRequest {
    /// Checks request-level limits and fills defaults from `config` and the subject presets.
    pub fn into_job(self, config: &Config) -> Result<BatchJob, AppError> {
        let mut document = self.document;
        if document.subject.trim().is_empty() {
            return Err(AppError::Validation("document.subject must not be empty".into()));
        }
        if document.school_name.trim().is_empty() {
            if let Some(school) = &config.default_school_name {
                document.school_name = school.clone();
            }
        }

        let recipients = if self.students.is_empty() {
            let copies = self.copies.unwrap_or(DEFAULT_COPIES);
            if copies == 0 || copies > config.max_copies {
                return Err(AppError::Validation(format!(
                    "copies must be between 1 and {}, got {copies}",
                    config.max_copies
                )));
            }
            Recipients::Blank { copies }
        } else {
            if self.students.len() > config.max_batch_students {
                return Err(AppError::Validation(format!(
                    "at most {} students per batch, got {}",
                    config.max_batch_students,
                    self.students.len()
                )));
            }
            Recipients::Students(self.students)
        };

        let instructions = match self.instructions {
            Some(input) => input.into_block(),
            None => instructions_for(&document.subject),
        };

        Ok(BatchJob {
            document,
            instructions,
            table: self.marking_table.unwrap_or_else(default_marking_table),
            recipients,
        })
    }
}

/// One document ready for layout: position in the batch, output name, filled-in record.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub index: usize,
    pub file_stem: String,
    pub student: StudentRecord,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub index: usize,
    pub file_stem: String,
    pub output: RenderOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub file_stem: String,
    pub reason: String,
}

/// Successes and failures, each in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub rendered: Vec<RenderedDocument>,
    pub failed: Vec<BatchFailure>,
}

impl BatchJob {
    pub fn document_count(&self) -> usize {
        match &self.recipients {
            Recipients::Students(students) => students.len(),
            Recipients::Blank { copies } => *copies as usize,
        }
    }

    /// Names every document and issues exam numbers in input order. Records whose exam
    /// number is rejected come back as failures; the rest are ready for layout.
    pub fn prepare<R: Rng>(
        &self,
        limit: Option<usize>,
        allocator: &mut ExamNumberAllocator<R>,
    ) -> (Vec<PreparedDocument>, Vec<BatchFailure>) {
        let count = limit.map_or(self.document_count(), |n| n.min(self.document_count()));
        let mut prepared = Vec::with_capacity(count);
        let mut failed = Vec::new();

        for index in 0..count {
            let (file_stem, mut student) = match &self.recipients {
                Recipients::Students(students) => {
                    let student = students[index].clone();
                    (student_file_stem(&student, index + 1), student)
                }
                Recipients::Blank { .. } => (
                    blank_file_stem(&self.document.subject, index + 1),
                    StudentRecord::default(),
                ),
            };

            if self.document.include_exam_number {
                match allocator.assign(&student.exam_number) {
                    Ok(number) => student.exam_number = Some(number),
                    Err(err) => {
                        failed.push(BatchFailure {
                            index,
                            file_stem,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                }
            }

            prepared.push(PreparedDocument {
                index,
                file_stem,
                student,
            });
        }

        (prepared, failed)
    }

    fn layout(
        &self,
        engine: &LayoutEngine,
        doc: PreparedDocument,
    ) -> Result<RenderedDocument, BatchFailure> {
        match engine.render(&self.document, &doc.student, &self.instructions, &self.table) {
            Ok(output) => Ok(RenderedDocument {
                index: doc.index,
                file_stem: doc.file_stem,
                output,
            }),
            Err(err) => Err(BatchFailure {
                index: doc.index,
                file_stem: doc.file_stem,
                reason: err.to_string(),
            }),
        }
    }
}

/// Lays out every document of `job`. Exam numbers are issued sequentially so the
/// uniqueness check sees the whole batch; layout then runs on the rayon pool.
pub fn render_batch<R: Rng>(
    engine: &LayoutEngine,
    job: &BatchJob,
    mut allocator: ExamNumberAllocator<R>,
) -> BatchOutcome {
    let (prepared, mut failed) = job.prepare(None, &mut allocator);

    let results: Vec<Result<RenderedDocument, BatchFailure>> = prepared
        .into_par_iter()
        .map(|doc| job.layout(engine, doc))
        .collect();

    let mut rendered = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(doc) => rendered.push(doc),
            Err(failure) => failed.push(failure),
        }
    }
    failed.sort_by_key(|f| f.index);

    for failure in &failed {
        warn!(
            index = failure.index,
            file_stem = %failure.file_stem,
            "Skipping document: {}",
            failure.reason
        );
    }
    info!(
        "Batch for {} finished: {} rendered, {} failed",
        job.document.subject,
        rendered.len(),
        failed.len()
    );

    BatchOutcome { rendered, failed }
}

/// Lays out only the first document of `job`, propagating its error instead of
/// collecting it. Used by the preview and layout endpoints.
pub fn render_first<R: Rng>(
    engine: &LayoutEngine,
    job: &BatchJob,
    mut allocator: ExamNumberAllocator<R>,
) -> Result<RenderedDocument, AppError> {
    let (mut prepared, failed) = job.prepare(Some(1), &mut allocator);
    if let Some(failure) = failed.into_iter().next() {
        return Err(AppError::UnprocessableEntity(failure.reason));
    }
    let doc = prepared
        .pop()
        .ok_or_else(|| AppError::Validation("request describes no documents".into()))?;

    let output = engine.render(&job.document, &doc.student, &job.instructions, &job.table)?;
    Ok(RenderedDocument {
        index: doc.index,
        file_stem: doc.file_stem,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::exam_numbers::{ExamNumberPolicy, EXAM_NUMBER_LENGTH};
    use crate::layout::default_page_config;
    use crate::models::SectionedTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn request(students: serde_json::Value) -> TopPageRequest {
        serde_json::from_value(serde_json::json!({
            "document": {
                "school_name": "Moi Girls High School",
                "subject": "mathematics",
                "form_level": "Form 3",
                "term": "Term 2",
                "exam_name": "Exam 1",
                "exam_date": "2025-03-07",
                "duration": "2 HOURS",
                "prefill_student_fields": true
            },
            "students": students
        }))
        .unwrap()
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(Arc::new(default_page_config()))
    }

    fn allocator(policy: ExamNumberPolicy) -> ExamNumberAllocator<StdRng> {
        ExamNumberAllocator::new(policy, StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_into_job_fills_presets_and_default_table() {
        let job = request(serde_json::json!([])).into_job(&Config::default()).unwrap();
        assert_eq!(job.instructions, instructions_for("Mathematics"));
        assert_eq!(job.table, default_marking_table());
        assert!(matches!(job.recipients, Recipients::Blank { copies: DEFAULT_COPIES }));
    }

    #[test]
    fn test_into_job_uses_default_school_name() {
        let mut req = request(serde_json::json!([]));
        req.document.school_name = "  ".into();
        let config = Config {
            default_school_name: Some("Alliance High School".into()),
            ..Config::default()
        };
        let job = req.into_job(&config).unwrap();
        assert_eq!(job.document.school_name, "Alliance High School");
    }

    #[test]
    fn test_into_job_rejects_copies_out_of_range() {
        let mut req = request(serde_json::json!([]));
        req.copies = Some(0);
        assert!(matches!(req.into_job(&Config::default()), Err(AppError::Validation(_))));

        let mut req = request(serde_json::json!([]));
        req.copies = Some(101);
        assert!(matches!(req.into_job(&Config::default()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_into_job_rejects_too_many_students() {
        let students: Vec<serde_json::Value> =
            (0..3).map(|i| serde_json::json!({ "name": format!("S{i}") })).collect();
        let config = Config {
            max_batch_students: 2,
            ..Config::default()
        };
        assert!(matches!(
            request(serde_json::Value::Array(students)).into_job(&config),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_instructions_accept_text_or_lines() {
        let text: InstructionsInput = serde_json::from_str("\"1. One\\n\\n2. Two\"").unwrap();
        let lines: InstructionsInput = serde_json::from_str("[\"1. One\", \" \", \"2. Two\"]").unwrap();
        assert_eq!(text.into_block().lines, vec!["1. One", "2. Two"]);
        assert_eq!(lines.into_block().lines, vec!["1. One", "2. Two"]);
    }

    #[test]
    fn test_blank_batch_renders_every_copy_with_unique_numbers() {
        let mut req = request(serde_json::json!([]));
        req.copies = Some(5);
        let job = req.into_job(&Config::default()).unwrap();

        let outcome = render_batch(&engine(), &job, allocator(ExamNumberPolicy::Unique));
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.rendered.len(), 5);
        assert_eq!(outcome.rendered[4].file_stem, "mathematics_Page_5");

        let numbers: std::collections::HashSet<String> = outcome
            .rendered
            .iter()
            .map(|doc| {
                let text = doc.output.pages[0].text_layer();
                let line = text
                    .lines()
                    .find(|l| l.starts_with("Exam Number: "))
                    .unwrap()
                    .to_string();
                assert_eq!(line.len(), "Exam Number: ".len() + EXAM_NUMBER_LENGTH);
                line
            })
            .collect();
        assert_eq!(numbers.len(), 5);
    }

    #[test]
    fn test_bad_record_does_not_abort_batch() {
        let job = request(serde_json::json!([
            { "name": "Achieng Otieno", "admission_number": "101", "exam_number": "DUP0000001" },
            { "name": "Brian Kiprop", "admission_number": "102", "exam_number": "DUP0000001" },
            { "name": "Chebet Wanjiru", "admission_number": "103" }
        ]))
        .into_job(&Config::default())
        .unwrap();

        let outcome = render_batch(&engine(), &job, allocator(ExamNumberPolicy::Unique));
        let rendered: Vec<usize> = outcome.rendered.iter().map(|d| d.index).collect();
        assert_eq!(rendered, vec![0, 2]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].file_stem, "Brian_Kiprop_102");
        assert!(outcome.rendered[0].output.pages[0]
            .text_layer()
            .contains("Name: Achieng Otieno"));
    }

    #[test]
    fn test_layout_error_is_per_document() {
        let mut req = request(serde_json::json!([
            { "name": "Achieng Otieno" },
            { "name": "Brian Kiprop" }
        ]));
        req.marking_table = Some(MarkingTableSpec::Sectioned(SectionedTable {
            section_1_questions: 60,
            ..SectionedTable::default()
        }));
        let job = req.into_job(&Config::default()).unwrap();

        let outcome = render_batch(&engine(), &job, allocator(ExamNumberPolicy::Unique));
        assert!(outcome.rendered.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[1].index, 1);
    }

    #[test]
    fn test_render_first_uses_first_student_only() {
        let job = request(serde_json::json!([
            { "name": "Achieng Otieno" },
            { "name": "Brian Kiprop" }
        ]))
        .into_job(&Config::default())
        .unwrap();

        let doc = render_first(&engine(), &job, allocator(ExamNumberPolicy::Unique)).unwrap();
        assert_eq!(doc.index, 0);
        assert_eq!(doc.file_stem, "Achieng_Otieno");
    }

    #[test]
    fn test_render_first_propagates_layout_error() {
        let mut req = request(serde_json::json!([]));
        req.instructions = Some(InstructionsInput::Text("word ".repeat(20_000)));
        let job = req.into_job(&Config::default()).unwrap();
        assert!(matches!(
            render_first(&engine(), &job, allocator(ExamNumberPolicy::Unique)),
            Err(AppError::Layout(_))
        ));
    }
}
