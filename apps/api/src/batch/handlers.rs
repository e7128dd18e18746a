use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::batch::exam_numbers::ExamNumberAllocator;
use crate::batch::naming::sanitize_file_stem;
use crate::batch::{render_batch, render_first, BatchFailure, TopPageRequest};
use crate::errors::AppError;
use crate::layout::{LayoutDiagnostic, Page};
use crate::presets::{instructions_for, resolve_subject};
use crate::state::AppState;

const DIAGNOSTICS_HEADER: HeaderName = HeaderName::from_static("x-toppage-diagnostics");
const RENDERED_HEADER: HeaderName = HeaderName::from_static("x-documents-rendered");
const FAILED_HEADER: HeaderName = HeaderName::from_static("x-documents-failed");

#[derive(Serialize)]
pub struct InstructionsResponse {
    pub subject: &'static str,
    pub instructions: Vec<String>,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub file_stem: String,
    pub pages: Vec<Page>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

#[derive(Serialize)]
struct BatchFailureReport<'a> {
    message: &'static str,
    failures: &'a [BatchFailure],
}

fn allocator(state: &AppState) -> ExamNumberAllocator<StdRng> {
    ExamNumberAllocator::new(state.config.exam_number_policy, StdRng::from_os_rng())
}

fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError::Internal(anyhow::anyhow!("spawn_blocking failed while rendering: {e}"))
}

fn attachment(stem: &str, extension: &str) -> String {
    format!("attachment; filename=\"{stem}.{extension}\"")
}

/// GET /api/v1/instructions/:subject
pub async fn handle_get_instructions(Path(subject): Path<String>) -> Json<InstructionsResponse> {
    Json(InstructionsResponse {
        subject: resolve_subject(&subject),
        instructions: instructions_for(&subject).lines,
    })
}

/// POST /api/v1/top-pages/layout
/// Draw list of the first document, without writing a file.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(req): Json<TopPageRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let job = req.into_job(&state.config)?;
    let engine = state.engine.clone();
    let allocator = allocator(&state);

    let doc = tokio::task::spawn_blocking(move || render_first(&engine, &job, allocator))
        .await
        .map_err(join_error)??;

    Ok(Json(LayoutResponse {
        file_stem: doc.file_stem,
        pages: doc.output.pages,
        diagnostics: doc.output.diagnostics,
    }))
}

/// POST /api/v1/top-pages/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<TopPageRequest>,
) -> Result<Response, AppError> {
    let job = req.into_job(&state.config)?;
    let engine = state.engine.clone();
    let writer = state.writer.clone();
    let allocator = allocator(&state);

    let (doc, bytes) = tokio::task::spawn_blocking(move || {
        let doc = render_first(&engine, &job, allocator)?;
        let bytes = writer.write(&doc.output.pages, job.document.logo.as_ref())?;
        Ok::<_, AppError>((doc, bytes))
    })
    .await
    .map_err(join_error)??;

    info!(
        "Preview {} rendered: {} page(s), {} diagnostic(s)",
        doc.file_stem,
        doc.output.pages.len(),
        doc.output.diagnostics.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, state.writer.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment(&doc.file_stem, state.writer.extension()),
            ),
            (DIAGNOSTICS_HEADER, doc.output.diagnostics.len().to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/top-pages/batch
/// Every successfully rendered document, in input order, merged into one file.
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(req): Json<TopPageRequest>,
) -> Result<Response, AppError> {
    let job = req.into_job(&state.config)?;
    let engine = state.engine.clone();
    let writer = state.writer.clone();
    let allocator = allocator(&state);
    let stem = sanitize_file_stem(&format!("{}_Top_Pages", job.document.subject));

    let (rendered, failed, bytes) = tokio::task::spawn_blocking(move || {
        let outcome = render_batch(&engine, &job, allocator);
        if outcome.rendered.is_empty() {
            let report = BatchFailureReport {
                message: "no document in the batch could be rendered",
                failures: &outcome.failed,
            };
            return Err(AppError::UnprocessableEntity(
                serde_json::to_string(&report).unwrap_or_default(),
            ));
        }
        let rendered = outcome.rendered.len();
        let failed = outcome.failed.len();
        let pages: Vec<Page> = outcome
            .rendered
            .into_iter()
            .flat_map(|doc| doc.output.pages)
            .collect();
        let bytes = writer.write(&pages, job.document.logo.as_ref())?;
        Ok::<_, AppError>((rendered, failed, bytes))
    })
    .await
    .map_err(join_error)??;

    Ok((
        [
            (header::CONTENT_TYPE, state.writer.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment(&stem, state.writer.extension()),
            ),
            (RENDERED_HEADER, rendered.to_string()),
            (FAILED_HEADER, failed.to_string()),
        ],
        bytes,
    )
        .into_response())
}
