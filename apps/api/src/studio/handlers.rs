//! Axum route handlers for the Studio API.

use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::extract::ValidJson;
use crate::studio::compiler::compile;
use crate::studio::document::PromptDocument;
use crate::studio::library::{LibraryCategory, LIBRARY};
use crate::studio::lint::{lint, LintFinding};

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub prompt: String,
    pub findings: Vec<LintFinding>,
}

/// POST /api/v1/studio/compile
///
/// Renders the document for its target model and lints it in one pass.
pub async fn handle_compile(
    ValidJson(doc): ValidJson<PromptDocument>,
) -> Result<Json<CompileResponse>, AppError> {
    Ok(Json(CompileResponse {
        prompt: compile(&doc),
        findings: lint(&doc),
    }))
}

/// GET /api/v1/studio/library
pub async fn handle_library() -> Json<&'static [LibraryCategory]> {
    Json(LIBRARY)
}
