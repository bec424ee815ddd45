use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client_id::ClientId;
use crate::errors::AppError;
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::lookup::rate_limit::PROJECT_SAVE_POLICY;
use crate::models::project::{ProjectRow, ProjectSummaryRow};
use crate::projects::store::{delete_project, get_project, list_projects, upsert_project};
use crate::state::AppState;
use crate::studio::document::PromptDocument;

const MAX_NAME_CHARS: usize = 60;

#[derive(Deserialize)]
pub struct SessionQuery {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub items: Vec<ProjectSummaryRow>,
}

#[derive(Deserialize)]
pub struct SaveProjectRequest {
    pub session_id: Uuid,
    /// Absent for a new project.
    pub id: Option<Uuid>,
    pub name: String,
    pub payload: PromptDocument,
}

#[derive(Serialize)]
pub struct SaveProjectResponse {
    pub id: Uuid,
    pub remaining: u32,
}

/// GET /api/v1/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SessionQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let items = list_projects(&state.db, params.session_id).await?;
    Ok(Json(ProjectListResponse { items }))
}

/// POST /api/v1/projects
pub async fn handle_save_project(
    State(state): State<AppState>,
    client: ClientId,
    ValidJson(req): ValidJson<SaveProjectRequest>,
) -> Result<Json<SaveProjectResponse>, AppError> {
    let admission = state.limiter.check(&PROJECT_SAVE_POLICY, client.as_str())?;
    let name = validate_name(&req.name)?;
    let id = req.id.unwrap_or_else(Uuid::new_v4);

    let saved = upsert_project(&state.db, req.session_id, id, name, &req.payload).await?;
    if !saved {
        return Err(AppError::NotFound(format!("Project {id} not found")));
    }

    Ok(Json(SaveProjectResponse {
        id,
        remaining: admission.remaining,
    }))
}

/// GET /api/v1/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidQuery(params): ValidQuery<SessionQuery>,
) -> Result<Json<ProjectRow>, AppError> {
    let project = get_project(&state.db, params.session_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    Ok(Json(project))
}

/// DELETE /api/v1/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidQuery(params): ValidQuery<SessionQuery>,
) -> Result<StatusCode, AppError> {
    delete_project(&state.db, params.session_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Etna at dawn ").unwrap(), "Etna at dawn");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(61)).is_err());
        assert!(validate_name(&"x".repeat(60)).is_ok());
    }
}
