use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{ProjectRow, ProjectSummaryRow};
use crate::studio::document::PromptDocument;

const LIST_LIMIT: i64 = 50;

/// Most recently updated first.
pub async fn list_projects(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Vec<ProjectSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectSummaryRow>(
        "SELECT id, name, updated_at FROM projects WHERE session_id = $1 ORDER BY updated_at DESC LIMIT $2",
    )
    .bind(session_id)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
}

pub async fn get_project(
    pool: &PgPool,
    session_id: Uuid,
    id: Uuid,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        "SELECT id, name, payload, updated_at FROM projects WHERE id = $1 AND session_id = $2",
    )
    .bind(id)
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

/// Inserts or overwrites a project. An id owned by another session is left
/// untouched and reported as `false`.
pub async fn upsert_project(
    pool: &PgPool,
    session_id: Uuid,
    id: Uuid,
    name: &str,
    payload: &PromptDocument,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO projects (id, session_id, name, payload, updated_at)
        VALUES ($1, $2, $3, $4, now())
        ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            WHERE projects.session_id = EXCLUDED.session_id
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(name)
    .bind(Json(payload))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_project(pool: &PgPool, session_id: Uuid, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projects WHERE id = $1 AND session_id = $2")
        .bind(id)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}
