pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::lookup::handlers as lookup;
use crate::projects::handlers as projects;
use crate::state::AppState;
use crate::studio::handlers as studio;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Lookup API
        .route("/api/v1/lookup/discover", get(lookup::handle_discover))
        .route("/api/v1/lookup/dictionary", get(lookup::handle_dictionary))
        .route("/api/v1/lookup/wikipedia", get(lookup::handle_wikipedia))
        .route("/api/v1/lookup/wikidata", get(lookup::handle_wikidata))
        .route("/api/v1/lookup/conceptnet", get(lookup::handle_conceptnet))
        // Studio API
        .route("/api/v1/studio/compile", post(studio::handle_compile))
        .route("/api/v1/studio/library", get(studio::handle_library))
        // Saved documents
        .route(
            "/api/v1/projects",
            get(projects::handle_list_projects).post(projects::handle_save_project),
        )
        .route(
            "/api/v1/projects/:id",
            get(projects::handle_get_project).delete(projects::handle_delete_project),
        )
        .with_state(state)
}
