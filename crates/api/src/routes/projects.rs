//! Project routes, including team membership and suggestion threads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use domain::models::project::{
    dedup_team, AddSuggestionRequest, CreateProjectRequest, UpdateProjectRequest,
};
use domain::models::{Project, ProjectDetail, Suggestion};
use persistence::repositories::{NewProject, ProjectChanges, ProjectRepository, UserRepository};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{
    ApiJson, CurrentUser, ProjectCreators, ProjectDeleters, RoleGuard, Suggesters,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/suggestions", post(add_suggestion))
}

fn project_not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

/// Unique title violations become 409 with a readable message.
fn map_project_write_error(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("projects_title_key") => {
            ApiError::Conflict("A project with this title already exists".to_string())
        }
        _ => err.into(),
    }
}

/// Rejects member ids that do not belong to a user.
async fn ensure_users_exist(state: &AppState, ids: &[Uuid]) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = UserRepository::new(state.pool.clone())
        .count_existing(ids)
        .await?;
    if found != ids.len() as i64 {
        return Err(ApiError::Validation(
            "One or more selected users do not exist".to_string(),
        ));
    }
    Ok(())
}

/// All projects with lead, team and suggestions populated.
///
/// GET /api/projects
async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectDetail>>, ApiError> {
    let projects = ProjectRepository::new(state.pool.clone()).list().await?;
    Ok(Json(projects))
}

/// GET /api/projects/:id
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, ApiError> {
    ProjectRepository::new(state.pool.clone())
        .find_detail(id)
        .await?
        .map(Json)
        .ok_or_else(project_not_found)
}

/// Create a project.
///
/// POST /api/projects
///
/// Requires Admin or Head. The lead defaults to the creator and the team is
/// de-duplicated. Every referenced user must exist; a taken title is a 409.
async fn create_project(
    State(state): State<AppState>,
    guard: RoleGuard<ProjectCreators>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectDetail>), ApiError> {
    request.validate()?;

    let creator = guard.user;
    let lead_id = request.lead.unwrap_or(creator.id);
    let team = dedup_team(&request.team);

    // The lead may sit outside the team but must still be a real user
    let mut referenced = team.clone();
    if !referenced.contains(&lead_id) {
        referenced.push(lead_id);
    }
    ensure_users_exist(&state, &referenced).await?;

    let repo = ProjectRepository::new(state.pool.clone());
    let id = repo
        .create(&NewProject {
            title: request.title.trim(),
            description: request.description.trim(),
            domain: request.domain,
            lead_id,
            status: request.status.unwrap_or_default(),
            created_by: creator.id,
            team: &team,
        })
        .await
        .map_err(map_project_write_error)?;

    info!(project_id = %id, user_id = %creator.id, "Project created");

    let detail = repo.find_detail(id).await?.ok_or_else(project_not_found)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Edit a project.
///
/// PUT /api/projects/:id
///
/// Requires a session; only the creator or an Admin may edit. A new `team`
/// replaces the old one.
async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let repo = ProjectRepository::new(state.pool.clone());

    // Ownership before validation, so strangers learn nothing about the body
    let entity = repo.find(id).await?.ok_or_else(project_not_found)?;
    if !Project::from(&entity).can_edit(user.id, user.role) {
        return Err(ApiError::Forbidden(
            "Not authorized to update this project".to_string(),
        ));
    }

    request.validate()?;

    let team = request.team.as_deref().map(dedup_team);
    let mut referenced = team.clone().unwrap_or_default();
    if let Some(lead) = request.lead {
        referenced.push(lead);
    }
    ensure_users_exist(&state, &dedup_team(&referenced)).await?;

    let changes = ProjectChanges {
        title: request.title.map(|t| t.trim().to_string()),
        description: request.description.map(|d| d.trim().to_string()),
        domain: request.domain,
        lead_id: request.lead,
        status: request.status,
        team,
    };

    let updated = repo
        .update(id, &changes)
        .await
        .map_err(map_project_write_error)?;
    if !updated {
        return Err(project_not_found());
    }

    info!(project_id = %id, user_id = %user.id, "Project updated");

    let detail = repo.find_detail(id).await?.ok_or_else(project_not_found)?;
    Ok(Json(detail))
}

/// Delete a project with its team and suggestions.
///
/// DELETE /api/projects/:id
///
/// Requires Admin.
async fn delete_project(
    State(state): State<AppState>,
    guard: RoleGuard<ProjectDeleters>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = ProjectRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(project_not_found());
    }
    info!(project_id = %id, user_id = %guard.user.id, "Project removed");
    Ok(Json(json!({ "message": "Project removed" })))
}

/// Leave a suggestion on a project.
///
/// POST /api/projects/:id/suggestions
///
/// Requires Admin, Head or Alumni. Returns the project's whole thread,
/// newest first.
async fn add_suggestion(
    State(state): State<AppState>,
    guard: RoleGuard<Suggesters>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<AddSuggestionRequest>,
) -> Result<(StatusCode, Json<Vec<Suggestion>>), ApiError> {
    request.validate()?;

    let repo = ProjectRepository::new(state.pool.clone());
    if repo.find(id).await?.is_none() {
        return Err(project_not_found());
    }

    let thread = repo
        .add_suggestion(id, guard.user.id, request.text.trim())
        .await?;

    info!(project_id = %id, user_id = %guard.user.id, "Suggestion added");
    Ok((StatusCode::CREATED, Json(thread)))
}
