//! Meeting scheduling routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use domain::models::meeting::CreateMeetingRequest;
use domain::models::project::dedup_team;
use domain::models::Meeting;
use persistence::repositories::{MeetingRepository, NewMeeting, UserRepository};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, CurrentUser, MeetingOrganizers, RoleGuard};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meetings).post(create_meeting))
        .route("/:id", delete(delete_meeting))
}

fn meeting_not_found() -> ApiError {
    ApiError::NotFound("Meeting not found".to_string())
}

/// Meetings the caller organizes or attends, earliest first.
///
/// GET /api/meetings
async fn list_meetings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Meeting>>, ApiError> {
    let meetings = MeetingRepository::new(state.pool.clone())
        .list_for_user(user.id)
        .await?;
    Ok(Json(meetings))
}

/// Schedule a meeting.
///
/// POST /api/meetings
///
/// Requires Admin or Head. The caller becomes the organizer; participants
/// are de-duplicated and must all exist. `endTime` may not precede
/// `startTime`.
async fn create_meeting(
    State(state): State<AppState>,
    guard: RoleGuard<MeetingOrganizers>,
    ApiJson(request): ApiJson<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<Meeting>), ApiError> {
    request.validate()?;

    let participants = dedup_team(&request.participants);
    if !participants.is_empty() {
        let found = UserRepository::new(state.pool.clone())
            .count_existing(&participants)
            .await?;
        if found != participants.len() as i64 {
            return Err(ApiError::Validation(
                "One or more participants do not exist".to_string(),
            ));
        }
    }

    let repo = MeetingRepository::new(state.pool.clone());
    let id = repo
        .create(&NewMeeting {
            title: request.title.trim(),
            meeting_type: request.meeting_type,
            topic: request.details.topic.trim(),
            location: request.details.location.trim(),
            agenda: request.details.agenda.as_deref(),
            start_time: request.start_time,
            end_time: request.end_time,
            organized_by: guard.user.id,
            participants: &participants,
        })
        .await?;

    info!(
        meeting_id = %id,
        user_id = %guard.user.id,
        participants = participants.len(),
        "Meeting scheduled"
    );

    let meeting = repo.find(id).await?.ok_or_else(meeting_not_found)?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

/// Cancel a meeting.
///
/// DELETE /api/meetings/:id
///
/// Requires a session; only the organizer or an Admin may delete.
async fn delete_meeting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let repo = MeetingRepository::new(state.pool.clone());

    let meeting = repo.find(id).await?.ok_or_else(meeting_not_found)?;
    if !meeting.can_delete(user.id, user.role) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this meeting".to_string(),
        ));
    }

    if !repo.delete(id).await? {
        return Err(meeting_not_found());
    }

    info!(meeting_id = %id, user_id = %user.id, "Meeting removed");
    Ok(Json(json!({ "message": "Meeting removed" })))
}
