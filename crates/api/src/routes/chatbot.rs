//! AI page summaries.

use axum::{extract::State, routing::post, Json, Router};
use domain::models::summary::{
    build_prompt, describe_meeting, describe_project, PageType, SummarizeRequest,
    SummarizeResponse,
};
use persistence::repositories::{MeetingRepository, ProjectRepository};
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, CurrentUser};
use crate::services::SummarizeError;

pub fn router() -> Router<AppState> {
    Router::new().route("/summarize", post(summarize))
}

fn map_summarize_error(err: SummarizeError) -> ApiError {
    match err {
        SummarizeError::NotConfigured => {
            ApiError::ServiceUnavailable("Summaries are not available right now".to_string())
        }
        other => {
            warn!(error = %other, "Summary generation failed");
            ApiError::BadGateway(other.to_string())
        }
    }
}

/// Summarize a project or meeting page with the language model.
///
/// POST /api/chatbot/summarize
///
/// Requires a session. `pageType` is `project` or `meeting`. A missing API
/// key gives 503 and an upstream failure 502.
async fn summarize(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let page_type: PageType = request.page_type.parse().map_err(ApiError::Validation)?;

    // Load the page and flatten it into plain text for the prompt
    let description = match page_type {
        PageType::Project => {
            let project = ProjectRepository::new(state.pool.clone())
                .find_detail(request.page_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Project not found.".to_string()))?;
            describe_project(&project)
        }
        PageType::Meeting => {
            let meeting = MeetingRepository::new(state.pool.clone())
                .find(request.page_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Meeting not found.".to_string()))?;
            describe_meeting(&meeting)
        }
    };

    let summary = state
        .summarizer
        .summarize(&build_prompt(&description))
        .await
        .map_err(map_summarize_error)?;

    info!(
        user_id = %user.id,
        page_id = %request.page_id,
        page_type = ?page_type,
        "Summary generated"
    );
    Ok(Json(SummarizeResponse { summary }))
}
