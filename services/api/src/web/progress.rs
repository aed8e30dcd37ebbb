//! services/api/src/web/progress.rs
//!
//! Completion toggling and the cross-course continue-learning endpoint.
//! Everything here requires a signed-in user.
//!
//! Both completion handlers return the freshly recomputed course progress -
//! the client never has to (and must not) maintain its own tally; an
//! optimistic UI can reconcile against this response.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::catalog::ProgressDto;
use crate::web::state::AppState;
use opencourse_core::domain::User;
use opencourse_core::ordering::resolve_sequence;
use opencourse_core::ports::PortError;
use opencourse_core::progress::compute_progress;
use opencourse_core::resume::{resolve_resume, ResumeTarget};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CompletionResponse {
    pub lesson_id: Uuid,
    pub completed: bool,
    pub progress: ProgressDto,
}

/// Where "continue learning" should take the viewer. `lesson_id` is absent
/// when everything they touched is finished and they land on the course page
/// instead.
#[derive(Serialize, ToSchema)]
pub struct ContinueTargetDto {
    pub course_slug: String,
    pub lesson_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct ContinueResponse {
    pub target: Option<ContinueTargetDto>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Recomputes course progress after a completion mutation. Always reads
/// back from storage; there is no cached copy to invalidate.
async fn progress_for_course(
    state: &AppState,
    user_id: Uuid,
    course_slug: &str,
    course_id: Uuid,
) -> Result<ProgressDto, ApiError> {
    let tree = state.catalog.get_course_tree(course_slug).await?;
    let sequence = resolve_sequence(&tree);
    let completed = state
        .completions
        .completed_lesson_ids(user_id, course_id)
        .await?;
    let p = compute_progress(&sequence, &completed);
    Ok(ProgressDto {
        completed_count: p.completed_count,
        total: p.total,
        percent: p.percent,
        next_lesson_id: p.next_lesson_id,
    })
}

/// Completion toggles only make sense for lessons a learner can see.
async fn published_lesson_guard(state: &AppState, lesson_id: Uuid) -> Result<(), ApiError> {
    let lesson = state.catalog.get_lesson(lesson_id).await?;
    if !lesson.is_published() {
        return Err(ApiError::Port(PortError::NotFound(format!(
            "Lesson {} not found",
            lesson_id
        ))));
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /lessons/{lesson_id}/completion - mark a lesson completed.
///
/// Idempotent: completing an already-completed lesson changes nothing.
#[utoipa::path(
    post,
    path = "/lessons/{lesson_id}/completion",
    params(("lesson_id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson marked completed", body = CompletionResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Lesson not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mark_completed_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(lesson_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    published_lesson_guard(&state, lesson_id).await?;
    let course = state.catalog.course_of_lesson(lesson_id).await?;

    state.completions.mark_completed(user.user_id, lesson_id).await?;

    let progress = progress_for_course(&state, user.user_id, &course.slug, course.id).await?;
    Ok(Json(CompletionResponse {
        lesson_id,
        completed: true,
        progress,
    }))
}

/// DELETE /lessons/{lesson_id}/completion - unmark a completion.
///
/// Idempotent: unmarking a lesson that was never completed is a no-op.
#[utoipa::path(
    delete,
    path = "/lessons/{lesson_id}/completion",
    params(("lesson_id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Completion removed", body = CompletionResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Lesson not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn unmark_completed_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(lesson_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    published_lesson_guard(&state, lesson_id).await?;
    let course = state.catalog.course_of_lesson(lesson_id).await?;

    state
        .completions
        .unmark_completed(user.user_id, lesson_id)
        .await?;

    let progress = progress_for_course(&state, user.user_id, &course.slug, course.id).await?;
    Ok(Json(CompletionResponse {
        lesson_id,
        completed: false,
        progress,
    }))
}

/// GET /continue - the single best course and lesson to resume.
#[utoipa::path(
    get,
    path = "/continue",
    responses(
        (status = 200, description = "Resume target, if any", body = ContinueResponse),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn continue_learning_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.completions.resume_rows(user.user_id).await?;

    let target = resolve_resume(&rows).map(|target| match target {
        ResumeTarget::Lesson {
            course_slug,
            lesson_id,
        } => ContinueTargetDto {
            course_slug,
            lesson_id: Some(lesson_id),
        },
        ResumeTarget::Course { course_slug } => ContinueTargetDto {
            course_slug,
            lesson_id: None,
        },
    });

    Ok(Json(ContinueResponse { target }))
}
