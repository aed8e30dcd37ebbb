//! services/api/src/web/catalog.rs
//!
//! The learner-facing catalog: course listing, course detail with per-lesson
//! access decisions, and the gated lesson view.
//!
//! Anonymous browsing is allowed everywhere here; the access gate decides
//! per lesson what the viewer may open. The subscription check runs only
//! when a premium course is actually on screen, so free courses never pay
//! for the external call.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::MaybeViewer;
use crate::web::state::AppState;
use opencourse_core::access::{check_access, DenialReason};
use opencourse_core::domain::{Audience, Course, CourseTree, Lesson, User, Viewer};
use opencourse_core::ordering::resolve_sequence;
use opencourse_core::progress::compute_progress;
use opencourse_core::richtext::render_document;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CourseDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub audience: String,
}

impl CourseDto {
    pub(crate) fn from_domain(course: &Course) -> Self {
        Self {
            id: course.id,
            slug: course.slug.clone(),
            title: course.title.clone(),
            language: course.language.clone(),
            description: course.description.clone(),
            poster_url: course.poster_url.clone(),
            audience: audience_str(course.audience).to_string(),
        }
    }
}

/// One row of the course catalog.
#[derive(Serialize, ToSchema)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: CourseDto,
    pub lesson_count: i64,
    /// Present only for signed-in viewers.
    pub progress: Option<ProgressSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressSummary {
    pub completed_count: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressDto {
    pub completed_count: usize,
    pub total: usize,
    pub percent: u8,
    pub next_lesson_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct LessonSummaryDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub position: i32,
}

impl LessonSummaryDto {
    fn from_domain(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            slug: lesson.slug.clone(),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            kind: lesson.kind.to_string(),
            position: lesson.position,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChapterDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub position: i32,
    pub lessons: Vec<LessonSummaryDto>,
}

/// One entry of the resolved sequence, carrying the gate's verdict for the
/// current viewer.
#[derive(Serialize, ToSchema)]
pub struct SequenceEntryDto {
    pub lesson_id: Uuid,
    pub slug: String,
    pub title: String,
    pub kind: String,
    pub position: usize,
    pub allowed: bool,
    /// `"auth"` or `"subscription"` when locked.
    pub reason: Option<&'static str>,
    pub completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CourseDetailResponse {
    pub course: CourseDto,
    pub chapters: Vec<ChapterDto>,
    pub standalone_lessons: Vec<LessonSummaryDto>,
    pub sequence: Vec<SequenceEntryDto>,
    pub progress: Option<ProgressDto>,
}

/// The gated lesson view. Content fields are present only when the gate
/// allows the viewer in.
#[derive(Serialize, ToSchema)]
pub struct LessonViewResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub allowed: bool,
    pub reason: Option<&'static str>,
    pub content: Option<String>,
    pub content_html: Option<String>,
    pub video_url: Option<String>,
    pub completed: bool,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn audience_str(audience: Audience) -> &'static str {
    match audience {
        Audience::Free => "FREE",
        Audience::Premium => "PREMIUM",
    }
}

pub(crate) fn reason_str(reason: DenialReason) -> &'static str {
    match reason {
        DenialReason::Auth => "auth",
        DenialReason::Subscription => "subscription",
    }
}

/// Builds the request-scoped viewer for a course. The subscription service
/// is consulted only when the course is premium and the viewer is signed in;
/// it fails closed, so a degraded entitlement provider just locks premium
/// content.
async fn viewer_for_course(
    state: &AppState,
    user: Option<User>,
    course: &Course,
) -> Viewer {
    match user {
        None => Viewer::anonymous(),
        Some(user) => {
            let subscribed = if course.audience.is_free() {
                false
            } else {
                state.subscription.is_active_subscriber(&user.email).await
            };
            Viewer::signed_in(user, subscribed)
        }
    }
}

async fn completed_ids_for(
    state: &AppState,
    viewer: &Viewer,
    course_id: Uuid,
) -> Result<HashSet<Uuid>, ApiError> {
    match &viewer.identity {
        Some(user) => Ok(state
            .completions
            .completed_lesson_ids(user.user_id, course_id)
            .await?),
        None => Ok(HashSet::new()),
    }
}

fn sequence_entries(
    tree: &CourseTree,
    sequence: &[Lesson],
    viewer: &Viewer,
    completed: &HashSet<Uuid>,
) -> Vec<SequenceEntryDto> {
    sequence
        .iter()
        .enumerate()
        .map(|(position, lesson)| {
            let decision = check_access(&tree.course, position, viewer);
            SequenceEntryDto {
                lesson_id: lesson.id,
                slug: lesson.slug.clone(),
                title: lesson.title.clone(),
                kind: lesson.kind.to_string(),
                position,
                allowed: decision.allowed,
                reason: decision.reason.map(reason_str),
                completed: completed.contains(&lesson.id),
            }
        })
        .collect()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the course catalog.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "Course catalog", body = [CourseSummary]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(MaybeViewer(user)): Extension<MaybeViewer>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = state.catalog.list_courses().await?;

    // One query either way: published counts for everyone, plus the
    // viewer's completions when signed in.
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    let mut completed: HashMap<Uuid, usize> = HashMap::new();
    match &user {
        Some(user) => {
            for row in state.completions.resume_rows(user.user_id).await? {
                *totals.entry(row.course_id).or_default() += 1;
                if row.completed_at.is_some() {
                    *completed.entry(row.course_id).or_default() += 1;
                }
            }
        }
        None => {
            for (course_id, count) in state.catalog.published_lesson_counts().await? {
                totals.insert(course_id, count);
            }
        }
    }

    let summaries: Vec<CourseSummary> = courses
        .iter()
        .map(|course| {
            let total = totals.get(&course.id).copied().unwrap_or(0);
            let progress = user.as_ref().map(|_| {
                let done = completed.get(&course.id).copied().unwrap_or(0);
                ProgressSummary {
                    completed_count: done,
                    total: total as usize,
                    percent: if total == 0 {
                        0
                    } else {
                        ((done * 100) as f64 / total as f64).round() as u8
                    },
                }
            });
            CourseSummary {
                course: CourseDto::from_domain(course),
                lesson_count: total,
                progress,
            }
        })
        .collect();

    Ok(Json(summaries))
}

/// Course detail: metadata, chapters with their published lessons, and the
/// resolved sequence with per-lesson access decisions.
#[utoipa::path(
    get,
    path = "/courses/{slug}",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course detail", body = CourseDetailResponse),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn course_detail_handler(
    State(state): State<Arc<AppState>>,
    Extension(MaybeViewer(user)): Extension<MaybeViewer>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tree = state.catalog.get_course_tree(&slug).await?;
    let sequence = resolve_sequence(&tree);
    let viewer = viewer_for_course(&state, user, &tree.course).await;
    let completed = completed_ids_for(&state, &viewer, tree.course.id).await?;

    let chapters = tree
        .chapters
        .iter()
        .map(|node| ChapterDto {
            id: node.chapter.id,
            slug: node.chapter.slug.clone(),
            title: node.chapter.title.clone(),
            description: node.chapter.description.clone(),
            poster_url: node.chapter.poster_url.clone(),
            position: node.chapter.position,
            lessons: node
                .lessons
                .iter()
                .filter(|l| l.is_published())
                .map(LessonSummaryDto::from_domain)
                .collect(),
        })
        .collect();

    let standalone_lessons = tree
        .standalone
        .iter()
        .filter(|l| l.is_published())
        .map(LessonSummaryDto::from_domain)
        .collect();

    let progress = viewer
        .is_authenticated()
        .then(|| {
            let p = compute_progress(&sequence, &completed);
            ProgressDto {
                completed_count: p.completed_count,
                total: p.total,
                percent: p.percent,
                next_lesson_id: p.next_lesson_id,
            }
        });

    let response = CourseDetailResponse {
        course: CourseDto::from_domain(&tree.course),
        chapters,
        standalone_lessons,
        sequence: sequence_entries(&tree, &sequence, &viewer, &completed),
        progress,
    };
    Ok(Json(response))
}

/// Gated lesson view.
#[utoipa::path(
    get,
    path = "/courses/{slug}/lessons/{lesson_slug}",
    params(
        ("slug" = String, Path, description = "Course slug"),
        ("lesson_slug" = String, Path, description = "Lesson slug")
    ),
    responses(
        (status = 200, description = "Lesson view, locked or open", body = LessonViewResponse),
        (status = 404, description = "Course or lesson not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn lesson_view_handler(
    State(state): State<Arc<AppState>>,
    Extension(MaybeViewer(user)): Extension<MaybeViewer>,
    Path((slug, lesson_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let tree = state.catalog.get_course_tree(&slug).await?;
    let sequence = resolve_sequence(&tree);

    // Unpublished lessons are indistinguishable from absent ones out here.
    let position = sequence
        .iter()
        .position(|lesson| lesson.slug == lesson_slug)
        .ok_or_else(|| {
            ApiError::Port(opencourse_core::ports::PortError::NotFound(format!(
                "Lesson {} not found",
                lesson_slug
            )))
        })?;
    let lesson = &sequence[position];

    let viewer = viewer_for_course(&state, user, &tree.course).await;
    let completed = completed_ids_for(&state, &viewer, tree.course.id).await?;
    let decision = check_access(&tree.course, position, &viewer);

    let (content, content_html, video_url) = if decision.allowed {
        (
            lesson.content.clone(),
            lesson.content_json.as_ref().map(render_document),
            lesson.video_url.clone(),
        )
    } else {
        (None, None, None)
    };

    let response = LessonViewResponse {
        id: lesson.id,
        slug: lesson.slug.clone(),
        title: lesson.title.clone(),
        description: lesson.description.clone(),
        kind: lesson.kind.to_string(),
        allowed: decision.allowed,
        reason: decision.reason.map(reason_str),
        content,
        content_html,
        video_url,
        completed: completed.contains(&lesson.id),
    };
    Ok(Json(response))
}
