//! services/api/src/web/admin.rs
//!
//! The authoring surface: course/chapter/lesson CRUD and drag-and-drop
//! reordering. Mounted behind `require_admin`; the access gate does not
//! apply here, so admins see drafts and archived lessons too.
//!
//! Input validation happens before any persistence attempt; duplicate slugs
//! surface as 409 from the unique constraint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::catalog::CourseDto;
use crate::web::state::AppState;
use opencourse_core::domain::{
    Audience, ChapterUpdate, CourseUpdate, Lesson, LessonKind, LessonParent, LessonStatus,
    LessonUpdate, NewChapter, NewCourse, NewLesson,
};

//=========================================================================================
// Validation
//=========================================================================================

fn slug_pattern() -> &'static Regex {
    static SLUG_RE: OnceLock<Regex> = OnceLock::new();
    SLUG_RE.get_or_init(|| Regex::new("^[a-z0-9-]+$").expect("slug pattern is valid"))
}

fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug_pattern().is_match(slug) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Slug '{}' must match [a-z0-9-]+",
            slug
        )))
    }
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().len() < 2 {
        return Err(ApiError::Validation(
            "Title must be at least 2 characters".to_string(),
        ));
    }
    Ok(())
}

fn parse_audience(raw: Option<&str>) -> Result<Audience, ApiError> {
    match raw {
        None | Some("PREMIUM") => Ok(Audience::Premium),
        Some("FREE") => Ok(Audience::Free),
        Some(other) => Err(ApiError::Validation(format!(
            "Unknown audience '{}', expected FREE or PREMIUM",
            other
        ))),
    }
}

fn parse_kind(raw: Option<&str>) -> Result<LessonKind, ApiError> {
    match raw {
        None | Some("TEXT") => Ok(LessonKind::Text),
        Some("VIDEO") => Ok(LessonKind::Video),
        Some(other) => Err(ApiError::Validation(format!(
            "Unknown lesson kind '{}', expected VIDEO or TEXT",
            other
        ))),
    }
}

fn parse_status(raw: &str) -> Result<LessonStatus, ApiError> {
    match raw {
        "DRAFT" => Ok(LessonStatus::Draft),
        "PUBLISHED" => Ok(LessonStatus::Published),
        "ARCHIVED" => Ok(LessonStatus::Archived),
        other => Err(ApiError::Validation(format!(
            "Unknown lesson status '{}', expected DRAFT, PUBLISHED or ARCHIVED",
            other
        ))),
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub slug: String,
    pub title: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    /// `FREE` or `PREMIUM`; defaults to `PREMIUM`.
    pub audience: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub audience: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateChapterRequest {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateChapterRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLessonRequest {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    /// `VIDEO` or `TEXT`; defaults to `TEXT`. New lessons start as drafts.
    pub kind: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLessonRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub kind: Option<String>,
    /// `DRAFT`, `PUBLISHED` or `ARCHIVED`.
    pub status: Option<String>,
}

/// The full ordered id list for one sibling scope; positions are rewritten
/// to the list index.
#[derive(Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub ordered: Vec<Uuid>,
}

/// The authoring view of a lesson: includes drafts, raw content, and status.
#[derive(Serialize, ToSchema)]
pub struct AdminLessonDto {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub chapter_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub kind: String,
    pub status: String,
    pub position: i32,
}

impl AdminLessonDto {
    fn from_domain(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            chapter_id: lesson.chapter_id,
            slug: lesson.slug.clone(),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            content: lesson.content.clone(),
            content_json: lesson.content_json.clone(),
            video_url: lesson.video_url.clone(),
            kind: lesson.kind.to_string(),
            status: lesson.status.to_string(),
            position: lesson.position,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AdminChapterDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub position: i32,
    pub lessons: Vec<AdminLessonDto>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminCourseDetailResponse {
    pub course: CourseDto,
    pub chapters: Vec<AdminChapterDto>,
    pub standalone_lessons: Vec<AdminLessonDto>,
}

//=========================================================================================
// Course Handlers
//=========================================================================================

/// POST /admin/courses - create a course.
#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created"),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Slug already exists"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_slug(&req.slug)?;
    validate_title(&req.title)?;
    let audience = parse_audience(req.audience.as_deref())?;

    let course = state
        .catalog
        .create_course(NewCourse {
            slug: req.slug,
            title: req.title,
            language: req.language,
            description: req.description,
            poster_url: req.poster_url,
            audience,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CourseDto::from_domain(&course))))
}

/// PATCH /admin/courses/{course_id} - update course metadata.
#[utoipa::path(
    patch,
    path = "/admin/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Slug already exists"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
    }
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    let audience = match &req.audience {
        Some(raw) => Some(parse_audience(Some(raw.as_str()))?),
        None => None,
    };

    let course = state
        .catalog
        .update_course(
            course_id,
            CourseUpdate {
                slug: req.slug,
                title: req.title,
                language: req.language,
                description: req.description,
                poster_url: req.poster_url,
                audience,
            },
        )
        .await?;
    Ok(Json(CourseDto::from_domain(&course)))
}

/// DELETE /admin/courses/{course_id} - delete a course and everything in it.
#[utoipa::path(
    delete,
    path = "/admin/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_course(course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/courses/{course_id} - the full tree, drafts included.
#[utoipa::path(
    get,
    path = "/admin/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Full course tree", body = AdminCourseDetailResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn admin_course_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let course = state.catalog.get_course(course_id).await?;
    let tree = state.catalog.get_course_tree(&course.slug).await?;

    let chapters = tree
        .chapters
        .iter()
        .map(|node| AdminChapterDto {
            id: node.chapter.id,
            slug: node.chapter.slug.clone(),
            title: node.chapter.title.clone(),
            description: node.chapter.description.clone(),
            poster_url: node.chapter.poster_url.clone(),
            position: node.chapter.position,
            lessons: node.lessons.iter().map(AdminLessonDto::from_domain).collect(),
        })
        .collect();

    let response = AdminCourseDetailResponse {
        course: CourseDto::from_domain(&tree.course),
        chapters,
        standalone_lessons: tree
            .standalone
            .iter()
            .map(AdminLessonDto::from_domain)
            .collect(),
    };
    Ok(Json(response))
}

//=========================================================================================
// Chapter Handlers
//=========================================================================================

/// POST /admin/courses/{course_id}/chapters - append a chapter.
#[utoipa::path(
    post,
    path = "/admin/courses/{course_id}/chapters",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = CreateChapterRequest,
    responses(
        (status = 201, description = "Chapter created"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Slug already exists in the course"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_chapter_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_slug(&req.slug)?;
    validate_title(&req.title)?;

    let chapter = state
        .catalog
        .create_chapter(NewChapter {
            course_id,
            slug: req.slug,
            title: req.title,
            description: req.description,
            poster_url: req.poster_url,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AdminChapterDto {
            id: chapter.id,
            slug: chapter.slug,
            title: chapter.title,
            description: chapter.description,
            poster_url: chapter.poster_url,
            position: chapter.position,
            lessons: vec![],
        }),
    ))
}

/// PATCH /admin/chapters/{chapter_id} - update chapter metadata.
#[utoipa::path(
    patch,
    path = "/admin/chapters/{chapter_id}",
    params(("chapter_id" = Uuid, Path, description = "Chapter id")),
    request_body = UpdateChapterRequest,
    responses(
        (status = 200, description = "Chapter updated"),
        (status = 404, description = "Chapter not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_chapter_handler(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<Uuid>,
    Json(req): Json<UpdateChapterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
    }
    if let Some(title) = &req.title {
        validate_title(title)?;
    }

    let chapter = state
        .catalog
        .update_chapter(
            chapter_id,
            ChapterUpdate {
                slug: req.slug,
                title: req.title,
                description: req.description,
                poster_url: req.poster_url,
            },
        )
        .await?;
    Ok(Json(AdminChapterDto {
        id: chapter.id,
        slug: chapter.slug,
        title: chapter.title,
        description: chapter.description,
        poster_url: chapter.poster_url,
        position: chapter.position,
        lessons: vec![],
    }))
}

/// DELETE /admin/chapters/{chapter_id} - delete a chapter and its lessons.
#[utoipa::path(
    delete,
    path = "/admin/chapters/{chapter_id}",
    params(("chapter_id" = Uuid, Path, description = "Chapter id")),
    responses(
        (status = 204, description = "Chapter deleted"),
        (status = 404, description = "Chapter not found")
    )
)]
pub async fn delete_chapter_handler(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_chapter(chapter_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Lesson Handlers
//=========================================================================================

async fn create_lesson(
    state: &AppState,
    parent: LessonParent,
    req: CreateLessonRequest,
) -> Result<Lesson, ApiError> {
    validate_slug(&req.slug)?;
    validate_title(&req.title)?;
    let kind = parse_kind(req.kind.as_deref())?;

    Ok(state
        .catalog
        .create_lesson(NewLesson {
            parent,
            slug: req.slug,
            title: req.title,
            description: req.description,
            content: req.content,
            content_json: req.content_json,
            video_url: req.video_url,
            kind,
        })
        .await?)
}

/// POST /admin/courses/{course_id}/lessons - append a standalone lesson.
#[utoipa::path(
    post,
    path = "/admin/courses/{course_id}/lessons",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created"),
        (status = 404, description = "Course not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_course_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = create_lesson(&state, LessonParent::Course(course_id), req).await?;
    Ok((StatusCode::CREATED, Json(AdminLessonDto::from_domain(&lesson))))
}

/// POST /admin/chapters/{chapter_id}/lessons - append a lesson to a chapter.
#[utoipa::path(
    post,
    path = "/admin/chapters/{chapter_id}/lessons",
    params(("chapter_id" = Uuid, Path, description = "Chapter id")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created"),
        (status = 404, description = "Chapter not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_chapter_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<Uuid>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = create_lesson(&state, LessonParent::Chapter(chapter_id), req).await?;
    Ok((StatusCode::CREATED, Json(AdminLessonDto::from_domain(&lesson))))
}

/// PATCH /admin/lessons/{lesson_id} - update a lesson, including publishing.
#[utoipa::path(
    patch,
    path = "/admin/lessons/{lesson_id}",
    params(("lesson_id" = Uuid, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated"),
        (status = 404, description = "Lesson not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
    }
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    let kind = match &req.kind {
        Some(raw) => Some(parse_kind(Some(raw.as_str()))?),
        None => None,
    };
    let status = match &req.status {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };

    let lesson = state
        .catalog
        .update_lesson(
            lesson_id,
            LessonUpdate {
                slug: req.slug,
                title: req.title,
                description: req.description,
                content: req.content,
                content_json: req.content_json,
                video_url: req.video_url,
                kind,
                status,
            },
        )
        .await?;
    Ok(Json(AdminLessonDto::from_domain(&lesson)))
}

/// DELETE /admin/lessons/{lesson_id} - delete a lesson and its completions.
#[utoipa::path(
    delete,
    path = "/admin/lessons/{lesson_id}",
    params(("lesson_id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn delete_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_lesson(lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Reorder Handlers (server side of drag-and-drop)
//=========================================================================================

/// PUT /admin/courses/{course_id}/chapters/order
#[utoipa::path(
    put,
    path = "/admin/courses/{course_id}/chapters/order",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Chapters reordered"),
        (status = 404, description = "An id does not belong to the course")
    )
)]
pub async fn reorder_chapters_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.reorder_chapters(course_id, &req.ordered).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/courses/{course_id}/lessons/order - standalone lessons.
#[utoipa::path(
    put,
    path = "/admin/courses/{course_id}/lessons/order",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Lessons reordered"),
        (status = 404, description = "An id does not belong to the course")
    )
)]
pub async fn reorder_course_lessons_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .catalog
        .reorder_lessons(LessonParent::Course(course_id), &req.ordered)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/chapters/{chapter_id}/lessons/order
#[utoipa::path(
    put,
    path = "/admin/chapters/{chapter_id}/lessons/order",
    params(("chapter_id" = Uuid, Path, description = "Chapter id")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Lessons reordered"),
        (status = 404, description = "An id does not belong to the chapter")
    )
)]
pub async fn reorder_chapter_lessons_handler(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .catalog
        .reorder_lessons(LessonParent::Chapter(chapter_id), &req.ordered)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_must_be_lowercase_kebab() {
        assert!(validate_slug("spanish-101").is_ok());
        assert!(validate_slug("a").is_ok());
        assert!(validate_slug("Spanish-101").is_err());
        assert!(validate_slug("spanish_101").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("spanish 101").is_err());
    }

    #[test]
    fn titles_need_two_characters_after_trimming() {
        assert!(validate_title("Es").is_ok());
        assert!(validate_title(" a ").is_err());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn audience_parsing_is_strict() {
        assert_eq!(parse_audience(None).unwrap(), Audience::Premium);
        assert_eq!(parse_audience(Some("FREE")).unwrap(), Audience::Free);
        assert!(parse_audience(Some("free")).is_err());
    }

    #[test]
    fn status_parsing_is_strict() {
        assert_eq!(parse_status("PUBLISHED").unwrap(), LessonStatus::Published);
        assert!(parse_status("published").is_err());
        assert!(parse_status("LIVE").is_err());
    }
}
