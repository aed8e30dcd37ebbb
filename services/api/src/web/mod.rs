//! services/api/src/web/mod.rs
//!
//! The HTTP surface: route handlers, middlewares, shared state, and the
//! master OpenAPI definition.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod middleware;
pub mod progress;
pub mod state;
pub mod upload;

use utoipa::OpenApi;

pub use middleware::{load_viewer, require_admin, require_auth};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        catalog::list_courses_handler,
        catalog::course_detail_handler,
        catalog::lesson_view_handler,
        progress::mark_completed_handler,
        progress::unmark_completed_handler,
        progress::continue_learning_handler,
        admin::create_course_handler,
        admin::update_course_handler,
        admin::delete_course_handler,
        admin::admin_course_detail_handler,
        admin::create_chapter_handler,
        admin::update_chapter_handler,
        admin::delete_chapter_handler,
        admin::create_course_lesson_handler,
        admin::create_chapter_lesson_handler,
        admin::update_lesson_handler,
        admin::delete_lesson_handler,
        admin::reorder_chapters_handler,
        admin::reorder_course_lessons_handler,
        admin::reorder_chapter_lessons_handler,
        upload::upload_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            catalog::CourseDto,
            catalog::CourseSummary,
            catalog::ProgressSummary,
            catalog::ProgressDto,
            catalog::LessonSummaryDto,
            catalog::ChapterDto,
            catalog::SequenceEntryDto,
            catalog::CourseDetailResponse,
            catalog::LessonViewResponse,
            progress::CompletionResponse,
            progress::ContinueTargetDto,
            progress::ContinueResponse,
            admin::CreateCourseRequest,
            admin::UpdateCourseRequest,
            admin::CreateChapterRequest,
            admin::UpdateChapterRequest,
            admin::CreateLessonRequest,
            admin::UpdateLessonRequest,
            admin::ReorderRequest,
            admin::AdminLessonDto,
            admin::AdminChapterDto,
            admin::AdminCourseDetailResponse,
            upload::UploadResponse,
        )
    ),
    tags(
        (name = "opencourse API", description = "Course catalog, lesson gating, and progress tracking.")
    )
)]
pub struct ApiDoc;
