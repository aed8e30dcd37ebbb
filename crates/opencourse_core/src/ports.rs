//! crates/opencourse_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases,
//! entitlement providers, or file storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{
    Chapter, ChapterUpdate, Course, CourseTree, CourseUpdate, Lesson, LessonParent, LessonUpdate,
    NewChapter, NewCourse, NewLesson, User, UserCredentials,
};
use crate::resume::ResumeRow;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g.,
/// database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for user accounts and browser login sessions.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a session cookie value to the user it belongs to.
    /// Expired or unknown sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<User>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Persistence for the course/chapter/lesson hierarchy.
///
/// Referential integrity lives with the implementation: deleting a course
/// cascades to its chapters and lessons, deleting a chapter cascades its
/// lessons, deleting a lesson cascades its completions.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Courses ---
    async fn create_course(&self, new: NewCourse) -> PortResult<Course>;
    async fn update_course(&self, course_id: Uuid, changes: CourseUpdate) -> PortResult<Course>;
    async fn delete_course(&self, course_id: Uuid) -> PortResult<()>;
    async fn list_courses(&self) -> PortResult<Vec<Course>>;
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;
    async fn get_course_by_slug(&self, slug: &str) -> PortResult<Course>;

    /// Loads a course with its chapters and all their lessons plus the
    /// course's standalone lessons, in one traversal-ready value.
    async fn get_course_tree(&self, slug: &str) -> PortResult<CourseTree>;

    // --- Chapters ---
    async fn create_chapter(&self, new: NewChapter) -> PortResult<Chapter>;
    async fn update_chapter(
        &self,
        chapter_id: Uuid,
        changes: ChapterUpdate,
    ) -> PortResult<Chapter>;
    async fn delete_chapter(&self, chapter_id: Uuid) -> PortResult<()>;

    // --- Lessons ---
    async fn create_lesson(&self, new: NewLesson) -> PortResult<Lesson>;
    async fn update_lesson(&self, lesson_id: Uuid, changes: LessonUpdate) -> PortResult<Lesson>;
    async fn delete_lesson(&self, lesson_id: Uuid) -> PortResult<()>;
    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    /// Resolves the course a lesson ultimately belongs to, following the
    /// chapter indirection when needed.
    async fn course_of_lesson(&self, lesson_id: Uuid) -> PortResult<Course>;

    /// Published-lesson count per course, for the catalog listing.
    async fn published_lesson_counts(&self) -> PortResult<Vec<(Uuid, i64)>>;

    // --- Reordering ---
    /// Rewrites chapter positions to match the given id order.
    async fn reorder_chapters(&self, course_id: Uuid, ordered: &[Uuid]) -> PortResult<()>;

    /// Rewrites lesson positions within one sibling scope to match the
    /// given id order.
    async fn reorder_lessons(&self, parent: LessonParent, ordered: &[Uuid]) -> PortResult<()>;
}

/// Persistence for the per-(user, lesson) completion facts.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// All lessons within the course the user has completed.
    async fn completed_lesson_ids(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<HashSet<Uuid>>;

    /// Idempotent: completing an already-completed lesson changes nothing
    /// observable and must not error.
    async fn mark_completed(&self, user_id: Uuid, lesson_id: Uuid) -> PortResult<()>;

    /// Idempotent: unmarking a non-completed lesson is a no-op.
    async fn unmark_completed(&self, user_id: Uuid, lesson_id: Uuid) -> PortResult<()>;

    /// Every published lesson across every course, tagged with the user's
    /// completion state, in the canonical traversal order consumed by
    /// [`crate::resume::resolve_resume`].
    async fn resume_rows(&self, user_id: Uuid) -> PortResult<Vec<ResumeRow>>;
}

/// External premium entitlement check.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Returns whether the email holds an active subscription.
    ///
    /// Fail-closed by contract: implementations absorb timeouts and
    /// transport failures and answer `false`; degradation never surfaces
    /// to the learner as an error.
    async fn is_active_subscriber(&self, email: &str) -> bool;
}

/// Stores an uploaded file and returns its publicly reachable URL.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> PortResult<String>;
}
