//! crates/opencourse_core/src/domain.rs
//!
//! Defines the pure, core data structures for the course catalog.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Course-level audience flag.
///
/// `Free` courses are open to any signed-in viewer. `Premium` courses
/// require an active subscription for everything past the first lesson.
/// The database stores this as a nullable text column where `NULL`
/// means premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Free,
    Premium,
}

impl Audience {
    pub fn is_free(self) -> bool {
        matches!(self, Audience::Free)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonKind {
    Video,
    Text,
}

impl From<&str> for LessonKind {
    fn from(s: &str) -> Self {
        match s {
            "VIDEO" => Self::Video,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for LessonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "VIDEO"),
            Self::Text => write!(f, "TEXT"),
        }
    }
}

/// Lifecycle state of a lesson. Only `Published` lessons are visible on
/// the learner surface; the authoring surface sees all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Draft,
    Published,
    Archived,
}

impl From<&str> for LessonStatus {
    fn from(s: &str) -> Self {
        match s {
            "PUBLISHED" => Self::Published,
            "ARCHIVED" => Self::Archived,
            _ => Self::Draft,
        }
    }
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Published => write!(f, "PUBLISHED"),
            Self::Archived => write!(f, "ARCHIVED"),
        }
    }
}

/// A course as authored by an administrator.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub audience: Audience,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chapter grouping lessons inside a course. `position` orders
/// chapters within their course; it is not required to be contiguous.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A lesson. Exactly one of `course_id` (standalone lesson) or
/// `chapter_id` is set; the database enforces this with a CHECK
/// constraint. `position` orders a lesson among siblings sharing the
/// same parent.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub chapter_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub kind: LessonKind,
    pub status: LessonStatus,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn is_published(&self) -> bool {
        self.status == LessonStatus::Published
    }
}

/// A course together with its chapters (each carrying its own lessons)
/// and its standalone lessons, as loaded in one shot for the learner
/// surface.
#[derive(Debug, Clone)]
pub struct CourseTree {
    pub course: Course,
    pub chapters: Vec<ChapterNode>,
    pub standalone: Vec<Lesson>,
}

#[derive(Debug, Clone)]
pub struct ChapterNode {
    pub chapter: Chapter,
    pub lessons: Vec<Lesson>,
}

/// A single completion fact: this user finished this lesson at this
/// time. Unique per (user, lesson); unmarking deletes the row outright.
#[derive(Debug, Clone)]
pub struct LessonCompletion {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

// Represents a user - used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The resolved request-scoped viewer: who is looking at the learner
/// surface, and whether they hold an active subscription. Never
/// persisted.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub identity: Option<User>,
    pub subscribed: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            subscribed: false,
        }
    }

    pub fn signed_in(user: User, subscribed: bool) -> Self {
        Self {
            identity: Some(user),
            subscribed,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

// ----- Mutation payloads for the catalog port -----
//
// `None` in an update struct means "leave the field unchanged".

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub slug: String,
    pub title: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub audience: Audience,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub audience: Option<Audience>,
}

#[derive(Debug, Clone)]
pub struct NewChapter {
    pub course_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChapterUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
}

/// Where a new lesson is attached: directly on a course, or inside a
/// chapter. Doubles as the sibling scope for reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonParent {
    Course(Uuid),
    Chapter(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub parent: LessonParent,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub kind: LessonKind,
}

#[derive(Debug, Clone, Default)]
pub struct LessonUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub video_url: Option<String>,
    pub kind: Option<LessonKind>,
    pub status: Option<LessonStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_status_round_trips_through_text() {
        for status in [
            LessonStatus::Draft,
            LessonStatus::Published,
            LessonStatus::Archived,
        ] {
            assert_eq!(LessonStatus::from(status.to_string().as_str()), status);
        }
    }

    #[test]
    fn unknown_status_text_falls_back_to_draft() {
        assert_eq!(LessonStatus::from("bogus"), LessonStatus::Draft);
    }

    #[test]
    fn anonymous_viewer_is_not_authenticated() {
        let viewer = Viewer::anonymous();
        assert!(!viewer.is_authenticated());
        assert!(!viewer.subscribed);
    }
}
