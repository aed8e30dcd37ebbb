//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `AuthStore`, `CatalogStore`, and `CompletionStore`
//! ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.
//!
//! Queries use the runtime API with `FromRow` record structs mapped into
//! domain types, so the build does not need a live database. Schema shape is
//! guaranteed by the migrations applied at startup; a mismatch fails fast
//! there instead of degrading per column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use opencourse_core::domain::{
    Audience, Chapter, ChapterNode, ChapterUpdate, Course, CourseTree, CourseUpdate, Lesson,
    LessonKind, LessonParent, LessonStatus, LessonUpdate, NewChapter, NewCourse, NewLesson, User,
    UserCredentials,
};
use opencourse_core::ports::{
    AuthStore, CatalogStore, CompletionStore, PortError, PortResult,
};
use opencourse_core::resume::ResumeRow;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a sqlx error onto the port taxonomy: missing rows become `NotFound`,
/// unique violations become `Conflict`, foreign-key violations on inserts
/// become `NotFound` (the referenced row is gone), everything else is
/// `Unexpected`.
fn map_db_err(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => PortError::Conflict(format!("{} already exists", what)),
            Some("23503") => PortError::NotFound(format!("{} not found", what)),
            _ => PortError::Unexpected(e.to_string()),
        },
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const COURSE_COLS: &str =
    "id, slug, title, language, description, poster_url, audience, created_at, updated_at";

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    slug: String,
    title: String,
    language: Option<String>,
    description: Option<String>,
    poster_url: Option<String>,
    audience: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRecord {
    fn into_domain(self) -> Course {
        Course {
            id: self.id,
            slug: self.slug,
            title: self.title,
            language: self.language,
            description: self.description,
            poster_url: self.poster_url,
            // NULL audience means premium.
            audience: match self.audience.as_deref() {
                Some("FREE") => Audience::Free,
                _ => Audience::Premium,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CHAPTER_COLS: &str =
    "id, course_id, slug, title, description, poster_url, position, created_at, updated_at";

#[derive(FromRow)]
struct ChapterRecord {
    id: Uuid,
    course_id: Uuid,
    slug: String,
    title: String,
    description: Option<String>,
    poster_url: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChapterRecord {
    fn into_domain(self) -> Chapter {
        Chapter {
            id: self.id,
            course_id: self.course_id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            poster_url: self.poster_url,
            position: self.position,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const LESSON_COLS: &str = "id, course_id, chapter_id, slug, title, description, content, \
     content_json, video_url, kind, status, position, created_at, updated_at";

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    course_id: Option<Uuid>,
    chapter_id: Option<Uuid>,
    slug: String,
    title: String,
    description: Option<String>,
    content: Option<String>,
    content_json: Option<serde_json::Value>,
    video_url: Option<String>,
    kind: String,
    status: String,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LessonRecord {
    fn into_domain(self) -> Lesson {
        Lesson {
            id: self.id,
            course_id: self.course_id,
            chapter_id: self.chapter_id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            content: self.content,
            content_json: self.content_json,
            video_url: self.video_url,
            kind: LessonKind::from(self.kind.as_str()),
            status: LessonStatus::from(self.status.as_str()),
            position: self.position,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}

impl UserRecord {
    fn into_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct ResumeRowRecord {
    course_id: Uuid,
    course_slug: String,
    course_created_at: DateTime<Utc>,
    chapter_id: Option<Uuid>,
    chapter_position: Option<i32>,
    lesson_id: Uuid,
    lesson_position: i32,
    completed_at: Option<DateTime<Utc>>,
}

impl ResumeRowRecord {
    fn into_domain(self) -> ResumeRow {
        ResumeRow {
            course_id: self.course_id,
            course_slug: self.course_slug,
            course_created_at: self.course_created_at,
            chapter_id: self.chapter_id,
            chapter_position: self.chapter_position,
            lesson_id: self.lesson_id,
            lesson_position: self.lesson_position,
            completed_at: self.completed_at,
        }
    }
}

fn audience_column(audience: Audience) -> Option<&'static str> {
    match audience {
        Audience::Free => Some("FREE"),
        Audience::Premium => None,
    }
}

//=========================================================================================
// `AuthStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "User"))?;
        Ok(record.into_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "User"))?;
        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "Auth session"))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.user_id, u.email FROM auth_sessions s \
             JOIN users u ON u.user_id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.into_domain())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "INSERT INTO courses (id, slug, title, language, description, poster_url, audience) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COURSE_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.language)
        .bind(&new.description)
        .bind(&new.poster_url)
        .bind(audience_column(new.audience))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Course slug"))?;
        Ok(record.into_domain())
    }

    async fn update_course(&self, course_id: Uuid, changes: CourseUpdate) -> PortResult<Course> {
        // Audience toggles to NULL for premium, which COALESCE cannot
        // express; it gets its own statement when present.
        if let Some(audience) = changes.audience {
            sqlx::query("UPDATE courses SET audience = $2, updated_at = now() WHERE id = $1")
                .bind(course_id)
                .bind(audience_column(audience))
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_err(e, "Course"))?;
        }

        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "UPDATE courses SET \
                slug = COALESCE($2, slug), \
                title = COALESCE($3, title), \
                language = COALESCE($4, language), \
                description = COALESCE($5, description), \
                poster_url = COALESCE($6, poster_url), \
                updated_at = now() \
             WHERE id = $1 RETURNING {COURSE_COLS}"
        ))
        .bind(course_id)
        .bind(&changes.slug)
        .bind(&changes.title)
        .bind(&changes.language)
        .bind(&changes.description)
        .bind(&changes.poster_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Course"))?;
        Ok(record.into_domain())
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        // Chapters, lessons, and completions go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Course {} not found", course_id)));
        }
        Ok(())
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLS} FROM courses ORDER BY created_at ASC, slug ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(CourseRecord::into_domain).collect())
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Course {}", course_id)))?;
        Ok(record.into_domain())
    }

    async fn get_course_by_slug(&self, slug: &str) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLS} FROM courses WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Course {}", slug)))?;
        Ok(record.into_domain())
    }

    async fn get_course_tree(&self, slug: &str) -> PortResult<CourseTree> {
        let course = self.get_course_by_slug(slug).await?;

        let chapters = sqlx::query_as::<_, ChapterRecord>(&format!(
            "SELECT {CHAPTER_COLS} FROM chapters WHERE course_id = $1 \
             ORDER BY position ASC, created_at ASC, id ASC"
        ))
        .bind(course.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let lessons = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT l.{} FROM lessons l \
             LEFT JOIN chapters ch ON l.chapter_id = ch.id \
             WHERE l.course_id = $1 OR ch.course_id = $1 \
             ORDER BY l.position ASC, l.created_at ASC, l.id ASC",
            LESSON_COLS.replace(", ", ", l.")
        ))
        .bind(course.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Bucket lessons under their chapter; the rest are standalone.
        let mut by_chapter: HashMap<Uuid, Vec<Lesson>> = HashMap::new();
        let mut standalone = Vec::new();
        for record in lessons {
            let lesson = record.into_domain();
            match lesson.chapter_id {
                Some(chapter_id) => by_chapter.entry(chapter_id).or_default().push(lesson),
                None => standalone.push(lesson),
            }
        }

        let chapters = chapters
            .into_iter()
            .map(|record| {
                let chapter = record.into_domain();
                let lessons = by_chapter.remove(&chapter.id).unwrap_or_default();
                ChapterNode { chapter, lessons }
            })
            .collect();

        Ok(CourseTree {
            course,
            chapters,
            standalone,
        })
    }

    async fn create_chapter(&self, new: NewChapter) -> PortResult<Chapter> {
        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "INSERT INTO chapters (id, course_id, slug, title, description, poster_url, position) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM chapters WHERE course_id = $2)) \
             RETURNING {CHAPTER_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.course_id)
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.poster_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Chapter"))?;
        Ok(record.into_domain())
    }

    async fn update_chapter(
        &self,
        chapter_id: Uuid,
        changes: ChapterUpdate,
    ) -> PortResult<Chapter> {
        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "UPDATE chapters SET \
                slug = COALESCE($2, slug), \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                poster_url = COALESCE($5, poster_url), \
                updated_at = now() \
             WHERE id = $1 RETURNING {CHAPTER_COLS}"
        ))
        .bind(chapter_id)
        .bind(&changes.slug)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.poster_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Chapter"))?;
        Ok(record.into_domain())
    }

    async fn delete_chapter(&self, chapter_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Chapter {} not found",
                chapter_id
            )));
        }
        Ok(())
    }

    async fn create_lesson(&self, new: NewLesson) -> PortResult<Lesson> {
        let (course_id, chapter_id) = match new.parent {
            LessonParent::Course(id) => (Some(id), None),
            LessonParent::Chapter(id) => (None, Some(id)),
        };

        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "INSERT INTO lessons \
                (id, course_id, chapter_id, slug, title, description, content, content_json, \
                 video_url, kind, status, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'DRAFT', \
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM lessons \
                  WHERE course_id IS NOT DISTINCT FROM $2 \
                    AND chapter_id IS NOT DISTINCT FROM $3)) \
             RETURNING {LESSON_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(chapter_id)
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.content)
        .bind(&new.content_json)
        .bind(&new.video_url)
        .bind(new.kind.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Lesson"))?;
        Ok(record.into_domain())
    }

    async fn update_lesson(&self, lesson_id: Uuid, changes: LessonUpdate) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "UPDATE lessons SET \
                slug = COALESCE($2, slug), \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                content = COALESCE($5, content), \
                content_json = COALESCE($6, content_json), \
                video_url = COALESCE($7, video_url), \
                kind = COALESCE($8, kind), \
                status = COALESCE($9, status), \
                updated_at = now() \
             WHERE id = $1 RETURNING {LESSON_COLS}"
        ))
        .bind(lesson_id)
        .bind(&changes.slug)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.content)
        .bind(&changes.content_json)
        .bind(&changes.video_url)
        .bind(changes.kind.map(|k| k.to_string()))
        .bind(changes.status.map(|s| s.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Lesson"))?;
        Ok(record.into_domain())
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Lesson {} not found",
                lesson_id
            )));
        }
        Ok(())
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {LESSON_COLS} FROM lessons WHERE id = $1"
        ))
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Lesson {}", lesson_id)))?;
        Ok(record.into_domain())
    }

    async fn course_of_lesson(&self, lesson_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT co.{} FROM lessons l \
             LEFT JOIN chapters ch ON l.chapter_id = ch.id \
             JOIN courses co ON co.id = COALESCE(l.course_id, ch.course_id) \
             WHERE l.id = $1",
            COURSE_COLS.replace(", ", ", co.")
        ))
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Lesson {}", lesson_id)))?;
        Ok(record.into_domain())
    }

    async fn reorder_chapters(&self, course_id: Uuid, ordered: &[Uuid]) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE chapters SET position = u.ord - 1, updated_at = now() \
             FROM (SELECT * FROM unnest($2::uuid[]) WITH ORDINALITY AS t(id, ord)) u \
             WHERE chapters.id = u.id AND chapters.course_id = $1",
        )
        .bind(course_id)
        .bind(ordered.to_vec())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() != ordered.len() as u64 {
            return Err(PortError::NotFound(
                "One or more chapters do not belong to the course".to_string(),
            ));
        }
        Ok(())
    }

    async fn reorder_lessons(&self, parent: LessonParent, ordered: &[Uuid]) -> PortResult<()> {
        let (sql, scope_id) = match parent {
            LessonParent::Course(id) => (
                "UPDATE lessons SET position = u.ord - 1, updated_at = now() \
                 FROM (SELECT * FROM unnest($2::uuid[]) WITH ORDINALITY AS t(id, ord)) u \
                 WHERE lessons.id = u.id AND lessons.course_id = $1",
                id,
            ),
            LessonParent::Chapter(id) => (
                "UPDATE lessons SET position = u.ord - 1, updated_at = now() \
                 FROM (SELECT * FROM unnest($2::uuid[]) WITH ORDINALITY AS t(id, ord)) u \
                 WHERE lessons.id = u.id AND lessons.chapter_id = $1",
                id,
            ),
        };

        let result = sqlx::query(sql)
            .bind(scope_id)
            .bind(ordered.to_vec())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() != ordered.len() as u64 {
            return Err(PortError::NotFound(
                "One or more lessons do not belong to the scope".to_string(),
            ));
        }
        Ok(())
    }

    async fn published_lesson_counts(&self) -> PortResult<Vec<(Uuid, i64)>> {
        // DISTINCT because the chapter join fans out standalone lessons.
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT co.id, COUNT(DISTINCT l.id) FROM courses co \
             LEFT JOIN chapters ch ON ch.course_id = co.id \
             LEFT JOIN lessons l \
                ON (l.course_id = co.id OR l.chapter_id = ch.id) AND l.status = 'PUBLISHED' \
             GROUP BY co.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(rows)
    }
}

//=========================================================================================
// `CompletionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionStore for DbAdapter {
    async fn completed_lesson_ids(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT lc.lesson_id FROM lesson_completions lc \
             JOIN lessons l ON l.id = lc.lesson_id \
             LEFT JOIN chapters ch ON l.chapter_id = ch.id \
             WHERE lc.user_id = $1 AND COALESCE(l.course_id, ch.course_id) = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(ids.into_iter().collect())
    }

    async fn mark_completed(&self, user_id: Uuid, lesson_id: Uuid) -> PortResult<()> {
        // The unique constraint makes repeat completions a no-op rather
        // than an error.
        sqlx::query(
            "INSERT INTO lesson_completions (user_id, lesson_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, lesson_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(lesson_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Lesson"))?;
        Ok(())
    }

    async fn unmark_completed(&self, user_id: Uuid, lesson_id: Uuid) -> PortResult<()> {
        // Deleting an absent completion is a no-op by design of DELETE.
        sqlx::query("DELETE FROM lesson_completions WHERE user_id = $1 AND lesson_id = $2")
            .bind(user_id)
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn resume_rows(&self, user_id: Uuid) -> PortResult<Vec<ResumeRow>> {
        let records = sqlx::query_as::<_, ResumeRowRecord>(
            "SELECT co.id AS course_id, co.slug AS course_slug, \
                    co.created_at AS course_created_at, \
                    ch.id AS chapter_id, ch.position AS chapter_position, \
                    l.id AS lesson_id, l.position AS lesson_position, \
                    lc.completed_at \
             FROM lessons l \
             LEFT JOIN chapters ch ON l.chapter_id = ch.id \
             JOIN courses co ON co.id = COALESCE(l.course_id, ch.course_id) \
             LEFT JOIN lesson_completions lc \
                ON lc.lesson_id = l.id AND lc.user_id = $1 \
             WHERE l.status = 'PUBLISHED' \
             ORDER BY co.created_at ASC, co.slug ASC, co.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records
            .into_iter()
            .map(ResumeRowRecord::into_domain)
            .collect())
    }
}
