//! crates/opencourse_core/src/resume.rs
//!
//! The cross-course continue-learning resolver: for a signed-in viewer, pick
//! the single best course and lesson to resume across the whole catalog.
//!
//! Courses are walked in a canonical order - creation time, then slug, then
//! id - so the "first course encountered" policy does not depend on database
//! row order. Within a course the walk follows chapter position (standalone
//! lessons last), then lesson position, then lesson id.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One published lesson somewhere in the catalog, tagged with its owning
/// course and the viewer's completion of it. Produced by
/// [`crate::ports::CompletionStore::resume_rows`].
#[derive(Debug, Clone)]
pub struct ResumeRow {
    pub course_id: Uuid,
    pub course_slug: String,
    pub course_created_at: DateTime<Utc>,
    pub chapter_id: Option<Uuid>,
    pub chapter_position: Option<i32>,
    pub lesson_id: Uuid,
    pub lesson_position: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Where the learner should land when they hit "continue learning".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeTarget {
    /// Resume at a specific lesson.
    Lesson { course_slug: String, lesson_id: Uuid },
    /// Everything is finished; land on the course page and let its own
    /// default routing pick a lesson.
    Course { course_slug: String },
}

/// Resolves the resume target:
///
/// 1. the first incomplete lesson of the first course (canonical order)
///    holding one;
/// 2. otherwise, the course containing the most recent completion, slug only;
/// 3. otherwise (empty catalog, no completions), nothing.
pub fn resolve_resume(rows: &[ResumeRow]) -> Option<ResumeTarget> {
    let mut ordered: Vec<_> = rows.iter().collect();
    ordered.sort_by(|a, b| traversal_key(a).cmp(&traversal_key(b)));

    if let Some(row) = ordered.iter().find(|row| row.completed_at.is_none()) {
        return Some(ResumeTarget::Lesson {
            course_slug: row.course_slug.clone(),
            lesson_id: row.lesson_id,
        });
    }

    // Every lesson completed: fall back to the course with the latest
    // completion. Walking in canonical order with a strict comparison keeps
    // timestamp ties deterministic (earliest canonical course wins).
    let mut best: Option<(&ResumeRow, DateTime<Utc>)> = None;
    for row in &ordered {
        if let Some(at) = row.completed_at {
            if best.map_or(true, |(_, best_at)| at > best_at) {
                best = Some((row, at));
            }
        }
    }
    best.map(|(row, _)| ResumeTarget::Course {
        course_slug: row.course_slug.clone(),
    })
}

type TraversalKey<'a> = (
    DateTime<Utc>,
    &'a str,
    Uuid,
    // Standalone lessons (no chapter) sort after every chapter.
    bool,
    Option<i32>,
    Option<Uuid>,
    i32,
    Uuid,
);

fn traversal_key(row: &ResumeRow) -> TraversalKey<'_> {
    (
        row.course_created_at,
        row.course_slug.as_str(),
        row.course_id,
        row.chapter_id.is_none(),
        row.chapter_position,
        row.chapter_id,
        row.lesson_position,
        row.lesson_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    struct CourseFixture {
        id: Uuid,
        slug: String,
        created_at: DateTime<Utc>,
    }

    fn course(slug: &str, created_offset_days: i64) -> CourseFixture {
        CourseFixture {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            created_at: base_time() + Duration::days(created_offset_days),
        }
    }

    fn row(
        course: &CourseFixture,
        chapter: Option<(Uuid, i32)>,
        lesson_position: i32,
        completed_at: Option<DateTime<Utc>>,
    ) -> ResumeRow {
        ResumeRow {
            course_id: course.id,
            course_slug: course.slug.clone(),
            course_created_at: course.created_at,
            chapter_id: chapter.map(|(id, _)| id),
            chapter_position: chapter.map(|(_, pos)| pos),
            lesson_id: Uuid::new_v4(),
            lesson_position,
            completed_at,
        }
    }

    #[test]
    fn empty_catalog_has_no_resume_target() {
        assert_eq!(resolve_resume(&[]), None);
    }

    #[test]
    fn untouched_catalog_resumes_at_the_very_first_lesson() {
        let a = course("a", 0);
        let rows = vec![row(&a, None, 1, None), row(&a, None, 0, None)];

        match resolve_resume(&rows).unwrap() {
            ResumeTarget::Lesson {
                course_slug,
                lesson_id,
            } => {
                assert_eq!(course_slug, "a");
                assert_eq!(lesson_id, rows[1].lesson_id);
            }
            other => panic!("expected a lesson target, got {other:?}"),
        }
    }

    #[test]
    fn finished_course_yields_to_an_untouched_one() {
        // Viewer completed all of course A; course B has lessons but no
        // completions. Resume lands on B's first lesson.
        let a = course("a", 0);
        let b = course("b", 1);
        let done = Some(base_time() + Duration::hours(1));

        let rows = vec![
            row(&a, None, 0, done),
            row(&a, None, 1, done),
            row(&b, None, 0, None),
            row(&b, None, 1, None),
        ];

        match resolve_resume(&rows).unwrap() {
            ResumeTarget::Lesson {
                course_slug,
                lesson_id,
            } => {
                assert_eq!(course_slug, "b");
                assert_eq!(lesson_id, rows[2].lesson_id);
            }
            other => panic!("expected a lesson target, got {other:?}"),
        }
    }

    #[test]
    fn partially_completed_course_resumes_at_its_first_gap() {
        let a = course("a", 0);
        let chapter_id = Uuid::new_v4();
        let done = Some(base_time() + Duration::hours(1));

        // Chapter lesson completed, second chapter lesson not, standalone not.
        let rows = vec![
            row(&a, Some((chapter_id, 0)), 0, done),
            row(&a, Some((chapter_id, 0)), 1, None),
            row(&a, None, 0, None),
        ];

        match resolve_resume(&rows).unwrap() {
            ResumeTarget::Lesson { lesson_id, .. } => assert_eq!(lesson_id, rows[1].lesson_id),
            other => panic!("expected a lesson target, got {other:?}"),
        }
    }

    #[test]
    fn standalone_lessons_sort_after_chapter_lessons() {
        let a = course("a", 0);
        let chapter_id = Uuid::new_v4();
        let done = Some(base_time() + Duration::hours(1));

        // Standalone lesson incomplete, chapter lesson incomplete: the
        // chapter lesson wins even though the standalone has position 0.
        let rows = vec![
            row(&a, None, 0, None),
            row(&a, Some((chapter_id, 3)), 5, None),
            row(&a, Some((chapter_id, 3)), 2, done),
        ];

        match resolve_resume(&rows).unwrap() {
            ResumeTarget::Lesson { lesson_id, .. } => assert_eq!(lesson_id, rows[1].lesson_id),
            other => panic!("expected a lesson target, got {other:?}"),
        }
    }

    #[test]
    fn everything_finished_falls_back_to_most_recent_completion() {
        let a = course("a", 0);
        let b = course("b", 1);

        let rows = vec![
            row(&a, None, 0, Some(base_time() + Duration::hours(2))),
            row(&b, None, 0, Some(base_time() + Duration::hours(5))),
            row(&b, None, 1, Some(base_time() + Duration::hours(3))),
        ];

        assert_eq!(
            resolve_resume(&rows).unwrap(),
            ResumeTarget::Course {
                course_slug: "b".to_string()
            }
        );
    }

    #[test]
    fn course_order_is_by_creation_time_not_row_order() {
        let newer = course("newer", 5);
        let older = course("older", 0);

        // Rows arrive with the newer course first; the older course must
        // still be walked first.
        let rows = vec![row(&newer, None, 0, None), row(&older, None, 0, None)];

        match resolve_resume(&rows).unwrap() {
            ResumeTarget::Lesson { course_slug, .. } => assert_eq!(course_slug, "older"),
            other => panic!("expected a lesson target, got {other:?}"),
        }
    }
}
