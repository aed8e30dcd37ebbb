//! crates/opencourse_core/src/ordering.rs
//!
//! Flattens a course tree into the single learner-facing lesson sequence:
//! chapters by position, each contributing its published lessons by position,
//! followed by the course's standalone published lessons by position.
//!
//! The access gate's "is this the first lesson" check is positional, so this
//! ordering must match the navigation sidebar exactly. Ties on `position`
//! break by creation time, then id, which keeps the sequence stable across
//! requests.

use std::collections::HashSet;

use crate::domain::{CourseTree, Lesson};

/// Produces the ordered, deduplicated sequence of published lessons for a
/// course. Deterministic and total: no lesson is lost or duplicated, and an
/// empty tree yields an empty sequence.
pub fn resolve_sequence(tree: &CourseTree) -> Vec<Lesson> {
    let mut chapters: Vec<_> = tree.chapters.iter().collect();
    chapters.sort_by(|a, b| {
        (a.chapter.position, a.chapter.created_at, a.chapter.id).cmp(&(
            b.chapter.position,
            b.chapter.created_at,
            b.chapter.id,
        ))
    });

    let mut sequence = Vec::new();
    let mut seen = HashSet::new();

    for node in chapters {
        for lesson in published_in_order(&node.lessons) {
            if seen.insert(lesson.id) {
                sequence.push(lesson.clone());
            }
        }
    }
    for lesson in published_in_order(&tree.standalone) {
        if seen.insert(lesson.id) {
            sequence.push(lesson.clone());
        }
    }

    sequence
}

/// The published lessons of one sibling scope, in sidebar order.
fn published_in_order(lessons: &[Lesson]) -> Vec<&Lesson> {
    let mut published: Vec<_> = lessons.iter().filter(|l| l.is_published()).collect();
    published.sort_by(|a, b| {
        (a.position, a.created_at, a.id).cmp(&(b.position, b.created_at, b.id))
    });
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Audience, Chapter, ChapterNode, Course, LessonKind, LessonStatus,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn course(slug: &str) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: slug.to_string(),
            language: None,
            description: None,
            poster_url: None,
            audience: Audience::Premium,
            created_at: now,
            updated_at: now,
        }
    }

    fn chapter(course_id: Uuid, slug: &str, position: i32) -> Chapter {
        let now = Utc::now();
        Chapter {
            id: Uuid::new_v4(),
            course_id,
            slug: slug.to_string(),
            title: slug.to_string(),
            description: None,
            poster_url: None,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    fn lesson(slug: &str, position: i32, status: LessonStatus) -> Lesson {
        let now = Utc::now();
        Lesson {
            id: Uuid::new_v4(),
            course_id: None,
            chapter_id: None,
            slug: slug.to_string(),
            title: slug.to_string(),
            description: None,
            content: None,
            content_json: None,
            video_url: None,
            kind: LessonKind::Text,
            status,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_course_yields_empty_sequence() {
        let tree = CourseTree {
            course: course("empty"),
            chapters: vec![],
            standalone: vec![],
        };
        assert!(resolve_sequence(&tree).is_empty());
    }

    #[test]
    fn chapters_come_before_standalone_lessons() {
        // The spanish-101 scenario: chapter "basics" with L1 (position 0)
        // and L2 (position 1), plus standalone L3 (position 0).
        let c = course("spanish-101");
        let basics = chapter(c.id, "basics", 0);
        let l1 = lesson("l1", 0, LessonStatus::Published);
        let l2 = lesson("l2", 1, LessonStatus::Published);
        let l3 = lesson("l3", 0, LessonStatus::Published);

        let tree = CourseTree {
            course: c,
            chapters: vec![ChapterNode {
                chapter: basics,
                lessons: vec![l2.clone(), l1.clone()],
            }],
            standalone: vec![l3.clone()],
        };

        let sequence = resolve_sequence(&tree);
        let slugs: Vec<_> = sequence.iter().map(|l| l.slug.as_str()).collect();
        assert_eq!(slugs, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn chapter_positions_order_the_sequence() {
        let c = course("c");
        let late = chapter(c.id, "late", 10);
        let early = chapter(c.id, "early", 2);

        let tree = CourseTree {
            course: c,
            chapters: vec![
                ChapterNode {
                    chapter: late,
                    lessons: vec![lesson("b", 0, LessonStatus::Published)],
                },
                ChapterNode {
                    chapter: early,
                    lessons: vec![lesson("a", 7, LessonStatus::Published)],
                },
            ],
            standalone: vec![],
        };

        let slugs: Vec<_> = resolve_sequence(&tree)
            .iter()
            .map(|l| l.slug.clone())
            .collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[test]
    fn unpublished_lessons_are_excluded() {
        let c = course("c");
        let ch = chapter(c.id, "ch", 0);
        let tree = CourseTree {
            course: c,
            chapters: vec![ChapterNode {
                chapter: ch,
                lessons: vec![
                    lesson("draft", 0, LessonStatus::Draft),
                    lesson("live", 1, LessonStatus::Published),
                    lesson("gone", 2, LessonStatus::Archived),
                ],
            }],
            standalone: vec![lesson("hidden", 0, LessonStatus::Draft)],
        };

        let sequence = resolve_sequence(&tree);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence[0].slug, "live");
    }

    #[test]
    fn duplicate_lessons_appear_once() {
        let c = course("c");
        let ch = chapter(c.id, "ch", 0);
        let l = lesson("dup", 0, LessonStatus::Published);

        let tree = CourseTree {
            course: c,
            chapters: vec![ChapterNode {
                chapter: ch,
                lessons: vec![l.clone()],
            }],
            standalone: vec![l],
        };

        assert_eq!(resolve_sequence(&tree).len(), 1);
    }

    #[test]
    fn position_ties_break_deterministically() {
        let c = course("c");
        let ch = chapter(c.id, "ch", 0);
        let mut a = lesson("a", 3, LessonStatus::Published);
        let mut b = lesson("b", 3, LessonStatus::Published);
        // Same position, distinct creation times: older wins.
        b.created_at = a.created_at + chrono::Duration::seconds(5);
        a.created_at = b.created_at - chrono::Duration::seconds(10);

        let tree = CourseTree {
            course: c,
            chapters: vec![ChapterNode {
                chapter: ch,
                lessons: vec![b.clone(), a.clone()],
            }],
            standalone: vec![],
        };

        let first = &resolve_sequence(&tree)[0];
        assert_eq!(first.slug, "a");
    }
}
