//! crates/opencourse_core/src/progress.rs
//!
//! Derives completion count, percentage, and the "next lesson to resume"
//! from the resolved sequence and the viewer's completed-lesson set.
//!
//! Callers recompute this after every mark/unmark; nothing here (or anywhere
//! else) caches it.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::Lesson;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    pub completed_count: usize,
    pub total: usize,
    /// `round(100 * completed / total)`, 0 for an empty sequence.
    pub percent: u8,
    /// First lesson in sequence order not yet completed; `None` when the
    /// course is finished or has no published lessons.
    pub next_lesson_id: Option<Uuid>,
}

pub fn compute_progress(sequence: &[Lesson], completed: &HashSet<Uuid>) -> CourseProgress {
    let completed_count = sequence
        .iter()
        .filter(|lesson| completed.contains(&lesson.id))
        .count();

    let percent = if sequence.is_empty() {
        0
    } else {
        ((completed_count * 100) as f64 / sequence.len() as f64).round() as u8
    };

    let next_lesson_id = sequence
        .iter()
        .find(|lesson| !completed.contains(&lesson.id))
        .map(|lesson| lesson.id);

    CourseProgress {
        completed_count,
        total: sequence.len(),
        percent,
        next_lesson_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LessonKind, LessonStatus};
    use chrono::Utc;

    fn lesson(position: i32) -> Lesson {
        let now = Utc::now();
        Lesson {
            id: Uuid::new_v4(),
            course_id: None,
            chapter_id: None,
            slug: format!("lesson-{position}"),
            title: format!("Lesson {position}"),
            description: None,
            content: None,
            content_json: None,
            video_url: None,
            kind: LessonKind::Text,
            status: LessonStatus::Published,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_sequence_is_zero_percent_with_no_next() {
        let progress = compute_progress(&[], &HashSet::new());
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.completed_count, 0);
        assert_eq!(progress.next_lesson_id, None);
    }

    #[test]
    fn two_of_four_is_fifty_percent() {
        let sequence: Vec<_> = (0..4).map(lesson).collect();
        let completed: HashSet<_> = [sequence[0].id, sequence[2].id].into();

        let progress = compute_progress(&sequence, &completed);
        assert_eq!(progress.completed_count, 2);
        assert_eq!(progress.percent, 50);
        // Next is the first uncompleted lesson in order, not an arbitrary one.
        assert_eq!(progress.next_lesson_id, Some(sequence[1].id));
    }

    #[test]
    fn one_of_three_rounds_to_thirty_three() {
        let sequence: Vec<_> = (0..3).map(lesson).collect();
        let completed: HashSet<_> = [sequence[0].id].into();

        let progress = compute_progress(&sequence, &completed);
        assert_eq!(progress.completed_count, 1);
        assert_eq!(progress.percent, 33);
        assert_eq!(progress.next_lesson_id, Some(sequence[1].id));
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let sequence: Vec<_> = (0..3).map(lesson).collect();
        let completed: HashSet<_> = [sequence[0].id, sequence[1].id].into();
        assert_eq!(compute_progress(&sequence, &completed).percent, 67);
    }

    #[test]
    fn fully_completed_course_has_no_next_lesson() {
        let sequence: Vec<_> = (0..2).map(lesson).collect();
        let completed: HashSet<_> = sequence.iter().map(|l| l.id).collect();

        let progress = compute_progress(&sequence, &completed);
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.next_lesson_id, None);
    }

    #[test]
    fn completions_outside_the_sequence_do_not_count() {
        let sequence: Vec<_> = (0..2).map(lesson).collect();
        let completed: HashSet<_> = [Uuid::new_v4()].into();

        let progress = compute_progress(&sequence, &completed);
        assert_eq!(progress.completed_count, 0);
        assert_eq!(progress.next_lesson_id, Some(sequence[0].id));
    }
}
