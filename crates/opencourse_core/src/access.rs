//! crates/opencourse_core/src/access.rs
//!
//! The access gate: decides, per lesson, whether the current viewer may open
//! it. Pure predicate; the HTTP layer is responsible for turning a denial
//! reason into a sign-in or subscribe redirect.
//!
//! The gate applies to the learner surface only. The authoring surface sits
//! behind its own admin check and never consults it.

use crate::domain::{Course, Viewer};

/// Why a lesson is locked for the current viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Viewer must sign in.
    Auth,
    /// Viewer must hold an active subscription.
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
}

impl AccessDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluates the gate for the lesson at `position` in the course's resolved
/// sequence.
///
/// Rules, in order:
/// 1. the first lesson in the sequence is the free preview - always open;
/// 2. everything past it requires sign-in;
/// 3. premium courses additionally require an active subscription.
pub fn check_access(course: &Course, position: usize, viewer: &Viewer) -> AccessDecision {
    if position == 0 {
        return AccessDecision::allowed();
    }
    if !viewer.is_authenticated() {
        return AccessDecision::denied(DenialReason::Auth);
    }
    if !course.audience.is_free() && !viewer.subscribed {
        return AccessDecision::denied(DenialReason::Subscription);
    }
    AccessDecision::allowed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Audience, User};
    use chrono::Utc;
    use uuid::Uuid;

    fn course(audience: Audience) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            slug: "spanish-101".to_string(),
            title: "Spanish 101".to_string(),
            language: Some("es".to_string()),
            description: None,
            poster_url: None,
            audience,
            created_at: now,
            updated_at: now,
        }
    }

    fn signed_in(subscribed: bool) -> Viewer {
        Viewer::signed_in(
            User {
                user_id: Uuid::new_v4(),
                email: "learner@example.com".to_string(),
            },
            subscribed,
        )
    }

    #[test]
    fn first_lesson_is_open_to_everyone() {
        let premium = course(Audience::Premium);
        for viewer in [Viewer::anonymous(), signed_in(false), signed_in(true)] {
            let decision = check_access(&premium, 0, &viewer);
            assert!(decision.allowed);
            assert_eq!(decision.reason, None);
        }
    }

    #[test]
    fn anonymous_viewer_is_asked_to_sign_in_past_the_preview() {
        let free = course(Audience::Free);
        let decision = check_access(&free, 1, &Viewer::anonymous());
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenialReason::Auth));
    }

    #[test]
    fn free_course_is_fully_open_to_any_signed_in_viewer() {
        let free = course(Audience::Free);
        for viewer in [signed_in(false), signed_in(true)] {
            for position in 1..5 {
                assert!(check_access(&free, position, &viewer).allowed);
            }
        }
    }

    #[test]
    fn premium_course_requires_a_subscription_past_the_preview() {
        let premium = course(Audience::Premium);
        let decision = check_access(&premium, 3, &signed_in(false));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenialReason::Subscription));

        assert!(check_access(&premium, 3, &signed_in(true)).allowed);
    }
}
