pub mod access;
pub mod domain;
pub mod ordering;
pub mod ports;
pub mod progress;
pub mod resume;
pub mod richtext;

pub use access::{check_access, AccessDecision, DenialReason};
pub use domain::{
    Audience, AuthSession, Chapter, ChapterNode, Course, CourseTree, Lesson, LessonCompletion,
    LessonKind, LessonParent, LessonStatus, User, UserCredentials, Viewer,
};
pub use ordering::resolve_sequence;
pub use ports::{
    AuthStore, CatalogStore, CompletionStore, FileStorage, PortError, PortResult,
    SubscriptionService,
};
pub use progress::{compute_progress, CourseProgress};
pub use resume::{resolve_resume, ResumeRow, ResumeTarget};
pub use richtext::render_document;
