//! Durable storage for students, courses, grades and users.
//!
//! Handlers only see the [`LedgerStore`] trait; the concrete backend is chosen
//! at startup (`LEDGER_BACKEND`) and injected through `AppState`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

mod memory;
pub mod models;
mod postgres;
mod schema;

pub use memory::MemoryLedger;
pub use models::{
    CascadeOutcome, Course, CoursePatch, Grade, GradeFilter, GradePatch, Role, Student,
    StudentPatch, User,
};
pub use postgres::PgLedger;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    /// Releases backend resources on shutdown.
    async fn close(&self) {}

    // --- students ---
    async fn insert_student(&self, student: &Student) -> StoreResult<()>;
    /// All students ordered by `student_id`.
    async fn list_students(&self) -> StoreResult<Vec<Student>>;
    async fn find_student(&self, student_id: &str) -> StoreResult<Option<Student>>;
    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> StoreResult<Student>;
    /// Removes the student and every grade referencing it.
    async fn delete_student(&self, student_id: &str) -> StoreResult<CascadeOutcome>;
    async fn count_students(&self) -> StoreResult<u64>;

    // --- courses ---
    async fn insert_course(&self, course: &Course) -> StoreResult<()>;
    /// All courses ordered by `course_id`.
    async fn list_courses(&self) -> StoreResult<Vec<Course>>;
    async fn find_course(&self, course_id: &str) -> StoreResult<Option<Course>>;
    async fn update_course(&self, course_id: &str, patch: &CoursePatch) -> StoreResult<Course>;
    /// Removes the course and every grade referencing it.
    async fn delete_course(&self, course_id: &str) -> StoreResult<CascadeOutcome>;
    async fn count_courses(&self) -> StoreResult<u64>;

    // --- grades ---
    async fn insert_grade(&self, grade: &Grade) -> StoreResult<()>;
    /// Matching grades in insertion order.
    async fn list_grades(&self, filter: &GradeFilter) -> StoreResult<Vec<Grade>>;
    async fn find_grade(&self, id: Uuid) -> StoreResult<Option<Grade>>;
    async fn update_grade(&self, id: Uuid, patch: &GradePatch) -> StoreResult<Grade>;
    async fn delete_grade(&self, id: Uuid) -> StoreResult<()>;
    async fn count_grades(&self, filter: &GradeFilter) -> StoreResult<u64>;

    // --- users ---
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// All users ordered by username.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<u64>;
}
