use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CascadeOutcome, Course, CoursePatch, Grade, GradeFilter, GradePatch, LedgerStore, StoreResult,
    Student, StudentPatch, User,
};
use crate::error::StoreError;

#[derive(Default)]
struct Collections {
    students: BTreeMap<String, Student>,
    courses: BTreeMap<String, Course>,
    grades: Vec<Grade>, // insertion order
    users: BTreeMap<String, User>,
}

/// In-process ledger. Every operation, including the two-step cascade
/// delete, runs under a single lock acquisition.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Collections>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_student(&self, student: &Student) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.students.contains_key(&student.student_id) {
            return Err(StoreError::duplicate("student", &student.student_id));
        }
        db.students
            .insert(student.student_id.clone(), student.clone());
        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        Ok(self.inner.read().await.students.values().cloned().collect())
    }

    async fn find_student(&self, student_id: &str) -> StoreResult<Option<Student>> {
        Ok(self.inner.read().await.students.get(student_id).cloned())
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> StoreResult<Student> {
        let mut db = self.inner.write().await;
        let student = db
            .students
            .get_mut(student_id)
            .ok_or_else(|| StoreError::not_found("student", student_id))?;
        student.first_name = patch.first_name.clone();
        student.last_name = patch.last_name.clone();
        Ok(student.clone())
    }

    async fn delete_student(&self, student_id: &str) -> StoreResult<CascadeOutcome> {
        let mut db = self.inner.write().await;
        if !db.students.contains_key(student_id) {
            return Err(StoreError::not_found("student", student_id));
        }
        let before = db.grades.len();
        db.grades.retain(|g| g.student_id != student_id);
        let deleted_grades = (before - db.grades.len()) as u64;
        db.students.remove(student_id);
        Ok(CascadeOutcome { deleted_grades })
    }

    async fn count_students(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.students.len() as u64)
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.courses.contains_key(&course.course_id) {
            return Err(StoreError::duplicate("course", &course.course_id));
        }
        db.courses.insert(course.course_id.clone(), course.clone());
        Ok(())
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.inner.read().await.courses.values().cloned().collect())
    }

    async fn find_course(&self, course_id: &str) -> StoreResult<Option<Course>> {
        Ok(self.inner.read().await.courses.get(course_id).cloned())
    }

    async fn update_course(&self, course_id: &str, patch: &CoursePatch) -> StoreResult<Course> {
        let mut db = self.inner.write().await;
        let course = db
            .courses
            .get_mut(course_id)
            .ok_or_else(|| StoreError::not_found("course", course_id))?;
        course.name = patch.name.clone();
        course.credits = patch.credits;
        Ok(course.clone())
    }

    async fn delete_course(&self, course_id: &str) -> StoreResult<CascadeOutcome> {
        let mut db = self.inner.write().await;
        if !db.courses.contains_key(course_id) {
            return Err(StoreError::not_found("course", course_id));
        }
        let before = db.grades.len();
        db.grades.retain(|g| g.course_id != course_id);
        let deleted_grades = (before - db.grades.len()) as u64;
        db.courses.remove(course_id);
        Ok(CascadeOutcome { deleted_grades })
    }

    async fn count_courses(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.courses.len() as u64)
    }

    async fn insert_grade(&self, grade: &Grade) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.grades.iter().any(|g| g.id == grade.id) {
            return Err(StoreError::duplicate("grade", grade.id.to_string()));
        }
        db.grades.push(grade.clone());
        Ok(())
    }

    async fn list_grades(&self, filter: &GradeFilter) -> StoreResult<Vec<Grade>> {
        Ok(self
            .inner
            .read()
            .await
            .grades
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect())
    }

    async fn find_grade(&self, id: Uuid) -> StoreResult<Option<Grade>> {
        Ok(self
            .inner
            .read()
            .await
            .grades
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn update_grade(&self, id: Uuid, patch: &GradePatch) -> StoreResult<Grade> {
        let mut db = self.inner.write().await;
        let grade = db
            .grades
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StoreError::not_found("grade", id.to_string()))?;
        patch.apply(grade);
        Ok(grade.clone())
    }

    async fn delete_grade(&self, id: Uuid) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        let pos = db
            .grades
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| StoreError::not_found("grade", id.to_string()))?;
        db.grades.remove(pos);
        Ok(())
    }

    async fn count_grades(&self, filter: &GradeFilter) -> StoreResult<u64> {
        Ok(self
            .inner
            .read()
            .await
            .grades
            .iter()
            .filter(|g| filter.matches(g))
            .count() as u64)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.contains_key(&user.username) {
            return Err(StoreError::duplicate("user", &user.username));
        }
        db.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.users.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn student(id: &str) -> Student {
        Student {
            student_id: id.into(),
            first_name: "Alice".into(),
            last_name: "Martin".into(),
        }
    }

    fn course(id: &str) -> Course {
        Course {
            course_id: id.into(),
            name: "Databases".into(),
            credits: 4,
        }
    }

    fn grade(student_id: &str, course_id: &str, value: f64) -> Grade {
        Grade {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            course_id: course_id.into(),
            grade: value,
            date: date!(2025 - 01 - 15),
        }
    }

    #[tokio::test]
    async fn duplicate_student_is_rejected_and_first_record_kept() {
        let ledger = MemoryLedger::new();
        ledger.insert_student(&student("S001")).await.unwrap();

        let mut other = student("S001");
        other.first_name = "Bob".into();
        let err = ledger.insert_student(&other).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { entity: "student", .. }));

        assert_eq!(ledger.count_students().await.unwrap(), 1);
        let kept = ledger.find_student("S001").await.unwrap().unwrap();
        assert_eq!(kept.first_name, "Alice");
    }

    #[tokio::test]
    async fn deleting_student_cascades_to_its_grades_only() {
        let ledger = MemoryLedger::new();
        ledger.insert_student(&student("S001")).await.unwrap();
        ledger.insert_student(&student("S002")).await.unwrap();
        ledger.insert_course(&course("C001")).await.unwrap();
        ledger.insert_course(&course("C002")).await.unwrap();
        for g in [
            grade("S001", "C001", 12.0),
            grade("S001", "C002", 14.0),
            grade("S001", "C001", 9.0),
            grade("S002", "C001", 16.0),
        ] {
            ledger.insert_grade(&g).await.unwrap();
        }

        let outcome = ledger.delete_student("S001").await.unwrap();
        assert_eq!(outcome.deleted_grades, 3);
        assert!(ledger.find_student("S001").await.unwrap().is_none());
        assert_eq!(ledger.count_students().await.unwrap(), 1);
        assert_eq!(ledger.count_grades(&GradeFilter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_missing_course_reports_not_found_and_keeps_grades() {
        let ledger = MemoryLedger::new();
        ledger.insert_grade(&grade("S001", "C404", 10.0)).await.unwrap();
        let err = ledger.delete_course("C404").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "course", .. }));
        assert_eq!(ledger.count_grades(&GradeFilter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lists_are_ordered_by_natural_key() {
        let ledger = MemoryLedger::new();
        for id in ["S003", "S001", "S002"] {
            ledger.insert_student(&student(id)).await.unwrap();
        }
        let ids: Vec<_> = ledger
            .list_students()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.student_id)
            .collect();
        assert_eq!(ids, ["S001", "S002", "S003"]);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_grade_fail() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            ledger.update_grade(id, &GradePatch::default()).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.delete_grade(id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(ledger.find_grade(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn grade_filters_select_by_student_and_course() {
        let ledger = MemoryLedger::new();
        ledger.insert_grade(&grade("S001", "C001", 12.0)).await.unwrap();
        ledger.insert_grade(&grade("S001", "C002", 13.0)).await.unwrap();
        ledger.insert_grade(&grade("S002", "C001", 14.0)).await.unwrap();

        assert_eq!(
            ledger.count_grades(&GradeFilter::student("S001")).await.unwrap(),
            2
        );
        let course = ledger.list_grades(&GradeFilter::course("C001")).await.unwrap();
        assert_eq!(course.len(), 2);
        assert_eq!(course[0].grade, 12.0);
    }
}
