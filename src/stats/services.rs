use std::collections::HashMap;

use serde::Serialize;

use super::engine::{
    self, distinct_students, pass_rate, summarize, CourseAverage, GradeStats, StudentAverage,
    PASS_THRESHOLD,
};
use crate::{
    error::StoreError,
    ledger::{Course, Grade, GradeFilter, LedgerStore, Student, StoreResult},
};

/// What a statistics request is about.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Student(&'a str),
    Course(&'a str),
    Global,
}

/// Summary plus pass rate for one scope. `summary` is `None` when the scope
/// exists but holds no grades.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedStats {
    pub summary: Option<GradeStats>,
    pub pass_rate: Option<f64>,
    pub student_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptRow {
    #[serde(flatten)]
    pub grade: Grade,
    pub course: Course,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRow {
    #[serde(flatten)]
    pub grade: Grade,
    pub student: Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overview {
    pub students: u64,
    pub courses: u64,
    pub grades: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalOverview {
    pub overview: Overview,
    pub stats: Option<GradeStats>,
    pub pass_rate: Option<f64>,
    pub by_course: Vec<CourseAverage>,
    pub by_student: Vec<StudentAverage>,
}

fn values(grades: &[Grade]) -> impl Iterator<Item = f64> + '_ {
    grades.iter().map(|g| g.grade)
}

async fn require_student(store: &dyn LedgerStore, id: &str) -> StoreResult<Student> {
    store
        .find_student(id)
        .await?
        .ok_or_else(|| StoreError::not_found("student", id))
}

async fn require_course(store: &dyn LedgerStore, id: &str) -> StoreResult<Course> {
    store
        .find_course(id)
        .await?
        .ok_or_else(|| StoreError::not_found("course", id))
}

fn scoped(grades: &[Grade]) -> ScopedStats {
    ScopedStats {
        summary: summarize(values(grades)),
        pass_rate: pass_rate(values(grades), PASS_THRESHOLD),
        student_count: distinct_students(grades),
    }
}

/// The student together with their stats, in one lookup.
pub async fn student_stats(
    store: &dyn LedgerStore,
    student_id: &str,
) -> StoreResult<(Student, ScopedStats)> {
    let student = require_student(store, student_id).await?;
    let grades = store.list_grades(&GradeFilter::student(student_id)).await?;
    Ok((student, scoped(&grades)))
}

pub async fn course_stats(
    store: &dyn LedgerStore,
    course_id: &str,
) -> StoreResult<(Course, ScopedStats)> {
    let course = require_course(store, course_id).await?;
    let grades = store.list_grades(&GradeFilter::course(course_id)).await?;
    Ok((course, scoped(&grades)))
}

/// Fails with `NotFound` when the scoped student or course does not exist.
pub async fn stats_for(store: &dyn LedgerStore, scope: Scope<'_>) -> StoreResult<ScopedStats> {
    match scope {
        Scope::Student(id) => Ok(student_stats(store, id).await?.1),
        Scope::Course(id) => Ok(course_stats(store, id).await?.1),
        Scope::Global => Ok(scoped(&store.list_grades(&GradeFilter::all()).await?)),
    }
}

/// The student's grades with their course, newest first.
pub async fn student_transcript(
    store: &dyn LedgerStore,
    student_id: &str,
) -> StoreResult<(Student, Vec<TranscriptRow>)> {
    let student = require_student(store, student_id).await?;
    let grades = store.list_grades(&GradeFilter::student(student_id)).await?;
    let courses: HashMap<String, Course> = store
        .list_courses()
        .await?
        .into_iter()
        .map(|c| (c.course_id.clone(), c))
        .collect();

    let mut rows: Vec<TranscriptRow> = grades
        .into_iter()
        .filter_map(|grade| {
            let course = courses.get(&grade.course_id)?.clone();
            Some(TranscriptRow { grade, course })
        })
        .collect();
    rows.sort_by(|a, b| b.grade.date.cmp(&a.grade.date));
    Ok((student, rows))
}

/// The course's grades with their student, highest grade first.
pub async fn course_roster(
    store: &dyn LedgerStore,
    course_id: &str,
) -> StoreResult<(Course, Vec<RosterRow>)> {
    let course = require_course(store, course_id).await?;
    let grades = store.list_grades(&GradeFilter::course(course_id)).await?;
    let students: HashMap<String, Student> = store
        .list_students()
        .await?
        .into_iter()
        .map(|s| (s.student_id.clone(), s))
        .collect();

    let mut rows: Vec<RosterRow> = grades
        .into_iter()
        .filter_map(|grade| {
            let student = students.get(&grade.student_id)?.clone();
            Some(RosterRow { grade, student })
        })
        .collect();
    rows.sort_by(|a, b| b.grade.grade.total_cmp(&a.grade.grade));
    Ok((course, rows))
}

pub async fn global_overview(store: &dyn LedgerStore) -> StoreResult<GlobalOverview> {
    let students = store.list_students().await?;
    let courses = store.list_courses().await?;
    let grades = store.list_grades(&GradeFilter::all()).await?;

    Ok(GlobalOverview {
        overview: Overview {
            students: students.len() as u64,
            courses: courses.len() as u64,
            grades: grades.len() as u64,
        },
        stats: summarize(values(&grades)),
        pass_rate: pass_rate(values(&grades), PASS_THRESHOLD),
        by_course: engine::average_by_course(&grades, &courses),
        by_student: engine::average_by_student(&grades, &students),
    })
}
