//! Printable report model shared by the PDF renderer.
//!
//! Builders pull the same computed views as the JSON endpoints, so a report
//! and `/stats/...` always agree. Numbers are rounded to two decimals here and
//! nowhere else.

use std::str::FromStr;

use time::{macros::format_description, Date, OffsetDateTime};

use crate::{
    error::ApiError,
    ledger::{LedgerStore, StoreResult},
    stats::{
        engine::GradeStats,
        services::{self, Scope},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Student,
    Course,
    Global,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Student => "student",
            ReportKind::Course => "course",
            ReportKind::Global => "global",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(ReportKind::Student),
            "course" => Ok(ReportKind::Course),
            "global" => Ok(ReportKind::Global),
            other => Err(ApiError::validation(format!(
                "unknown report type '{other}' (expected student, course or global)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Section {
    fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub generated_on: Date,
    pub sections: Vec<Section>,
}

impl Report {
    fn new(sections: Vec<Section>) -> Self {
        Self {
            title: "Academic Report".into(),
            generated_on: OffsetDateTime::now_utc().date(),
            sections,
        }
    }
}

pub fn two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

pub fn day_month_year(date: Date) -> String {
    let format = format_description!("[day]/[month]/[year]");
    date.format(&format).unwrap_or_else(|_| date.to_string())
}

fn stats_section(heading: &str, stats: &GradeStats, pass_rate: Option<f64>) -> Section {
    let mut section = Section::new(heading)
        .line(format!("Average: {}/20", two_decimals(stats.average)))
        .line(format!("Lowest grade: {}/20", stats.min))
        .line(format!("Highest grade: {}/20", stats.max))
        .line(format!("Number of grades: {}", stats.count));
    if let Some(rate) = pass_rate {
        section = section.line(format!("Pass rate: {rate}%"));
    }
    section
}

pub async fn student_report(store: &dyn LedgerStore, student_id: &str) -> StoreResult<Report> {
    let (student, rows) = services::student_transcript(store, student_id).await?;
    let stats = services::stats_for(store, Scope::Student(student_id)).await?;

    let mut sections = vec![Section::new(format!("Student: {}", student.full_name()))
        .line(format!("ID: {}", student.student_id))];
    if let Some(summary) = &stats.summary {
        sections.push(stats_section("Statistics", summary, stats.pass_rate));
    }
    if !rows.is_empty() {
        let mut grades = Section::new("Grades");
        for row in &rows {
            grades = grades.line(format!(
                "{}: {}/20 - {}",
                row.course.name,
                row.grade.grade,
                day_month_year(row.grade.date)
            ));
        }
        sections.push(grades);
    }
    Ok(Report::new(sections))
}

pub async fn course_report(store: &dyn LedgerStore, course_id: &str) -> StoreResult<Report> {
    let (course, rows) = services::course_roster(store, course_id).await?;
    let stats = services::stats_for(store, Scope::Course(course_id)).await?;

    let mut sections = vec![Section::new(format!("Course: {}", course.name))
        .line(format!("ID: {}", course.course_id))
        .line(format!("Credits: {}", course.credits))];
    if let Some(summary) = &stats.summary {
        sections.push(
            stats_section("Statistics", summary, stats.pass_rate)
                .line(format!("Students graded: {}", stats.student_count)),
        );
    }
    if !rows.is_empty() {
        let mut grades = Section::new("Grades");
        for row in &rows {
            grades = grades.line(format!(
                "{}: {}/20 - {}",
                row.student.full_name(),
                row.grade.grade,
                day_month_year(row.grade.date)
            ));
        }
        sections.push(grades);
    }
    Ok(Report::new(sections))
}

pub async fn global_report(store: &dyn LedgerStore) -> StoreResult<Report> {
    let global = services::global_overview(store).await?;

    let mut sections = vec![Section::new("Overview")
        .line(format!("Students: {}", global.overview.students))
        .line(format!("Courses: {}", global.overview.courses))
        .line(format!("Grades: {}", global.overview.grades))];
    if let Some(summary) = &global.stats {
        sections.push(stats_section("Global statistics", summary, global.pass_rate));
    }
    if !global.by_course.is_empty() {
        let mut ranking = Section::new("Average by course");
        for c in &global.by_course {
            ranking = ranking.line(format!(
                "{}: {}/20 ({} grades)",
                c.course_name,
                two_decimals(c.average),
                c.count
            ));
        }
        sections.push(ranking);
    }
    if !global.by_student.is_empty() {
        let mut ranking = Section::new("Average by student");
        for s in &global.by_student {
            ranking = ranking.line(format!(
                "{}: {}/20 ({} grades)",
                s.student_name,
                two_decimals(s.average),
                s.count
            ));
        }
        sections.push(ranking);
    }
    Ok(Report::new(sections))
}
