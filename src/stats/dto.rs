use serde::Serialize;

use super::{
    engine::{CourseAverage, GradeStats, StudentAverage},
    services::{GlobalOverview, Overview},
};
use crate::ledger::{Course, Student};

#[derive(Debug, Serialize)]
pub struct StudentStatsResponse {
    pub student: Student,
    pub stats: Option<GradeStats>,
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CourseStatsResponse {
    pub course: Course,
    pub stats: Option<GradeStats>,
    pub student_count: usize,
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GlobalStatsResponse {
    pub overview: Overview,
    pub global_stats: Option<GradeStats>,
    pub pass_rate: Option<f64>,
    pub by_course: Vec<CourseAverage>,
    pub by_student: Vec<StudentAverage>,
}

impl From<GlobalOverview> for GlobalStatsResponse {
    fn from(g: GlobalOverview) -> Self {
        Self {
            overview: g.overview,
            global_stats: g.stats,
            pass_rate: g.pass_rate,
            by_course: g.by_course,
            by_student: g.by_student,
        }
    }
}
