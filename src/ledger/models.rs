use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub student_id: String, // natural key, immutable
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub course_id: String, // natural key, immutable
    pub name: String,
    pub credits: i32,
}

/// One recorded mark. `student_id`/`course_id` are plain references; they are
/// only checked when the grade is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    pub grade: f64,
    pub date: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            other => Err(StoreError::Corrupt(format!("unknown role '{other}'"))),
        }
    }
}

/// Credential record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct StudentPatch {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct CoursePatch {
    pub name: String,
    pub credits: i32,
}

/// Partial grade update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GradePatch {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
    pub grade: Option<f64>,
    pub date: Option<Date>,
}

impl GradePatch {
    pub fn apply(&self, grade: &mut Grade) {
        if let Some(student_id) = &self.student_id {
            grade.student_id = student_id.clone();
        }
        if let Some(course_id) = &self.course_id {
            grade.course_id = course_id.clone();
        }
        if let Some(value) = self.grade {
            grade.grade = value;
        }
        if let Some(date) = self.date {
            grade.date = date;
        }
    }
}

/// Grade selection; `None` matches anything.
#[derive(Debug, Clone, Default)]
pub struct GradeFilter {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
}

impl GradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn student(student_id: &str) -> Self {
        Self {
            student_id: Some(student_id.to_string()),
            course_id: None,
        }
    }

    pub fn course(course_id: &str) -> Self {
        Self {
            student_id: None,
            course_id: Some(course_id.to_string()),
        }
    }

    pub fn matches(&self, grade: &Grade) -> bool {
        self.student_id
            .as_deref()
            .map_or(true, |id| grade.student_id == id)
            && self
                .course_id
                .as_deref()
                .map_or(true, |id| grade.course_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CascadeOutcome {
    pub deleted_grades: u64,
}
