use serde::Deserialize;

use crate::{
    error::{present, ApiError},
    ledger::{Course, CoursePatch},
};

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_id: Option<String>,
    pub name: Option<String>,
    pub credits: Option<i32>,
}

fn positive_credits(credits: i32) -> Result<i32, ApiError> {
    if credits <= 0 {
        return Err(ApiError::validation("credits must be a positive integer"));
    }
    Ok(credits)
}

impl CreateCourseRequest {
    pub fn into_course(self) -> Result<Course, ApiError> {
        match (present(self.course_id), present(self.name), self.credits) {
            (Some(course_id), Some(name), Some(credits)) => Ok(Course {
                course_id,
                name,
                credits: positive_credits(credits)?,
            }),
            _ => Err(ApiError::validation(
                "course_id, name and credits are required",
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub credits: Option<i32>,
}

impl UpdateCourseRequest {
    pub fn into_patch(self) -> Result<CoursePatch, ApiError> {
        match (present(self.name), self.credits) {
            (Some(name), Some(credits)) => Ok(CoursePatch {
                name,
                credits: positive_credits(credits)?,
            }),
            _ => Err(ApiError::validation("name and credits are required")),
        }
    }
}
