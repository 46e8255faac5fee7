use serde::Deserialize;

use crate::{
    error::{present, ApiError},
    ledger::{Student, StudentPatch},
};

const ALL_FIELDS_REQUIRED: &str = "student_id, first_name and last_name are required";

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub student_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CreateStudentRequest {
    pub fn into_student(self) -> Result<Student, ApiError> {
        match (
            present(self.student_id),
            present(self.first_name),
            present(self.last_name),
        ) {
            (Some(student_id), Some(first_name), Some(last_name)) => Ok(Student {
                student_id,
                first_name,
                last_name,
            }),
            _ => Err(ApiError::validation(ALL_FIELDS_REQUIRED)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateStudentRequest {
    pub fn into_patch(self) -> Result<StudentPatch, ApiError> {
        match (present(self.first_name), present(self.last_name)) {
            (Some(first_name), Some(last_name)) => Ok(StudentPatch {
                first_name,
                last_name,
            }),
            _ => Err(ApiError::validation("first_name and last_name are required")),
        }
    }
}
