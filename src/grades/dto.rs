use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
    pub grade: Option<f64>,
    /// `YYYY-MM-DD`; a full ISO timestamp is accepted and truncated to its date.
    pub date: Option<String>,
}

/// Every field optional; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGradeRequest {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
    pub grade: Option<f64>,
    pub date: Option<String>,
}
