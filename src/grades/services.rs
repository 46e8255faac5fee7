use time::{macros::format_description, Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateGradeRequest, UpdateGradeRequest};
use crate::{
    error::{present, ApiError},
    ledger::{Grade, GradePatch, LedgerStore},
};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 20.0;

pub fn check_range(grade: f64) -> Result<f64, ApiError> {
    if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
        return Err(ApiError::validation(format!(
            "grade must be between {MIN_GRADE} and {MAX_GRADE}"
        )));
    }
    Ok(grade)
}

/// Parses the calendar date at the start of `raw` (`2025-01-15` or
/// `2025-01-15T08:30:00Z`).
pub fn parse_date(raw: &str) -> Result<Date, ApiError> {
    let format = format_description!("[year]-[month]-[day]");
    raw.trim()
        .get(..10)
        .and_then(|prefix| Date::parse(prefix, &format).ok())
        .ok_or_else(|| ApiError::validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("invalid grade id '{raw}'")))
}

/// Checks run in a fixed order and stop at the first failure: required
/// fields, student, course, then range.
pub async fn record_grade(
    store: &dyn LedgerStore,
    req: CreateGradeRequest,
) -> Result<Grade, ApiError> {
    let (Some(student_id), Some(course_id), Some(value)) =
        (present(req.student_id), present(req.course_id), req.grade)
    else {
        return Err(ApiError::validation(
            "student_id, course_id and grade are required",
        ));
    };
    let date = match req.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };

    if store.find_student(&student_id).await?.is_none() {
        warn!(%student_id, "grade for unknown student");
        return Err(ApiError::NotFound(format!("student '{student_id}' not found")));
    }
    if store.find_course(&course_id).await?.is_none() {
        warn!(%course_id, "grade for unknown course");
        return Err(ApiError::NotFound(format!("course '{course_id}' not found")));
    }
    let value = check_range(value)?;

    let grade = Grade {
        id: Uuid::new_v4(),
        student_id,
        course_id,
        grade: value,
        date,
    };
    store.insert_grade(&grade).await?;
    info!(grade_id = %grade.id, student_id = %grade.student_id, course_id = %grade.course_id, grade = grade.grade, "grade recorded");
    Ok(grade)
}

/// Referenced student/course are not re-checked here; only the range is.
pub fn to_patch(req: UpdateGradeRequest) -> Result<GradePatch, ApiError> {
    Ok(GradePatch {
        student_id: present(req.student_id),
        course_id: present(req.course_id),
        grade: req.grade.map(check_range).transpose()?,
        date: req.date.as_deref().map(parse_date).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Course, GradeFilter, MemoryLedger, Student};
    use time::macros::date;

    async fn store_with_roster() -> MemoryLedger {
        let store = MemoryLedger::new();
        store
            .insert_student(&Student {
                student_id: "S001".into(),
                first_name: "Alice".into(),
                last_name: "Martin".into(),
            })
            .await
            .unwrap();
        store
            .insert_course(&Course {
                course_id: "C001".into(),
                name: "Databases".into(),
                credits: 4,
            })
            .await
            .unwrap();
        store
    }

    fn request(student_id: &str, course_id: &str, grade: f64) -> CreateGradeRequest {
        CreateGradeRequest {
            student_id: Some(student_id.into()),
            course_id: Some(course_id.into()),
            grade: Some(grade),
            date: Some("2025-01-15".into()),
        }
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        assert_eq!(parse_date("2025-01-15").unwrap(), date!(2025 - 01 - 15));
        assert_eq!(
            parse_date("2025-01-15T08:30:00.000Z").unwrap(),
            date!(2025 - 01 - 15)
        );
        assert!(parse_date("15/01/2025").is_err());
        assert!(parse_date("2025").is_err());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(check_range(0.0).is_ok());
        assert!(check_range(20.0).is_ok());
        assert!(check_range(-1.0).is_err());
        assert!(check_range(21.0).is_err());
    }

    #[tokio::test]
    async fn out_of_range_grades_are_rejected() {
        let store = store_with_roster().await;
        for value in [-1.0, 21.0] {
            let err = record_grade(&store, request("S001", "C001", value))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        let grade = record_grade(&store, request("S001", "C001", 20.0))
            .await
            .unwrap();
        assert_eq!(grade.date, date!(2025 - 01 - 15));
        assert_eq!(store.count_grades(&GradeFilter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_student_is_checked_before_range() {
        let store = store_with_roster().await;
        let err = record_grade(&store, request("S404", "C001", 25.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = record_grade(&store, request("S001", "C404", 12.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(store.count_grades(&GradeFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn date_defaults_to_today() {
        let store = store_with_roster().await;
        let mut req = request("S001", "C001", 11.0);
        req.date = None;
        let grade = record_grade(&store, req).await.unwrap();
        assert_eq!(grade.date, OffsetDateTime::now_utc().date());
    }

    #[test]
    fn patch_keeps_absent_fields_and_checks_range() {
        let patch = to_patch(UpdateGradeRequest {
            grade: Some(17.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.grade, Some(17.0));
        assert!(patch.student_id.is_none());
        assert!(patch.date.is_none());

        let err = to_patch(UpdateGradeRequest {
            grade: Some(20.5),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
