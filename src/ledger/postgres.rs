use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    schema, CascadeOutcome, Course, CoursePatch, Grade, GradeFilter, GradePatch, LedgerStore,
    StoreResult, Student, StudentPatch, User,
};
use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed ledger sharing one connection pool across requests.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            created_at: r.created_at,
        })
    }
}

fn insert_error(e: sqlx::Error, entity: &'static str, key: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::duplicate(entity, key)
        }
        _ => StoreError::Database(e),
    }
}

impl PgLedger {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            // stale connections are replaced when the next request acquires one
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("apply ledger schema")?;
        }
        info!("ledger schema ready");
        Ok(())
    }

    async fn count(&self, sql: &str) -> StoreResult<u64> {
        let n = sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await?;
        Ok(n as u64)
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn insert_student(&self, student: &Student) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO students (student_id, first_name, last_name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&student.student_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "student", &student.student_id))?;
        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let rows = sqlx::query_as::<_, Student>(
            r#"
            SELECT student_id, first_name, last_name
              FROM students
             ORDER BY student_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_student(&self, student_id: &str) -> StoreResult<Option<Student>> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            SELECT student_id, first_name, last_name
              FROM students
             WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> StoreResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
               SET first_name = $2, last_name = $3
             WHERE student_id = $1
            RETURNING student_id, first_name, last_name
            "#,
        )
        .bind(student_id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("student", student_id))
    }

    async fn delete_student(&self, student_id: &str) -> StoreResult<CascadeOutcome> {
        let mut tx = self.pool.begin().await?;
        let deleted_grades = sqlx::query("DELETE FROM grades WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let removed = sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            // dropping the transaction rolls the grade deletion back
            return Err(StoreError::not_found("student", student_id));
        }
        tx.commit().await?;
        debug!(%student_id, deleted_grades, "student deleted");
        Ok(CascadeOutcome { deleted_grades })
    }

    async fn count_students(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM students").await
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO courses (course_id, name, credits)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&course.course_id)
        .bind(&course.name)
        .bind(course.credits)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "course", &course.course_id))?;
        Ok(())
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, name, credits
              FROM courses
             ORDER BY course_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_course(&self, course_id: &str) -> StoreResult<Option<Course>> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, name, credits
              FROM courses
             WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_course(&self, course_id: &str, patch: &CoursePatch) -> StoreResult<Course> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
               SET name = $2, credits = $3
             WHERE course_id = $1
            RETURNING course_id, name, credits
            "#,
        )
        .bind(course_id)
        .bind(&patch.name)
        .bind(patch.credits)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("course", course_id))
    }

    async fn delete_course(&self, course_id: &str) -> StoreResult<CascadeOutcome> {
        let mut tx = self.pool.begin().await?;
        let deleted_grades = sqlx::query("DELETE FROM grades WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let removed = sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(StoreError::not_found("course", course_id));
        }
        tx.commit().await?;
        debug!(%course_id, deleted_grades, "course deleted");
        Ok(CascadeOutcome { deleted_grades })
    }

    async fn count_courses(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM courses").await
    }

    async fn insert_grade(&self, grade: &Grade) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO grades (id, student_id, course_id, grade, date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(grade.id)
        .bind(&grade.student_id)
        .bind(&grade.course_id)
        .bind(grade.grade)
        .bind(grade.date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_grades(&self, filter: &GradeFilter) -> StoreResult<Vec<Grade>> {
        let rows = sqlx::query_as::<_, Grade>(
            r#"
            SELECT id, student_id, course_id, grade, date
              FROM grades
             WHERE ($1::text IS NULL OR student_id = $1)
               AND ($2::text IS NULL OR course_id = $2)
             ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(filter.student_id.as_deref())
        .bind(filter.course_id.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_grade(&self, id: Uuid) -> StoreResult<Option<Grade>> {
        let row = sqlx::query_as::<_, Grade>(
            r#"
            SELECT id, student_id, course_id, grade, date
              FROM grades
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_grade(&self, id: Uuid, patch: &GradePatch) -> StoreResult<Grade> {
        sqlx::query_as::<_, Grade>(
            r#"
            UPDATE grades
               SET student_id = COALESCE($2, student_id),
                   course_id  = COALESCE($3, course_id),
                   grade      = COALESCE($4, grade),
                   date       = COALESCE($5, date)
             WHERE id = $1
            RETURNING id, student_id, course_id, grade, date
            "#,
        )
        .bind(id)
        .bind(patch.student_id.as_deref())
        .bind(patch.course_id.as_deref())
        .bind(patch.grade)
        .bind(patch.date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("grade", id.to_string()))
    }

    async fn delete_grade(&self, id: Uuid) -> StoreResult<()> {
        let removed = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(StoreError::not_found("grade", id.to_string()));
        }
        Ok(())
    }

    async fn count_grades(&self, filter: &GradeFilter) -> StoreResult<u64> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM grades
             WHERE ($1::text IS NULL OR student_id = $1)
               AND ($2::text IS NULL OR course_id = $2)
            "#,
        )
        .bind(filter.student_id.as_deref())
        .bind(filter.course_id.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(n as u64)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "user", &user.username))?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at
              FROM users
             WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at
              FROM users
             ORDER BY username ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count_users(&self) -> StoreResult<u64> {
        self.count("SELECT COUNT(*) FROM users").await
    }
}
