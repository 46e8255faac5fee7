/// Idempotent DDL applied when the Postgres ledger opens.
///
/// Grades carry no foreign keys; references are only checked when a grade
/// is created.
pub(super) const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS students (
        student_id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        course_id TEXT PRIMARY KEY,
        name      TEXT NOT NULL,
        credits   INTEGER NOT NULL CHECK (credits > 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS grades (
        id          UUID PRIMARY KEY,
        student_id  TEXT NOT NULL,
        course_id   TEXT NOT NULL,
        grade       DOUBLE PRECISION NOT NULL CHECK (grade >= 0 AND grade <= 20),
        date        DATE NOT NULL,
        recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS grades_student_id_idx ON grades (student_id)",
    "CREATE INDEX IF NOT EXISTS grades_course_id_idx ON grades (course_id)",
    "CREATE INDEX IF NOT EXISTS grades_date_idx ON grades (date)",
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL CHECK (role IN ('admin', 'teacher')),
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];
