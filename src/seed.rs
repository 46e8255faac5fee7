//! Startup provisioning: default accounts and an optional demo roster.

use anyhow::Context;
use time::{macros::date, Date};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::services::create_user,
    config::SeedConfig,
    ledger::{Course, Grade, LedgerStore, Role, Student},
};

const DEMO_STUDENTS: &[(&str, &str, &str)] = &[
    ("S001", "Alice", "Martin"),
    ("S002", "Bob", "Dupont"),
    ("S003", "Claire", "Bernard"),
    ("S004", "David", "Petit"),
    ("S005", "Emma", "Moreau"),
];

const DEMO_COURSES: &[(&str, &str, i32)] = &[
    ("C001", "Base de données", 4),
    ("C002", "Programmation Web", 3),
    ("C003", "Algorithmes", 5),
    ("C004", "Réseaux", 3),
];

// One row per student, one column per course (C001..C004).
const DEMO_GRADES: &[(&str, [f64; 4])] = &[
    ("S001", [16.5, 18.0, 15.0, 17.5]),
    ("S002", [12.0, 14.5, 11.0, 13.0]),
    ("S003", [19.0, 17.5, 18.5, 16.0]),
    ("S004", [10.5, 9.0, 8.5, 11.0]),
    ("S005", [15.0, 16.5, 14.0, 15.5]),
];

const DEMO_DATES: [Date; 4] = [
    date!(2025 - 01 - 15),
    date!(2025 - 01 - 20),
    date!(2025 - 02 - 01),
    date!(2025 - 02 - 10),
];

pub async fn run(store: &dyn LedgerStore, config: &SeedConfig) -> anyhow::Result<()> {
    if config.default_users {
        default_users(store, config).await?;
    }
    if config.demo_data {
        demo_data(store).await?;
    }
    Ok(())
}

/// Creates `admin` and `teacher` unless an account with that name exists.
pub async fn default_users(store: &dyn LedgerStore, config: &SeedConfig) -> anyhow::Result<()> {
    let accounts = [
        ("admin", config.admin_password.as_str(), Role::Admin),
        ("teacher", config.teacher_password.as_str(), Role::Teacher),
    ];
    for (username, password, role) in accounts {
        if store.find_user_by_username(username).await?.is_some() {
            info!(%username, "default user already present");
            continue;
        }
        create_user(store, username, password, role)
            .await
            .with_context(|| format!("creating default user '{username}'"))?;
    }
    Ok(())
}

/// Loads the demo roster into an empty ledger. Returns whether anything was
/// written; existing data is never touched.
pub async fn demo_data(store: &dyn LedgerStore) -> anyhow::Result<bool> {
    if store.count_students().await? > 0 {
        info!("ledger already has students; skipping demo data");
        return Ok(false);
    }

    for &(student_id, first_name, last_name) in DEMO_STUDENTS {
        store
            .insert_student(&Student {
                student_id: student_id.into(),
                first_name: first_name.into(),
                last_name: last_name.into(),
            })
            .await
            .with_context(|| format!("seeding student {student_id}"))?;
    }
    for &(course_id, name, credits) in DEMO_COURSES {
        store
            .insert_course(&Course {
                course_id: course_id.into(),
                name: name.into(),
                credits,
            })
            .await
            .with_context(|| format!("seeding course {course_id}"))?;
    }
    let mut grades = 0;
    for &(student_id, marks) in DEMO_GRADES {
        for ((&(course_id, _, _), grade), date) in DEMO_COURSES.iter().zip(marks).zip(DEMO_DATES) {
            store
                .insert_grade(&Grade {
                    id: Uuid::new_v4(),
                    student_id: student_id.into(),
                    course_id: course_id.into(),
                    grade,
                    date,
                })
                .await
                .context("seeding grade")?;
            grades += 1;
        }
    }

    info!(
        students = DEMO_STUDENTS.len(),
        courses = DEMO_COURSES.len(),
        grades,
        "demo data loaded"
    );
    Ok(true)
}
