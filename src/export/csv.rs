use std::collections::HashMap;

use super::report::two_decimals;
use crate::{
    ledger::{Course, Grade, Student},
    stats::engine::{self, pass_rate, summarize, PASS_THRESHOLD},
};

const HEADER: &str = "Type,ID,Name,Average,Credits";

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn average_or_na(average: Option<f64>) -> String {
    average.map(two_decimals).unwrap_or_else(|| "N/A".into())
}

/// One row per student and per course, then a global statistics block.
pub fn render(students: &[Student], courses: &[Course], grades: &[Grade]) -> String {
    let by_student: HashMap<String, f64> = engine::average_by_student(grades, students)
        .into_iter()
        .map(|s| (s.student_id, s.average))
        .collect();
    let by_course: HashMap<String, f64> = engine::average_by_course(grades, courses)
        .into_iter()
        .map(|c| (c.course_id, c.average))
        .collect();

    let mut out = String::from(HEADER);
    out.push('\n');

    for s in students {
        out.push_str(&format!(
            "Student,{},{},{},\n",
            csv_quote(&s.student_id),
            csv_quote(&s.full_name()),
            average_or_na(by_student.get(&s.student_id).copied()),
        ));
    }
    for c in courses {
        out.push_str(&format!(
            "Course,{},{},{},{}\n",
            csv_quote(&c.course_id),
            csv_quote(&c.name),
            average_or_na(by_course.get(&c.course_id).copied()),
            c.credits,
        ));
    }

    let values = || grades.iter().map(|g| g.grade);
    if let Some(stats) = summarize(values()) {
        out.push_str("\nGlobal statistics\n");
        out.push_str(&format!("Average,{}\n", two_decimals(stats.average)));
        out.push_str(&format!("Lowest grade,{}\n", stats.min));
        out.push_str(&format!("Highest grade,{}\n", stats.max));
        out.push_str(&format!("Number of grades,{}\n", stats.count));
        if let Some(rate) = pass_rate(values(), PASS_THRESHOLD) {
            out.push_str(&format!("Pass rate,{rate}%\n"));
        }
    }
    out
}
