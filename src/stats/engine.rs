//! Group-by arithmetic over grade sets.
//!
//! Everything here is a single pass over an in-memory slice; joins against
//! students/courses are keyed lookups. Averages are left unrounded: only the
//! export renderers round to two decimals.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::ledger::{Course, Grade, Student};

/// Minimum mark counted as a pass.
pub const PASS_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAverage {
    pub course_id: String,
    pub course_name: String,
    pub average: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    pub student_id: String,
    pub student_name: String,
    pub average: f64,
    pub count: u64,
}

/// `None` when there are no grades: "no data" is not the same as 0/20.
pub fn summarize<I>(grades: I) -> Option<GradeStats>
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = grades.into_iter();
    let first = iter.next()?;
    let (mut sum, mut min, mut max, mut count) = (first, first, first, 1u64);
    for g in iter {
        sum += g;
        min = min.min(g);
        max = max.max(g);
        count += 1;
    }
    Some(GradeStats {
        average: sum / count as f64,
        min,
        max,
        count,
    })
}

/// Share of grades at or above `threshold`, as a percentage with one decimal.
pub fn pass_rate<I>(grades: I, threshold: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (passed, total) = grades.into_iter().fold((0u64, 0u64), |(p, t), g| {
        (p + u64::from(g >= threshold), t + 1)
    });
    if total == 0 {
        return None;
    }
    Some(round_to(passed as f64 / total as f64 * 100.0, 1))
}

pub fn distinct_students(grades: &[Grade]) -> usize {
    grades
        .iter()
        .map(|g| g.student_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Default)]
struct Acc {
    sum: f64,
    count: u64,
}

impl Acc {
    fn push(&mut self, g: f64) {
        self.sum += g;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Groups by key (grades with an unknown key are skipped), then ranks by
/// descending average. The sort is stable over key order, so ties are
/// deterministic for a given grade set.
fn rank<'a, K, F>(grades: &'a [Grade], key: F, known: &HashSet<&str>) -> Vec<(&'a str, Acc)>
where
    K: AsRef<str> + ?Sized + 'a,
    F: Fn(&'a Grade) -> &'a K,
{
    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for g in grades {
        let k = key(g).as_ref();
        if known.contains(k) {
            groups.entry(k).or_default().push(g.grade);
        }
    }
    let mut ranked: Vec<_> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.average().total_cmp(&a.1.average()));
    ranked
}

pub fn average_by_course(grades: &[Grade], courses: &[Course]) -> Vec<CourseAverage> {
    let names: HashMap<&str, &str> = courses
        .iter()
        .map(|c| (c.course_id.as_str(), c.name.as_str()))
        .collect();
    let known: HashSet<&str> = names.keys().copied().collect();

    rank(grades, |g| g.course_id.as_str(), &known)
        .into_iter()
        .map(|(id, acc)| CourseAverage {
            course_id: id.to_string(),
            course_name: names.get(id).copied().unwrap_or_default().to_string(),
            average: acc.average(),
            count: acc.count,
        })
        .collect()
}

pub fn average_by_student(grades: &[Grade], students: &[Student]) -> Vec<StudentAverage> {
    let names: HashMap<&str, String> = students
        .iter()
        .map(|s| (s.student_id.as_str(), s.full_name()))
        .collect();
    let known: HashSet<&str> = names.keys().copied().collect();

    rank(grades, |g| g.student_id.as_str(), &known)
        .into_iter()
        .map(|(id, acc)| StudentAverage {
            student_id: id.to_string(),
            student_name: names.get(id).cloned().unwrap_or_default(),
            average: acc.average(),
            count: acc.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use uuid::Uuid;

    fn grade(student_id: &str, course_id: &str, value: f64) -> Grade {
        Grade {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            course_id: course_id.into(),
            grade: value,
            date: date!(2025 - 02 - 01),
        }
    }

    fn course(id: &str, name: &str) -> Course {
        Course {
            course_id: id.into(),
            name: name.into(),
            credits: 3,
        }
    }

    fn student(id: &str, first: &str, last: &str) -> Student {
        Student {
            student_id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    #[test]
    fn summarize_single_pass() {
        let stats = summarize([16.5, 18.0, 15.0, 17.5]).unwrap();
        assert_eq!(stats.average, 16.75);
        assert_eq!(stats.min, 15.0);
        assert_eq!(stats.max, 18.0);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn summarize_empty_is_no_data() {
        assert_eq!(summarize(Vec::<f64>::new()), None);
    }

    #[test]
    fn pass_rate_counts_threshold_as_pass() {
        assert_eq!(pass_rate([9.0, 10.0, 11.0, 19.0], PASS_THRESHOLD), Some(75.0));
        assert_eq!(pass_rate([9.0, 9.5], PASS_THRESHOLD), Some(0.0));
        assert_eq!(pass_rate(Vec::<f64>::new(), PASS_THRESHOLD), None);
    }

    #[test]
    fn pass_rate_rounds_to_one_decimal() {
        // 2 of 3 -> 66.666...
        assert_eq!(pass_rate([12.0, 14.0, 3.0], PASS_THRESHOLD), Some(66.7));
    }

    #[test]
    fn course_ranking_is_descending_and_joined() {
        let courses = [course("C001", "Databases"), course("C002", "Web")];
        let grades = [
            grade("S001", "C001", 10.0),
            grade("S002", "C001", 12.0),
            grade("S001", "C002", 18.0),
        ];
        let ranked = average_by_course(&grades, &courses);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].course_id, "C002");
        assert_eq!(ranked[0].course_name, "Web");
        assert_eq!(ranked[1].average, 11.0);
        assert_eq!(ranked[1].count, 2);
    }

    #[test]
    fn rankings_skip_grades_of_deleted_entities() {
        let students = [student("S001", "Alice", "Martin")];
        let grades = [grade("S001", "C001", 14.0), grade("S999", "C001", 20.0)];
        let ranked = average_by_student(&grades, &students);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].student_name, "Alice Martin");
        assert_eq!(ranked[0].average, 14.0);
    }

    #[test]
    fn ties_keep_key_order() {
        let students = [
            student("S002", "Bob", "Dupont"),
            student("S001", "Alice", "Martin"),
        ];
        let grades = [grade("S002", "C001", 15.0), grade("S001", "C001", 15.0)];
        let ranked = average_by_student(&grades, &students);
        let ids: Vec<_> = ranked.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, ["S001", "S002"]);
        assert_eq!(ranked, average_by_student(&grades, &students));
    }

    #[test]
    fn distinct_students_in_grade_set() {
        let grades = [
            grade("S001", "C001", 14.0),
            grade("S001", "C001", 8.0),
            grade("S002", "C001", 11.0),
        ];
        assert_eq!(distinct_students(&grades), 2);
    }
}
