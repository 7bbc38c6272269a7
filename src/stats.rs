use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus, GradeRecord, RosterEntry};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RosterStats {
    pub total_students: usize,
    pub total_classes: usize,
    pub average_per_class: u64,
}

/// Round half up. Inputs are never negative.
fn round_half_up(value: f64) -> u64 {
    (value + 0.5).floor() as u64
}

pub fn roster_stats(roster: &[RosterEntry], class_count: usize) -> RosterStats {
    let total_students = roster.len();
    let average_per_class = if class_count > 0 {
        round_half_up(total_students as f64 / class_count as f64)
    } else {
        0
    };
    RosterStats {
        total_students,
        total_classes: class_count,
        average_per_class,
    }
}

/// Percentage of records marked present, rounded; 0 with no records.
pub fn attendance_rate(records: &[AttendanceRecord]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    round_half_up(100.0 * present as f64 / records.len() as f64) as u32
}

/// Mean grade points. Unknown letters count as zero, not as missing.
pub fn grade_average(records: &[GradeRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: f64 = records.iter().map(|r| r.grade.points()).sum();
    total / records.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassSummary, Grade, StudentRef};
    use chrono::NaiveDate;

    fn attendance(statuses: &[AttendanceStatus]) -> Vec<AttendanceRecord> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| AttendanceRecord {
                date: NaiveDate::from_ymd_opt(2024, 11, 18 + i as u32).unwrap(),
                status: *s,
            })
            .collect()
    }

    fn grades(letters: &[&str]) -> Vec<GradeRecord> {
        letters
            .iter()
            .map(|g| GradeRecord {
                subject: "Math".into(),
                grade: Grade::from(*g),
            })
            .collect()
    }

    fn roster(n: usize) -> Vec<RosterEntry> {
        let class = ClassSummary {
            id: 1,
            name: "Algebra".into(),
            subject: "Math".into(),
            color: None,
        };
        (0..n)
            .map(|i| RosterEntry::new(StudentRef::new(i as i64, format!("S{i}")), &class))
            .collect()
    }

    #[test]
    fn empty_roster_has_zero_average() {
        let stats = roster_stats(&[], 0);
        assert_eq!(stats.average_per_class, 0);
        assert_eq!(stats.total_students, 0);
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(roster_stats(&roster(5), 2).average_per_class, 3);
        assert_eq!(roster_stats(&roster(7), 3).average_per_class, 2);
        assert_eq!(roster_stats(&roster(8), 3).average_per_class, 3);
        assert_eq!(roster_stats(&roster(3), 0).average_per_class, 0);
        let stats = roster_stats(&roster(4), 2);
        assert_eq!(stats.total_classes, 2);
        assert_eq!(stats.average_per_class, 2);
    }

    #[test]
    fn attendance_rate_rounds_percentage() {
        use AttendanceStatus::*;
        assert_eq!(attendance_rate(&attendance(&[Present, Present, Absent, Present])), 75);
        assert_eq!(attendance_rate(&attendance(&[Present, Absent, Absent])), 33);
        assert_eq!(attendance_rate(&attendance(&[Present, Present, Absent])), 67);
        assert_eq!(attendance_rate(&attendance(&[Present, Unknown])), 50);
        assert_eq!(attendance_rate(&[]), 0);
    }

    #[test]
    fn grade_average_maps_letters() {
        assert_eq!(grade_average(&grades(&["A", "B"])), 3.5);
        assert_eq!(grade_average(&grades(&["F", "D", "C"])), 1.0);
        assert_eq!(grade_average(&[]), 0.0);
    }

    #[test]
    fn unknown_letters_count_as_zero() {
        assert_eq!(grade_average(&grades(&["A", "E"])), 2.0);
        assert_eq!(grade_average(&grades(&["A+"])), 0.0);
    }
}
