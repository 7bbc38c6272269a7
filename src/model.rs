use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Row of `GET /api/classes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body of `GET /api/classes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassDetail {
    pub id: i64,
    pub name: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub students: Vec<StudentRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    /// Weeks are numbered from 1; a zero week is rejected on decode.
    pub week_number: NonZeroU32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Student as embedded in a class detail. Only id and name are typed;
/// everything else (email, embedded attendance or grades) is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentRef {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StudentRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// A student annotated with the metadata of the class it was found in.
/// One entry exists per (student id, class id) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub student: StudentRef,
    pub class_id: i64,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub class_subject: Option<String>,
    #[serde(default)]
    pub class_color: Option<String>,
}

impl RosterEntry {
    pub fn new(student: StudentRef, class: &ClassSummary) -> Self {
        Self {
            student,
            class_id: class.id,
            class_name: Some(class.name.clone()),
            class_subject: Some(class.subject.clone()),
            class_color: class.color.clone(),
        }
    }

    pub fn id(&self) -> i64 {
        self.student.id
    }

    pub fn name(&self) -> &str {
        &self.student.name
    }

    /// Composite key `(student id, class id)`.
    pub fn key(&self) -> (i64, i64) {
        (self.student.id, self.class_id)
    }
}

/// Body of `GET /api/students/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentDetail {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub class_subject: Option<String>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub grades: Vec<GradeRecord>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(other)]
    Unknown,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Accepts `2024-11-18`, an RFC 3339 timestamp, or a naive
/// `2024-11-18T09:00:00`; the time part is dropped.
fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date `{}`", raw)))
}

/// Letter grade. Letters outside A-F are kept verbatim in `Other`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    Other(String),
}

impl Grade {
    /// Grade-point mapping: A=4 .. F=0; unrecognised letters are worth 0.
    pub fn points(&self) -> f64 {
        match self {
            Grade::A => 4.0,
            Grade::B => 3.0,
            Grade::C => 2.0,
            Grade::D => 1.0,
            Grade::F | Grade::Other(_) => 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::Other(s) => s,
        }
    }
}

impl From<String> for Grade {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "A" => Grade::A,
            "B" => Grade::B,
            "C" => Grade::C,
            "D" => Grade::D,
            "F" => Grade::F,
            _ => Grade::Other(raw),
        }
    }
}

impl From<&str> for Grade {
    fn from(raw: &str) -> Self {
        Grade::from(raw.to_string())
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradeRecord {
    pub subject: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub comment_text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Quiz,
    Test,
    Assignment,
    Lab,
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Quiz => "quiz",
            EventKind::Test => "test",
            EventKind::Assignment => "assignment",
            EventKind::Lab => "lab",
            EventKind::Other => "other",
        }
    }

    /// Quizzes and tests are timed assessments; the rest are coursework.
    pub fn is_assessment(&self) -> bool {
        matches!(self, EventKind::Quiz | EventKind::Test)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub class_name: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}
