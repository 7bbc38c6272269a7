//! Per-screen controllers.
//!
//! Each screen owns its state explicitly. Loads commit their results only once
//! every request has finished, so a failed or abandoned load leaves whatever
//! the screen showed before untouched. The pure functions in `search`,
//! `topics` and `stats` run over borrowed snapshots of that state.
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::api::{ClassRepository, EducatorAi, FetchError};
use crate::model::{
    AttendanceRecord, ClassDetail, ClassSummary, Comment, GradeRecord, RosterEntry, StudentDetail,
    StudentRef, Topic,
};
use crate::roster::{build_roster, build_roster_concurrent};
use crate::search;
use crate::stats::{self, RosterStats};
use crate::topics;

pub const STUDENTS_ALERT: &str = "Failed to load students. Please try again.";
pub const CLASSES_ALERT: &str = "Failed to load classes. Please try again.";
pub const CLASS_ALERT: &str = "Failed to load class data. Please try again.";
pub const STUDENT_ALERT: &str = "Failed to load student data. Please try again.";
pub const AI_ALERT: &str = "Failed to get AI response.";

/// Students shown in the class preview list.
pub const CLASS_PREVIEW_LEN: usize = 3;
/// Grade chips shown on the student profile.
pub const RECENT_GRADES_LEN: usize = 4;

/// Holds a screen's loading flag up for as long as a load is in flight.
/// The flag drops back when the load finishes or its future is dropped.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug, Default)]
pub struct ClassesScreen {
    classes: Vec<ClassSummary>,
    loading: bool,
    alert: Option<String>,
}

impl ClassesScreen {
    pub fn classes(&self) -> &[ClassSummary] {
        &self.classes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    #[instrument(skip_all)]
    pub async fn refresh(&mut self, repo: &dyn ClassRepository) -> Result<(), FetchError> {
        let result = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            repo.list_classes().await
        };
        match result {
            Ok(classes) => {
                self.classes = classes;
                self.alert = None;
                Ok(())
            }
            Err(err) => {
                error!(%err, "error fetching classes");
                self.alert = Some(CLASSES_ALERT.to_string());
                Err(err)
            }
        }
    }
}

/// The all-students screen: roster, search box and roll-up counts.
#[derive(Debug, Default)]
pub struct StudentsScreen {
    concurrent: bool,
    classes: Vec<ClassSummary>,
    roster: Vec<RosterEntry>,
    skipped: Vec<i64>,
    query: String,
    loading: bool,
    alert: Option<String>,
}

impl StudentsScreen {
    pub fn new(concurrent: bool) -> Self {
        Self {
            concurrent,
            ..Default::default()
        }
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn classes(&self) -> &[ClassSummary] {
        &self.classes
    }

    /// Classes left out of the last successful load.
    pub fn skipped_classes(&self) -> &[i64] {
        &self.skipped
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn visible(&self) -> Vec<RosterEntry> {
        search::filter(&self.roster, &self.query)
    }

    pub fn stats(&self) -> RosterStats {
        stats::roster_stats(&self.roster, self.classes.len())
    }

    pub fn empty_message(&self) -> String {
        if self.query.is_empty() {
            "No students yet. Add students to your classes to see them here.".to_string()
        } else {
            format!(
                "No students match \"{}\". Try a different search term.",
                self.query
            )
        }
    }

    #[instrument(skip_all, fields(concurrent = self.concurrent))]
    pub async fn refresh(&mut self, repo: &dyn ClassRepository) -> Result<(), FetchError> {
        let loaded = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            match repo.list_classes().await {
                Ok(classes) => {
                    let roster = if self.concurrent {
                        build_roster_concurrent(repo, &classes).await
                    } else {
                        build_roster(repo, &classes).await
                    };
                    Ok((classes, roster))
                }
                Err(err) => Err(err),
            }
        };
        let (classes, roster) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(%err, "error fetching students");
                self.alert = Some(STUDENTS_ALERT.to_string());
                return Err(err);
            }
        };
        info!(
            classes = classes.len(),
            students = roster.entries.len(),
            skipped = roster.skipped.len(),
            "roster loaded"
        );

        self.skipped = roster.skipped.iter().map(|s| s.class_id).collect();
        self.roster = roster.entries;
        self.classes = classes;
        self.alert = None;
        Ok(())
    }
}

/// Summary block of the class detail screen.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassOverview {
    pub student_count: usize,
    pub topic_count: usize,
    pub preview: Vec<StudentRef>,
    /// Set when the preview does not show every student.
    pub view_all: Option<usize>,
}

pub fn class_overview(detail: &ClassDetail) -> ClassOverview {
    let student_count = detail.students.len();
    ClassOverview {
        student_count,
        topic_count: detail.topics.len(),
        preview: detail
            .students
            .iter()
            .take(CLASS_PREVIEW_LEN)
            .cloned()
            .collect(),
        view_all: (student_count > CLASS_PREVIEW_LEN).then_some(student_count),
    }
}

/// One class: its detail, overview, and the week-filtered topic list.
#[derive(Debug)]
pub struct ClassScreen {
    class_id: i64,
    detail: Option<ClassDetail>,
    selected_week: Option<u32>,
    filter_expanded: bool,
    loading: bool,
    alert: Option<String>,
}

impl ClassScreen {
    pub fn new(class_id: i64) -> Self {
        Self {
            class_id,
            detail: None,
            selected_week: None,
            filter_expanded: false,
            loading: false,
            alert: None,
        }
    }

    pub fn class_id(&self) -> i64 {
        self.class_id
    }

    pub fn detail(&self) -> Option<&ClassDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    #[instrument(skip_all, fields(class_id = self.class_id))]
    pub async fn refresh(&mut self, repo: &dyn ClassRepository) -> Result<(), FetchError> {
        let result = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            repo.get_class_detail(self.class_id).await
        };
        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.alert = None;
                Ok(())
            }
            Err(err) => {
                error!(%err, "error fetching class data");
                self.alert = Some(CLASS_ALERT.to_string());
                Err(err)
            }
        }
    }

    pub fn overview(&self) -> Option<ClassOverview> {
        self.detail.as_ref().map(class_overview)
    }

    pub fn toggle_filter(&mut self) {
        self.filter_expanded = !self.filter_expanded;
    }

    pub fn filter_expanded(&self) -> bool {
        self.filter_expanded
    }

    pub fn select_week(&mut self, week: Option<u32>) {
        self.selected_week = week;
    }

    pub fn selected_week(&self) -> Option<u32> {
        self.selected_week
    }

    fn all_topics(&self) -> &[Topic] {
        self.detail.as_ref().map(|d| d.topics.as_slice()).unwrap_or(&[])
    }

    pub fn weeks(&self) -> Vec<u32> {
        topics::distinct_weeks(self.all_topics())
    }

    pub fn visible_topics(&self) -> Vec<Topic> {
        topics::filter_by_week(self.all_topics(), self.selected_week)
    }

    pub fn empty_message(&self) -> String {
        match self.selected_week {
            Some(week) => format!(
                "No topics found for Week {}. Try selecting a different week.",
                week
            ),
            None => "Start adding topics to organize your curriculum and lesson plans.".to_string(),
        }
    }
}

/// Derived figures for the student profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentProfile {
    pub name: String,
    pub class_name: Option<String>,
    pub class_subject: Option<String>,
    pub attendance_rate: u32,
    pub grade_average: f64,
    pub grade_count: usize,
    pub attendance: Vec<AttendanceRecord>,
    pub recent_grades: Vec<GradeRecord>,
    pub comments: Vec<Comment>,
}

impl StudentProfile {
    pub fn from_detail(detail: &StudentDetail) -> Self {
        Self {
            name: detail.name.clone(),
            class_name: detail.class_name.clone(),
            class_subject: detail.class_subject.clone(),
            attendance_rate: stats::attendance_rate(&detail.attendance),
            grade_average: stats::grade_average(&detail.grades),
            grade_count: detail.grades.len(),
            attendance: detail.attendance.clone(),
            recent_grades: detail.grades.iter().take(RECENT_GRADES_LEN).cloned().collect(),
            comments: detail.comments.clone(),
        }
    }

    /// Grade average as shown on the profile, one decimal place.
    pub fn grade_average_label(&self) -> String {
        format!("{:.1}", self.grade_average)
    }
}

#[derive(Debug)]
pub struct StudentScreen {
    student_id: i64,
    detail: Option<StudentDetail>,
    loading: bool,
    alert: Option<String>,
}

impl StudentScreen {
    pub fn new(student_id: i64) -> Self {
        Self {
            student_id,
            detail: None,
            loading: false,
            alert: None,
        }
    }

    pub fn detail(&self) -> Option<&StudentDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn profile(&self) -> Option<StudentProfile> {
        self.detail.as_ref().map(StudentProfile::from_detail)
    }

    #[instrument(skip_all, fields(student_id = self.student_id))]
    pub async fn refresh(&mut self, repo: &dyn ClassRepository) -> Result<(), FetchError> {
        let result = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            repo.get_student(self.student_id).await
        };
        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.alert = None;
                Ok(())
            }
            Err(err) => {
                error!(%err, "error fetching student data");
                self.alert = Some(STUDENT_ALERT.to_string());
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedPrompt {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTED_PROMPTS: [SuggestedPrompt; 4] = [
    SuggestedPrompt {
        title: "Create Lesson Plan",
        subtitle: "Generate a lesson plan for any topic",
        prompt: "Help me create a lesson plan for algebra basics",
    },
    SuggestedPrompt {
        title: "Student Insights",
        subtitle: "Analyze student performance patterns",
        prompt: "What insights can you provide about my students' progress?",
    },
    SuggestedPrompt {
        title: "Schedule Optimizer",
        subtitle: "Optimize your teaching schedule",
        prompt: "Help me optimize my weekly teaching schedule",
    },
    SuggestedPrompt {
        title: "Teaching Ideas",
        subtitle: "Get creative teaching suggestions",
        prompt: "Give me creative ways to teach fractions to middle schoolers",
    },
];

#[derive(Debug, Default)]
pub struct AssistantScreen {
    input: String,
    response: String,
    loading: bool,
    alert: Option<String>,
}

impl AssistantScreen {
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Copy a canned prompt into the input box. Out-of-range indexes are ignored.
    pub fn use_suggestion(&mut self, index: usize) {
        if let Some(s) = SUGGESTED_PROMPTS.get(index) {
            self.input = s.prompt.to_string();
        }
    }

    /// Send the current input. Blank input is not sent. The input box is
    /// cleared afterwards whether or not the request succeeded.
    #[instrument(skip_all)]
    pub async fn send(&mut self, ai: &dyn EducatorAi) -> Result<(), FetchError> {
        if self.input.trim().is_empty() {
            return Ok(());
        }
        self.response.clear();
        let result = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            ai.ask(&self.input).await
        };
        self.input.clear();
        match result {
            Ok(text) => {
                self.response = text;
                self.alert = None;
                Ok(())
            }
            Err(err) => {
                error!(%err, "educator ai request failed");
                self.alert = Some(AI_ALERT.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grade;
    use chrono::NaiveDate;

    fn detail_with_students(n: usize) -> ClassDetail {
        ClassDetail {
            id: 1,
            name: "Algebra".into(),
            subject: "Math".into(),
            color: None,
            topics: vec![],
            students: (0..n)
                .map(|i| StudentRef::new(i as i64, format!("S{i}")))
                .collect(),
        }
    }

    #[test]
    fn overview_previews_three_students() {
        let o = class_overview(&detail_with_students(5));
        assert_eq!(o.student_count, 5);
        assert_eq!(o.preview.len(), 3);
        assert_eq!(o.view_all, Some(5));

        let o = class_overview(&detail_with_students(3));
        assert_eq!(o.preview.len(), 3);
        assert_eq!(o.view_all, None);

        let o = class_overview(&detail_with_students(0));
        assert!(o.preview.is_empty());
    }

    #[test]
    fn profile_derives_rates() {
        let detail = StudentDetail {
            id: Some(10),
            name: "Ann".into(),
            class_name: Some("Algebra".into()),
            class_subject: Some("Math".into()),
            attendance: vec![
                AttendanceRecord {
                    date: NaiveDate::from_ymd_opt(2024, 11, 18).unwrap(),
                    status: crate::model::AttendanceStatus::Present,
                },
                AttendanceRecord {
                    date: NaiveDate::from_ymd_opt(2024, 11, 19).unwrap(),
                    status: crate::model::AttendanceStatus::Absent,
                },
            ],
            grades: ["A", "B", "B", "C", "A"]
                .iter()
                .map(|g| GradeRecord {
                    subject: "Math".into(),
                    grade: Grade::from(*g),
                })
                .collect(),
            comments: vec![],
        };
        let p = StudentProfile::from_detail(&detail);
        assert_eq!(p.attendance_rate, 50);
        assert_eq!(p.grade_count, 5);
        assert_eq!(p.recent_grades.len(), 4);
        assert_eq!(p.grade_average_label(), "3.2");
    }

    #[test]
    fn class_screen_without_detail_is_empty() {
        let mut screen = ClassScreen::new(4);
        assert!(screen.weeks().is_empty());
        assert!(screen.visible_topics().is_empty());
        assert!(screen.overview().is_none());
        screen.select_week(Some(2));
        assert_eq!(
            screen.empty_message(),
            "No topics found for Week 2. Try selecting a different week."
        );
        screen.toggle_filter();
        assert!(screen.filter_expanded());
        screen.toggle_filter();
        assert!(!screen.filter_expanded());
    }

    #[test]
    fn suggestions_fill_input() {
        let mut screen = AssistantScreen::default();
        screen.use_suggestion(3);
        assert_eq!(screen.input(), SUGGESTED_PROMPTS[3].prompt);
        screen.use_suggestion(99);
        assert_eq!(screen.input(), SUGGESTED_PROMPTS[3].prompt);
    }

    #[test]
    fn students_empty_message_mentions_query() {
        let mut screen = StudentsScreen::new(false);
        assert!(screen.empty_message().starts_with("No students yet"));
        screen.set_query("zed");
        assert_eq!(
            screen.empty_message(),
            "No students match \"zed\". Try a different search term."
        );
    }
}
