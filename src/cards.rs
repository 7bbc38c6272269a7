//! List-row cards for each entity kind, rendered as plain text lines.
use chrono::NaiveDate;

use crate::model::{CalendarEvent, ClassSummary, EventKind, RosterEntry, Topic};

/// Accent used when a class has no color of its own.
pub const DEFAULT_ACCENT: &str = "#4F46E5";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCard {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentCard {
    pub id: i64,
    pub initial: char,
    pub name: String,
    pub class_name: Option<String>,
    pub class_subject: Option<String>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCard {
    pub id: i64,
    pub title: String,
    pub week_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub class_name: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Card {
    Class(ClassCard),
    Student(StudentCard),
    Topic(TopicCard),
    Event(EventCard),
}

impl From<&ClassSummary> for Card {
    fn from(c: &ClassSummary) -> Self {
        Card::Class(ClassCard {
            id: c.id,
            name: c.name.clone(),
            subject: c.subject.clone(),
            color: c.color.clone().unwrap_or_else(|| DEFAULT_ACCENT.to_string()),
        })
    }
}

impl From<&RosterEntry> for Card {
    fn from(e: &RosterEntry) -> Self {
        Card::Student(StudentCard {
            id: e.id(),
            initial: e.name().chars().next().unwrap_or('?'),
            name: e.name().to_string(),
            class_name: e.class_name.clone(),
            class_subject: e.class_subject.clone(),
            color: e
                .class_color
                .clone()
                .unwrap_or_else(|| DEFAULT_ACCENT.to_string()),
        })
    }
}

impl From<&Topic> for Card {
    fn from(t: &Topic) -> Self {
        Card::Topic(TopicCard {
            id: t.id,
            title: t.title.clone(),
            week_number: t.week_number.get(),
        })
    }
}

impl From<&CalendarEvent> for Card {
    fn from(e: &CalendarEvent) -> Self {
        Card::Event(EventCard {
            id: e.id,
            title: e.title.clone(),
            date: e.date,
            class_name: e.class_name.clone(),
            kind: e.kind,
        })
    }
}

pub fn render(card: &Card) -> String {
    match card {
        Card::Class(c) => format!("[{}] {} · {} ({})", c.id, c.name, c.subject, c.color),
        Card::Student(s) => {
            let class = match (&s.class_name, &s.class_subject) {
                (Some(n), Some(sub)) => format!("{} · {}", n, sub),
                (Some(n), None) => n.clone(),
                (None, Some(sub)) => sub.clone(),
                (None, None) => "Unassigned".to_string(),
            };
            format!("({}) {} #{} - {}", s.initial, s.name, s.id, class)
        }
        Card::Topic(t) => format!("{} · Week {}", t.title, t.week_number),
        Card::Event(e) => format!(
            "{} {} [{}] {}",
            e.date.format("%a %b %-d"),
            e.title,
            e.kind.as_str(),
            e.class_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StudentRef;

    #[test]
    fn student_card_falls_back_to_accent() {
        let class = ClassSummary {
            id: 2,
            name: "Biology".into(),
            subject: "Science".into(),
            color: None,
        };
        let card = Card::from(&RosterEntry::new(StudentRef::new(11, "Bo"), &class));
        match &card {
            Card::Student(s) => {
                assert_eq!(s.color, DEFAULT_ACCENT);
                assert_eq!(s.initial, 'B');
            }
            other => panic!("unexpected card {:?}", other),
        }
        assert!(render(&card).contains("Biology · Science"));
    }

    #[test]
    fn topic_and_event_render() {
        let topic = Topic {
            id: 1,
            title: "Fractions".into(),
            week_number: std::num::NonZeroU32::new(3).unwrap(),
            created_at: None,
        };
        assert_eq!(render(&Card::from(&topic)), "Fractions · Week 3");

        let event = CalendarEvent {
            id: 1,
            title: "Quiz on Linear Equations".into(),
            date: NaiveDate::from_ymd_opt(2024, 11, 18).unwrap(),
            class_name: "Algebra I".into(),
            kind: EventKind::Quiz,
        };
        assert_eq!(
            render(&Card::from(&event)),
            "Mon Nov 18 Quiz on Linear Equations [quiz] Algebra I"
        );
    }
}
