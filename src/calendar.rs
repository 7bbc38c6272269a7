use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{CalendarEvent, EventKind};

/// The Sunday-to-Saturday week containing `today`.
pub fn week_of(today: NaiveDate) -> [NaiveDate; 7] {
    let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

pub fn events_on(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|e| e.date == date).collect()
}

/// Events falling inside the week of `today`, ordered by date.
pub fn events_in_week(events: &[CalendarEvent], today: NaiveDate) -> Vec<&CalendarEvent> {
    let week = week_of(today);
    let mut hits: Vec<&CalendarEvent> = events
        .iter()
        .filter(|e| e.date >= week[0] && e.date <= week[6])
        .collect();
    hits.sort_by_key(|e| e.date);
    hits
}

fn event(
    id: i64,
    title: &str,
    (y, m, d): (i32, u32, u32),
    class_name: &str,
    kind: EventKind,
) -> Option<CalendarEvent> {
    Some(CalendarEvent {
        id,
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(y, m, d)?,
        class_name: class_name.to_string(),
        kind,
    })
}

/// Fixed event feed; the backend has no events endpoint.
pub fn sample_events() -> Vec<CalendarEvent> {
    [
        event(1, "Quiz on Linear Equations", (2024, 11, 18), "Algebra I", EventKind::Quiz),
        event(2, "Group Project Due", (2024, 11, 20), "Algebra I", EventKind::Assignment),
        event(3, "Lab Experiment", (2024, 11, 19), "Biology 101", EventKind::Lab),
        event(4, "Chapter Test", (2024, 11, 21), "Biology 101", EventKind::Test),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        let week = week_of(ymd(2024, 11, 20));
        assert_eq!(week[0], ymd(2024, 11, 17));
        assert_eq!(week[0].weekday(), Weekday::Sun);
        assert_eq!(week[6], ymd(2024, 11, 23));

        let week = week_of(ymd(2024, 11, 17));
        assert_eq!(week[0], ymd(2024, 11, 17));
    }

    #[test]
    fn week_crosses_month_boundary() {
        let week = week_of(ymd(2024, 12, 2));
        assert_eq!(week[0], ymd(2024, 12, 1));
        let week = week_of(ymd(2024, 11, 30));
        assert_eq!(week[6], ymd(2024, 11, 30));
        assert_eq!(week[0], ymd(2024, 11, 24));
    }

    #[test]
    fn sample_events_group_by_day() {
        let events = sample_events();
        assert_eq!(events.len(), 4);
        let on_19th = events_on(&events, ymd(2024, 11, 19));
        assert_eq!(on_19th.len(), 1);
        assert_eq!(on_19th[0].title, "Lab Experiment");

        let in_week: Vec<i64> = events_in_week(&events, ymd(2024, 11, 20))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(in_week, vec![1, 3, 2, 4]);
        assert!(events_in_week(&events, ymd(2024, 12, 20)).is_empty());

        let assessments = events_in_week(&events, ymd(2024, 11, 17))
            .into_iter()
            .filter(|e| e.kind.is_assessment())
            .count();
        assert_eq!(assessments, 2);
    }
}
