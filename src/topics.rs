use std::collections::BTreeSet;

use crate::model::Topic;

/// Distinct week numbers present in `topics`, ascending.
pub fn distinct_weeks(topics: &[Topic]) -> Vec<u32> {
    topics
        .iter()
        .map(|t| t.week_number.get())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Topics of one week in their original order; `None` keeps everything.
pub fn filter_by_week(topics: &[Topic], week: Option<u32>) -> Vec<Topic> {
    match week {
        None => topics.to_vec(),
        Some(w) => topics
            .iter()
            .filter(|t| t.week_number.get() == w)
            .cloned()
            .collect(),
    }
}
