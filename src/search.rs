use crate::model::RosterEntry;

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// True when `needle` (already lowercased) occurs in the student name, class
/// name or class subject. Absent class fields simply do not match.
pub fn matches(entry: &RosterEntry, needle: &str) -> bool {
    contains_folded(entry.name(), needle)
        || entry
            .class_name
            .as_deref()
            .is_some_and(|n| contains_folded(n, needle))
        || entry
            .class_subject
            .as_deref()
            .is_some_and(|s| contains_folded(s, needle))
}

/// Case-insensitive substring search over the roster.
///
/// A blank query returns the roster unchanged. The query itself is not
/// trimmed when matching, so `"ann "` only matches text containing the space.
pub fn filter(roster: &[RosterEntry], query: &str) -> Vec<RosterEntry> {
    if query.trim().is_empty() {
        return roster.to_vec();
    }
    let needle = query.to_lowercase();
    roster
        .iter()
        .filter(|entry| matches(entry, &needle))
        .cloned()
        .collect()
}
