//! Flattens the students of every class into one annotated roster.
//!
//! A class whose detail cannot be fetched contributes nothing; the rest of
//! the batch still goes through. Output order is always class order, then
//! the order students appear inside each class detail.
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::api::{ClassRepository, FetchError};
use crate::model::{ClassDetail, ClassSummary, RosterEntry};

/// A class whose detail fetch failed while building the roster.
#[derive(Debug)]
pub struct SkippedClass {
    pub class_id: i64,
    pub error: FetchError,
}

/// Result of one aggregation pass.
#[derive(Debug, Default)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub skipped: Vec<SkippedClass>,
}

/// Annotate one class's students with the summary's name, subject and color.
pub fn entries_for_class(class: &ClassSummary, detail: ClassDetail) -> Vec<RosterEntry> {
    detail
        .students
        .into_iter()
        .map(|student| RosterEntry::new(student, class))
        .collect()
}

fn collect<I>(results: I) -> Roster
where
    I: IntoIterator<Item = (i64, Result<Vec<RosterEntry>, FetchError>)>,
{
    let mut roster = Roster::default();
    for (class_id, result) in results {
        match result {
            Ok(mut entries) => {
                debug!(class_id, students = entries.len(), "class merged into roster");
                roster.entries.append(&mut entries);
            }
            Err(error) => {
                warn!(class_id, %error, "skipping class: detail fetch failed");
                roster.skipped.push(SkippedClass { class_id, error });
            }
        }
    }
    roster
}

/// Fetch each class detail one at a time, in listed order.
#[instrument(skip_all, fields(classes = classes.len()))]
pub async fn build_roster(repo: &dyn ClassRepository, classes: &[ClassSummary]) -> Roster {
    let mut results = Vec::with_capacity(classes.len());
    for class in classes {
        let result = repo
            .get_class_detail(class.id)
            .await
            .map(|detail| entries_for_class(class, detail));
        results.push((class.id, result));
    }
    collect(results)
}

/// Fetch all class details at once. `join_all` yields results in input
/// order, so the roster matches `build_roster` regardless of completion order.
#[instrument(skip_all, fields(classes = classes.len()))]
pub async fn build_roster_concurrent(
    repo: &dyn ClassRepository,
    classes: &[ClassSummary],
) -> Roster {
    let fetches = classes.iter().map(|class| async move {
        let result = repo
            .get_class_detail(class.id)
            .await
            .map(|detail| entries_for_class(class, detail));
        (class.id, result)
    });
    collect(join_all(fetches).await)
}
