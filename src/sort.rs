use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::criteria::SortKey;
use crate::models::JobRecord;

/// Sorts descending by the chosen key. `sort_by` is stable, so records with
/// equal keys keep their incoming order; there is no secondary key.
pub fn sort_records<R: Borrow<JobRecord>>(records: &mut [R], key: SortKey) {
    records.sort_by(|a, b| compare(b.borrow(), a.borrow(), key));
}

fn compare(a: &JobRecord, b: &JobRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Match => score(a).total_cmp(&score(b)),
        SortKey::Newest => posted_millis(a).cmp(&posted_millis(b)),
        SortKey::Salary => salary(a).total_cmp(&salary(b)),
    }
}

fn score(record: &JobRecord) -> f64 {
    record.match_score.unwrap_or(0.0)
}

// Missing timestamps sort as the epoch.
fn posted_millis(record: &JobRecord) -> i64 {
    record.created_at.map(|at| at.timestamp_millis()).unwrap_or(0)
}

fn salary(record: &JobRecord) -> f64 {
    record.salary_min.unwrap_or(0.0)
}
