use tracing::{debug, warn};

use crate::models::{JobKey, JobPayload, JobRecord, JobType, MatchItem};

/// Raw response from one acquisition, still in its source-specific shape.
#[derive(Debug, Clone)]
pub enum RawBatch {
    Matches(Vec<MatchItem>),
    Listings(Vec<JobPayload>),
}

impl RawBatch {
    pub fn len(&self) -> usize {
        match self {
            RawBatch::Matches(items) => items.len(),
            RawBatch::Listings(items) => items.len(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<JobRecord>,
    /// Items that had neither an id nor an application URL.
    pub dropped: usize,
}

pub fn normalize(batch: RawBatch) -> Normalized {
    let received = batch.len();
    let records: Vec<JobRecord> = match batch {
        RawBatch::Matches(items) => items.into_iter().filter_map(from_match_item).collect(),
        RawBatch::Listings(items) => items.into_iter().filter_map(from_listing).collect(),
    };

    let dropped = received - records.len();
    if dropped > 0 {
        warn!(dropped, received, "dropped job items without id or application url");
    }
    debug!(kept = records.len(), "normalized batch");

    Normalized { records, dropped }
}

/// Profile-match shape: `{ job: {...}, match_score }`.
pub fn from_match_item(item: MatchItem) -> Option<JobRecord> {
    let job = item.job?;
    let score = item
        .match_score
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 100.0));
    build_record(job, score)
}

/// Live-search shape: already a flat job.
pub fn from_listing(payload: JobPayload) -> Option<JobRecord> {
    build_record(payload, None)
}

fn build_record(payload: JobPayload, match_score: Option<f64>) -> Option<JobRecord> {
    let application_url = non_blank(payload.application_url);
    let key = match (payload.id, &application_url) {
        (Some(id), _) => JobKey::Id(id),
        (None, Some(url)) => JobKey::Url(url.clone()),
        (None, None) => return None,
    };

    Some(JobRecord {
        key,
        title: payload.title.unwrap_or_default(),
        company_name: payload.company_name.unwrap_or_default(),
        location: payload.location.unwrap_or_default(),
        job_type: JobType::from_payload(payload.job_type.as_deref()),
        salary_min: non_negative(payload.salary_min),
        salary_max: non_negative(payload.salary_max),
        description: payload.description.unwrap_or_default(),
        created_at: payload.created_at,
        source: non_blank(payload.source),
        application_url,
        match_score,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: Option<i64>, url: Option<&str>) -> JobPayload {
        JobPayload {
            id,
            title: Some("Rust Developer".to_string()),
            company_name: Some("Ferrous".to_string()),
            application_url: url.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_match_item_carries_score() {
        let item = MatchItem {
            job: Some(payload(Some(3), None)),
            match_score: Some(81.5),
        };
        let record = from_match_item(item).unwrap();
        assert_eq!(record.key, JobKey::Id(3));
        assert_eq!(record.match_score, Some(81.5));
        assert_eq!(record.job_type, JobType::Unknown);
    }

    #[test]
    fn test_nan_score_does_not_outrank_real_scores() {
        let items: Vec<MatchItem> = serde_json::from_str(
            r#"[{"job": {"id": 1}, "match_score": 90}, {"job": {"id": 2}, "match_score": "NaN"}]"#,
        )
        .unwrap();
        let mut records = normalize(RawBatch::Matches(items)).records;
        assert_eq!(records[1].match_score, None);

        crate::sort::sort_records(&mut records, crate::criteria::SortKey::Match);
        let order: Vec<Option<i64>> = records.iter().map(|r| r.id()).collect();
        assert_eq!(order, vec![Some(1), Some(2)]);

        let direct = MatchItem {
            job: Some(payload(Some(3), None)),
            match_score: Some(f64::NAN),
        };
        assert_eq!(from_match_item(direct).unwrap().match_score, None);
    }

    #[test]
    fn test_listing_uses_url_identity_and_defaults() {
        let mut p = payload(None, Some("https://example.com/apply/9"));
        p.source = Some("".to_string());
        p.salary_min = Some(-5.0);
        let record = from_listing(p).unwrap();
        assert_eq!(record.key, JobKey::Url("https://example.com/apply/9".to_string()));
        assert!(record.source.is_none());
        assert!(record.salary_min.is_none());
        assert!(record.match_score.is_none());
    }

    #[test]
    fn test_items_without_identity_are_dropped() {
        let batch = RawBatch::Listings(vec![
            payload(Some(1), None),
            payload(None, None),
            payload(None, Some("   ")),
            payload(None, Some("https://example.com/x")),
        ]);
        let normalized = normalize(batch);
        assert_eq!(normalized.records.len(), 2);
        assert_eq!(normalized.dropped, 2);

        let batch = RawBatch::Matches(vec![MatchItem { job: None, match_score: Some(50.0) }]);
        let normalized = normalize(batch);
        assert!(normalized.records.is_empty());
        assert_eq!(normalized.dropped, 1);
    }
}
