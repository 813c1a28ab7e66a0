use crate::criteria::SearchCriteria;
use crate::models::{JobRecord, JobType};

/// Conjunction of the five refinement predicates. Built once per
/// recomputation so the lowercased needles are not rebuilt per record.
pub struct FilterPipeline {
    query: Option<String>,
    location: Option<String>,
    job_type: Option<JobType>,
    min_salary: Option<f64>,
    sources: Vec<String>,
}

impl FilterPipeline {
    pub fn new(criteria: &SearchCriteria) -> Self {
        Self {
            query: lowered(&criteria.query),
            location: lowered(&criteria.location),
            job_type: criteria.job_type,
            min_salary: criteria.min_salary.filter(|v| *v > 0.0),
            sources: criteria.sources.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Keeps records that pass every active predicate, in input order.
    #[cfg(test)]
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a JobRecord>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        records.into_iter().filter(|r| self.accepts(r)).collect()
    }

    pub fn accepts(&self, record: &JobRecord) -> bool {
        self.text_matches(record)
            && self.location_matches(record)
            && self.job_type_matches(record)
            && self.salary_matches(record)
            && self.source_matches(record)
    }

    fn text_matches(&self, record: &JobRecord) -> bool {
        let Some(q) = &self.query else { return true };
        contains(&record.title, q) || contains(&record.company_name, q) || contains(&record.description, q)
    }

    fn location_matches(&self, record: &JobRecord) -> bool {
        let Some(loc) = &self.location else { return true };
        contains(&record.location, loc)
    }

    fn job_type_matches(&self, record: &JobRecord) -> bool {
        self.job_type.is_none_or(|t| record.job_type == t)
    }

    fn salary_matches(&self, record: &JobRecord) -> bool {
        self.min_salary
            .is_none_or(|min| record.salary_min.unwrap_or(0.0) >= min)
    }

    // A record without a source can never satisfy a non-empty facet.
    fn source_matches(&self, record: &JobRecord) -> bool {
        if self.sources.is_empty() {
            return true;
        }
        match &record.source {
            Some(source) => {
                let source = source.to_lowercase();
                self.sources.iter().any(|s| *s == source)
            }
            None => false,
        }
    }
}

fn lowered(needle: &str) -> Option<String> {
    if needle.is_empty() {
        None
    } else {
        Some(needle.to_lowercase())
    }
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobKey;

    fn job(id: i64, title: &str, source: Option<&str>) -> JobRecord {
        JobRecord {
            key: JobKey::Id(id),
            title: title.to_string(),
            company_name: "Initech".to_string(),
            location: "Remote - India".to_string(),
            job_type: JobType::FullTime,
            salary_min: None,
            salary_max: None,
            description: "Build services".to_string(),
            created_at: None,
            source: source.map(String::from),
            application_url: None,
            match_score: None,
        }
    }

    #[test]
    fn test_empty_criteria_passes_everything() {
        let records = vec![job(1, "A", None), job(2, "B", Some("Indeed"))];
        let kept = FilterPipeline::new(&SearchCriteria::default()).apply(&records);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_text_query_checks_title_company_description() {
        let mut records = vec![job(1, "Platform Engineer", None), job(2, "Designer", None)];
        records[1].description = "Work with ENGINEERING teams".to_string();
        let mut third = job(3, "Analyst", None);
        third.company_name = "Engineer Corp".to_string();
        records.push(third);
        records.push(job(4, "Accountant", None));

        let criteria = SearchCriteria { query: "engineer".to_string(), ..Default::default() };
        let ids: Vec<_> = FilterPipeline::new(&criteria)
            .apply(&records)
            .iter()
            .filter_map(|r| r.id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_location_type_and_salary() {
        let mut records = vec![job(1, "A", None), job(2, "B", None), job(3, "C", None)];
        records[0].salary_min = Some(900000.0);
        records[1].job_type = JobType::Contract;
        records[1].salary_min = Some(1000000.0);
        records[2].location = "Berlin".to_string();

        let criteria = SearchCriteria {
            location: "india".to_string(),
            job_type: Some(JobType::FullTime),
            min_salary: Some(800000.0),
            ..Default::default()
        };
        let kept = FilterPipeline::new(&criteria).apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), Some(1));

        // Missing salary counts as zero.
        let criteria = SearchCriteria { min_salary: Some(1.0), ..Default::default() };
        assert_eq!(FilterPipeline::new(&criteria).apply(&records).len(), 2);
    }

    #[test]
    fn test_source_facet_excludes_unsourced_records() {
        let records = vec![
            job(1, "A", Some("Indeed")),
            job(2, "B", None),
            job(3, "C", Some("LinkedIn")),
        ];
        let mut criteria = SearchCriteria::default();
        criteria.sources.insert("LinkedIn".to_string());
        let kept = FilterPipeline::new(&criteria).apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), Some(3));
    }

    #[test]
    fn test_filtering_is_idempotent_and_order_preserving() {
        let records: Vec<JobRecord> = (0..20)
            .map(|i| {
                let source = if i % 3 == 0 { Some("Naukri") } else { Some("Indeed") };
                let title = if i % 2 == 0 { "Rust Engineer" } else { "Manager" };
                job(i, title, source)
            })
            .collect();
        let mut criteria = SearchCriteria { query: "engineer".to_string(), ..Default::default() };
        criteria.sources.insert("naukri".to_string());

        let pipeline = FilterPipeline::new(&criteria);
        let once = pipeline.apply(&records);
        let twice = pipeline.apply(once.iter().copied());
        assert_eq!(once, twice);
        let ids: Vec<_> = once.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec![0, 6, 12, 18]);
    }
}
