//! In-memory backend and record builders shared by unit tests.

use std::sync::Mutex;

use crate::api::{JobSource, LiveSearchRequest};
use crate::error::AcquisitionError;
use crate::models::{JobPayload, MatchItem, Profile};
use crate::retrieval::AcquisitionRequest;

#[derive(Default)]
pub struct FakeSource {
    pub profiles: Vec<Profile>,
    pub profiles_fail: bool,
    pub matches: Vec<MatchItem>,
    pub listings: Vec<JobPayload>,
    pub fail_jobs: bool,
    pub calls: Mutex<Vec<AcquisitionRequest>>,
}

impl FakeSource {
    pub fn calls(&self) -> Vec<AcquisitionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, request: AcquisitionRequest) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
    }

    fn failure() -> AcquisitionError {
        AcquisitionError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }
}

impl JobSource for FakeSource {
    fn list_profiles(&self) -> Result<Vec<Profile>, AcquisitionError> {
        if self.profiles_fail {
            return Err(Self::failure());
        }
        Ok(self.profiles.clone())
    }

    fn match_jobs(&self, profile_id: i64, threshold: f64) -> Result<Vec<MatchItem>, AcquisitionError> {
        self.record(AcquisitionRequest::Match { profile_id, threshold });
        if self.fail_jobs {
            return Err(Self::failure());
        }
        Ok(self.matches.clone())
    }

    fn live_search(&self, request: &LiveSearchRequest) -> Result<Vec<JobPayload>, AcquisitionError> {
        self.record(AcquisitionRequest::Live(request.clone()));
        if self.fail_jobs {
            return Err(Self::failure());
        }
        Ok(self.listings.clone())
    }
}

pub fn profile(id: i64, title: &str) -> Profile {
    Profile {
        id,
        title: title.to_string(),
        skills: Vec::new(),
        is_active: true,
        created_at: None,
    }
}

pub fn payload(id: i64, title: &str, location: &str, source: Option<&str>) -> JobPayload {
    JobPayload {
        id: Some(id),
        title: Some(title.to_string()),
        company_name: Some("Acme".to_string()),
        location: Some(location.to_string()),
        job_type: Some("full_time".to_string()),
        description: Some(format!("{} role", title)),
        source: source.map(String::from),
        ..Default::default()
    }
}

pub fn scored(id: i64, title: &str, score: f64) -> MatchItem {
    MatchItem {
        job: Some(payload(id, title, "Bengaluru, India", None)),
        match_score: Some(score),
    }
}
