use tracing::{debug, info, warn};

use crate::api::{JobSource, LiveSearchRequest};
use crate::error::AcquisitionError;
use crate::normalize::{normalize, Normalized, RawBatch};

pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// How the candidate set is acquired. Each variant carries only the
/// parameters that make sense for it.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalMode {
    ProfileMatch { profile_id: i64, min_match: f64 },
    LiveSearch { query: String, location: String },
}

impl RetrievalMode {
    pub fn profile_match(profile_id: i64, min_match: f64) -> Self {
        RetrievalMode::ProfileMatch {
            profile_id,
            min_match: clamp_threshold(min_match),
        }
    }

    pub fn label(&self) -> String {
        match self {
            RetrievalMode::ProfileMatch { profile_id, min_match } => {
                format!("profile #{} (>= {}%)", profile_id, (min_match * 100.0).round() as i64)
            }
            RetrievalMode::LiveSearch { query, .. } if query.trim().is_empty() => "live search".to_string(),
            RetrievalMode::LiveSearch { query, .. } => format!("live search '{}'", query.trim()),
        }
    }
}

/// Match thresholds are fractions in `[0, 1]`.
pub fn clamp_threshold(value: f64) -> f64 {
    if value.is_nan() { DEFAULT_THRESHOLD } else { value.clamp(0.0, 1.0) }
}

/// Fixed live-search request fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSearchDefaults {
    pub country: String,
    pub max_results: usize,
    pub include_alternate_sources: bool,
}

impl Default for LiveSearchDefaults {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            max_results: 12,
            include_alternate_sources: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionRequest {
    Match { profile_id: i64, threshold: f64 },
    Live(LiveSearchRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalState {
    Idle,
    Fetching,
    Ready,
    Failed { message: String },
}

/// An issued acquisition. Whoever performs the request must hand `seq`
/// back to `complete`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub seq: u64,
    pub request: AcquisitionRequest,
}

#[derive(Debug)]
pub enum Completion {
    Ready(Normalized),
    Failed(String),
    /// A newer request was issued after this one; its result was discarded.
    Stale,
}

/// Performs one request against the backend. Free of controller state so
/// it can run on a worker thread.
pub fn execute(source: &dyn JobSource, request: &AcquisitionRequest) -> Result<RawBatch, AcquisitionError> {
    match request {
        AcquisitionRequest::Match { profile_id, threshold } => {
            source.match_jobs(*profile_id, *threshold).map(RawBatch::Matches)
        }
        AcquisitionRequest::Live(live) => source.live_search(live).map(RawBatch::Listings),
    }
}

#[derive(Debug)]
pub struct RetrievalController {
    mode: Option<RetrievalMode>,
    state: RetrievalState,
    issued: u64,
    live_defaults: LiveSearchDefaults,
}

impl RetrievalController {
    pub fn new(live_defaults: LiveSearchDefaults) -> Self {
        Self {
            mode: None,
            state: RetrievalState::Idle,
            issued: 0,
            live_defaults,
        }
    }

    pub fn mode(&self) -> Option<&RetrievalMode> {
        self.mode.as_ref()
    }

    pub fn state(&self) -> &RetrievalState {
        &self.state
    }

    /// Enters `Fetching` for `mode` and shapes the backend request.
    pub fn begin(&mut self, mode: RetrievalMode) -> Ticket {
        self.issued += 1;
        let request = self.shape_request(&mode);
        info!(seq = self.issued, mode = %mode.label(), "acquiring jobs");
        self.mode = Some(mode);
        self.state = RetrievalState::Fetching;
        Ticket {
            seq: self.issued,
            request,
        }
    }

    /// Re-issues the current mode's request, if there is one.
    pub fn retry(&mut self) -> Option<Ticket> {
        let mode = self.mode.clone()?;
        Some(self.begin(mode))
    }

    /// Applies a finished request. Only the most recently issued sequence
    /// number is honoured; anything older is dropped.
    pub fn complete(&mut self, seq: u64, outcome: Result<RawBatch, AcquisitionError>) -> Completion {
        if seq != self.issued {
            debug!(seq, latest = self.issued, "discarding stale acquisition result");
            return Completion::Stale;
        }

        match outcome {
            Ok(batch) => {
                let normalized = normalize(batch);
                info!(seq, records = normalized.records.len(), "acquisition ready");
                self.state = RetrievalState::Ready;
                Completion::Ready(normalized)
            }
            Err(err) => {
                warn!(seq, error = %err, "acquisition failed");
                let message = err.user_message().to_string();
                self.state = RetrievalState::Failed {
                    message: message.clone(),
                };
                Completion::Failed(message)
            }
        }
    }

    fn shape_request(&self, mode: &RetrievalMode) -> AcquisitionRequest {
        match mode {
            RetrievalMode::ProfileMatch { profile_id, min_match } => AcquisitionRequest::Match {
                profile_id: *profile_id,
                threshold: *min_match,
            },
            RetrievalMode::LiveSearch { query, location } => AcquisitionRequest::Live(LiveSearchRequest {
                query: query.trim().to_string(),
                location: location.clone(),
                country: self.live_defaults.country.clone(),
                max_results: self.live_defaults.max_results,
                include_alternate_sources: self.live_defaults.include_alternate_sources,
            }),
        }
    }
}
