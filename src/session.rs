use std::borrow::Borrow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::api::JobSource;
use crate::criteria::{PageSize, SearchCriteria, SortKey, TextDraft};
use crate::debounce::{Debouncer, TimerHandle, DEFAULT_DELAY};
use crate::error::AcquisitionError;
use crate::filter::FilterPipeline;
use crate::models::{JobRecord, JobType, Profile};
use crate::normalize::RawBatch;
use crate::paginate::{clamp_page, paginate, total_pages};
use crate::retrieval::{
    self, clamp_threshold, Completion, LiveSearchDefaults, RetrievalController, RetrievalMode,
    RetrievalState, Ticket, DEFAULT_THRESHOLD,
};
use crate::sort::sort_records;

pub const NO_JOBS_MESSAGE: &str = "No jobs found";

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub default_threshold: f64,
    pub default_location: String,
    pub page_size: PageSize,
    pub live: LiveSearchDefaults,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DELAY,
            default_threshold: DEFAULT_THRESHOLD,
            default_location: "India".to_string(),
            page_size: PageSize::default(),
            live: LiveSearchDefaults::default(),
        }
    }
}

/// What the user currently sees.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub items: Vec<&'a JobRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageView<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct Slot<'a> {
    index: usize,
    record: &'a JobRecord,
}

impl Borrow<JobRecord> for Slot<'_> {
    fn borrow(&self) -> &JobRecord {
        self.record
    }
}

/// All state for one search screen: the acquired records, the refinement
/// criteria and the acquisition preferences. Every mutation goes through
/// `&mut self`, so the owner's event loop serializes them.
pub struct SearchSession {
    records: Vec<JobRecord>,
    /// Indices into `records` after filtering and sorting.
    view: Vec<usize>,
    criteria: SearchCriteria,
    draft: TextDraft,
    debouncer: Debouncer<TextDraft>,
    edit_timer: Option<TimerHandle>,
    controller: RetrievalController,
    profiles: Vec<Profile>,
    use_profile: bool,
    selected_profile: Option<i64>,
    threshold: f64,
    dropped: usize,
    recomputations: u64,
}

impl SearchSession {
    pub fn new(settings: SessionSettings) -> Self {
        let criteria = SearchCriteria {
            location: settings.default_location.clone(),
            page_size: settings.page_size,
            ..Default::default()
        };
        let draft = TextDraft::from_criteria(&criteria);

        Self {
            records: Vec::new(),
            view: Vec::new(),
            criteria,
            draft,
            debouncer: Debouncer::new(settings.debounce),
            edit_timer: None,
            controller: RetrievalController::new(settings.live),
            profiles: Vec::new(),
            use_profile: false,
            selected_profile: None,
            threshold: clamp_threshold(settings.default_threshold),
            dropped: 0,
            recomputations: 0,
        }
    }

    // --- Acquisition ---

    /// Loads saved profiles and starts the first acquisition: profile match
    /// on the first profile if any exist, live search otherwise.
    pub fn mount(&mut self, source: &dyn JobSource) -> Ticket {
        self.profiles = match source.list_profiles() {
            Ok(profiles) => profiles,
            Err(err) => {
                warn!(error = %err, "could not load profiles, using live search");
                Vec::new()
            }
        };
        self.selected_profile = self.profiles.first().map(|p| p.id);
        self.use_profile = self.selected_profile.is_some();
        self.refetch()
    }

    pub fn desired_mode(&self) -> RetrievalMode {
        match (self.use_profile, self.selected_profile) {
            (true, Some(id)) => RetrievalMode::profile_match(id, self.threshold),
            _ => RetrievalMode::LiveSearch {
                query: self.criteria.query.clone(),
                location: self.criteria.location.clone(),
            },
        }
    }

    pub fn refetch(&mut self) -> Ticket {
        self.criteria.page = 1;
        let mode = self.desired_mode();
        self.controller.begin(mode)
    }

    pub fn retry(&mut self) -> Ticket {
        self.criteria.page = 1;
        match self.controller.retry() {
            Some(ticket) => ticket,
            None => {
                let mode = self.desired_mode();
                self.controller.begin(mode)
            }
        }
    }

    /// Applies a finished acquisition. Returns false for a stale result.
    pub fn complete(&mut self, seq: u64, outcome: Result<RawBatch, AcquisitionError>) -> bool {
        match self.controller.complete(seq, outcome) {
            Completion::Stale => false,
            Completion::Ready(normalized) => {
                self.records = normalized.records;
                self.dropped = normalized.dropped;
                self.criteria.page = 1;
                self.recompute();
                true
            }
            Completion::Failed(_) => {
                self.records.clear();
                self.dropped = 0;
                self.criteria.page = 1;
                self.recompute();
                true
            }
        }
    }

    /// Runs `ticket` on the calling thread and applies the result.
    pub fn resolve(&mut self, source: &dyn JobSource, ticket: Ticket) -> bool {
        let outcome = retrieval::execute(source, &ticket.request);
        self.complete(ticket.seq, outcome)
    }

    pub fn set_use_profile(&mut self, on: bool) -> Ticket {
        self.use_profile = on;
        self.refetch()
    }

    pub fn select_profile(&mut self, profile_id: i64) -> Option<Ticket> {
        if !self.profiles.iter().any(|p| p.id == profile_id) {
            warn!(profile_id, "selected profile is not in the loaded list");
        }
        self.selected_profile = Some(profile_id);
        self.criteria.page = 1;
        if self.use_profile {
            Some(self.refetch())
        } else {
            None
        }
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Option<Ticket> {
        self.threshold = clamp_threshold(threshold);
        self.criteria.page = 1;
        if self.use_profile && self.selected_profile.is_some() {
            Some(self.refetch())
        } else {
            None
        }
    }

    /// Submitting the search form commits any pending text at once and
    /// re-acquires with the current mode.
    pub fn submit_search(&mut self) -> Ticket {
        self.edit_timer = None;
        if let Some(draft) = self.debouncer.flush() {
            self.commit(draft);
        }
        self.refetch()
    }

    // --- Debounced text input ---

    pub fn edit_query(&mut self, text: impl Into<String>, now: Instant) {
        self.draft.query = text.into();
        self.schedule_draft(now);
    }

    pub fn edit_location(&mut self, text: impl Into<String>, now: Instant) {
        self.draft.location = text.into();
        self.schedule_draft(now);
    }

    pub fn edit_min_salary(&mut self, text: impl Into<String>, now: Instant) {
        self.draft.min_salary = text.into();
        self.schedule_draft(now);
    }

    fn schedule_draft(&mut self, now: Instant) {
        self.edit_timer = Some(self.debouncer.schedule(self.draft.clone(), now));
    }

    /// Drops uncommitted typing and puts the text fields back to the
    /// criteria currently in force. Returns whether anything was pending.
    pub fn cancel_edit(&mut self) -> bool {
        let cancelled = self
            .edit_timer
            .take()
            .and_then(|handle| self.debouncer.cancel(handle))
            .is_some();
        self.draft = TextDraft::from_criteria(&self.criteria);
        cancelled
    }

    pub fn has_pending_edit(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Commits pending text once its window has elapsed. Returns whether
    /// the view was recomputed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(draft) => {
                self.edit_timer = None;
                self.commit(draft);
                true
            }
            None => false,
        }
    }

    /// Replaces the text fields immediately, bypassing the debounce window.
    pub fn commit_text(&mut self, draft: TextDraft) {
        self.edit_timer = None;
        self.debouncer.flush();
        self.draft = draft.clone();
        self.commit(draft);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    fn commit(&mut self, draft: TextDraft) {
        debug!(query = %draft.query, location = %draft.location, "committing text filters");
        draft.commit_into(&mut self.criteria);
        self.criteria.page = 1;
        self.recompute();
    }

    // --- Immediate controls ---

    pub fn set_job_type(&mut self, job_type: Option<JobType>) {
        self.criteria.job_type = job_type;
        self.reset_and_recompute();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.criteria.sort = sort;
        self.reset_and_recompute();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.criteria.page_size = page_size;
        self.reset_and_recompute();
    }

    pub fn set_sources<I: IntoIterator<Item = String>>(&mut self, sources: I) {
        self.criteria.sources = sources.into_iter().collect();
        self.reset_and_recompute();
    }

    pub fn set_page(&mut self, requested: i64) {
        self.criteria.page = clamp_page(requested, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.criteria.page as i64 + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.criteria.page as i64 - 1);
    }

    fn reset_and_recompute(&mut self) {
        self.criteria.page = 1;
        self.recompute();
    }

    fn recompute(&mut self) {
        let pipeline = FilterPipeline::new(&self.criteria);
        let mut slots: Vec<Slot> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| pipeline.accepts(record))
            .map(|(index, record)| Slot { index, record })
            .collect();
        sort_records(&mut slots, self.criteria.sort);
        self.view = slots.into_iter().map(|slot| slot.index).collect();

        self.criteria.page = clamp_page(self.criteria.page as i64, self.total_pages());
        self.recomputations += 1;
        debug!(
            pass = self.recomputations,
            matches = self.view.len(),
            page = self.criteria.page,
            "view recomputed"
        );
    }

    // --- Derived views ---

    pub fn page(&self) -> PageView<'_> {
        let page = paginate(&self.view, self.criteria.page_size.get(), self.criteria.page as i64);
        PageView {
            items: page.items.iter().map(|&i| &self.records[i]).collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_matches: page.total_items,
            has_prev: page.has_prev(),
            has_next: page.has_next(),
        }
    }

    #[cfg(test)]
    pub fn filtered(&self) -> Vec<&JobRecord> {
        self.view.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.view.len(), self.criteria.page_size.get())
    }

    /// Distinct source labels of the acquired records, first seen first.
    pub fn source_options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = Vec::new();
        for source in self.records.iter().filter_map(|r| r.source.as_deref()) {
            if !options.contains(&source) {
                options.push(source);
            }
        }
        options
    }

    // --- Accessors ---

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn draft(&self) -> &TextDraft {
        &self.draft
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn selected_profile(&self) -> Option<i64> {
        self.selected_profile
    }

    pub fn use_profile(&self) -> bool {
        self.use_profile
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mode(&self) -> Option<&RetrievalMode> {
        self.controller.mode()
    }

    pub fn state(&self) -> &RetrievalState {
        self.controller.state()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.controller.state(), RetrievalState::Fetching)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.controller.state() {
            RetrievalState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[cfg(test)]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
