//! Temporal window harvesting.
//!
//! The archive caps every request at a handful of documents and caps how
//! deep the result cursor may reach within one query, so an arbitrary date
//! range has to be covered as a sequence of date windows, each paginated
//! independently. The harvester walks the range window by window, adapting
//! the window width to the observed result density: a failed request
//! shrinks the stride and retries the same window, a sparse window widens
//! the stride for the windows after it.
//!
//! One request is outstanding at a time; every decision depends on the
//! previous response's window total. Documents stream out of the iterator
//! as each page arrives, so a caller can persist them without buffering
//! the whole harvest.

use std::collections::VecDeque;
use std::fmt;

use chrono::{Duration, NaiveDate};

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_STRIDE_DAYS};
use crate::fetch::fetch_page;
use crate::session::ServiceClient;
use crate::types::{Document, PageRequest, PageResult, QueryDescriptor};

/// Tuning knobs for a harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Results per page request.
    pub page_size: u64,

    /// Initial window width in days. Widening on sparse windows can in
    /// principle outgrow what the per-window cursor ceiling can address if
    /// density suddenly spikes; the stride only ever grows by one day per
    /// window, which has been enough in practice.
    pub stride_days: i64,

    /// Fetch each document's full text with an extra retrieval call.
    pub include_full_text: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            stride_days: DEFAULT_STRIDE_DAYS,
            include_full_text: false,
        }
    }
}

/// A date window the harvester gave up on after exhausting its retries.
///
/// The sub-range is not covered by the harvest; callers must surface it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonedWindow {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub reason: String,
}

impl fmt::Display for AbandonedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}: {}",
            self.window_start, self.window_end, self.reason
        )
    }
}

/// Everything a finished harvest produced, for callers that prefer a
/// buffered result over draining the iterator themselves.
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    pub documents: Vec<Document>,
    pub abandoned: Vec<AbandonedWindow>,
}

/// Mutable position of a running harvest: the current window and the
/// result cursor within it. Owned exclusively by one [`Harvest`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct HarvestState {
    window_start: NaiveDate,
    window_end: NaiveDate,
    stride_days: i64,
    page_begin: u64,
    page_end: u64,
}

impl HarvestState {
    /// Open a window at `start`, clamped to the end of the query range.
    fn open(start: NaiveDate, query_end: NaiveDate, stride_days: i64, page_size: u64) -> Self {
        Self {
            window_start: start,
            window_end: (start + Duration::days(stride_days)).min(query_end),
            stride_days,
            page_begin: 1,
            page_end: page_size,
        }
    }
}

/// Start a harvest run over the query's full date range.
///
/// The returned [`Harvest`] lazily yields documents as pages arrive.
pub fn harvest<'c>(
    client: &'c dyn ServiceClient,
    query: QueryDescriptor,
    options: HarvestOptions,
) -> Harvest<'c> {
    Harvest::new(client, query, options)
}

/// A lazy, forward-only stream of harvested documents.
///
/// Finite and not restartable mid-stream; a fresh harvest over the same
/// query covers the same windows again because they are derived only from
/// the query and the options, never from prior output.
pub struct Harvest<'c> {
    client: &'c dyn ServiceClient,
    query: QueryDescriptor,
    options: HarvestOptions,
    state: Option<HarvestState>,
    ready: VecDeque<Document>,
    abandoned: Vec<AbandonedWindow>,
}

impl<'c> Harvest<'c> {
    #[must_use]
    pub fn new(client: &'c dyn ServiceClient, query: QueryDescriptor, options: HarvestOptions) -> Self {
        let state = HarvestState::open(
            query.start_date,
            query.end_date,
            options.stride_days.max(1),
            options.page_size,
        );
        Self {
            client,
            query,
            options,
            state: Some(state),
            ready: VecDeque::new(),
            abandoned: Vec::new(),
        }
    }

    /// Date windows abandoned so far. Complete once the iterator is drained.
    #[must_use]
    pub fn abandoned(&self) -> &[AbandonedWindow] {
        &self.abandoned
    }

    /// Drain the harvest and return everything it produced.
    #[must_use]
    pub fn collect_all(mut self) -> HarvestOutcome {
        let mut documents = Vec::new();
        while let Some(document) = self.next() {
            documents.push(document);
        }
        HarvestOutcome {
            documents,
            abandoned: self.abandoned,
        }
    }

    /// Issue one page request and apply the resulting transition.
    fn step(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let request = PageRequest {
            query: self.query.keywords.clone(),
            source_id: self.query.source_id,
            window_start: state.window_start,
            window_end: state.window_end,
            result_begin: state.page_begin,
            result_end: state.page_end,
        };

        match fetch_page(self.client, &request, self.options.include_full_text) {
            Ok(page) if page.status_code == 200 => self.on_page(page),
            Ok(page) => self.on_failure(format!("HTTP status {}", page.status_code)),
            Err(error) => self.on_failure(error.to_string()),
        }
    }

    /// Advance after a successful page: paginate deeper or move the window.
    fn on_page(&mut self, page: PageResult) {
        // The window total is re-read from every response rather than cached;
        // the service may reinterpret it between pages.
        let total = page.total_matches;
        self.ready.extend(page.documents);

        let Some(state) = self.state.as_mut() else {
            return;
        };

        if total == 0 {
            tracing::debug!(
                window_start = %state.window_start,
                window_end = %state.window_end,
                "window has no matches"
            );
            self.slide(false);
            return;
        }

        if state.page_end < total {
            state.page_begin = state.page_end + 1;
            state.page_end = (state.page_begin + self.options.page_size - 1).min(total);
            tracing::debug!(
                begin = state.page_begin,
                end = state.page_end,
                total,
                "more pages in window"
            );
            return;
        }

        // Cursor reached the window total. A sparse window earns the next
        // windows a wider stride, trading request count for ceiling risk.
        let sparse = total < self.options.page_size / 2;
        self.slide(sparse);
    }

    /// Close the current window and open the next one, or finish.
    fn slide(&mut self, grow_stride: bool) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window_end >= self.query.end_date {
            tracing::debug!("date range covered, harvest complete");
            self.state = None;
            return;
        }
        if grow_stride {
            state.stride_days += 1;
        }
        let next_start = state.window_end + Duration::days(1);
        *state = HarvestState::open(
            next_start,
            self.query.end_date,
            state.stride_days,
            self.options.page_size,
        );
    }

    /// Shrink the stride and retry the same window, or give the window up.
    ///
    /// The stride doubles as the retry budget: each failure halves it, and a
    /// failure at the one-day floor abandons the window and moves on.
    fn on_failure(&mut self, reason: String) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.stride_days > 1 {
            state.stride_days = (state.stride_days / 2).max(1);
            tracing::warn!(
                window_start = %state.window_start,
                window_end = %state.window_end,
                stride_days = state.stride_days,
                reason = %reason,
                "request failed, shrinking stride and retrying the window"
            );
            return;
        }

        let abandoned = AbandonedWindow {
            window_start: state.window_start,
            window_end: state.window_end,
            reason,
        };
        tracing::error!(
            window_start = %abandoned.window_start,
            window_end = %abandoned.window_end,
            reason = %abandoned.reason,
            "request failed at minimum stride, abandoning window"
        );
        self.abandoned.push(abandoned);
        self.slide(false);
    }
}

impl Iterator for Harvest<'_> {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        loop {
            if let Some(document) = self.ready.pop_front() {
                return Some(document);
            }
            self.state.as_ref()?;
            self.step();
        }
    }
}
