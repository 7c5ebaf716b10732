//! The per-location run loop.
//!
//! One worker task drives the browser through every selected location in
//! order; the foreground only consumes [`RunEvent`]s. Cancellation is checked
//! once per location and never interrupts a search in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mapscout_core::{BusinessRecord, FilterCriteria, SearchLocation};
use mapscout_scraper::pacing;
use mapscout_scraper::{MapPage, ScraperError, SearchOrchestrator};
use mapscout_sink::ResultSink;
use tokio::sync::mpsc::UnboundedSender;

/// Shared stop request, checked between locations.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress messages from the worker to the foreground.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Percentage of locations processed.
    Progress(u8),
    Status(String),
    /// One line per saved business.
    Result(String),
    Stats { total: usize, with_email: usize },
    Complete(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub query: String,
    pub locations: Vec<SearchLocation>,
    pub filters: FilterCriteria,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub with_email: usize,
    pub locations_done: usize,
    pub locations_failed: usize,
    pub cancelled: bool,
    pub records: Vec<BusinessRecord>,
}

enum Stop {
    Finished,
    Cancelled,
    Failed(anyhow::Error),
}

fn emit(events: &UnboundedSender<RunEvent>, event: RunEvent) {
    // The foreground may already be gone; the run still finishes and saves.
    let _ = events.send(event);
}

fn result_line(record: &BusinessRecord) -> String {
    format!(
        "{} | {} | {} | {:.1} ({}) | {}",
        record.name, record.phone, record.website, record.rating, record.review_count, record.email
    )
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done.saturating_mul(100) / total).unwrap_or(100)
}

/// Runs every location in `plan` through `orchestrator`, feeding each batch
/// to `sink`.
///
/// The browser session is closed before this returns, on every path.
///
/// # Errors
///
/// Returns an error if the session dies mid-run or a result file cannot be
/// written. Records already accepted are still flushed in that case.
pub async fn execute_run<P: MapPage>(
    orchestrator: &SearchOrchestrator<P>,
    plan: RunPlan,
    mut sink: ResultSink,
    cancel: CancellationFlag,
    events: UnboundedSender<RunEvent>,
) -> anyhow::Result<RunSummary> {
    let total_locations = plan.locations.len();
    let mut locations_done = 0;
    let mut locations_failed = 0;
    let mut with_email = 0;

    emit(&events, RunEvent::Progress(0));
    let stop = 'locations: {
        for (index, location) in plan.locations.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(processed = index, "run cancelled");
                break 'locations Stop::Cancelled;
            }
            emit(
                &events,
                RunEvent::Status(format!(
                    "[{}/{total_locations}] {location}",
                    index + 1
                )),
            );

            match orchestrator
                .search_location(&plan.query, location, &plan.filters)
                .await
            {
                Ok(batch) => {
                    with_email += batch.iter().filter(|r| r.has_email()).count();
                    for record in &batch {
                        emit(&events, RunEvent::Result(result_line(record)));
                    }
                    let found = batch.len();
                    if let Err(err) = sink.accept(batch) {
                        break 'locations Stop::Failed(
                            anyhow::Error::new(err).context("failed to save results"),
                        );
                    }
                    tracing::info!(
                        department = %location.department,
                        province = %location.province,
                        district = %location.district,
                        found,
                        "location done"
                    );
                }
                Err(err) if err.is_fatal() => {
                    break 'locations Stop::Failed(fatal(err));
                }
                Err(err) => {
                    locations_failed += 1;
                    tracing::warn!(location = %location, error = %err, "location failed; continuing");
                    emit(&events, RunEvent::Status(format!("{location}: {err}")));
                }
            }

            locations_done += 1;
            emit(&events, RunEvent::Progress(percent(index + 1, total_locations)));
            emit(
                &events,
                RunEvent::Stats {
                    total: sink.records().len(),
                    with_email,
                },
            );

            if index + 1 < total_locations {
                pacing::pause(orchestrator.pacing(), pacing::BETWEEN_LOCATIONS).await;
            }
        }
        Stop::Finished
    };

    orchestrator.page().close().await;

    let records = match sink.finish() {
        Ok(records) => records,
        Err(err) => {
            let err = anyhow::Error::new(err).context("failed to save results");
            emit(&events, RunEvent::Error(format!("{err:#}")));
            return Err(err);
        }
    };

    let summary = RunSummary {
        total: records.len(),
        with_email,
        locations_done,
        locations_failed,
        cancelled: matches!(stop, Stop::Cancelled),
        records,
    };

    if let Stop::Failed(err) = stop {
        emit(&events, RunEvent::Error(format!("{err:#}")));
        return Err(err);
    }

    emit(
        &events,
        RunEvent::Complete(format!(
            "{} businesses found, {} with email, {} of {} locations processed ({} failed)",
            summary.total,
            summary.with_email,
            summary.locations_done,
            total_locations,
            summary.locations_failed
        )),
    );
    Ok(summary)
}

fn fatal(err: ScraperError) -> anyhow::Error {
    tracing::error!(error = %err, "browser session lost; stopping run");
    anyhow::Error::new(err).context("browser session lost")
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
