use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::error::{FetchError, NotificationError};
use crate::fetcher::VesselSource;
use crate::normalizer::{self, VesselReport};
use crate::notifier::{self, Notifier};
use crate::persister::{ContainerStatus, SnapshotPersister};
use crate::vessel::{VesselQuery, VesselRoster};

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Stored { key: String },
    FetchFailed { reason: String },
    ExtractionFailed { reason: String },
    StorageFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselOutcome {
    pub name: String,
    pub summary: String,
    pub report: Option<VesselReport>,
    pub status: OutcomeStatus,
}

impl VesselOutcome {
    /// True when the vessel yielded a data summary, whether or not the
    /// snapshot made it into the bucket.
    pub fn has_data(&self) -> bool {
        self.report.is_some()
    }

    pub fn stored_key(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Stored { key } => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub container: ContainerStatus,
    pub outcomes: Vec<VesselOutcome>,
}

impl RunReport {
    pub fn summaries(&self) -> Vec<String> {
        self.outcomes.iter().map(|o| o.summary.clone()).collect()
    }

    pub fn stored_keys(&self) -> Vec<&str> {
        self.outcomes.iter().filter_map(VesselOutcome::stored_key).collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Stored { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn message(&self) -> String {
        let has_data = self.outcomes.iter().any(VesselOutcome::has_data);
        notifier::compose_message(&self.summaries(), has_data)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    Started(&'a VesselQuery),
    Finished(&'a VesselOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub run: RunReport,
    pub message: String,
}

/// Fetch, normalize and persist every rostered vessel in order.
pub struct VesselSnapshotPipeline {
    source: Arc<dyn VesselSource>,
    persister: SnapshotPersister,
    roster: VesselRoster,
    clock: Clock,
}

impl VesselSnapshotPipeline {
    pub fn new(
        source: Arc<dyn VesselSource>,
        persister: SnapshotPersister,
        roster: VesselRoster,
    ) -> Self {
        Self {
            source,
            persister,
            roster,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Processes the roster one vessel at a time. Every vessel yields exactly
    /// one outcome.
    pub async fn run(&self) -> RunReport {
        self.run_with(|_| {}).await
    }

    /// Like `run`, reporting each vessel to `on_progress` as it starts and
    /// finishes.
    pub async fn run_with<F>(&self, mut on_progress: F) -> RunReport
    where
        F: FnMut(Progress<'_>) + Send,
    {
        let container = self.persister.ensure_container().await;
        let mut outcomes = Vec::with_capacity(self.roster.len());

        for vessel in self.roster.vessels() {
            on_progress(Progress::Started(vessel));
            let outcome = self.process_vessel(vessel).await;
            on_progress(Progress::Finished(&outcome));
            outcomes.push(outcome);
        }

        let report = RunReport {
            container,
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "vessel run finished"
        );
        report
    }

    /// Runs the roster, then publishes one combined message.
    pub async fn broadcast(
        &self,
        notifier: &dyn Notifier,
    ) -> Result<BroadcastReport, NotificationError> {
        let run = self.run().await;
        let message = run.message();

        if let Err(err) = notifier.publish(notifier::SUBJECT, &message).await {
            error!(error = %err, "error publishing notification");
            return Err(err);
        }

        Ok(BroadcastReport { run, message })
    }

    pub async fn process_vessel(&self, vessel: &VesselQuery) -> VesselOutcome {
        let name = vessel.name();
        info!(vessel = name, lookup = %vessel.lookup(), "fetching vessel data");

        // An empty body carries no vessel data whichever source produced it.
        let fetched = match self.source.fetch(vessel.lookup()).await {
            Ok(snapshot) if snapshot.is_empty() => Err(FetchError::Empty),
            other => other,
        };

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(vessel = name, error = %err, "error fetching vessel data");
                return VesselOutcome {
                    name: name.to_string(),
                    summary: normalizer::fetch_failure_line(name),
                    report: None,
                    status: OutcomeStatus::FetchFailed {
                        reason: err.to_string(),
                    },
                };
            }
        };

        let report = match normalizer::extract(&snapshot) {
            Ok(report) => report,
            Err(err) => {
                warn!(vessel = name, error = %err, "error extracting vessel fields");
                return VesselOutcome {
                    name: name.to_string(),
                    summary: normalizer::extraction_failure_line(name, &err),
                    report: None,
                    status: OutcomeStatus::ExtractionFailed {
                        reason: err.to_string(),
                    },
                };
            }
        };

        let status = match self
            .persister
            .save_at(Some(snapshot), name, (self.clock)())
            .await
        {
            Ok(key) => OutcomeStatus::Stored { key },
            Err(err) => OutcomeStatus::StorageFailed {
                reason: err.to_string(),
            },
        };

        VesselOutcome {
            name: name.to_string(),
            summary: report.summary(name),
            report: Some(report),
            status,
        }
    }
}
