//! The outer control loop of a run.

use crate::aggregate::{Aggregator, ResultTable};
use crate::delay::Pacing;
use crate::error::{CrawlError, VisitError};
use crate::extract::PageExtractor;
use crate::model::{ObjectKind, Record, Target};
use crate::selection::SelectionSet;
use crate::session::{LaunchOptions, Launcher, SessionManager};
use crate::visit::Visit;
use crate::walker::{PagePlan, PaginationWalker};
use tracing::{error, info};

/// Progress of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// Targets in the selection.
    pub total: usize,
    pub attempted: usize,
    pub success: usize,
    pub failure: usize,
    pub failed: Vec<usize>,
    /// Targets whose page no longer exists. Not counted as failures.
    pub invalid: Vec<usize>,
    /// Selected targets never attempted because the run stopped early.
    pub remaining: Vec<usize>,
}

impl RunState {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Indices worth visiting again: failures plus anything left unvisited.
    pub fn retry_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .failed
            .iter()
            .chain(self.remaining.iter())
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn log_report(&self, kind: ObjectKind) {
        info!("-----------------");
        info!("Report");
        info!("Total number of targets: {}", self.total);
        info!("Attempted: {}", self.attempted);
        info!("Success: {}", self.success);
        info!("Fail: {}", self.failure);
        if !self.failed.is_empty() {
            info!("Failed indices: {}", join(&self.failed));
        }
        if !self.invalid.is_empty() {
            info!(
                "The following {}s have no information: {}",
                kind.noun(),
                join(&self.invalid)
            );
        }
        if !self.remaining.is_empty() {
            info!("Not visited: {}", join(&self.remaining));
        }
        info!("-----------------");
    }
}

fn join(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct Orchestrator<L: Launcher, E> {
    kind: ObjectKind,
    targets: Vec<Target>,
    selection: SelectionSet,
    sessions: SessionManager<L>,
    extractor: E,
    pacing: Pacing,
    aggregator: Aggregator,
    state: RunState,
}

impl<L, E> Orchestrator<L, E>
where
    L: Launcher,
    E: PageExtractor<L::Session>,
{
    pub fn new(
        kind: ObjectKind,
        targets: Vec<Target>,
        selection: SelectionSet,
        launcher: L,
        options: LaunchOptions,
        extractor: E,
        pacing: Pacing,
    ) -> Self {
        let state = RunState::new(selection.len());
        Self {
            kind,
            targets,
            selection,
            sessions: SessionManager::new(launcher, options),
            extractor,
            pacing,
            aggregator: Aggregator::new(),
            state,
        }
    }

    /// Visits every selected target in order.
    ///
    /// A failing target is recorded and skipped. A blocking banner stops the
    /// run; everything aggregated before it stays available.
    pub async fn run(&mut self) -> Result<(), CrawlError> {
        if let Err(e) = self.sessions.acquire().await {
            self.state.remaining = self.selection.indices.clone();
            error!("Failed to start the browser: {}", e);
            return Err(e.into());
        }

        let indices = self.selection.indices.clone();
        for (position, &index) in indices.iter().enumerate() {
            self.state.attempted += 1;
            match self.visit_target(index).await {
                Ok(record) => {
                    info!(
                        "Index {}: done ({} rows)",
                        index,
                        record.row_count()
                    );
                    self.state.success += 1;
                    self.aggregator.insert(index, record);
                }
                Err(VisitError::TargetRemoved { identifier }) => {
                    info!("Index {}: {} has been removed. Skipping", index, identifier);
                    self.state.invalid.push(index);
                }
                Err(VisitError::Blocked { url }) => {
                    self.state.failure += 1;
                    self.state.failed.push(index);
                    self.state.remaining = indices[position + 1..].to_vec();
                    error!(
                        "Index {}: the site has detected the crawler. Stopping the run",
                        index
                    );
                    return Err(CrawlError::Blocked { index, url });
                }
                Err(e) => {
                    self.state.failure += 1;
                    self.state.failed.push(index);
                    error!(
                        "Index {}: {}. This {} gets skipped",
                        index,
                        e,
                        self.kind.noun()
                    );
                }
            }
        }
        Ok(())
    }

    async fn visit_target(&mut self, index: usize) -> Result<Record, VisitError> {
        let target = self
            .targets
            .get(index)
            .cloned()
            .ok_or(VisitError::UnknownTarget(index))?;
        let mut visit = Visit::new(&mut self.sessions, &self.extractor, &mut self.pacing);
        match self.kind {
            ObjectKind::Profile => visit.profile(&target).await,
            ObjectKind::Business => visit.business(&target).await,
            ObjectKind::Review => {
                let plan = match &self.selection.tokens {
                    Some(tokens) => PagePlan::Fixed {
                        tokens: tokens.clone(),
                        skip_home: self.selection.skips_home(),
                    },
                    None => PagePlan::Discover,
                };
                PaginationWalker::new(&mut visit, plan).walk(&target).await
            }
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn table(&self) -> Option<ResultTable> {
        self.aggregator.table(self.kind)
    }

    pub fn session_resets(&self) -> u32 {
        self.sessions.resets()
    }

    /// Closes the browser. The aggregated records stay available.
    pub async fn shutdown(&mut self) {
        self.sessions.shutdown().await;
    }

    pub fn into_parts(self) -> (Aggregator, RunState) {
        (self.aggregator, self.state)
    }
}
