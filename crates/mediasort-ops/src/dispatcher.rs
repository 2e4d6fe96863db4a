//! Bounded fan-out of resolve+place tasks.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mediasort_core::{Candidate, CandidateError, PathFormatter, Resolver, SortConfig};

use crate::placer::{PlaceOutcome, Placer};
use crate::progress::{CandidateReport, PassSummary};

/// Runs every candidate through the resolver and placer.
///
/// At most `concurrency` candidates are in flight at once. A slot is taken
/// before each task is spawned and released when the task ends, whether it
/// succeeded, failed or panicked.
///
/// Cancellation stops admission and abandons pending resolutions. A
/// placement that has already started is allowed to finish.
pub struct Dispatcher {
    resolver: Arc<dyn Resolver>,
    placer: Arc<Placer>,
    concurrency: usize,
    dry_run: bool,
}

impl Dispatcher {
    /// Create a dispatcher for one pass.
    pub fn new(
        config: &SortConfig,
        resolver: Arc<dyn Resolver>,
        formatter: Arc<dyn PathFormatter>,
    ) -> Self {
        Self {
            resolver,
            placer: Arc::new(Placer::new(config, formatter)),
            concurrency: config.concurrency.max(1),
            dry_run: config.dry_run,
        }
    }

    /// Process every candidate exactly once and wait for all of them.
    ///
    /// Per-candidate failures are logged and counted; they never fail the
    /// dispatch. Candidates left unprocessed by `cancel` are counted as
    /// cancelled.
    pub async fn dispatch(
        &self,
        candidates: &[Candidate],
        cancel: &CancellationToken,
    ) -> PassSummary {
        let total = candidates.len();
        let mut summary = PassSummary::default();

        if self.dry_run {
            info!("Dry run: no files will be moved");
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                let skipped = candidates.len() - index;
                debug!(skipped, "admission stopped");
                summary.cancelled += skipped as u64;
                break;
            };

            let resolver = Arc::clone(&self.resolver);
            let placer = Arc::clone(&self.placer);
            let candidate = candidate.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let id = candidate.id;
                let path = candidate.path.clone();

                // Inner task so a panic is attributed to this candidate.
                let result = tokio::spawn(async move {
                    process(resolver.as_ref(), &placer, &candidate, total, &cancel).await
                })
                .await
                .unwrap_or_else(|e| {
                    Err(CandidateError::Task {
                        message: e.to_string(),
                    })
                });

                CandidateReport { id, path, result }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    match &report.result {
                        Err(CandidateError::Cancelled) | Ok(_) => {}
                        Err(e) => warn!(
                            "[{}/{}] {}\n  └─> {}",
                            report.id,
                            total,
                            report.path.display(),
                            e
                        ),
                    }
                    summary.record(&report);
                }
                Err(e) => {
                    // Only reachable if the runtime is shutting down.
                    warn!(error = %e, "dispatch task aborted");
                }
            }
        }

        debug!(
            moved = summary.moved,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "dispatch complete"
        );
        summary
    }
}

async fn process(
    resolver: &dyn Resolver,
    placer: &Placer,
    candidate: &Candidate,
    total: usize,
    cancel: &CancellationToken,
) -> Result<PlaceOutcome, CandidateError> {
    let matched = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(CandidateError::Cancelled),
        matched = resolver.resolve(&candidate.path) => matched?,
    };
    placer.place(candidate, &matched, total).await
}
