use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::catalog::CatalogHandle;
use crate::entities::{Catalog, ProductRecord};
use crate::query::engine::query_cancellable;
use crate::query::filter::FilterSpec;

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub id: u64,
    pub spec: FilterSpec,
}

/// Outcome of one evaluation, tagged with the request that produced it.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub request_id: u64,
    /// `lastUpdated` of the catalog snapshot the request ran against.
    pub catalog_updated: DateTime<Utc>,
    pub items: Vec<ProductRecord>,
    evaluation: u64,
}

type ResultSlot = Option<Arc<QueryResult>>;

/// Evaluates filter requests off the caller's task.
///
/// Only the latest submitted request is ever evaluated; a newer request
/// cancels the one in flight. Replacing the catalog re-runs the latest
/// request against the new snapshot.
pub struct QueryWorker {
    requests: watch::Sender<Option<Arc<QueryRequest>>>,
    results: watch::Receiver<ResultSlot>,
    next_id: AtomicU64,
    shutdown_token: CancellationToken,
    task: JoinHandle<()>,
}

impl QueryWorker {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(catalog: &CatalogHandle) -> Self {
        let (request_tx, request_rx) = watch::channel(None);
        let (result_tx, result_rx) = watch::channel(None);
        let shutdown_token = CancellationToken::new();

        let task = tokio::spawn(
            run_loop(
                request_rx,
                catalog.subscribe(),
                Arc::new(result_tx),
                shutdown_token.clone(),
            )
            .instrument(info_span!("query_worker")),
        );

        Self {
            requests: request_tx,
            results: result_rx,
            next_id: AtomicU64::new(0),
            shutdown_token,
            task,
        }
    }

    /// Queues `spec`, superseding any earlier request; returns its id.
    pub fn submit(&self, spec: FilterSpec) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.requests
            .send_replace(Some(Arc::new(QueryRequest { id, spec })));
        id
    }

    /// Latest published result; changes whenever a fresher one lands.
    pub fn results(&self) -> watch::Receiver<ResultSlot> {
        self.results.clone()
    }

    /// Waits until the result for `request_id`, or for a newer request, is
    /// published. `None` once the worker has stopped.
    pub async fn wait_for(&self, request_id: u64) -> Option<Arc<QueryResult>> {
        let mut rx = self.results.clone();
        let slot = rx
            .wait_for(|slot| slot.as_ref().is_some_and(|r| r.request_id >= request_id))
            .await
            .ok()?;
        slot.clone()
    }

    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        if let Err(e) = self.task.await {
            warn!("query worker task ended abnormally: {}", e);
        }
    }
}

async fn run_loop(
    mut requests: watch::Receiver<Option<Arc<QueryRequest>>>,
    mut catalog: watch::Receiver<Arc<Catalog>>,
    results: Arc<watch::Sender<ResultSlot>>,
    shutdown_token: CancellationToken,
) {
    let mut catalog_open = true;
    let mut evaluation = 0u64;
    let mut in_flight: Option<CancellationToken> = None;

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => break,
            changed = requests.changed() => {
                if changed.is_err() {
                    debug!("query worker handle dropped");
                    break;
                }
            }
            changed = catalog.changed(), if catalog_open => {
                if changed.is_err() {
                    // keep serving the last snapshot
                    catalog_open = false;
                    continue;
                }
            }
        }

        let Some(request) = requests.borrow_and_update().clone() else {
            continue;
        };
        let snapshot = catalog.borrow_and_update().clone();

        if let Some(previous) = in_flight.take() {
            previous.cancel();
        }
        let cancel = shutdown_token.child_token();
        in_flight = Some(cancel.clone());
        evaluation += 1;

        debug!(
            request_id = request.id,
            evaluation,
            items = snapshot.len(),
            "evaluating query"
        );
        tokio::spawn(evaluate(request, snapshot, evaluation, cancel, results.clone()));
    }

    if let Some(previous) = in_flight {
        previous.cancel();
    }
}

async fn evaluate(
    request: Arc<QueryRequest>,
    catalog: Arc<Catalog>,
    evaluation: u64,
    cancel: CancellationToken,
    results: Arc<watch::Sender<ResultSlot>>,
) {
    let request_id = request.id;
    let catalog_updated = catalog.last_updated;

    let outcome = tokio::task::spawn_blocking(move || {
        query_cancellable(&catalog, &request.spec, &cancel)
    })
    .await;

    match outcome {
        Ok(Some(items)) => {
            let result = QueryResult {
                request_id,
                catalog_updated,
                items,
                evaluation,
            };
            if !publish_if_fresh(&results, result) {
                debug!(request_id, evaluation, "discarding stale query result");
            }
        }
        Ok(None) => debug!(request_id, evaluation, "query superseded"),
        Err(e) => warn!(request_id, "query evaluation failed: {}", e),
    }
}

/// Publishes `result` unless a later evaluation already did.
fn publish_if_fresh(results: &watch::Sender<ResultSlot>, result: QueryResult) -> bool {
    results.send_if_modified(|slot| {
        let fresher = slot
            .as_ref()
            .is_none_or(|current| current.evaluation < result.evaluation);
        if fresher {
            *slot = Some(Arc::new(result));
        }
        fresher
    })
}
