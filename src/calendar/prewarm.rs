use super::{Inner, Snapshot};
use crate::model::YearMonth;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Lance le précalcul des autres mois de l'année de `requested`.
///
/// Aucun retour vers l'appelant : un échec laisse simplement des mois
/// absents, calculés plus tard à la demande.
pub(super) fn spawn(
    inner: Arc<Inner>,
    requested: YearMonth,
    snapshot: Snapshot,
) -> Option<JoinHandle<()>> {
    let pending: Vec<YearMonth> = requested
        .siblings()
        .filter(|ym| *ym != requested && !inner.contains(*ym))
        .collect();
    if pending.is_empty() {
        return None;
    }

    let spawned = thread::Builder::new()
        .name(format!("prewarm-{}", requested.year()))
        .spawn(move || run(&inner, pending, &snapshot));

    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(year = requested.year(), error = %err, "could not start month prewarm");
            None
        }
    }
}

fn run(inner: &Inner, pending: Vec<YearMonth>, snapshot: &Snapshot) {
    let mut inserted = 0usize;
    for year_month in pending {
        // vidé entre-temps : inutile de continuer
        if inner.generation() != snapshot.generation {
            debug!("prewarm abandoned after invalidation");
            return;
        }
        if inner.contains(year_month) {
            continue;
        }
        let month = inner.compute(year_month, snapshot);
        if inner.insert_if_absent(year_month, month, snapshot.generation) {
            inserted += 1;
        }
    }
    debug!(inserted, "prewarm finished");
}

pub(super) fn join(task: JoinHandle<()>) {
    if task.join().is_err() {
        warn!("month prewarm task panicked; cache left partially warmed");
    }
}
