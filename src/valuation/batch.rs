//! Batch valuation - one independent blocking task per subject
//!
//! Subjects share nothing mutable: the engine, the sale population and the
//! source are all read-only, so no locking is involved.

use crate::valuation::engine::ValuationEngine;
use crate::valuation::error::ValuationError;
use crate::valuation::source::SaleRecordSource;
use crate::valuation::types::{ComparableSale, SubjectProperty, ValuationResult};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;

pub type BatchOutcome = Result<ValuationResult, ValuationError>;

async fn run_blocking<F>(count: usize, valuate_one: F) -> Vec<BatchOutcome>
where
    F: Fn(usize) -> BatchOutcome + Send + Sync + 'static,
{
    let valuate_one = Arc::new(valuate_one);
    let mut set = JoinSet::new();

    for index in 0..count {
        let valuate_one = Arc::clone(&valuate_one);
        set.spawn_blocking(move || (index, valuate_one(index)));
    }

    let mut slots: Vec<Option<BatchOutcome>> = (0..count).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        };
        slots[index] = Some(outcome);
    }

    slots.into_iter().flatten().collect()
}

/// Value every subject against the same sale population.
/// Results come back in the order the subjects were given.
pub async fn valuate_batch(
    engine: Arc<ValuationEngine>,
    subjects: Vec<SubjectProperty>,
    sales: Arc<[ComparableSale]>,
    reference_date: NaiveDate,
) -> Vec<BatchOutcome> {
    info!(
        "Valuing {} subjects against {} sales",
        subjects.len(),
        sales.len()
    );

    let count = subjects.len();
    let subjects: Arc<[SubjectProperty]> = subjects.into();
    run_blocking(count, move |index| {
        engine.valuate(&subjects[index], &sales, reference_date)
    })
    .await
}

/// Value every subject, querying `source` separately for each
pub async fn valuate_batch_from_source<S>(
    engine: Arc<ValuationEngine>,
    subjects: Vec<SubjectProperty>,
    source: Arc<S>,
    reference_date: NaiveDate,
) -> Vec<BatchOutcome>
where
    S: SaleRecordSource + Send + Sync + ?Sized + 'static,
{
    info!("Valuing {} subjects from sale record source", subjects.len());

    let count = subjects.len();
    let subjects: Arc<[SubjectProperty]> = subjects.into();
    run_blocking(count, move |index| {
        engine.valuate_from_source(&subjects[index], &*source, reference_date)
    })
    .await
}
