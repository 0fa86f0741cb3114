//! Bounded concurrent fan-out for one worker turn.
//!
//! Each unit of work (a query, a URL) runs as its own task; at most `limit` run at once.
//! Failures and panics stay with their unit: siblings keep running and the caller gets
//! one [`UnitOutcome`] per unit, in request order.

use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::tools::ToolError;

/// Concurrent units per turn unless configured otherwise.
pub const DEFAULT_FAN_OUT_LIMIT: usize = 5;

/// Result of one unit, tagged with the unit it came from.
#[derive(Debug)]
pub struct UnitOutcome<U, T> {
    pub unit: U,
    pub result: Result<T, ToolError>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

/// Runs `work` once per unit with at most `limit` units in flight (`0` counts as 1).
///
/// Outcomes are returned in the order of `units`, regardless of completion order.
pub async fn fan_out<U, T, F, Fut>(units: Vec<U>, limit: usize, work: F) -> Vec<UnitOutcome<U, T>>
where
    U: Clone + Debug + Send + 'static,
    T: Send + 'static,
    F: Fn(U) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ToolError>> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let work = Arc::new(work);
    let mut tasks = JoinSet::new();

    for (idx, unit) in units.iter().cloned().enumerate() {
        let permits = Arc::clone(&permits);
        let work = Arc::clone(&work);
        tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => AssertUnwindSafe(work(unit))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(ToolError::Join(panic_message(payload.as_ref())))),
                Err(e) => Err(ToolError::Join(e.to_string())),
            };
            (idx, result)
        });
    }

    let mut slots: Vec<Option<Result<T, ToolError>>> = units.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, result)) => {
                tracing::debug!(unit = ?units[idx], ok = result.is_ok(), "fan-out unit finished");
                slots[idx] = Some(result);
            }
            Err(e) => tracing::warn!(error = %e, "fan-out task did not complete"),
        }
    }

    units
        .into_iter()
        .zip(slots)
        .map(|(unit, slot)| UnitOutcome {
            unit,
            result: slot.unwrap_or_else(|| Err(ToolError::Join("task cancelled".into()))),
        })
        .collect()
}
