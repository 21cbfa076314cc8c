//! Bounded polling and the readiness predicates it is used with.

use std::{future::Future, time::Duration};

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use tokio::time::{Instant, sleep};

use crate::{Result, error::TimeoutSnafu};

/// Interval between two readiness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Deadline used when `now + timeout` cannot be represented.
const LONGEST_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Call `check` until it yields a value, an error, or `timeout` elapses.
///
/// `check` runs once immediately and then once per `interval`. `Ok(None)`
/// means "not yet", `Ok(Some(value))` ends the wait, and an error aborts it
/// right away without further attempts. The last probe happens at the
/// deadline, never after it.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let deadline = start
        .checked_add(timeout)
        .unwrap_or_else(|| start + LONGEST_WAIT);
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return TimeoutSnafu { what, timeout }.fail();
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// A deployment is ready once it has at least one ready replica and every
/// replica is ready.
pub fn deployment_is_ready(deployment: &Deployment) -> bool {
    deployment.status.as_ref().is_some_and(|status| {
        let ready = status.ready_replicas.unwrap_or_default();
        ready > 0 && status.replicas.unwrap_or_default() == ready
    })
}

pub fn pod_is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|status| status.phase.as_deref()) == Some("Running")
}
