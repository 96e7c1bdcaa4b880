//! Waiting for asynchronously rendered nodes.

use crate::host::PageHost;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Probe until it yields a value or `timeout` has elapsed.
///
/// The probe always runs at least once. `None` is only returned once the
/// elapsed time is at least `timeout`. Dropping the future cancels the wait.
pub async fn await_condition<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(found) = probe().await? {
            return Ok(Some(found));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        sleep(interval.min(timeout - elapsed)).await;
    }
}

/// A node (or set of nodes) that matched a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub selector: String,
    /// How many nodes matched when the wait resolved.
    pub count: usize,
}

/// Polls the page until a selector matches.
pub struct ElementWaiter<'a, H> {
    host: &'a H,
    timeout: Duration,
    interval: Duration,
}

impl<H> Clone for ElementWaiter<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for ElementWaiter<'_, H> {}

impl<'a, H: PageHost> ElementWaiter<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self {
            host,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn host(&self) -> &'a H {
        self.host
    }

    /// Wait with the configured timeout. Absence is `Ok(None)`.
    pub async fn wait_for(&self, selector: &str) -> Result<Option<Element>> {
        self.wait_for_with(selector, self.timeout).await
    }

    pub async fn wait_for_with(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Element>> {
        let host = self.host;
        let found = await_condition(self.interval, timeout, move || async move {
            let count = host.count(selector).await?;
            Ok((count > 0).then(|| Element {
                selector: selector.to_string(),
                count,
            }))
        })
        .await?;
        if found.is_none() {
            debug!("'{}' not found within {}ms", selector, timeout.as_millis());
        }
        Ok(found)
    }
}
