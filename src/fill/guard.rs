//! Suppressing genuine user input while the automation runs.

use crate::host::{InteractionEvent, ListenerId, PageHost};
use crate::{Error, Result};
use tracing::{debug, warn};

/// Installs interaction filters on engage and removes exactly those on release.
///
/// `handlers` is non-empty iff the guard is active.
#[derive(Debug, Default)]
pub struct InputBlockGuard {
    handlers: Vec<(InteractionEvent, ListenerId)>,
}

impl InputBlockGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn handlers(&self) -> &[(InteractionEvent, ListenerId)] {
        &self.handlers
    }

    pub async fn engage<H: PageHost>(&mut self, host: &H) -> Result<()> {
        if self.is_active() {
            return Err(Error::GuardAlreadyEngaged);
        }
        for event in InteractionEvent::ALL {
            match host.add_interaction_filter(event).await {
                Ok(id) => self.handlers.push((event, id)),
                Err(e) => {
                    // leave nothing half-installed
                    if self.release(host).await.is_err() {
                        warn!("rollback left {} filters installed", self.handlers.len());
                    }
                    return Err(e);
                }
            }
        }
        debug!("input blocked ({} filters)", self.handlers.len());
        Ok(())
    }

    /// Remove the installed filters. A no-op when not engaged.
    ///
    /// Every filter is attempted. Ones that could not be removed stay in
    /// `handlers`, the guard stays active, and the first failure is returned,
    /// so a later call retries only those.
    pub async fn release<H: PageHost>(&mut self, host: &H) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let mut first_err = None;
        for (event, id) in std::mem::take(&mut self.handlers) {
            if let Err(e) = host.remove_interaction_filter(id).await {
                warn!("failed to remove {} filter: {}", event, e);
                self.handlers.push((event, id));
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                debug!("input unblocked");
                Ok(())
            }
        }
    }
}
