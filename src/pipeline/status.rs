//! Status observers. They only ever receive; nothing flows back.

use super::phase::AutomationStatus;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

pub trait StatusSink {
    fn report(&self, status: &AutomationStatus);
}

impl<F> StatusSink for F
where
    F: Fn(&AutomationStatus),
{
    fn report(&self, status: &AutomationStatus) {
        self(status)
    }
}

/// Writes every transition to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn report(&self, status: &AutomationStatus) {
        info!(phase = %status.phase, "{}", status.message);
    }
}

/// Forwards transitions to an async observer. A gone receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<AutomationStatus>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<AutomationStatus>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelSink {
    fn report(&self, status: &AutomationStatus) {
        let _ = self.tx.send(status.clone());
    }
}
