//! Routing controller commands to per-platform responders.
//!
//! A controller sends a [`CommandRequest`] naming a platform; whichever
//! responder registered for that platform answers it. A request that cannot
//! be delivered or answered comes back as a refusal, never as an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const REFUSED: &str = "Refused to connect. Are you on the correct website?";
pub const NO_ACTIVE_CONTEXT: &str = "No active tab found";

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests a responder can queue before senders wait.
const QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Download,
    Upload,
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Upload => f.write_str("upload"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: CommandAction,
    pub platform: String,
    #[serde(default)]
    pub username: String,
}

impl CommandRequest {
    pub fn new(
        action: CommandAction,
        platform: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            action,
            platform: platform.into(),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn refused() -> Self {
        Self::failed(REFUSED)
    }
}

/// A delivered request awaiting its answer.
#[derive(Debug)]
pub struct Incoming {
    pub request: CommandRequest,
    reply: oneshot::Sender<CommandResponse>,
}

impl Incoming {
    /// Answer the request. A sender that already gave up is ignored.
    pub fn respond(self, response: CommandResponse) {
        let _ = self.reply.send(response);
    }
}

/// Receiving end for one platform.
#[derive(Debug)]
pub struct Responder {
    platform: String,
    rx: mpsc::Receiver<Incoming>,
}

impl Responder {
    /// Next request, or `None` once the relay dropped this registration.
    pub async fn recv(&mut self) -> Option<Incoming> {
        self.rx.recv().await
    }

    /// Answer every request with `handler` until the registration goes away.
    pub async fn serve<F>(mut self, mut handler: F)
    where
        F: FnMut(&CommandRequest) -> CommandResponse,
    {
        while let Some(incoming) = self.recv().await {
            debug!("{} responder got {}", self.platform, incoming.request.action);
            let response = handler(&incoming.request);
            incoming.respond(response);
        }
    }
}

/// Platform name to responder routing table.
#[derive(Debug)]
pub struct Relay {
    responders: Mutex<HashMap<String, mpsc::Sender<Incoming>>>,
    reply_timeout: Duration,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        Self {
            responders: Mutex::new(HashMap::new()),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Bound on delivery plus answer.
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, mpsc::Sender<Incoming>>> {
        self.responders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a responder for `platform` (case-insensitive), replacing any
    /// earlier one.
    pub fn register(&self, platform: impl Into<String>) -> Responder {
        let platform = platform.into();
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        if self.table().insert(platform.to_lowercase(), tx).is_some() {
            debug!("replaced responder for {}", platform);
        }
        Responder { platform, rx }
    }

    pub fn unregister(&self, platform: &str) -> bool {
        self.table().remove(&platform.to_lowercase()).is_some()
    }

    pub fn platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table().keys().cloned().collect();
        names.sort();
        names
    }

    /// Deliver `request` and wait for the answer.
    pub async fn send(&self, request: CommandRequest) -> CommandResponse {
        let key = request.platform.to_lowercase();
        let tx = {
            let table = self.table();
            if table.is_empty() {
                warn!("no responders registered");
                return CommandResponse::failed(NO_ACTIVE_CONTEXT);
            }
            table.get(&key).cloned()
        };
        let Some(tx) = tx else {
            warn!("no responder for platform '{}'", request.platform);
            return CommandResponse::refused();
        };

        info!("relaying {} on {}", request.action, request.platform);
        let (reply, answer) = oneshot::channel();
        let exchange = async {
            tx.send(Incoming { request, reply }).await.ok()?;
            answer.await.ok()
        };

        match timeout(self.reply_timeout, exchange).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                warn!("responder for '{}' hung up", key);
                let mut table = self.table();
                // a newer registration may have taken the slot meanwhile
                if tx.is_closed() && table.get(&key).is_some_and(|live| live.same_channel(&tx)) {
                    table.remove(&key);
                }
                CommandResponse::refused()
            }
            Err(_) => {
                warn!("responder for '{}' did not answer within {:?}", key, self.reply_timeout);
                CommandResponse::refused()
            }
        }
    }
}
