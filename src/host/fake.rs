//! In-memory page for unit tests.
//!
//! Selectors are matched literally: a node registered under
//! `input[name="title"]` is only found by that exact string.

use super::{AssetFile, FieldSignal, InteractionEvent, ListenerId, PageHost};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Node {
    text: String,
    disabled: bool,
}

impl Node {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            disabled: false,
        }
    }
}

#[derive(Default)]
struct State {
    nodes: HashMap<String, Vec<Node>>,
    pending: Vec<(Instant, String, Vec<Node>)>,
    reveals: HashMap<String, Vec<(String, Vec<String>)>>,
    values: HashMap<String, String>,
    signals: Vec<(String, FieldSignal)>,
    clicks: Vec<(String, String)>,
    assignments: Vec<(String, Vec<String>)>,
    filters: HashMap<u64, InteractionEvent>,
    next_filter: u64,
    faulty: Vec<String>,
    stuck: Option<InteractionEvent>,
}

impl State {
    /// Materialize delayed nodes whose time has come.
    fn settle(&mut self) {
        let now = Instant::now();
        let (due, later): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _, _)| *at <= now);
        self.pending = later;
        for (_, selector, nodes) in due {
            self.nodes.insert(selector, nodes);
        }
    }

    fn present(&self, selector: &str) -> bool {
        self.nodes.get(selector).is_some_and(|n| !n.is_empty())
    }
}

#[derive(Default)]
pub(crate) struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_node(self, selector: &str, text: &str) -> Self {
        self.with_nodes(selector, &[text])
    }

    pub fn with_nodes(self, selector: &str, texts: &[&str]) -> Self {
        self.lock().nodes.insert(
            selector.to_string(),
            texts.iter().map(|t| Node::new(t)).collect(),
        );
        self
    }

    /// Nodes that only exist once `delay` of (tokio) time has passed.
    pub fn with_delayed_nodes(self, selector: &str, texts: &[&str], delay: Duration) -> Self {
        let at = Instant::now() + delay;
        self.lock().pending.push((
            at,
            selector.to_string(),
            texts.iter().map(|t| Node::new(t)).collect(),
        ));
        self
    }

    /// Clicking `trigger` replaces whatever matches `selector` with `texts`.
    pub fn reveal_on_click(self, trigger: &str, selector: &str, texts: &[&str]) -> Self {
        self.lock()
            .reveals
            .entry(trigger.to_string())
            .or_default()
            .push((
                selector.to_string(),
                texts.iter().map(|t| t.to_string()).collect(),
            ));
        self
    }

    pub fn with_disabled(self, selector: &str) -> Self {
        self.lock().nodes.insert(
            selector.to_string(),
            vec![Node {
                text: String::new(),
                disabled: true,
            }],
        );
        self
    }

    /// Removing the filter for `event` fails until [`FakePage::unstick`].
    pub fn with_stuck_filter(self, event: InteractionEvent) -> Self {
        self.lock().stuck = Some(event);
        self
    }

    pub fn unstick(&self) {
        self.lock().stuck = None;
    }

    /// Any operation on `selector` fails with a host error.
    pub fn with_fault(self, selector: &str) -> Self {
        self.lock().faulty.push(selector.to_string());
        self
    }

    pub fn signals(&self, selector: &str) -> Vec<FieldSignal> {
        self.lock()
            .signals
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, sig)| *sig)
            .collect()
    }

    /// Text of every node clicked under `selector`, in click order.
    pub fn clicked(&self, selector: &str) -> Vec<String> {
        self.lock()
            .clicks
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn value(&self, selector: &str) -> Option<String> {
        self.lock().values.get(selector).cloned()
    }

    /// File names of every assignment made, per call.
    pub fn assignments(&self) -> Vec<(String, Vec<String>)> {
        self.lock().assignments.clone()
    }

    pub fn active_filters(&self) -> usize {
        self.lock().filters.len()
    }

    fn guard(&self, selector: &str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        if state.faulty.iter().any(|s| s == selector) {
            return Err(Error::Host(format!("injected fault on {}", selector)));
        }
        state.settle();
        Ok(state)
    }
}

impl PageHost for FakePage {
    async fn count(&self, selector: &str) -> Result<usize> {
        let state = self.guard(selector)?;
        Ok(state.nodes.get(selector).map_or(0, |n| n.len()))
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let state = self.guard(selector)?;
        Ok(state
            .nodes
            .get(selector)
            .map(|n| n.iter().map(|n| n.text.trim().to_string()).collect())
            .unwrap_or_default())
    }

    async fn click(&self, selector: &str, index: usize) -> Result<bool> {
        let mut state = self.guard(selector)?;
        let Some(node) = state.nodes.get(selector).and_then(|n| n.get(index)).cloned() else {
            return Ok(false);
        };
        state.clicks.push((selector.to_string(), node.text));
        if let Some(reveals) = state.reveals.get(selector).cloned() {
            for (target, texts) in reveals {
                let nodes = texts.iter().map(|t| Node::new(t)).collect();
                state.nodes.insert(target, nodes);
            }
        }
        Ok(true)
    }

    async fn write_value(&self, selector: &str, value: &str) -> Result<bool> {
        let mut state = self.guard(selector)?;
        if !state.present(selector) {
            return Ok(false);
        }
        state.values.insert(selector.to_string(), value.to_string());
        Ok(true)
    }

    async fn notify(&self, selector: &str, signal: FieldSignal) -> Result<bool> {
        let mut state = self.guard(selector)?;
        if !state.present(selector) {
            return Ok(false);
        }
        state.signals.push((selector.to_string(), signal));
        Ok(true)
    }

    async fn assign_files(&self, selector: &str, files: &[AssetFile]) -> Result<bool> {
        let mut state = self.guard(selector)?;
        if !state.present(selector) {
            return Ok(false);
        }
        let names = files.iter().map(|f| f.name.clone()).collect();
        state.assignments.push((selector.to_string(), names));
        Ok(true)
    }

    async fn is_disabled(&self, selector: &str) -> Result<Option<bool>> {
        let state = self.guard(selector)?;
        Ok(state
            .nodes
            .get(selector)
            .and_then(|n| n.first())
            .map(|n| n.disabled))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<bool> {
        let state = self.guard(selector)?;
        Ok(state.present(selector))
    }

    async fn add_interaction_filter(&self, event: InteractionEvent) -> Result<ListenerId> {
        let mut state = self.lock();
        if state.filters.values().any(|e| *e == event) {
            return Err(Error::GuardAlreadyEngaged);
        }
        state.next_filter += 1;
        let id = state.next_filter;
        state.filters.insert(id, event);
        Ok(ListenerId(id))
    }

    async fn remove_interaction_filter(&self, id: ListenerId) -> Result<()> {
        let mut state = self.lock();
        if state.stuck.is_some() && state.filters.get(&id.0) == state.stuck.as_ref() {
            return Err(Error::Host(format!("filter {} could not be removed", id.0)));
        }
        state.filters.remove(&id.0);
        Ok(())
    }
}
