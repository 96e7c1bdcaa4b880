//! Resolving combo-box style controls.
//!
//! A combo box is a text input that renders a suggestion list when clicked.
//! Resolution opens the list and picks the first suggestion that satisfies,
//! in order: exact match, separator prefix, substring (opt-in), fallback
//! label, and finally typing the value in and clicking the manual-entry
//! affordance. Anything else leaves the field unset.

use super::wait::ElementWaiter;
use crate::config::DropdownSelectors;
use crate::host::{FieldSignal, PageHost};
use crate::Result;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

pub const DEFAULT_MANUAL_ENTRY_WAIT: Duration = Duration::from_millis(2000);

/// How a suggestion was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Contains,
    Manual,
    /// Taken by position, no target.
    First,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Contains => "contains",
            Self::Manual => "manual",
            Self::First => "first",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched { label: String, via: MatchKind },
    Fallback { label: String },
    None,
}

impl Resolution {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Matched { label, .. } | Self::Fallback { label } => Some(label),
            Self::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

enum Pick {
    Match(usize, MatchKind),
    Fallback(usize),
}

/// Choose a suggestion for `target` without touching the page.
fn choose(texts: &[String], target: &str, sel: &DropdownSelectors) -> Option<Pick> {
    let target = target.trim();
    let wanted = target.to_lowercase();

    if !wanted.is_empty() {
        if let Some(i) = texts.iter().position(|t| t.trim().to_lowercase() == wanted) {
            return Some(Pick::Match(i, MatchKind::Exact));
        }

        let prefixes: Vec<String> = sel
            .separators
            .iter()
            .map(|sep| format!("{}{}", wanted, sep.to_lowercase()))
            .collect();
        if let Some(i) = texts.iter().position(|t| {
            let t = t.trim().to_lowercase();
            prefixes.iter().any(|p| t.starts_with(p.as_str()))
        }) {
            return Some(Pick::Match(i, MatchKind::Prefix));
        }

        if sel.match_contains {
            if let Some(i) = texts.iter().position(|t| t.contains(target)) {
                return Some(Pick::Match(i, MatchKind::Contains));
            }
        }
    }

    let fallback = sel.fallback_label.as_deref()?.trim().to_lowercase();
    texts
        .iter()
        .position(|t| t.trim().to_lowercase() == fallback)
        .map(Pick::Fallback)
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
pub fn css_attr_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(ch),
        }
    }
    out
}

pub struct DropdownResolver<'a, H> {
    waiter: ElementWaiter<'a, H>,
    manual_entry_wait: Duration,
}

impl<'a, H: PageHost> DropdownResolver<'a, H> {
    pub fn new(waiter: ElementWaiter<'a, H>) -> Self {
        Self {
            waiter,
            manual_entry_wait: DEFAULT_MANUAL_ENTRY_WAIT,
        }
    }

    pub fn manual_entry_wait(mut self, wait: Duration) -> Self {
        self.manual_entry_wait = wait;
        self
    }

    /// Click the trigger and wait for suggestions. `false` when the trigger
    /// never appeared.
    async fn open(&self, sel: &DropdownSelectors) -> Result<bool> {
        if self.waiter.wait_for(&sel.trigger).await?.is_none() {
            debug!("dropdown trigger '{}' not found", sel.trigger);
            return Ok(false);
        }
        self.waiter.host().click(&sel.trigger, 0).await?;
        let timeout = sel
            .suggestion_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.waiter.default_timeout());
        self.waiter.wait_for_with(&sel.suggestions, timeout).await?;
        Ok(true)
    }

    /// Open the control and select the suggestion best matching `target`.
    pub async fn resolve(&self, sel: &DropdownSelectors, target: &str) -> Result<Resolution> {
        if !self.open(sel).await? {
            return Ok(Resolution::None);
        }
        let host = self.waiter.host();
        let texts = host.texts(&sel.suggestions).await?;

        let clicked = match choose(&texts, target, sel) {
            Some(Pick::Match(i, via)) => host
                .click(&sel.suggestions, i)
                .await?
                .then(|| Resolution::Matched {
                    label: texts[i].clone(),
                    via,
                }),
            Some(Pick::Fallback(i)) => host
                .click(&sel.suggestions, i)
                .await?
                .then(|| Resolution::Fallback {
                    label: texts[i].clone(),
                }),
            None => None,
        };
        let resolution = match clicked {
            Some(resolution) => resolution,
            None => self.enter_manually(sel, target).await?,
        };

        match resolution.label() {
            Some(label) => info!("'{}' -> '{}'", target, label),
            None => info!("no option for '{}', leaving unset", target),
        }
        Ok(resolution)
    }

    /// Type `target` into the trigger and click whichever entry affordance
    /// shows up.
    async fn enter_manually(&self, sel: &DropdownSelectors, target: &str) -> Result<Resolution> {
        if sel.manual_match.is_none() && sel.custom_value.is_none() {
            return Ok(Resolution::None);
        }
        if target.trim().is_empty() {
            return Ok(Resolution::None);
        }
        let host = self.waiter.host();
        host.write_value(&sel.trigger, target).await?;
        host.notify(&sel.trigger, FieldSignal::Input).await?;
        sleep(self.manual_entry_wait).await;

        let exact = sel
            .manual_match
            .as_ref()
            .map(|tpl| tpl.replace("{value}", &css_attr_escape(target)));
        for candidate in exact.iter().chain(sel.custom_value.iter()) {
            if host.click(candidate, 0).await? {
                debug!("manual entry via '{}'", candidate);
                return Ok(Resolution::Matched {
                    label: target.to_string(),
                    via: MatchKind::Manual,
                });
            }
        }
        Ok(Resolution::None)
    }

    /// Take the first `limit` suggestions.
    pub async fn pick_first(
        &self,
        sel: &DropdownSelectors,
        limit: usize,
        settle: Duration,
    ) -> Result<Vec<String>> {
        self.select_many(sel, &[], limit, settle).await
    }

    /// Open the control and click up to `limit` suggestions, pausing `settle`
    /// after each. With `wanted` empty the first suggestions not yet picked
    /// are taken, otherwise each wanted label is matched exactly or by prefix.
    pub async fn select_many(
        &self,
        sel: &DropdownSelectors,
        wanted: &[String],
        limit: usize,
        settle: Duration,
    ) -> Result<Vec<String>> {
        let mut picked = Vec::new();
        if limit == 0 || !self.open(sel).await? {
            return Ok(picked);
        }
        let host = self.waiter.host();

        if wanted.is_empty() {
            // the list may re-render after each pick, so index into a fresh read
            for _ in 0..limit {
                let texts = host.texts(&sel.suggestions).await?;
                let Some(i) = texts.iter().position(|t| !picked.contains(t)) else {
                    break;
                };
                if host.click(&sel.suggestions, i).await? {
                    picked.push(texts[i].clone());
                }
                sleep(settle).await;
            }
        } else {
            let exact_only = DropdownSelectors {
                fallback_label: None,
                match_contains: false,
                ..sel.clone()
            };
            for label in wanted {
                if picked.len() >= limit {
                    break;
                }
                let texts = host.texts(&sel.suggestions).await?;
                if let Some(Pick::Match(i, _)) = choose(&texts, label, &exact_only) {
                    if host.click(&sel.suggestions, i).await? {
                        picked.push(texts[i].clone());
                    }
                    sleep(settle).await;
                }
            }
        }
        debug!("selected {:?} from '{}'", picked, sel.suggestions);
        Ok(picked)
    }
}
