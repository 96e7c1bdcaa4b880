//! The page surface the fill components drive.
//!
//! Everything the pipeline does to a page goes through [`PageHost`]. The
//! browser implementation lives in [`browser`]; tests use an in-memory page.

pub mod browser;
#[cfg(test)]
pub(crate) mod fake;

pub use browser::EokaHost;

use crate::Result;
use std::fmt;

/// A notification sent to a field after its value was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSignal {
    /// Give the field focus.
    Focus,
    /// Bubbling `input` event.
    Input,
    /// Bubbling `change` event.
    Change,
    /// Take focus away from the field.
    Blur,
}

impl FieldSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Input => "input",
            Self::Change => "change",
            Self::Blur => "blur",
        }
    }
}

/// User interaction events the input block guard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionEvent {
    Click,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
    KeyPress,
    ContextMenu,
}

impl InteractionEvent {
    pub const ALL: [InteractionEvent; 7] = [
        Self::Click,
        Self::MouseDown,
        Self::MouseUp,
        Self::KeyDown,
        Self::KeyUp,
        Self::KeyPress,
        Self::ContextMenu,
    ];

    /// DOM event type name.
    pub fn dom_name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::ContextMenu => "contextmenu",
        }
    }
}

impl fmt::Display for InteractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_name())
    }
}

/// Handle for an installed interaction filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A binary asset packaged for a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Operations the fill components need from a live page.
///
/// Selector-taking methods address *all* nodes matching a CSS selector; the
/// ones returning `bool` report whether a node was there to act on. A missing
/// node is never an error, only a host fault is.
#[allow(async_fn_in_trait)]
pub trait PageHost {
    /// Number of nodes currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Trimmed text content of every node matching `selector`, in document order.
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Synthetic click on the `index`-th match.
    async fn click(&self, selector: &str, index: usize) -> Result<bool>;

    /// Overwrite the value of the first match without notifying anyone.
    async fn write_value(&self, selector: &str, value: &str) -> Result<bool>;

    /// Tell the host environment the first match changed.
    async fn notify(&self, selector: &str, signal: FieldSignal) -> Result<bool>;

    /// Replace the file list of the first match in one assignment.
    async fn assign_files(&self, selector: &str, files: &[AssetFile]) -> Result<bool>;

    /// `Some(disabled)` for the first match, `None` when absent.
    async fn is_disabled(&self, selector: &str) -> Result<Option<bool>>;

    async fn scroll_into_view(&self, selector: &str) -> Result<bool>;

    /// Install a capture-phase filter that swallows genuine user events of
    /// the given type. Synthetic events must pass through.
    async fn add_interaction_filter(&self, event: InteractionEvent) -> Result<ListenerId>;

    async fn remove_interaction_filter(&self, id: ListenerId) -> Result<()>;
}
