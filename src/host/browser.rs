//! [`PageHost`] over a live eoka page.
//!
//! Every interaction is a synthetic DOM event dispatched from page script, so
//! `isTrusted` is false and the input block filters let it through. CDP input
//! events would be trusted and get swallowed by the guard.

use super::{AssetFile, FieldSignal, InteractionEvent, ListenerId, PageHost};
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use eoka::Page;
use tracing::debug;

/// Global the interaction filters are parked on between calls.
const FILTER_REGISTRY: &str = "window.__listingAutofillFilters";

/// Element id of the status overlay.
const OVERLAY_ID: &str = "listing-autofill-status";

/// Quote a string as a JS literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

pub struct EokaHost<'a> {
    page: &'a Page,
}

impl<'a> EokaHost<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// Run a statement against the first match; returns whether it existed.
    async fn with_first(&self, selector: &str, body: &str) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                {body}
                return true;
            }})()"#,
            sel = js_str(selector),
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Show or replace the status overlay text.
    pub async fn show_status(&self, message: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                let box = document.getElementById({id});
                if (!box) {{
                    box = document.createElement('div');
                    box.id = {id};
                    box.style.cssText = 'position:fixed;bottom:20px;right:20px;z-index:2147483647;padding:12px 20px;background:#222;color:#fff;border-radius:10px;font:600 15px sans-serif';
                    document.body.appendChild(box);
                }}
                box.textContent = {msg};
            }})()"#,
            id = js_str(OVERLAY_ID),
            msg = js_str(message),
        );
        self.page.execute(&js).await?;
        Ok(())
    }

    pub async fn hide_status(&self) -> Result<()> {
        let js = format!("document.getElementById({})?.remove()", js_str(OVERLAY_ID));
        self.page.execute(&js).await?;
        Ok(())
    }
}

impl PageHost for EokaHost<'_> {
    async fn count(&self, selector: &str) -> Result<usize> {
        let js = format!("document.querySelectorAll({}).length", js_str(selector));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let js = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(n => (n.textContent || '').trim()))",
            js_str(selector)
        );
        let raw: String = self.page.evaluate(&js).await?;
        serde_json::from_str(&raw).map_err(|e| Error::Host(format!("texts parse error: {}", e)))
    }

    async fn click(&self, selector: &str, index: usize) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelectorAll({sel})[{index}];
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            sel = js_str(selector),
        );
        let clicked: bool = self.page.evaluate(&js).await?;
        debug!("click {}[{}]: {}", selector, index, clicked);
        Ok(clicked)
    }

    async fn write_value(&self, selector: &str, value: &str) -> Result<bool> {
        self.with_first(selector, &format!("el.value = {};", js_str(value)))
            .await
    }

    async fn notify(&self, selector: &str, signal: FieldSignal) -> Result<bool> {
        let body = match signal {
            FieldSignal::Focus => "el.focus();".to_string(),
            FieldSignal::Blur => "el.blur();".to_string(),
            FieldSignal::Input | FieldSignal::Change => format!(
                "el.dispatchEvent(new Event({}, {{ bubbles: true }}));",
                js_str(signal.name())
            ),
        };
        self.with_first(selector, &body).await
    }

    async fn assign_files(&self, selector: &str, files: &[AssetFile]) -> Result<bool> {
        let payload: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "mime": f.mime,
                    "data": BASE64.encode(&f.bytes),
                })
            })
            .collect();
        let body = format!(
            r#"const files = {files};
                const dt = new DataTransfer();
                for (const f of files) {{
                    const bin = atob(f.data);
                    const bytes = new Uint8Array(bin.length);
                    for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
                    dt.items.add(new File([bytes], f.name, {{ type: f.mime }}));
                }}
                el.files = dt.files;"#,
            files = serde_json::Value::Array(payload),
        );
        self.with_first(selector, &body).await
    }

    async fn is_disabled(&self, selector: &str) -> Result<Option<bool>> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); return el ? !!el.disabled : null; }})()",
            js_str(selector)
        );
        Ok(self.page.evaluate(&js).await?)
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<bool> {
        self.with_first(
            selector,
            "el.scrollIntoView({ behavior: 'smooth', block: 'center' });",
        )
        .await
    }

    async fn add_interaction_filter(&self, event: InteractionEvent) -> Result<ListenerId> {
        let js = format!(
            r#"(() => {{
                const reg = {reg} = {reg} || {{ next: 1, handlers: {{}} }};
                if (Object.values(reg.handlers).some(h => h[0] === {event})) return 0;
                const id = reg.next++;
                const handler = (e) => {{
                    if (e.isTrusted) {{
                        e.stopPropagation();
                        e.stopImmediatePropagation();
                        e.preventDefault();
                        return false;
                    }}
                }};
                window.addEventListener({event}, handler, true);
                reg.handlers[id] = [{event}, handler];
                return id;
            }})()"#,
            reg = FILTER_REGISTRY,
            event = js_str(event.dom_name()),
        );
        let id: u64 = self.page.evaluate(&js).await?;
        if id == 0 {
            return Err(Error::GuardAlreadyEngaged);
        }
        Ok(ListenerId(id))
    }

    async fn remove_interaction_filter(&self, id: ListenerId) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const reg = {reg};
                const entry = reg && reg.handlers[{id}];
                if (!entry) return;
                window.removeEventListener(entry[0], entry[1], true);
                delete reg.handlers[{id}];
            }})()"#,
            reg = FILTER_REGISTRY,
            id = id.0,
        );
        self.page.execute(&js).await?;
        Ok(())
    }
}
