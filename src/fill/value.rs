//! Writing values into form fields.

use super::wait::ElementWaiter;
use crate::host::{FieldSignal, PageHost};
use crate::Result;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_KEYSTROKE_DELAY: Duration = Duration::from_millis(500);

pub struct ValueSetter<'a, H> {
    waiter: ElementWaiter<'a, H>,
    keystroke_delay: Duration,
}

impl<'a, H: PageHost> ValueSetter<'a, H> {
    pub fn new(waiter: ElementWaiter<'a, H>) -> Self {
        Self {
            waiter,
            keystroke_delay: DEFAULT_KEYSTROKE_DELAY,
        }
    }

    pub fn keystroke_delay(mut self, delay: Duration) -> Self {
        self.keystroke_delay = delay;
        self
    }

    /// Write `value` and emit `input` then `change`. Returns false when the
    /// field never showed up.
    pub async fn set(&self, selector: &str, value: &str) -> Result<bool> {
        if self.waiter.wait_for(selector).await?.is_none() {
            return Ok(false);
        }
        let host = self.waiter.host();
        host.write_value(selector, value).await?;
        host.notify(selector, FieldSignal::Input).await?;
        host.notify(selector, FieldSignal::Change).await?;
        debug!("set {} ({} chars)", selector, value.chars().count());
        Ok(true)
    }

    /// Type `value` one character at a time for fields whose validation is
    /// debounced on `input`. Ends with a single `change` and a blur.
    pub async fn set_paced(&self, selector: &str, value: &str) -> Result<bool> {
        if self.waiter.wait_for(selector).await?.is_none() {
            return Ok(false);
        }
        let host = self.waiter.host();
        host.write_value(selector, "").await?;
        host.notify(selector, FieldSignal::Focus).await?;

        let mut typed = String::with_capacity(value.len());
        for ch in value.chars() {
            typed.push(ch);
            host.write_value(selector, &typed).await?;
            host.notify(selector, FieldSignal::Input).await?;
            tokio::time::sleep(self.keystroke_delay).await;
        }

        host.notify(selector, FieldSignal::Change).await?;
        host.notify(selector, FieldSignal::Blur).await?;
        debug!("typed {} ({} chars)", selector, typed.chars().count());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakePage;
    use tokio::time::Instant;

    const PRICE: &str = "input[name=\"price\"]";

    #[tokio::test(start_paused = true)]
    async fn test_set_emits_input_then_change() {
        let page = FakePage::new().with_node("#title", "");
        let setter = ValueSetter::new(ElementWaiter::new(&page));
        assert!(setter.set("#title", "Jacket").await.unwrap());
        assert_eq!(page.value("#title").as_deref(), Some("Jacket"));
        assert_eq!(
            page.signals("#title"),
            vec![FieldSignal::Input, FieldSignal::Change]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_price_signal_sequence() {
        let page = FakePage::new().with_node(PRICE, "");
        let setter = ValueSetter::new(ElementWaiter::new(&page));
        let start = Instant::now();
        assert!(setter.set_paced(PRICE, "40.00").await.unwrap());

        use FieldSignal::*;
        assert_eq!(
            page.signals(PRICE),
            vec![Focus, Input, Input, Input, Input, Input, Change, Blur]
        );
        assert_eq!(page.value(PRICE).as_deref(), Some("40.00"));
        assert!(start.elapsed() >= Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_field_is_noop() {
        let page = FakePage::new();
        let setter = ValueSetter::new(ElementWaiter::new(&page).timeout(Duration::from_secs(1)));
        assert!(!setter.set("#gone", "x").await.unwrap());
        assert!(!setter.set_paced("#gone", "x").await.unwrap());
        assert!(page.signals("#gone").is_empty());
    }
}
