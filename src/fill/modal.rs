//! Interstitial dialog handling.

use crate::host::PageHost;
use crate::Result;
use tracing::info;

pub const DEFAULT_AUTHENTICITY_CLOSE: &str = "[data-testid=\"authenticity-modal--close-button\"]";

/// Closes the authenticity dialog some brands pop up.
pub struct ModalDismisser<'a, H> {
    host: &'a H,
    close_selector: &'a str,
}

impl<'a, H: PageHost> ModalDismisser<'a, H> {
    pub fn new(host: &'a H, close_selector: &'a str) -> Self {
        Self {
            host,
            close_selector,
        }
    }

    /// Single check, no polling. `true` when the dialog was there and got closed.
    pub async fn dismiss_if_present(&self) -> Result<bool> {
        if self.host.count(self.close_selector).await? == 0 {
            return Ok(false);
        }
        let closed = self.host.click(self.close_selector, 0).await?;
        if closed {
            info!("dismissed authenticity modal");
        }
        Ok(closed)
    }
}
