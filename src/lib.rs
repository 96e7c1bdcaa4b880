//! # listing-autofill
//!
//! Fill a marketplace new-listing form from a structured draft. The form is
//! driven through a fixed sequence of phases while genuine user input is
//! blocked, and stops once the submit control is ready.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use listing_autofill::{
//!     Config, EokaHost, HttpFetcher, ListingDraft, ListingPipeline, LogSink, PipelineSettings,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> listing_autofill::Result<()> {
//! let config = Config::load("configs/vinted.yaml")?;
//! let draft = ListingDraft::load("configs/jacket.yaml")?;
//!
//! let browser = eoka::Browser::launch().await?;
//! let page = browser.new_page(&config.target.url).await?;
//! let host = EokaHost::new(&page);
//! let fetcher = HttpFetcher::with_timeout(config.timings.fetch_timeout())?;
//!
//! let settings = PipelineSettings::from_config(&config);
//! let pipeline = ListingPipeline::new(&host, &fetcher, LogSink, settings);
//! let result = pipeline.start(&draft, &config.selectors).await?;
//! println!("Ready: {}", result.reached_readiness);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod fill;
pub mod host;
pub mod pipeline;
pub mod relay;

pub use config::{
    BrowserConfig, Condition, ConditionMapping, Config, DropdownSelectors, ListingDraft,
    ParamDef, Params, SelectorConfig, TargetConfig, Timings,
};
pub use fill::{AssetFetcher, HttpFetcher, Resolution};
pub use host::{EokaHost, PageHost};
pub use pipeline::{
    AutomationStatus, ChannelSink, ListingPipeline, LogSink, Phase, PhaseOutcome, PhaseReport,
    PipelineResult, PipelineSettings, StatusSink,
};
pub use relay::{CommandAction, CommandRequest, CommandResponse, Relay};

/// Result type for listing-autofill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading inputs or driving a page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("failed to fetch {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    #[error("submit control is disabled")]
    SubmitControlDisabled,

    #[error("an input block is already installed on this page")]
    GuardAlreadyEngaged,

    #[error("page error: {0}")]
    Host(String),
}
