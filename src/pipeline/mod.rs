//! The fill run.
//!
//! Phases run strictly in [`Phase`] order, each exactly once. A phase whose
//! elements never show up degrades to a skipped no-op and the run moves on;
//! only host faults abort it. The input guard is released on every path.

mod phase;
mod status;

pub use phase::{AutomationStatus, Phase, PhaseOutcome, PhaseReport};
pub use status::{ChannelSink, LogSink, StatusSink};

use crate::config::{
    ConditionMapping, Config, DropdownSelectors, ListingDraft, SelectorConfig, Timings,
};
use crate::fill::{
    AssetFetcher, AssetUploader, DropdownResolver, ElementWaiter, InputBlockGuard, MatchKind,
    ModalDismisser, Resolution, ValueSetter,
};
use crate::host::PageHost;
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Most color suggestions picked per run.
pub const COLOR_LIMIT: usize = 2;

/// Run policy taken from the config.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub timings: Timings,
    pub conditions: ConditionMapping,
    pub auto_submit: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timings: config.timings.clone(),
            conditions: config.conditions.clone(),
            auto_submit: config.auto_submit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    /// The submit control was found enabled.
    pub reached_readiness: bool,
    pub submitted: bool,
    pub phases: Vec<PhaseReport>,
}

impl PipelineResult {
    pub fn outcome(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|r| r.phase == phase)
            .map(|r| &r.outcome)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PhaseReport> {
        self.phases
            .iter()
            .filter(|r| matches!(r.outcome, PhaseOutcome::Skipped(_)))
    }
}

/// Bookkeeping for one run.
struct Run<'s, S> {
    sink: &'s S,
    status: AutomationStatus,
    result: PipelineResult,
}

impl<'s, S: StatusSink> Run<'s, S> {
    fn new(sink: &'s S) -> Self {
        Self {
            sink,
            status: AutomationStatus::default(),
            result: PipelineResult::default(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.enter_with(AutomationStatus::new(phase));
    }

    fn enter_with(&mut self, status: AutomationStatus) {
        debug_assert!(
            status.phase > self.status.phase,
            "{} cannot follow {}",
            status.phase,
            self.status.phase
        );
        self.status = status;
        self.sink.report(&self.status);
    }

    fn done(&mut self, detail: impl Into<String>) {
        self.record(PhaseOutcome::Done(detail.into()));
    }

    fn skipped(&mut self, reason: impl Into<String>) {
        self.record(PhaseOutcome::Skipped(reason.into()));
    }

    fn record(&mut self, outcome: PhaseOutcome) {
        let report = PhaseReport {
            phase: self.status.phase,
            outcome,
        };
        match report.outcome {
            PhaseOutcome::Done(_) => info!("{}", report),
            PhaseOutcome::Skipped(_) => warn!("{}", report),
        }
        self.result.phases.push(report);
    }

    fn resolved(&mut self, resolution: Resolution, sel: &DropdownSelectors) {
        match resolution {
            Resolution::Matched { label, via } => self.done(format!("'{}' ({})", label, via)),
            Resolution::Fallback { label } => self.done(format!("'{}' (fallback)", label)),
            Resolution::None => self.skipped(format!("no usable option in '{}'", sel.trigger)),
        }
    }
}

/// Drives one listing form from one draft.
pub struct ListingPipeline<'a, H, F, S> {
    host: &'a H,
    fetcher: &'a F,
    sink: S,
    settings: PipelineSettings,
}

impl<'a, H, F, S> ListingPipeline<'a, H, F, S>
where
    H: PageHost,
    F: AssetFetcher,
    S: StatusSink,
{
    pub fn new(host: &'a H, fetcher: &'a F, sink: S, settings: PipelineSettings) -> Self {
        Self {
            host,
            fetcher,
            sink,
            settings,
        }
    }

    /// Run every phase once against the current page.
    ///
    /// Returns `Err` only for host faults (or a guard already installed on
    /// the page); the guard is released before the error is returned. A
    /// filter that cannot be removed is itself a host fault.
    pub async fn start(
        &self,
        draft: &ListingDraft,
        selectors: &SelectorConfig,
    ) -> Result<PipelineResult> {
        let mut run = Run::new(&self.sink);
        let mut guard = InputBlockGuard::new();

        run.enter(Phase::Blocked);
        let outcome = match guard.engage(self.host).await {
            Ok(()) => {
                run.done(format!("{} input filters", guard.handlers().len()));
                self.fill(draft, selectors, &mut run).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            warn!("run aborted in {}: {}", run.status.phase, e);
        }
        run.enter(Phase::Unblocked);
        let released = guard.release(self.host).await;
        outcome?;
        if let Err(e) = released {
            warn!("{} input filters still installed", guard.handlers().len());
            return Err(e);
        }
        run.done("input restored");
        Ok(run.result)
    }

    async fn fill(
        &self,
        draft: &ListingDraft,
        selectors: &SelectorConfig,
        run: &mut Run<'_, S>,
    ) -> Result<()> {
        let t = &self.settings.timings;
        let waiter = ElementWaiter::new(self.host)
            .timeout(t.element_timeout())
            .interval(t.poll_interval());
        let setter = ValueSetter::new(waiter).keystroke_delay(t.keystroke_delay());
        let resolver = DropdownResolver::new(waiter).manual_entry_wait(t.manual_entry_wait());

        run.enter(Phase::UploadingImages);
        if draft.images.is_empty() {
            run.skipped("draft has no images");
        } else {
            let report = AssetUploader::new(waiter, self.fetcher)
                .fetch_timeout(t.fetch_timeout())
                .upload(&selectors.photos, &draft.images)
                .await?;
            if !report.field_found {
                run.skipped(Error::ElementNotFound(selectors.photos.clone()).to_string());
            } else if report.failed.is_empty() {
                run.done(format!("{} images", report.applied));
            } else {
                run.done(format!(
                    "{}/{} images, failed: {}",
                    report.applied,
                    report.attempted,
                    report.failed.join(", ")
                ));
            }
        }

        run.enter(Phase::FillingTitleAndDescription);
        let mut missing = Vec::new();
        if !setter.set(&selectors.title, &draft.title).await? {
            missing.push(selectors.title.as_str());
        }
        if !setter.set(&selectors.description, &draft.description).await? {
            missing.push(selectors.description.as_str());
        }
        match missing.len() {
            0 => run.done("title and description set"),
            2 => run.skipped(Error::ElementNotFound(missing.join(", ")).to_string()),
            _ => run.done(format!(
                "partially set, {}",
                Error::ElementNotFound(missing.join(", "))
            )),
        }
        sleep(t.settle()).await;

        run.enter(Phase::SelectingCategory);
        let category = match &draft.category {
            Some(label) => resolver.resolve(&selectors.category, label).await?,
            None => resolver
                .pick_first(&selectors.category, 1, Duration::ZERO)
                .await?
                .into_iter()
                .next()
                .map_or(Resolution::None, |label| Resolution::Matched {
                    label,
                    via: MatchKind::First,
                }),
        };
        run.resolved(category, &selectors.category);
        sleep(t.settle()).await;

        run.enter(Phase::SelectingBrand);
        if draft.brand.trim().is_empty() {
            run.skipped("draft has no brand");
        } else {
            let brand = resolver.resolve(&selectors.brand, &draft.brand).await?;
            run.resolved(brand, &selectors.brand);
            sleep(t.settle()).await;
        }

        run.enter(Phase::DismissingModal);
        let modal = ModalDismisser::new(self.host, &selectors.authenticity_modal_close);
        if modal.dismiss_if_present().await? {
            run.done("authenticity dialog closed");
            sleep(t.settle()).await;
        } else {
            run.done("no dialog");
        }

        run.enter(Phase::SelectingSize);
        if draft.size.trim().is_empty() {
            run.skipped("draft has no size");
        } else {
            let size = resolver.resolve(&selectors.size, &draft.size).await?;
            run.resolved(size, &selectors.size);
            sleep(t.settle()).await;
        }

        run.enter(Phase::SelectingCondition);
        let label = self.settings.conditions.label_for(&draft.condition);
        let condition = resolver.resolve(&selectors.condition, label).await?;
        run.resolved(condition, &selectors.condition);
        sleep(t.settle()).await;

        run.enter(Phase::SelectingColors);
        let colors = if draft.colors.is_empty() {
            resolver
                .pick_first(&selectors.color, COLOR_LIMIT, t.color_settle())
                .await?
        } else {
            resolver
                .select_many(&selectors.color, &draft.colors, COLOR_LIMIT, t.color_settle())
                .await?
        };
        if colors.is_empty() {
            run.skipped(format!("no color picked from '{}'", selectors.color.trigger));
        } else {
            run.done(colors.join(", "));
        }

        run.enter(Phase::SettingPrice);
        if setter.set_paced(&selectors.price, &draft.price).await? {
            run.done(format!("typed {}", draft.price));
        } else {
            run.skipped(Error::ElementNotFound(selectors.price.clone()).to_string());
        }

        self.await_submit_readiness(&selectors.submit, waiter, run).await
    }

    async fn await_submit_readiness(
        &self,
        submit: &str,
        waiter: ElementWaiter<'a, H>,
        run: &mut Run<'_, S>,
    ) -> Result<()> {
        run.enter(Phase::AwaitingSubmitReadiness);
        if waiter.wait_for(submit).await?.is_none() {
            run.skipped(Error::ElementNotFound(submit.to_string()).to_string());
            return Ok(());
        }
        self.host.scroll_into_view(submit).await?;
        sleep(self.settings.timings.settle()).await;

        match self.host.is_disabled(submit).await? {
            Some(false) => {
                run.done("submit control enabled");
                run.result.reached_readiness = true;
                if self.settings.auto_submit {
                    run.enter_with(AutomationStatus::with_message(Phase::Ready, "Uploading Item"));
                    if self.host.click(submit, 0).await? {
                        run.result.submitted = true;
                        run.done("submitted");
                    } else {
                        run.skipped(Error::ElementNotFound(submit.to_string()).to_string());
                    }
                } else {
                    run.enter(Phase::Ready);
                    run.done("left for review");
                }
            }
            Some(true) => {
                run.done("submit control present");
                run.enter(Phase::BlockedBySubmitControl);
                run.skipped(Error::SubmitControlDisabled.to_string());
            }
            None => run.skipped(Error::ElementNotFound(submit.to_string()).to_string()),
        }
        Ok(())
    }
}
