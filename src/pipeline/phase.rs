use std::fmt;

/// Pipeline states, in the only order they can occur.
///
/// `Ready` and `BlockedBySubmitControl` are alternatives; `Unblocked` is
/// terminal and reachable from any earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    Blocked,
    UploadingImages,
    FillingTitleAndDescription,
    SelectingCategory,
    SelectingBrand,
    DismissingModal,
    SelectingSize,
    SelectingCondition,
    SelectingColors,
    SettingPrice,
    AwaitingSubmitReadiness,
    Ready,
    BlockedBySubmitControl,
    Unblocked,
}

impl Phase {
    /// Human-readable status line.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Blocked => "Blocking Input",
            Self::UploadingImages => "Uploading Images",
            Self::FillingTitleAndDescription => "Filling Details",
            Self::SelectingCategory => "Selecting Category",
            Self::SelectingBrand => "Selecting Brand",
            Self::DismissingModal => "Checking Requirements",
            Self::SelectingSize => "Selecting Size",
            Self::SelectingCondition => "Selecting Condition",
            Self::SelectingColors => "Selecting Colors",
            Self::SettingPrice => "Finalizing Price",
            Self::AwaitingSubmitReadiness => "Checking Submit Button",
            Self::Ready => "Ready to Upload!",
            Self::BlockedBySubmitControl => "Error: Upload button disabled",
            Self::Unblocked => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Blocked => "blocked",
            Self::UploadingImages => "uploading_images",
            Self::FillingTitleAndDescription => "filling_title_and_description",
            Self::SelectingCategory => "selecting_category",
            Self::SelectingBrand => "selecting_brand",
            Self::DismissingModal => "dismissing_modal",
            Self::SelectingSize => "selecting_size",
            Self::SelectingCondition => "selecting_condition",
            Self::SelectingColors => "selecting_colors",
            Self::SettingPrice => "setting_price",
            Self::AwaitingSubmitReadiness => "awaiting_submit_readiness",
            Self::Ready => "ready",
            Self::BlockedBySubmitControl => "blocked_by_submit_control",
            Self::Unblocked => "unblocked",
        };
        f.write_str(s)
    }
}

/// What the status display shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationStatus {
    pub phase: Phase,
    pub message: String,
}

impl AutomationStatus {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            message: phase.message().to_string(),
        }
    }

    pub fn with_message(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }
}

impl Default for AutomationStatus {
    fn default() -> Self {
        Self::new(Phase::Idle)
    }
}

/// How a single phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Done(String),
    /// Degraded to a no-op; the run went on.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub outcome: PhaseOutcome,
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PhaseOutcome::Done(detail) => write!(f, "{}: {}", self.phase, detail),
            PhaseOutcome::Skipped(reason) => write!(f, "{}: skipped ({})", self.phase, reason),
        }
    }
}
