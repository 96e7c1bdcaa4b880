use serde::Deserialize;

/// Selectors for one combo-box control and how to match inside it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DropdownSelectors {
    /// Text input that opens the suggestion list.
    pub trigger: String,

    /// Matches every rendered suggestion node.
    pub suggestions: String,

    /// Tokens that may follow the target in a compound label ("M / 8").
    #[serde(default)]
    pub separators: Vec<String>,

    /// Suggestion to take when nothing matches (e.g. "Other").
    pub fallback_label: Option<String>,

    /// Also accept suggestions that merely contain the target.
    #[serde(default)]
    pub match_contains: bool,

    /// Node to click after typing the target in; `{value}` is replaced by
    /// the escaped target.
    pub manual_match: Option<String>,

    /// Generic "use what I typed" affordance.
    pub custom_value: Option<String>,

    /// How long to wait for suggestions after opening.
    pub suggestion_timeout_ms: Option<u64>,
}

impl DropdownSelectors {
    /// Plain exact/prefix-free control.
    pub fn new(trigger: impl Into<String>, suggestions: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            suggestions: suggestions.into(),
            separators: Vec::new(),
            fallback_label: None,
            match_contains: false,
            manual_match: None,
            custom_value: None,
            suggestion_timeout_ms: None,
        }
    }
}

/// Where every field of the listing form lives.
///
/// Defaults describe the marketplace form the tool was built against; a
/// config only needs to override what differs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorConfig {
    pub photos: String,
    pub title: String,
    pub description: String,
    pub category: DropdownSelectors,
    pub brand: DropdownSelectors,
    pub authenticity_modal_close: String,
    pub size: DropdownSelectors,
    pub condition: DropdownSelectors,
    pub color: DropdownSelectors,
    pub price: String,
    pub submit: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            photos: r#"input[name="photos"]"#.into(),
            title: r#"input[name="title"]"#.into(),
            description: r#"textarea[name="description"]"#.into(),
            category: DropdownSelectors::new(
                r#"input[name="category"]"#,
                r#"div[id^="catalog-suggestion-"]"#,
            ),
            brand: DropdownSelectors {
                manual_match: Some(r#"div[aria-label="{value}"]"#.into()),
                custom_value: Some(r#"div[id="custom-select-brand"]"#.into()),
                ..DropdownSelectors::new(
                    r#"input[name="brand"]"#,
                    r#"div[id^="suggested-brand-"]"#,
                )
            },
            authenticity_modal_close: crate::fill::modal::DEFAULT_AUTHENTICITY_CLOSE.into(),
            size: DropdownSelectors {
                separators: vec![" /".into()],
                fallback_label: Some("Other".into()),
                suggestion_timeout_ms: Some(2000),
                ..DropdownSelectors::new(
                    r#"input[id="size"], input[name="size"]"#,
                    r#"[role="button"], [role="presentation"]"#,
                )
            },
            condition: DropdownSelectors {
                match_contains: true,
                ..DropdownSelectors::new(r#"input[name="condition"]"#, r#"[role="button"]"#)
            },
            color: DropdownSelectors::new(
                r#"input[name="color"]"#,
                r#"div[id^="suggested-color-"]"#,
            ),
            price: r#"input[name="price"]"#.into(),
            submit: r#"button[data-testid="upload-form-save-button"]"#.into(),
        }
    }
}

impl SelectorConfig {
    /// Names of fields whose selector is blank.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        let plain = [
            ("photos", &self.photos),
            ("title", &self.title),
            ("description", &self.description),
            ("authenticity_modal_close", &self.authenticity_modal_close),
            ("price", &self.price),
            ("submit", &self.submit),
        ];
        let dropdowns = [
            ("category", &self.category),
            ("brand", &self.brand),
            ("size", &self.size),
            ("condition", &self.condition),
            ("color", &self.color),
        ];
        plain
            .into_iter()
            .filter(|(_, s)| s.trim().is_empty())
            .map(|(name, _)| name)
            .chain(
                dropdowns
                    .into_iter()
                    .filter(|(_, d)| d.trigger.trim().is_empty() || d.suggestions.trim().is_empty())
                    .map(|(name, _)| name),
            )
            .collect()
    }
}
