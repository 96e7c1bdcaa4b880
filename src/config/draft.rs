use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Item condition as recorded in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    BrandNew,
    LikeNew,
    Excellent,
    Good,
    Fair,
    /// Anything the draft source used that we have no name for.
    Other(String),
}

impl Condition {
    pub const KNOWN: [Condition; 5] = [
        Self::BrandNew,
        Self::LikeNew,
        Self::Excellent,
        Self::Good,
        Self::Fair,
    ];

    /// Accepts "Brand new", "brand_new", "BrandNew" and friends.
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "brandnew" => Self::BrandNew,
            "likenew" => Self::LikeNew,
            "excellent" => Self::Excellent,
            "good" => Self::Good,
            "fair" => Self::Fair,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrandNew => f.write_str("Brand new"),
            Self::LikeNew => f.write_str("Like new"),
            Self::Excellent => f.write_str("Excellent"),
            Self::Good => f.write_str("Good"),
            Self::Fair => f.write_str("Fair"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// The listing to post. Read once, never mutated during a run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Decimal kept as text; typed verbatim.
    #[serde(deserialize_with = "price_text")]
    pub price: String,
    #[serde(default)]
    pub size: String,
    pub condition: Condition,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,

    /// Where the listing was copied from. Informational.
    pub url: Option<String>,
    /// Category suggestion to pick; the first suggestion otherwise.
    pub category: Option<String>,
    /// Preferred colors; the first suggestions otherwise.
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Accept `price: 40.00` as well as `price: "40.00"`.
fn price_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Price::deserialize(deserializer)? {
        Price::Text(s) => s.trim().to_string(),
        Price::Number(n) => n.to_string(),
    })
}

impl ListingDraft {
    /// Load a draft from a YAML or JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let is_json = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parse a YAML draft (JSON documents parse too).
    pub fn parse(yaml: &str) -> Result<Self> {
        let draft: Self = serde_yaml::from_str(yaml)?;
        draft.validate()?;
        Ok(draft)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let draft: Self = serde_json::from_str(json)?;
        draft.validate()?;
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Config("draft title is required".into()));
        }
        if self.price.is_empty() {
            return Err(Error::Config("draft price is required".into()));
        }
        if !self
            .price
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        {
            return Err(Error::Config(format!(
                "draft price '{}' is not a decimal",
                self.price
            )));
        }
        Ok(())
    }
}

fn default_condition_label() -> String {
    "New with tags".into()
}

/// Maps draft conditions to the target site's labels.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConditionMapping {
    /// Overrides keyed by condition name ("Excellent", "Like new", ...).
    #[serde(default)]
    labels: HashMap<String, String>,

    /// Label for anything without an entry.
    #[serde(default = "default_condition_label")]
    default: String,
}

impl Default for ConditionMapping {
    fn default() -> Self {
        Self {
            labels: HashMap::new(),
            default: default_condition_label(),
        }
    }
}

impl ConditionMapping {
    fn builtin(condition: &Condition) -> Option<&'static str> {
        match condition {
            Condition::BrandNew => Some("New with tags"),
            Condition::LikeNew => Some("New without tags"),
            Condition::Excellent => Some("Very good"),
            Condition::Good => Some("Good"),
            Condition::Fair => Some("Satisfactory"),
            Condition::Other(_) => None,
        }
    }

    pub fn with_label(mut self, condition: &Condition, label: impl Into<String>) -> Self {
        self.labels.insert(condition.to_string(), label.into());
        self
    }

    pub fn with_default(mut self, label: impl Into<String>) -> Self {
        self.default = label.into();
        self
    }

    pub fn default_label(&self) -> &str {
        &self.default
    }

    /// Site label for `condition`: override, then built-in, then default.
    pub fn label_for(&self, condition: &Condition) -> &str {
        self.labels
            .iter()
            .find(|(k, _)| Condition::parse(k) == *condition)
            .map(|(_, v)| v.as_str())
            .or_else(|| Self::builtin(condition))
            .unwrap_or(self.default.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JACKET: &str = r#"
title: "Billabong Men's White and Grey Jacket"
price: "40.00"
description: "Large - vintage surf wear"
size: "L"
condition: "Excellent"
brand: "Billabong"
images:
  - "https://media.test/P0.jpg"
  - "https://media.test/P1.jpg"
"#;

    #[test]
    fn test_parse_draft_yaml() {
        let draft = ListingDraft::parse(JACKET).unwrap();
        assert_eq!(draft.price, "40.00");
        assert_eq!(draft.condition, Condition::Excellent);
        assert_eq!(draft.images.len(), 2);
        assert!(draft.colors.is_empty());
        assert!(draft.category.is_none());
    }

    #[test]
    fn test_parse_draft_json_with_numeric_price() {
        let json = r#"{"title":"Tee","price":12.5,"condition":"Brand new","images":[]}"#;
        let draft = ListingDraft::from_json(json).unwrap();
        assert_eq!(draft.price, "12.5");
        assert_eq!(draft.condition, Condition::BrandNew);
    }

    #[test]
    fn test_draft_requires_title() {
        let yaml = "title: \"\"\nprice: \"1\"\ncondition: Good\n";
        let err = ListingDraft::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_draft_rejects_non_decimal_price() {
        let yaml = "title: Tee\nprice: \"ten\"\ncondition: Good\n";
        assert!(ListingDraft::parse(yaml).is_err());
    }

    #[test]
    fn test_condition_spellings() {
        assert_eq!(Condition::parse("Brand new"), Condition::BrandNew);
        assert_eq!(Condition::parse("like_new"), Condition::LikeNew);
        assert_eq!(Condition::parse("LikeNew"), Condition::LikeNew);
        assert_eq!(
            Condition::parse("Vintage"),
            Condition::Other("Vintage".into())
        );
        // "new" alone is ambiguous between the two new conditions
        assert_eq!(Condition::parse("new"), Condition::Other("new".into()));
        assert_eq!(
            ConditionMapping::default().label_for(&Condition::parse("New")),
            "New with tags"
        );
    }

    #[test]
    fn test_mapping_covers_every_condition() {
        let mapping = ConditionMapping::default();
        let labels: Vec<&str> = Condition::KNOWN.iter().map(|c| mapping.label_for(c)).collect();
        assert_eq!(
            labels,
            ["New with tags", "New without tags", "Very good", "Good", "Satisfactory"]
        );
    }

    #[test]
    fn test_unmapped_condition_gets_default() {
        let mapping = ConditionMapping::default();
        assert_eq!(
            mapping.label_for(&Condition::Other("Vintage".into())),
            "New with tags"
        );
        let mapping = mapping.with_default("Satisfactory");
        assert_eq!(mapping.label_for(&Condition::Other("?".into())), "Satisfactory");
    }

    #[test]
    fn test_mapping_override_merges_onto_builtin() {
        let mapping = ConditionMapping::default().with_label(&Condition::Fair, "Acceptable");
        assert_eq!(mapping.label_for(&Condition::Fair), "Acceptable");
        assert_eq!(mapping.label_for(&Condition::Excellent), "Very good");
    }
}
