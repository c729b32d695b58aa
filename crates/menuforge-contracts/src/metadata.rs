use serde::{Deserialize, Serialize};

/// Structured catalog metadata for a single menu item.
///
/// Wire shape matches the response schema sent to the generation
/// service (camelCase keys). The record is replaced wholesale on each
/// successful generation; nothing mutates it field by field. Extra
/// properties in a service response are dropped on parse; duplicate
/// array entries pass through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemMetadata {
    pub item_name: String,
    pub description: String,
    pub category: String,
    pub dietary_tags: Vec<String>,
    pub allergen_warnings: Vec<String>,
    pub suggested_pairings: Vec<String>,
    pub seo_keywords: Vec<String>,
}

impl MenuItemMetadata {
    /// Both free-text fields carry content. Holds for every record the
    /// adapter hands out; raw service output may fail this.
    pub fn is_complete(&self) -> bool {
        !self.item_name.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// Pretty JSON with 2-space indent, as handed to the clipboard.
    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MenuItemMetadata;

    fn sample() -> MenuItemMetadata {
        MenuItemMetadata {
            item_name: "Spicy Chicken Sandwich".to_string(),
            description: "Crispy chicken with house hot sauce.".to_string(),
            category: "Main Course".to_string(),
            dietary_tags: vec!["Spicy".to_string()],
            allergen_warnings: vec!["Contains Gluten".to_string(), "Contains Gluten".to_string()],
            suggested_pairings: vec!["Fries".to_string(), "Lemonade".to_string()],
            seo_keywords: vec!["spicy chicken sandwich".to_string()],
        }
    }

    #[test]
    fn json_round_trip_is_lossless() -> anyhow::Result<()> {
        let original = sample();
        let text = serde_json::to_string(&original)?;
        let parsed: MenuItemMetadata = serde_json::from_str(&text)?;
        assert_eq!(parsed, original);
        Ok(())
    }

    #[test]
    fn wire_keys_are_camel_case() -> anyhow::Result<()> {
        let value = serde_json::to_value(sample())?;
        assert!(value.get("itemName").is_some());
        assert!(value.get("dietaryTags").is_some());
        assert!(value.get("allergenWarnings").is_some());
        assert!(value.get("suggestedPairings").is_some());
        assert!(value.get("seoKeywords").is_some());
        Ok(())
    }

    #[test]
    fn unknown_properties_are_ignored_and_duplicates_kept() -> anyhow::Result<()> {
        let parsed: MenuItemMetadata = serde_json::from_value(json!({
            "itemName": "Miso Soup",
            "description": "Classic starter.",
            "category": "Appetizer",
            "dietaryTags": ["Vegan", "Vegan"],
            "allergenWarnings": ["Contains Soy"],
            "suggestedPairings": [],
            "seoKeywords": [],
            "confidence": 0.93,
        }))?;
        assert_eq!(parsed.dietary_tags, vec!["Vegan", "Vegan"]);
        Ok(())
    }

    #[test]
    fn completeness_requires_both_text_fields() {
        let mut record = sample();
        assert!(record.is_complete());
        record.description = "   ".to_string();
        assert!(!record.is_complete());
    }

    #[test]
    fn pretty_json_uses_two_space_indent() -> anyhow::Result<()> {
        let text = sample().to_pretty_json()?;
        assert!(text.contains("\n  \"itemName\""));
        Ok(())
    }
}
