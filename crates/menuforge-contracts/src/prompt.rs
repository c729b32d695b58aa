use crate::input::ExtractionInput;

const ROLE_INSTRUCTION: &str = "You are an expert catalog manager for a food delivery service. \
Your task is to generate detailed, structured metadata for a menu item based on the information \
provided. Provide the data in the requested JSON format. Use your expertise to generate \
compelling descriptions and useful tags.";

/// Build the instruction text for one submission.
///
/// Paragraph order is fixed: role/task, ground-truth instructions for
/// any caller-supplied fields, then the image (or text-only) note.
pub fn build_prompt(input: &ExtractionInput) -> String {
    let mut paragraphs = vec![ROLE_INSTRUCTION.to_string()];

    match (input.manual_item_name(), input.manual_description()) {
        (Some(name), Some(description)) => paragraphs.push(format!(
            "The user has provided the following name and description. Use them as the ground \
             truth for those fields. Item Name: \"{name}\". Description: \"{description}\"."
        )),
        (Some(name), None) => paragraphs.push(format!(
            "The user has provided the item name. Use it as the ground truth for that field and \
             generate a compelling description based on it. Item Name: \"{name}\"."
        )),
        (None, Some(description)) => paragraphs.push(format!(
            "The user has provided the description. Use it as the ground truth for that field \
             and infer a suitable item name. Description: \"{description}\"."
        )),
        (None, None) => {}
    }

    if input.image.is_some() {
        paragraphs.push(
            "Use the provided image as a visual reference to enhance the accuracy and richness \
             of all generated metadata fields."
                .to_string(),
        );
    } else {
        paragraphs.push("Generate the metadata based only on the provided text.".to_string());
    }

    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use crate::input::{ExtractionInput, ImageAttachment};

    use super::build_prompt;

    fn with_image() -> Option<ImageAttachment> {
        ImageAttachment::new(vec![0x89, 0x50], "image/png").ok()
    }

    #[test]
    fn both_fields_become_ground_truth() {
        let prompt = build_prompt(&ExtractionInput {
            image: None,
            item_name: Some(" Pad Thai ".to_string()),
            description: Some("Rice noodles with tamarind.".to_string()),
        });
        assert!(prompt.contains("name and description"));
        assert!(prompt.contains("Item Name: \"Pad Thai\""));
        assert!(prompt.contains("Description: \"Rice noodles with tamarind.\""));
        assert!(prompt.contains("based only on the provided text"));
    }

    #[test]
    fn name_only_asks_for_a_description() {
        let prompt = build_prompt(&ExtractionInput {
            image: with_image(),
            item_name: Some("Tonkotsu Ramen".to_string()),
            description: None,
        });
        assert!(prompt.contains("generate a compelling description"));
        assert!(prompt.contains("visual reference"));
        assert!(!prompt.contains("based only on the provided text"));
    }

    #[test]
    fn description_only_asks_for_a_name() {
        let prompt = build_prompt(&ExtractionInput {
            image: None,
            item_name: None,
            description: Some("Slow-braised short rib.".to_string()),
        });
        assert!(prompt.contains("infer a suitable item name"));
    }

    #[test]
    fn image_only_has_role_and_image_paragraphs() {
        let prompt = build_prompt(&ExtractionInput {
            image: with_image(),
            item_name: None,
            description: None,
        });
        assert_eq!(prompt.matches("\n\n").count(), 1);
        assert!(prompt.starts_with("You are an expert catalog manager"));
        assert!(prompt.ends_with("metadata fields."));
    }
}
