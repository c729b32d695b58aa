use crate::error::GenerationError;

/// MIME types the upload collaborator accepts. Anything else is a
/// validation error before a request is ever built.
pub const ACCEPTED_IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Raw bytes of an uploaded photo plus its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageAttachment {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self, GenerationError> {
        let mime_type = mime_type.into();
        if !ACCEPTED_IMAGE_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(GenerationError::Validation(format!(
                "unsupported image type {mime_type}; accepted types are JPEG, PNG, and WebP"
            )));
        }
        Ok(Self { bytes, mime_type })
    }
}

/// Ephemeral input for one submission. Manual text fields count only
/// when non-empty after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionInput {
    pub image: Option<ImageAttachment>,
    pub item_name: Option<String>,
    pub description: Option<String>,
}

impl ExtractionInput {
    /// Manual item name, trimmed, or None when absent/blank.
    pub fn manual_item_name(&self) -> Option<&str> {
        self.item_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Manual description, trimmed, or None when absent/blank.
    pub fn manual_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn provided_fields(&self) -> ProvidedFields {
        ProvidedFields {
            item_name: self.manual_item_name().is_some(),
            description: self.manual_description().is_some(),
        }
    }

    /// At least one of image / name / description must be present
    /// before a submission may leave the controller.
    pub fn validate_for_submission(&self) -> Result<(), GenerationError> {
        if self.image.is_none()
            && self.manual_item_name().is_none()
            && self.manual_description().is_none()
        {
            return Err(GenerationError::Validation(
                "provide an image, an item name, or a description before submitting".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which free-text fields the caller supplied. The generation service
/// is never asked to produce a field the user already wrote, so this
/// drives both the prompt wording and the requested-output schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvidedFields {
    pub item_name: bool,
    pub description: bool,
}

#[cfg(test)]
mod tests {
    use crate::error::GenerationError;

    use super::{ExtractionInput, ImageAttachment};

    #[test]
    fn gif_attachment_is_rejected() {
        let err = ImageAttachment::new(vec![0x47, 0x49, 0x46], "image/gif").unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }

    #[test]
    fn accepted_types_pass() {
        for mime in ["image/jpeg", "image/png", "image/webp"] {
            assert!(ImageAttachment::new(vec![1, 2, 3], mime).is_ok());
        }
    }

    #[test]
    fn blank_manual_fields_do_not_count() {
        let input = ExtractionInput {
            image: None,
            item_name: Some("   ".to_string()),
            description: Some(String::new()),
        };
        assert!(input.manual_item_name().is_none());
        assert!(input.manual_description().is_none());
        assert!(input.validate_for_submission().is_err());
    }

    #[test]
    fn trimmed_values_are_exposed() {
        let input = ExtractionInput {
            image: None,
            item_name: Some("  Pad Thai  ".to_string()),
            description: None,
        };
        assert_eq!(input.manual_item_name(), Some("Pad Thai"));
        let provided = input.provided_fields();
        assert!(provided.item_name);
        assert!(!provided.description);
        assert!(input.validate_for_submission().is_ok());
    }

    #[test]
    fn image_alone_permits_submission() -> anyhow::Result<()> {
        let input = ExtractionInput {
            image: Some(ImageAttachment::new(vec![0xFF, 0xD8], "image/jpeg")?),
            item_name: None,
            description: None,
        };
        assert!(input.validate_for_submission().is_ok());
        Ok(())
    }
}
