pub mod error;
pub mod events;
pub mod input;
pub mod metadata;
pub mod prompt;
pub mod schema;

pub use error::GenerationError;
pub use events::{SessionEventPayload, SessionEventWriter};
pub use input::{ExtractionInput, ImageAttachment, ProvidedFields, ACCEPTED_IMAGE_MIME_TYPES};
pub use metadata::MenuItemMetadata;
pub use prompt::build_prompt;
pub use schema::response_schema;
