//! Record editors - form sessions buffering a draft until submit.

pub mod format;
mod session;
mod validation;

use thiserror::Error;

use crate::error::StoreError;

pub use session::{Draft, EditableDraft, EditorMode, FormSession, Submission};
pub use validation::{FieldError, FieldErrorKind, ValidationErrors};

/// Error type for submitting a form session into a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The draft is incomplete; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// The draft was valid but the collection rejected it.
    #[error(transparent)]
    Store(#[from] StoreError),
}
