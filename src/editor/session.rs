use crate::record::Record;

use super::ValidationErrors;

/// In-progress field values for one record type.
pub trait Draft: Clone {
    type Record: Record;

    /// Check the draft, reporting every failing field.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Build the record. The id is assigned by the collection on create.
    fn into_record(self) -> Self::Record;
}

/// A draft that can be pre-filled from an existing record for editing.
pub trait EditableDraft: Draft {
    fn from_record(record: &Self::Record) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

/// The outcome of a successful submit, ready for the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<R> {
    Create(R),
    Update { id: String, record: R },
}

/// Buffers edits to a draft, independent of the collection until submit.
///
/// Dropping the session (or calling `cancel`) discards the draft with no effect.
#[derive(Debug, Clone)]
pub struct FormSession<D> {
    mode: EditorMode,
    draft: D,
    errors: ValidationErrors,
}

impl<D: Draft> FormSession<D> {
    /// Start a session for a new record.
    pub fn create(draft: D) -> Self {
        FormSession {
            mode: EditorMode::Create,
            draft,
            errors: ValidationErrors::default(),
        }
    }

    /// Start a session editing `record`.
    pub fn edit(record: &D::Record) -> Self
    where
        D: EditableDraft,
    {
        FormSession {
            mode: EditorMode::Edit {
                id: record.id().to_string(),
            },
            draft: D::from_record(record),
            errors: ValidationErrors::default(),
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    /// Errors from the last failed submit.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validate and emit the record. On failure the session stays usable.
    pub fn submit(&mut self) -> Result<Submission<D::Record>, ValidationErrors> {
        if let Err(errors) = self.draft.validate() {
            self.errors = errors.clone();
            return Err(errors);
        }
        self.errors = ValidationErrors::default();

        let record = self.draft.clone().into_record();
        Ok(match &self.mode {
            EditorMode::Create => Submission::Create(record),
            EditorMode::Edit { id } => Submission::Update {
                id: id.clone(),
                record,
            },
        })
    }

    pub fn cancel(self) {}
}
