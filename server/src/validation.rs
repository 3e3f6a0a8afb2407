//! Request validation. Runs before any store call.

use todo_core::UpdateTodo;

/// Longest accepted title, counted in characters rather than bytes.
pub const MAX_TITLE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title must be at most {max} characters, got {len}")]
    TitleTooLong { len: usize, max: usize },

    #[error("update must set at least one of title or completed")]
    EmptyUpdate,
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(())
}

pub fn validate_update(patch: &UpdateTodo) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    Ok(())
}
