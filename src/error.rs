use thiserror::Error;

/// Domain errors raised by the math core.
///
/// Messages are shown verbatim to scripts, so they carry the valid range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("Row must be 1 to {max}, got {got}")]
    RowOutOfRange { got: i64, max: usize },
    #[error("Column must be 1 to {max}, got {got}")]
    ColumnOutOfRange { got: i64, max: usize },
    #[error("Index must be 1 to {max}, got {got}")]
    IndexOutOfRange { got: i64, max: usize },
    #[error("expected {expected} components, got {got}")]
    ComponentCount { expected: usize, got: usize },
    #[error("expected {expected} columns, got {got}")]
    ColumnCount { expected: usize, got: usize },
    #[error("cannot pop an empty transform stack")]
    EmptyStack,
    #[error("duplicate bone name {name:?}")]
    DuplicateBone { name: String },
}

pub type MathResult<T> = Result<T, MathError>;

/// Converts a 1-indexed public index into a 0-based offset.
pub(crate) fn checked_index(
    index: i64,
    max: usize,
    err: fn(i64, usize) -> MathError,
) -> MathResult<usize> {
    if index >= 1 && (index as u64) <= max as u64 {
        Ok(index as usize - 1)
    } else {
        Err(err(index, max))
    }
}

pub(crate) fn row_error(got: i64, max: usize) -> MathError {
    MathError::RowOutOfRange { got, max }
}

pub(crate) fn column_error(got: i64, max: usize) -> MathError {
    MathError::ColumnOutOfRange { got, max }
}

pub(crate) fn index_error(got: i64, max: usize) -> MathError {
    MathError::IndexOutOfRange { got, max }
}
