use thiserror::Error;

/// Cooperative cancellation marker raised when the wall-clock deadline
/// expires mid-search. Every active frame undoes its applied move and
/// propagates this upward; the iterative-deepening driver catches it, so it
/// never reaches the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("search deadline exceeded")]
pub struct DeadlineExceeded;

pub(crate) type SearchResult<T> = Result<T, DeadlineExceeded>;
