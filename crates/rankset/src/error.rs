//! Error types for the sorted set.

use thiserror::Error;

/// Error returned when a score type does not define addition.
///
/// [`ScoreHandler::sum`](crate::ScoreHandler::sum) returns this for score
/// types that are ordered but not summable, and
/// [`SortedSet::increment_by`](crate::SortedSet::increment_by) propagates
/// it without touching the set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("score type does not support sum")]
pub struct SumUnsupported;
