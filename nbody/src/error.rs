//! Programmer-error taxonomy (spec.md §7).
//!
//! These are contract violations, not domain failures: callers that hit one
//! have a bug. Every public QuadTree entry point that can violate the
//! Reset → Insert* → Evaluate → Query* state machine resolves to one of
//! these variants internally and then panics with its `Display` message,
//! rather than returning the error to ordinary callers.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuadTreeError {
    #[error("quadtree reset requires minX < maxX and minY < maxY")]
    InvertedBounds,
    #[error("quadtree reset requires expectedBodies > 0")]
    NonPositiveExpectedBodies,
    #[error("insert called before reset")]
    NotReset,
    #[error("insert called on a body outside the tree's root bounds")]
    OutsideBounds,
    #[error("insert called after evaluate; call reset first")]
    AlreadyEvaluated,
    #[error("query called before evaluate")]
    NotEvaluated,
}
