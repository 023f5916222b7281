//! Stack growth for deep trees.
//!
//! Long chains such as `a + b + c + ...` or nested conditionals give trees
//! one level per operand. Every recursive walk in the workspace (visitor,
//! rewriter, reducer) enters a level through [`ensure_sufficient_stack`].

/// Free stack below which a walker level gets a fresh segment.
const MIN_FREE: usize = 128 * 1024;

/// Size of each freshly allocated segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `level`, moving to a new stack segment first when the current one is
/// nearly exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(level: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_FREE, SEGMENT, level)
}
