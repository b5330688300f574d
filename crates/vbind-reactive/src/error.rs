#![forbid(unsafe_code)]

//! Errors raised by the reactive layer.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing path segment | Lookup through an absent key | `Undefined` (lenient) or [`ReactiveError::UnresolvedPath`] (strict) |
//! | Assignment through a non-object | `a.b = v` where `a` is a primitive | Ignored with a warning (lenient) or [`ReactiveError::NotAnObject`] (strict) |
//! | Runaway notify chain | Callbacks writing each other's sources | [`ReactiveError::DependencyCycle`] returned to the outermost writer |

/// Errors from path resolution and change propagation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactiveError {
    /// A segment of an expression path named a key that does not exist.
    #[error("cannot resolve `{path}`: segment `{segment}` is missing")]
    UnresolvedPath {
        /// The full expression path.
        path: String,
        /// The first segment that could not be resolved.
        segment: String,
    },
    /// The parent of an assignment target is not an object.
    #[error("cannot assign `{path}`: parent value is not an object")]
    NotAnObject {
        /// The full expression path.
        path: String,
    },
    /// Nested notifications exceeded the configured depth.
    #[error("dependency cycle: notify chain exceeded depth {depth}")]
    DependencyCycle {
        /// The depth limit that was hit.
        depth: usize,
    },
}
