#![forbid(unsafe_code)]

//! Dot-separated expression paths (`user.profile.name`).
//!
//! Resolution walks left to right through objects. In lenient mode (the
//! default) a missing or non-object intermediate yields
//! [`Value::Undefined`]; strict mode reports the first segment that could not
//! be resolved instead.

use std::fmt;

use crate::error::ReactiveError;
use crate::object::Object;
use crate::value::Value;

/// How path resolution treats missing segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResolveMode {
    /// Missing segments resolve to `Undefined`; bad assignments are skipped.
    #[default]
    Lenient,
    /// Missing segments and bad assignments are errors.
    Strict,
}

/// A parsed expression path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExpressionPath {
    raw: String,
    segments: Vec<String>,
}

impl ExpressionPath {
    /// Parse an expression. Surrounding whitespace is trimmed; segments are
    /// taken verbatim between dots.
    #[must_use]
    pub fn parse(expr: &str) -> Self {
        let raw = expr.trim().to_owned();
        let segments = raw.split('.').map(str::to_owned).collect();
        Self { raw, segments }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment: the top-level data key the path starts from.
    #[must_use]
    pub fn head(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Resolve against `root`. Reads are tracked by the evaluating watcher.
    pub fn resolve(&self, root: &Object, mode: ResolveMode) -> Result<Value, ReactiveError> {
        self.walk(root, &self.segments, mode)
    }

    fn walk(
        &self,
        root: &Object,
        segments: &[String],
        mode: ResolveMode,
    ) -> Result<Value, ReactiveError> {
        let mut current = Value::Object(root.clone());
        for segment in segments {
            current = match &current {
                Value::Object(object) => {
                    if mode == ResolveMode::Strict && !object.contains_key(segment) {
                        return Err(self.unresolved(segment));
                    }
                    object.get(segment)
                }
                _ if mode == ResolveMode::Strict => return Err(self.unresolved(segment)),
                _ => return Ok(Value::Undefined),
            };
        }
        Ok(current)
    }

    fn unresolved(&self, segment: &str) -> ReactiveError {
        ReactiveError::UnresolvedPath {
            path: self.raw.clone(),
            segment: segment.to_owned(),
        }
    }

    /// Write `value` at this path.
    ///
    /// Walks to the parent of the last segment and sets the property there.
    /// Returns whether the stored value changed.
    pub fn assign(
        &self,
        root: &Object,
        value: Value,
        mode: ResolveMode,
    ) -> Result<bool, ReactiveError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Ok(false);
        };
        match self.walk(root, parents, mode)? {
            Value::Object(parent) => parent.set(last, value),
            other if mode == ResolveMode::Strict => {
                tracing::debug!(path = %self.raw, parent = other.kind(), "assignment target missing");
                Err(ReactiveError::NotAnObject {
                    path: self.raw.clone(),
                })
            }
            other => {
                tracing::warn!(path = %self.raw, parent = other.kind(), "assignment skipped: parent is not an object");
                Ok(false)
            }
        }
    }
}

impl fmt::Display for ExpressionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ExpressionPath {
    fn from(expr: &str) -> Self {
        Self::parse(expr)
    }
}
