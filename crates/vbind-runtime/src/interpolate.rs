#![forbid(unsafe_code)]

//! `{{ path }}` text templates.
//!
//! A template is split once into literal and expression segments. Rendering
//! resolves every expression against the data root and concatenates the
//! result, so a text node bound to several expressions always shows the
//! whole template re-rendered, whichever expression changed.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Unresolvable path, lenient | Missing key / non-object parent | Renders `undefined` |
//! | Unresolvable path, strict | Same | [`ReactiveError::UnresolvedPath`] |
//! | Unclosed `{{` | No matching `}}` | Kept as literal text |
//! | Empty `{{}}` | Nothing between braces | Kept as literal text |

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use vbind_reactive::{ExpressionPath, Object, ReactiveError, ResolveMode};

static INTERPOLATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").ok());

/// Whether `text` contains at least one `{{ expression }}`.
#[must_use]
pub fn has_interpolation(text: &str) -> bool {
    INTERPOLATION.as_ref().is_some_and(|re| re.is_match(text))
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Expression(ExpressionPath),
}

/// A parsed text template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        let captures = INTERPOLATION
            .as_ref()
            .into_iter()
            .flat_map(|re| re.captures_iter(source));
        for caps in captures {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_owned()));
            }
            segments.push(Segment::Expression(ExpressionPath::parse(inner.as_str())));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_owned()));
        }
        Self {
            source: source.to_owned(),
            segments,
        }
    }

    /// The unparsed template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expression segments in order of appearance, duplicates included.
    pub fn expressions(&self) -> impl Iterator<Item = &ExpressionPath> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Expression(path) => Some(path),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn expression_count(&self) -> usize {
        self.expressions().count()
    }

    /// Render with every expression resolved against `root`.
    pub fn render(&self, root: &Object, mode: ResolveMode) -> Result<String, ReactiveError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expression(path) => {
                    let value = path.resolve(root, mode)?;
                    let _ = write!(out, "{value}");
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render `source` in one step.
pub fn render_template(
    source: &str,
    root: &Object,
    mode: ResolveMode,
) -> Result<String, ReactiveError> {
    Template::parse(source).render(root, mode)
}
