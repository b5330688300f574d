#![forbid(unsafe_code)]

//! A small markup reader and writer for [`MemoryTree`].
//!
//! The accepted language is a strict subset of HTML:
//!
//! - elements with `name`, `name=value`, `name="value"` or `name='value'`
//!   attributes (attribute names may contain `-`, `:` and `@`);
//! - void elements (`input`, `br`, `hr`, `img`, `meta`, `link`) and `/>`
//!   self-closing tags;
//! - text, kept verbatim (no entity decoding, whitespace preserved);
//! - comments `<!-- ... -->`, kept as [`NodeKind::Other`] nodes.
//!
//! Every non-void element must be closed by a matching tag.
//!
//! # Failure Modes
//!
//! | Failure | Cause |
//! |---------|-------|
//! | [`MarkupError::UnexpectedEof`] | Input ends inside a tag, comment, or open element |
//! | [`MarkupError::MismatchedClose`] | `</x>` closes a different element |
//! | [`MarkupError::StrayClose`] | `</x>` with nothing open |
//! | [`MarkupError::InvalidTag`] | `<` not followed by a tag name |

use crate::memory::MemoryTree;
use crate::{NodeId, NodeKind, ViewTree};

const VOID_ELEMENTS: [&str; 6] = ["input", "br", "hr", "img", "meta", "link"];

/// Errors from reading markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },
    #[error("`</{found}>` at byte {offset} does not close `<{expected}>`")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },
    #[error("`</{tag}>` at byte {offset} has no open element")]
    StrayClose { tag: String, offset: usize },
    #[error("invalid tag at byte {offset}")]
    InvalidTag { offset: usize },
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '<' | '"' | '\'')
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn take_until(&mut self, end: &str, context: &'static str) -> Result<&'a str, MarkupError> {
        let rest = self.rest();
        let Some(at) = rest.find(end) else {
            return Err(MarkupError::UnexpectedEof { context });
        };
        self.pos += at + end.len();
        Ok(&rest[..at])
    }
}

struct Open {
    node: NodeId,
    tag: String,
}

/// Parse `source` into detached nodes created in `tree`.
pub fn parse_fragment(tree: &MemoryTree, source: &str) -> Result<Vec<NodeId>, MarkupError> {
    let mut reader = Reader { src: source, pos: 0 };
    let mut top = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    let attach = |stack: &[Open], top: &mut Vec<NodeId>, node: NodeId| match stack.last() {
        Some(open) => tree.append_child(open.node, node),
        None => top.push(node),
    };

    while !reader.eof() {
        let offset = reader.pos;
        if reader.eat("<!--") {
            let body = reader.take_until("-->", "comment")?;
            let node = tree.create_comment(body);
            attach(&stack, &mut top, node);
        } else if reader.eat("</") {
            let tag = reader.take_while(is_name_char).to_owned();
            reader.skip_ws();
            if !reader.eat(">") {
                return Err(MarkupError::UnexpectedEof {
                    context: "closing tag",
                });
            }
            match stack.pop() {
                Some(open) if open.tag.eq_ignore_ascii_case(&tag) => {}
                Some(open) => {
                    return Err(MarkupError::MismatchedClose {
                        expected: open.tag,
                        found: tag,
                        offset,
                    });
                }
                None => return Err(MarkupError::StrayClose { tag, offset }),
            }
        } else if reader.eat("<") {
            let tag = reader.take_while(is_name_char).to_owned();
            if tag.is_empty() {
                return Err(MarkupError::InvalidTag { offset });
            }
            let node = tree.create_element(&tag);
            let self_closing = read_attributes(&mut reader, tree, node)?;
            attach(&stack, &mut top, node);
            if !self_closing && !is_void(&tag) {
                stack.push(Open { node, tag });
            }
        } else {
            let text = reader.take_while(|c| c != '<');
            let node = tree.create_text(text);
            attach(&stack, &mut top, node);
        }
    }

    if !stack.is_empty() {
        return Err(MarkupError::UnexpectedEof {
            context: "open element",
        });
    }
    Ok(top)
}

/// Read attributes up to the end of a start tag; returns whether the tag
/// was self-closing.
fn read_attributes(
    reader: &mut Reader<'_>,
    tree: &MemoryTree,
    node: NodeId,
) -> Result<bool, MarkupError> {
    loop {
        reader.skip_ws();
        if reader.eat("/>") {
            return Ok(true);
        }
        if reader.eat(">") {
            return Ok(false);
        }
        let name = reader.take_while(is_name_char);
        if name.is_empty() {
            return match reader.peek() {
                None => Err(MarkupError::UnexpectedEof { context: "tag" }),
                Some(_) => Err(MarkupError::InvalidTag { offset: reader.pos }),
            };
        }
        reader.skip_ws();
        let value = if reader.eat("=") {
            reader.skip_ws();
            match reader.peek() {
                Some(quote @ ('"' | '\'')) => {
                    reader.bump();
                    let mut end = [0u8; 4];
                    reader.take_until(quote.encode_utf8(&mut end), "attribute value")?
                }
                _ => reader.take_while(|c| !c.is_whitespace() && c != '>'),
            }
        } else {
            ""
        };
        tree.set_attribute(node, name, value);
    }
}

/// Append the markup form of `node` (and its subtree) to `out`.
pub fn write_node(tree: &MemoryTree, node: NodeId, out: &mut String) {
    match tree.kind(node) {
        NodeKind::Text => out.push_str(&tree.text(node)),
        NodeKind::Other => {
            out.push_str("<!--");
            out.push_str(&tree.text(node));
            out.push_str("-->");
        }
        NodeKind::Element => {
            let tag = tree.tag(node);
            out.push('<');
            out.push_str(&tag);
            for (name, value) in tree.attributes(node) {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&value);
                out.push('"');
            }
            out.push('>');
            if is_void(&tag) {
                return;
            }
            for child in tree.children(node) {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(src: &str) -> String {
        let tree = MemoryTree::parse(src).unwrap();
        tree.inner_html(tree.root())
    }

    #[test]
    fn canonical_markup_round_trips() {
        let src = r#"<div id="app"><input v-model="name"><p>Hello {{ name }}</p><!-- c --></div>"#;
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn attribute_forms_are_normalized() {
        assert_eq!(
            round_trip("<a x=1 y='two' z disabled=\"\" v-on:click=go></a>"),
            r#"<a x="1" y="two" z="" disabled="" v-on:click="go"></a>"#
        );
    }

    #[test]
    fn self_closing_and_void() {
        assert_eq!(round_trip("<x/><br><y />"), "<x></x><br><y></y>");
    }

    #[test]
    fn whitespace_text_is_kept() {
        let tree = MemoryTree::parse("<p> a </p>\n<p></p>").unwrap();
        assert_eq!(tree.children(tree.root()).len(), 3);
    }

    #[test]
    fn errors() {
        assert_eq!(
            MemoryTree::parse("<a><b></a>").unwrap_err(),
            MarkupError::MismatchedClose {
                expected: "b".into(),
                found: "a".into(),
                offset: 6
            }
        );
        assert!(matches!(
            MemoryTree::parse("</a>").unwrap_err(),
            MarkupError::StrayClose { .. }
        ));
        assert!(matches!(
            MemoryTree::parse("<a>").unwrap_err(),
            MarkupError::UnexpectedEof { .. }
        ));
        assert!(matches!(
            MemoryTree::parse("a < b").unwrap_err(),
            MarkupError::InvalidTag { .. }
        ));
        assert!(matches!(
            MemoryTree::parse("<a x=\"unterminated>").unwrap_err(),
            MarkupError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn unicode_text() {
        assert_eq!(round_trip("<p>héllo ✓ {{ x }}</p>"), "<p>héllo ✓ {{ x }}</p>");
    }
}
