//! Template parser implementation
//!
//! Single left-to-right scan over the template text. Recognizes, in order:
//! comments, close tags, open tags with attributes, and text runs up to the
//! next markup start.

use crate::scan::{self, NameScanner};
use crate::{ParseError, ParseWarning, Template};
use loom_dom::{AttributeNode, Element, NodeData, NodeId, VNode, VTree, is_void_element};

/// Parser options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Keep whitespace-only text runs verbatim. Otherwise runs spanning a
    /// line break are dropped and the rest collapse to one space.
    pub keep_whitespace: bool,
}

/// Template parser
#[derive(Default)]
pub struct TemplateParser {
    options: ParserOptions,
    names: NameScanner,
}

/// Element still waiting for its close tag
struct OpenElement {
    id: NodeId,
    tag: String,
    offset: usize,
}

/// State of one parse
struct ParseState<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tree: VTree,
    root: NodeId,
    stack: Vec<OpenElement>,
    warnings: Vec<ParseWarning>,
}

impl TemplateParser {
    /// Create a parser with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            names: NameScanner::new(),
        }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parse template text into a static tree rooted at a fragment
    pub fn parse(&self, source: &str) -> Result<Template, ParseError> {
        let mut tree = VTree::new();
        let root = tree.create_fragment();
        let mut state = ParseState {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tree,
            root,
            stack: Vec::new(),
            warnings: Vec::new(),
        };

        while state.pos < state.bytes.len() {
            if state.bytes[state.pos..].starts_with(b"<!--") {
                self.parse_comment(&mut state)?;
            } else if state.bytes[state.pos..].starts_with(b"</") {
                self.parse_close_tag(&mut state)?;
            } else if self.is_open_tag(&state, state.pos) {
                self.parse_open_tag(&mut state)?;
            } else {
                self.parse_text(&mut state)?;
            }
        }

        if let Some(open) = state.stack.pop() {
            let (line, column) = scan::line_col(source, open.offset);
            return Err(ParseError::UnclosedTag { tag: open.tag, line, column });
        }

        tracing::debug!(
            "Parsed template: {} nodes, {} warnings",
            state.tree.len(),
            state.warnings.len()
        );

        Ok(Template::new(state.tree, state.root, state.warnings))
    }

    fn is_open_tag(&self, state: &ParseState<'_>, at: usize) -> bool {
        state.bytes[at] == b'<'
            && state.bytes.get(at + 1).is_some_and(|&b| self.names.is_tag_start(b))
    }

    fn is_markup_start(&self, state: &ParseState<'_>, at: usize) -> bool {
        let rest = &state.bytes[at..];
        rest.starts_with(b"<!--") || rest.starts_with(b"</") || self.is_open_tag(state, at)
    }

    /// Append a new node under the innermost open element
    fn attach(&self, state: &mut ParseState<'_>, node: VNode) -> Result<NodeId, ParseError> {
        let parent = state.stack.last().map(|open| open.id).unwrap_or(state.root);
        let id = state.tree.push(node);
        state.tree.append_child(parent, id)?;
        Ok(id)
    }

    fn parse_comment(&self, state: &mut ParseState<'_>) -> Result<(), ParseError> {
        let start = state.pos;
        let body = start + 4;
        let Some(len) = scan::find_seq(&state.bytes[body..], b"-->") else {
            let (line, column) = scan::line_col(state.source, start);
            return Err(ParseError::UnterminatedComment { line, column });
        };

        let content = &state.source[body..body + len];
        self.attach(state, VNode::comment(content))?;
        state.pos = body + len + 3;
        Ok(())
    }

    fn parse_text(&self, state: &mut ParseState<'_>) -> Result<(), ParseError> {
        let start = state.pos;
        // A '<' here is literal (not a markup start), so look past it
        let mut end = start + 1;
        loop {
            match scan::find_byte(&state.bytes[end..], b'<') {
                Some(offset) if self.is_markup_start(state, end + offset) => {
                    end += offset;
                    break;
                }
                Some(offset) => end += offset + 1,
                None => {
                    end = state.bytes.len();
                    break;
                }
            }
        }

        let text = &state.source[start..end];
        state.pos = end;

        if !self.options.keep_whitespace && scan::is_blank(text) {
            // Indentation between lines is layout, not content
            if !text.contains('\n') {
                self.attach(state, VNode::text(" "))?;
            }
            return Ok(());
        }
        self.attach(state, VNode::text(text))?;
        Ok(())
    }

    fn parse_open_tag(&self, state: &mut ParseState<'_>) -> Result<(), ParseError> {
        let start = state.pos;
        let name_end = self.names.scan_tag_name(state.bytes, start + 1);
        let tag = state.source[start + 1..name_end].to_string();
        state.pos = name_end;

        let mut element = Element::new(tag.as_str());
        let self_closing = loop {
            state.pos = scan::skip_whitespace(state.bytes, state.pos);
            match state.bytes.get(state.pos) {
                None => {
                    let (line, column) = scan::line_col(state.source, start);
                    return Err(ParseError::UnterminatedTag { tag, line, column });
                }
                Some(b'>') => {
                    state.pos += 1;
                    break false;
                }
                Some(b'/') if state.bytes.get(state.pos + 1) == Some(&b'>') => {
                    state.pos += 2;
                    break true;
                }
                Some(b'/') => state.pos += 1,
                Some(_) => self.parse_attribute(state, &mut element)?,
            }
        };

        let void = is_void_element(&tag);
        let id = self.attach(state, VNode::new(NodeData::Element(element)))?;
        if !void && !self_closing {
            state.stack.push(OpenElement { id, tag, offset: start });
        }
        Ok(())
    }

    fn parse_attribute(&self, state: &mut ParseState<'_>, element: &mut Element) -> Result<(), ParseError> {
        let start = state.pos;
        let name_end = self.names.scan_attr_name(state.bytes, start);
        if name_end == start {
            let (line, column) = scan::line_col(state.source, start);
            return Err(ParseError::MalformedAttribute { line, column });
        }
        let name = &state.source[start..name_end];
        state.pos = scan::skip_whitespace(state.bytes, name_end);

        let mut value = "";
        if state.bytes.get(state.pos) == Some(&b'=') {
            state.pos = scan::skip_whitespace(state.bytes, state.pos + 1);
            value = match state.bytes.get(state.pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let body = state.pos + 1;
                    let Some(len) = scan::find_byte(&state.bytes[body..], quote) else {
                        let (line, column) = scan::line_col(state.source, start);
                        return Err(ParseError::UnterminatedAttribute {
                            name: name.to_string(),
                            line,
                            column,
                        });
                    };
                    state.pos = body + len + 1;
                    &state.source[body..body + len]
                }
                _ => {
                    let body = state.pos;
                    while state.pos < state.bytes.len()
                        && !scan::is_whitespace(state.bytes[state.pos])
                        && state.bytes[state.pos] != b'>'
                    {
                        state.pos += 1;
                    }
                    &state.source[body..state.pos]
                }
            };
        }

        let attributes = element.attributes_mut();
        if attributes.contains(name) {
            tracing::debug!("Ignoring duplicate attribute `{}` on <{}>", name, element.tag);
        } else {
            attributes.set(name, value);
        }
        Ok(())
    }

    fn parse_close_tag(&self, state: &mut ParseState<'_>) -> Result<(), ParseError> {
        let start = state.pos;
        let (line, column) = scan::line_col(state.source, start);
        let name_start = start + 2;
        let name_end = self.names.scan_tag_name(state.bytes, name_start);
        let tag = &state.source[name_start..name_end];

        let close = scan::skip_whitespace(state.bytes, name_end);
        match state.bytes.get(close) {
            Some(b'>') if !tag.is_empty() => state.pos = close + 1,
            None => {
                return Err(ParseError::UnterminatedTag { tag: tag.to_string(), line, column });
            }
            Some(_) => return Err(ParseError::MalformedCloseTag { line, column }),
        }

        let Some(index) = state.stack.iter().rposition(|open| open.tag.eq_ignore_ascii_case(tag)) else {
            return Err(ParseError::UnmatchedCloseTag { tag: tag.to_string(), line, column });
        };

        // Everything above the match is closed implicitly
        for open in state.stack.drain(index + 1..).rev() {
            tracing::warn!(
                "Implicitly closing <{}> at {}:{} (found </{}>)",
                open.tag, line, column, tag
            );
            state.warnings.push(ParseWarning::ImplicitlyClosed {
                tag: open.tag,
                closed_by: tag.to_string(),
                line,
                column,
            });
        }
        state.stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(src: &str) -> String {
        let template = TemplateParser::new().parse(src).unwrap();
        template.tree().to_markup(template.root())
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(markup("<div><span>Hi</span></div>"), "<div><span>Hi</span></div>");
    }

    #[test]
    fn test_attribute_forms() {
        let template = TemplateParser::new()
            .parse(r#"<input a="1" b='2' c=3 d [e]="x + 1" *if="ok" (click)="go">"#)
            .unwrap();
        let input = template.tree().children(template.root())[0];
        let attrs = template.tree().get(input).and_then(VNode::attributes).unwrap();
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![
            ("a", "1"),
            ("b", "2"),
            ("c", "3"),
            ("d", ""),
            ("[e]", "x + 1"),
            ("*if", "ok"),
            ("(click)", "go"),
        ]);
    }

    #[test]
    fn test_void_and_self_closing() {
        assert_eq!(markup("<p>a<br>b<x-icon/>c</p>"), "<p>a<br>b<x-icon></x-icon>c</p>");
    }

    #[test]
    fn test_comments_and_literal_lt() {
        assert_eq!(markup("<!-- note --><b>1 < 2</b>"), "<!-- note --><b>1 < 2</b>");
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(markup("<ul>\n  <li>a</li>\n</ul>"), "<ul><li>a</li></ul>");
        assert_eq!(markup("<b>{{a}}</b> \t <i>{{b}}</i>"), "<b>{{a}}</b> <i>{{b}}</i>");

        let parser = TemplateParser::with_options(ParserOptions { keep_whitespace: true });
        let template = parser.parse("<ul>\n <li>a</li></ul>").unwrap();
        assert_eq!(template.tree().to_markup(template.root()), "<ul>\n <li>a</li></ul>");
    }

    #[test]
    fn test_mismatched_close_recovers() {
        let template = TemplateParser::new().parse("<a><b></a>").unwrap();
        assert_eq!(template.warnings().len(), 1);
        assert_eq!(template.tree().to_markup(template.root()), "<a><b></b></a>");
    }

    #[test]
    fn test_fatal_errors() {
        let parser = TemplateParser::new();
        assert!(matches!(parser.parse("<a></b>"), Err(ParseError::UnmatchedCloseTag { .. })));
        assert!(matches!(parser.parse("<a>"), Err(ParseError::UnclosedTag { .. })));
        assert!(matches!(parser.parse("<!-- open"), Err(ParseError::UnterminatedComment { .. })));
        assert!(matches!(parser.parse("<a href=\"x"), Err(ParseError::UnterminatedAttribute { .. })));
        assert!(matches!(parser.parse("<a"), Err(ParseError::UnterminatedTag { .. })));
        assert!(matches!(parser.parse("<br></br>"), Err(ParseError::UnmatchedCloseTag { .. })));
    }
}
