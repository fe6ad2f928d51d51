//! # Markup Codec
//!
//! Text form of the surface, for hosts that only hand back the editable
//! region as HTML. `to_markup` writes a fragment; `parse_markup` reads
//! HTML back into a fragment. Reading is tolerant:
//!
//! - unbalanced tags are closed at the nearest matching ancestor or at the
//!   end of input, stray closing tags are ignored
//! - comments and declarations are dropped
//! - a `<` that does not start a tag is kept as text
//! - the common named entities and numeric references are decoded,
//!   `&nbsp;` to U+00A0 (the surface parser later turns it into a space)

use crate::markers::is_void_tag;
use crate::surface::{SurfaceFragment, SurfaceNode};
use logos::Logos;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Markup tokens
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum MarkupToken<'src> {
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    #[regex(r"<![^>\-][^>]*>")]
    Declaration,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9\-]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(
        r#"<[a-zA-Z][a-zA-Z0-9\-]*([ \t\r\n]+[^ \t\r\n"'<>/=]+([ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'|[^ \t\r\n"'<>]+))?)*[ \t\r\n]*/?>"#,
        |lex| lex.slice()
    )]
    OpenTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Serialize a fragment to HTML text
pub fn to_markup(fragment: &SurfaceFragment) -> String {
    let mut out = String::new();
    for node in &fragment.nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &SurfaceNode, out: &mut String) {
    match node {
        SurfaceNode::Text { content } => out.push_str(&escape_text(content)),
        SurfaceNode::Element {
            tag,
            attributes,
            styles,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if !styles.is_empty() {
                let style = styles
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join("; ");
                out.push_str(" style=\"");
                out.push_str(&escape_attr(&style));
                out.push('"');
            }
            out.push('>');

            if is_void_tag(tag) {
                return;
            }
            for child in children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

struct OpenElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    children: Vec<SurfaceNode>,
}

impl OpenElement {
    fn into_node(self) -> SurfaceNode {
        SurfaceNode::Element {
            tag: self.tag,
            attributes: self.attributes,
            styles: self.styles,
            children: self.children,
        }
    }
}

/// Parse HTML text into a fragment
#[instrument(skip(source), fields(len = source.len()))]
pub fn parse_markup(source: &str) -> SurfaceFragment {
    let mut roots: Vec<SurfaceNode> = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    for (token, span) in MarkupToken::lexer(source).spanned() {
        match token {
            Ok(MarkupToken::Comment) | Ok(MarkupToken::Declaration) => {}
            Ok(MarkupToken::Text(text)) => {
                push_child(&mut stack, &mut roots, text_node(&decode_entities(text)));
            }
            Ok(MarkupToken::OpenTag(raw)) => {
                let (element, self_closing) = parse_open_tag(raw);
                if self_closing || is_void_tag(&element.tag) {
                    push_child(&mut stack, &mut roots, element.into_node());
                } else {
                    stack.push(element);
                }
            }
            Ok(MarkupToken::CloseTag(raw)) => {
                let name = raw
                    .trim_start_matches("</")
                    .trim_end_matches('>')
                    .trim()
                    .to_ascii_lowercase();

                match stack.iter().rposition(|open| open.tag == name) {
                    Some(position) => {
                        while stack.len() > position {
                            close_top(&mut stack, &mut roots);
                        }
                    }
                    None => debug!(tag = %name, "Ignoring stray closing tag"),
                }
            }
            Err(()) => {
                push_child(&mut stack, &mut roots, text_node(&source[span]));
            }
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    SurfaceFragment::from_nodes(roots)
}

fn text_node(content: &str) -> SurfaceNode {
    SurfaceNode::text(content)
}

fn push_child(stack: &mut [OpenElement], roots: &mut Vec<SurfaceNode>, node: SurfaceNode) {
    let siblings = match stack.last_mut() {
        Some(open) => &mut open.children,
        None => roots,
    };

    // Adjacent text runs are one run
    if let SurfaceNode::Text { content } = &node {
        if let Some(SurfaceNode::Text { content: previous }) = siblings.last_mut() {
            previous.push_str(content);
            return;
        }
    }
    siblings.push(node);
}

fn close_top(stack: &mut Vec<OpenElement>, roots: &mut Vec<SurfaceNode>) {
    if let Some(open) = stack.pop() {
        push_child(stack, roots, open.into_node());
    }
}

fn parse_open_tag(raw: &str) -> (OpenElement, bool) {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let self_closing = inner.trim_end().ends_with('/');
    let inner = inner.trim_end().trim_end_matches('/');

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let tag = inner[..name_end].to_ascii_lowercase();

    let mut attributes = BTreeMap::new();
    let mut styles = BTreeMap::new();
    for (key, value) in parse_attributes(&inner[name_end..]) {
        if key == "style" {
            styles.extend(parse_style(&value));
        } else {
            attributes.insert(key, value);
        }
    }

    (
        OpenElement {
            tag,
            attributes,
            styles,
            children: Vec::new(),
        },
        self_closing,
    )
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = source.chars().collect();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            i += 1;
        }
        if start == i {
            i += 1;
            continue;
        }
        let key: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() || chars[i] != '=' {
            attrs.push((key, String::new()));
            continue;
        }
        i += 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        let value: String = match chars.get(i) {
            Some(&quote) if quote == '"' || quote == '\'' => {
                i += 1;
                let value_start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                let value = chars[value_start..i].iter().collect();
                i += 1;
                value
            }
            _ => {
                let value_start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                chars[value_start..i].iter().collect()
            }
        };

        attrs.push((key, decode_entities(&value)));
    }

    attrs
}

fn parse_style(source: &str) -> Vec<(String, String)> {
    source
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key, value.to_string()))
        })
        .collect()
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];

        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&after[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let fragment = parse_markup(
            r#"<p data-id="p1" style="text-align: center">Hi <strong>there</strong></p>"#,
        );
        assert_eq!(fragment.nodes.len(), 1);
        let p = &fragment.nodes[0];
        assert_eq!(p.attr("data-id"), Some("p1"));
        assert_eq!(p.style("text-align"), Some("center"));
        assert_eq!(p.children().len(), 2);
        assert_eq!(p.text_content(), "Hi there");
    }

    #[test]
    fn test_unbalanced_tags_are_closed() {
        let fragment = parse_markup("<div><p>one<p>two</div><span>tail");
        assert_eq!(fragment.nodes.len(), 2);
        assert_eq!(fragment.nodes[0].text_content(), "onetwo");
        assert_eq!(fragment.nodes[1].text_content(), "tail");
    }

    #[test]
    fn test_stray_close_and_comments_are_ignored() {
        let fragment = parse_markup("<!DOCTYPE html><!-- note --></b>text");
        assert_eq!(fragment.nodes, vec![SurfaceNode::text("text")]);
    }

    #[test]
    fn test_void_and_self_closing_tags() {
        let fragment = parse_markup(r#"<p>a<br>b<img src="x.png"/></p>"#);
        let p = &fragment.nodes[0];
        assert_eq!(p.children().len(), 4);
        assert!(p.children()[1].is_tag("br"));
        assert_eq!(p.children()[3].attr("src"), Some("x.png"));
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
        assert_eq!(decode_entities("&lt;tag&gt; &amp; &#65;&#x42;"), "<tag> & AB");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        let fragment = parse_markup("1 < 2");
        assert_eq!(fragment.text_content(), "1 < 2");
    }

    #[test]
    fn test_to_markup_escapes_and_orders_attributes() {
        let fragment = SurfaceFragment::from_nodes(vec![SurfaceNode::element("p")
            .with_attr("data-id", "p1")
            .with_attr("data-align", "left")
            .with_child(SurfaceNode::text("a < b & \"c\""))
            .with_child(SurfaceNode::element("br"))]);

        assert_eq!(
            to_markup(&fragment),
            r#"<p data-align="left" data-id="p1">a &lt; b &amp; "c"<br></p>"#
        );
    }
}
