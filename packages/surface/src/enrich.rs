//! # Surface Enrichment
//!
//! Display-only decoration applied after rendering:
//!
//! - code content is split into `span[data-token=..]` runs for keywords,
//!   strings, comments and numbers
//! - file chrome icons get a `data-icon` data URI from an icon lookup
//!
//! Nothing added here is read by the parser. Highlight spans concatenate
//! back to the original code text, so parsing an enriched surface yields
//! the same tree as parsing the plain one.

use crate::markers::*;
use crate::surface::{SurfaceFragment, SurfaceNode};
use tracing::debug;

/// Highlight token class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Keyword,
    String,
    Comment,
    Number,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Keyword => "keyword",
            TokenClass::String => "string",
            TokenClass::Comment => "comment",
            TokenClass::Number => "number",
        }
    }
}

/// A run of code text, classified or plain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub class: Option<TokenClass>,
    pub text: String,
}

struct Grammar {
    keywords: &'static [&'static str],
    line_comment: Option<&'static str>,
    hash_comment: bool,
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "else", "enum", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe",
    "use", "where", "while",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "interface", "let", "new", "null", "return", "switch", "this",
    "throw", "true", "try", "type", "typeof", "undefined", "var", "void", "while", "yield",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "False", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "None", "nonlocal", "not", "or", "pass", "raise", "return", "True", "try",
    "while", "with", "yield",
];

const SHELL_KEYWORDS: &[&str] = &[
    "case", "do", "done", "elif", "else", "esac", "export", "fi", "for", "function", "if", "in",
    "local", "return", "then", "until", "while",
];

const JSON_KEYWORDS: &[&str] = &["true", "false", "null"];

fn grammar_for(language: &str) -> Option<Grammar> {
    let grammar = match language.trim().to_ascii_lowercase().as_str() {
        "rust" | "rs" => Grammar {
            keywords: RUST_KEYWORDS,
            line_comment: Some("//"),
            hash_comment: false,
        },
        "javascript" | "js" | "typescript" | "ts" | "jsx" | "tsx" => Grammar {
            keywords: JS_KEYWORDS,
            line_comment: Some("//"),
            hash_comment: false,
        },
        "python" | "py" => Grammar {
            keywords: PYTHON_KEYWORDS,
            line_comment: None,
            hash_comment: true,
        },
        "bash" | "sh" | "shell" | "zsh" => Grammar {
            keywords: SHELL_KEYWORDS,
            line_comment: None,
            hash_comment: true,
        },
        "json" => Grammar {
            keywords: JSON_KEYWORDS,
            line_comment: None,
            hash_comment: false,
        },
        _ => return None,
    };
    Some(grammar)
}

/// Split code into highlight spans. Unknown languages yield a single plain
/// span. The span texts always concatenate back to `code`.
pub fn highlight(code: &str, language: &str) -> Vec<HighlightSpan> {
    let grammar = match grammar_for(language) {
        Some(grammar) => grammar,
        None => {
            return vec![HighlightSpan {
                class: None,
                text: code.to_string(),
            }]
        }
    };

    let mut spans: Vec<HighlightSpan> = Vec::new();
    let mut rest = code;

    while let Some(c) = rest.chars().next() {
        let (class, len) = if grammar.line_comment.map(|p| rest.starts_with(p)).unwrap_or(false)
            || (grammar.hash_comment && c == '#')
        {
            (Some(TokenClass::Comment), rest.find('\n').unwrap_or(rest.len()))
        } else if c == '"' || c == '\'' || c == '`' {
            (Some(TokenClass::String), string_len(rest, c))
        } else if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'))
                .unwrap_or(rest.len());
            (Some(TokenClass::Number), len)
        } else if c.is_alphabetic() || c == '_' {
            let len = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let class = grammar.keywords.contains(&word).then_some(TokenClass::Keyword);
            (class, len)
        } else {
            (None, c.len_utf8())
        };

        push_span(&mut spans, class, &rest[..len]);
        rest = &rest[len..];
    }

    spans
}

fn string_len(source: &str, quote: char) -> usize {
    let mut escaped = false;
    for (index, ch) in source.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return index + ch.len_utf8();
        } else if ch == '\n' && quote != '`' {
            return index;
        }
    }
    source.len()
}

fn push_span(spans: &mut Vec<HighlightSpan>, class: Option<TokenClass>, text: &str) {
    if let Some(last) = spans.last_mut() {
        if last.class.is_none() && class.is_none() {
            last.text.push_str(text);
            return;
        }
    }
    spans.push(HighlightSpan {
        class,
        text: text.to_string(),
    });
}

/// Decorate a rendered surface in place.
///
/// `icon_for` receives a file extension and returns base64 PNG data, or
/// `None` when no icon is available.
pub fn enrich<F>(fragment: &mut SurfaceFragment, mut icon_for: F)
where
    F: FnMut(&str) -> Option<String>,
{
    let mut stats = (0usize, 0usize);
    for node in &mut fragment.nodes {
        enrich_node(node, None, &mut icon_for, &mut stats);
    }
    debug!(code_blocks = stats.0, icons = stats.1, "Enriched surface");
}

fn enrich_node<F>(
    node: &mut SurfaceNode,
    language: Option<&str>,
    icon_for: &mut F,
    stats: &mut (usize, usize),
) where
    F: FnMut(&str) -> Option<String>,
{
    let own_language = if node.attr(ATTR_TYPE) == Some(TYPE_CODE) {
        node.attr(ATTR_LANGUAGE).map(str::to_string)
    } else {
        None
    };
    let language = own_language.as_deref().or(language);

    let role = node.attr(ATTR_ROLE).map(str::to_string);
    match role.as_deref() {
        Some(ROLE_CODE_CONTENT) => {
            let code = node.text_content();
            let spans = highlight(&code, language.unwrap_or_default());
            if let Some(children) = node.children_mut() {
                *children = spans.into_iter().map(span_node).collect();
            }
            stats.0 += 1;
            return;
        }
        Some(ROLE_FILE_ICON) => {
            let ext = node.attr(ATTR_EXT).unwrap_or_default().to_string();
            if let Some(data) = icon_for(&ext).filter(|d| !d.is_empty()) {
                node.set_attr(ATTR_ICON, format!("data:image/png;base64,{}", data));
                stats.1 += 1;
            }
            return;
        }
        _ => {}
    }

    if let Some(children) = node.children_mut() {
        for child in children {
            enrich_node(child, language, icon_for, stats);
        }
    }
}

fn span_node(span: HighlightSpan) -> SurfaceNode {
    match span.class {
        Some(class) => SurfaceNode::element("span")
            .with_attr(ATTR_TOKEN, class.as_str())
            .with_child(SurfaceNode::text(span.text)),
        None => SurfaceNode::text(span.text),
    }
}
