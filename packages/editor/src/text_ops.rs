//! # Inline Text Operations
//!
//! Editing primitives over the inline content of a text block. Content is
//! flattened into styled runs, edited by character offset, and rebuilt into
//! a canonical wrapper tree:
//!
//! ```text
//! color > strong > em > text
//! ```
//!
//! Adjacent runs with the same style merge and empty runs disappear, so
//! repeated edits never accumulate empty or redundant wrappers.

use jotter_model::EditorNode;

/// Formatting carried by a run of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

/// Formatting commands that act on a character range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Bold,
    Italic,
    Color(String),
    ClearColor,
}

pub fn flatten(children: &[EditorNode]) -> Vec<StyledRun> {
    let mut out = Vec::new();
    for child in children {
        flatten_into(child, &Style::default(), &mut out);
    }
    out
}

fn flatten_into(node: &EditorNode, style: &Style, out: &mut Vec<StyledRun>) {
    let inner = match node {
        EditorNode::Text { value } => {
            out.push(StyledRun {
                text: value.clone(),
                style: style.clone(),
            });
            return;
        }
        EditorNode::Strong { .. } => Style {
            bold: true,
            ..style.clone()
        },
        EditorNode::Em { .. } => Style {
            italic: true,
            ..style.clone()
        },
        EditorNode::Color { hex, .. } => Style {
            color: Some(hex.clone()),
            ..style.clone()
        },
        // Blocks never appear inline; keep their text rather than lose it
        _ => style.clone(),
    };

    if let Some(children) = node.children() {
        for child in children {
            flatten_into(child, &inner, out);
        }
    }
}

fn merge(runs: Vec<StyledRun>) -> Vec<StyledRun> {
    let mut out: Vec<StyledRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    out
}

/// Consecutive runs sharing the same key
fn groups<K, F>(runs: &[StyledRun], key: F) -> Vec<(K, &[StyledRun])>
where
    K: PartialEq,
    F: Fn(&StyledRun) -> K,
{
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=runs.len() {
        if i == runs.len() || key(&runs[i]) != key(&runs[start]) {
            out.push((key(&runs[start]), &runs[start..i]));
            start = i;
        }
    }
    out
}

/// Rebuild canonical inline nodes from runs
pub fn build(runs: Vec<StyledRun>) -> Vec<EditorNode> {
    let runs = merge(runs);
    let mut out = Vec::new();

    for (color, by_color) in groups(&runs, |r| r.style.color.clone()) {
        let mut colored = Vec::new();
        for (bold, by_bold) in groups(by_color, |r| r.style.bold) {
            let mut emphasized = Vec::new();
            for run in by_bold {
                let text = EditorNode::text(run.text.clone());
                if run.style.italic {
                    emphasized.push(EditorNode::em(vec![text]));
                } else {
                    emphasized.push(text);
                }
            }
            if bold {
                colored.push(EditorNode::strong(emphasized));
            } else {
                colored.extend(emphasized);
            }
        }
        match color {
            Some(hex) => out.push(EditorNode::color(hex, colored)),
            None => out.extend(colored),
        }
    }

    out
}

/// Length in characters
pub fn inline_len(children: &[EditorNode]) -> usize {
    flatten(children).iter().map(|r| r.text.chars().count()).sum()
}

fn split_runs(runs: Vec<StyledRun>, offset: usize) -> (Vec<StyledRun>, Vec<StyledRun>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut remaining = offset;

    for run in runs {
        let len = run.text.chars().count();
        if remaining >= len {
            remaining -= len;
            left.push(run);
        } else if remaining == 0 {
            right.push(run);
        } else {
            let byte = run
                .text
                .char_indices()
                .nth(remaining)
                .map(|(i, _)| i)
                .unwrap_or(run.text.len());
            let (a, b) = run.text.split_at(byte);
            left.push(StyledRun {
                text: a.to_string(),
                style: run.style.clone(),
            });
            right.push(StyledRun {
                text: b.to_string(),
                style: run.style,
            });
            remaining = 0;
        }
    }

    (left, right)
}

/// Split inline content at a character offset
pub fn split_at(children: &[EditorNode], offset: usize) -> (Vec<EditorNode>, Vec<EditorNode>) {
    let (left, right) = split_runs(flatten(children), offset);
    (build(left), build(right))
}

/// Insert plain text at `offset`, inheriting the style of the text before it
pub fn insert_text(children: &[EditorNode], offset: usize, text: &str) -> Vec<EditorNode> {
    let runs = flatten(children);
    let style = style_at(&runs, offset);
    let (mut left, right) = split_runs(runs, offset);
    left.push(StyledRun {
        text: text.to_string(),
        style,
    });
    left.extend(right);
    build(left)
}

fn style_at(runs: &[StyledRun], offset: usize) -> Style {
    let mut seen = 0;
    for run in runs {
        let len = run.text.chars().count();
        if len > 0 && offset > seen && offset <= seen + len {
            return run.style.clone();
        }
        seen += len;
    }
    runs.iter()
        .find(|r| !r.text.is_empty())
        .map(|r| r.style.clone())
        .unwrap_or_default()
}

/// Remove characters in `start..end`
pub fn delete_range(children: &[EditorNode], start: usize, end: usize) -> Vec<EditorNode> {
    if end <= start {
        return build(flatten(children));
    }
    let (left, rest) = split_runs(flatten(children), start);
    let (_, right) = split_runs(rest, end - start);
    let mut runs = left;
    runs.extend(right);
    build(runs)
}

/// Append `tail` to `head`, merging the runs at the seam
pub fn concat(head: &[EditorNode], tail: &[EditorNode]) -> Vec<EditorNode> {
    let mut runs = flatten(head);
    runs.extend(flatten(tail));
    build(runs)
}

/// Whether every character in `start..end` already carries `format`
pub fn is_formatted(children: &[EditorNode], start: usize, end: usize, format: &Format) -> bool {
    let (_, rest) = split_runs(flatten(children), start);
    let (middle, _) = split_runs(rest, end.saturating_sub(start));
    let middle: Vec<_> = middle.into_iter().filter(|r| !r.text.is_empty()).collect();
    !middle.is_empty()
        && middle.iter().all(|run| match format {
            Format::Bold => run.style.bold,
            Format::Italic => run.style.italic,
            Format::Color(hex) => run.style.color.as_deref() == Some(hex.as_str()),
            Format::ClearColor => run.style.color.is_none(),
        })
}

/// Apply a formatting command to `start..end`. Bold and italic toggle off
/// when the whole range already has them.
pub fn apply_format(children: &[EditorNode], start: usize, end: usize, format: &Format) -> Vec<EditorNode> {
    let len = inline_len(children);
    let end = end.min(len);
    if start >= end {
        return build(flatten(children));
    }

    let toggle_off = matches!(format, Format::Bold | Format::Italic)
        && is_formatted(children, start, end, format);

    let (left, rest) = split_runs(flatten(children), start);
    let (middle, right) = split_runs(rest, end - start);

    let middle = middle.into_iter().map(|mut run| {
        match format {
            Format::Bold => run.style.bold = !toggle_off,
            Format::Italic => run.style.italic = !toggle_off,
            Format::Color(hex) => run.style.color = Some(hex.clone()),
            Format::ClearColor => run.style.color = None,
        }
        run
    });

    let mut runs = left;
    runs.extend(middle);
    runs.extend(right);
    build(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> EditorNode {
        EditorNode::text(s)
    }

    #[test]
    fn test_build_is_canonical() {
        let nested = vec![
            EditorNode::em(vec![EditorNode::strong(vec![t("a")])]),
            EditorNode::strong(vec![t("b")]),
            t(""),
        ];
        assert_eq!(
            build(flatten(&nested)),
            vec![EditorNode::strong(vec![EditorNode::em(vec![t("a")]), t("b")])]
        );
    }

    #[test]
    fn test_insert_inherits_preceding_style() {
        let children = vec![EditorNode::strong(vec![t("ab")]), t("cd")];
        assert_eq!(
            insert_text(&children, 2, "X"),
            vec![EditorNode::strong(vec![t("abX")]), t("cd")]
        );
        assert_eq!(
            insert_text(&children, 0, "X"),
            vec![EditorNode::strong(vec![t("Xab")]), t("cd")]
        );
    }

    #[test]
    fn test_split_and_concat() {
        let children = vec![t("Hel"), EditorNode::em(vec![t("lo")])];
        let (left, right) = split_at(&children, 4);
        assert_eq!(left, vec![t("Hel"), EditorNode::em(vec![t("l")])]);
        assert_eq!(right, vec![EditorNode::em(vec![t("o")])]);
        assert_eq!(concat(&left, &right), children);
    }

    #[test]
    fn test_delete_range_multibyte() {
        let children = vec![t("héllo")];
        assert_eq!(delete_range(&children, 1, 2), vec![t("hllo")]);
        assert_eq!(delete_range(&children, 0, 99), Vec::<EditorNode>::new());
    }

    #[test]
    fn test_bold_toggles() {
        let children = vec![t("Hello world")];
        let bolded = apply_format(&children, 0, 5, &Format::Bold);
        assert_eq!(bolded, vec![EditorNode::strong(vec![t("Hello")]), t(" world")]);

        let unbolded = apply_format(&bolded, 0, 5, &Format::Bold);
        assert_eq!(unbolded, children);
    }

    #[test]
    fn test_color_wraps_outermost() {
        let children = vec![EditorNode::strong(vec![t("ab")])];
        let colored = apply_format(&children, 1, 2, &Format::Color("#f00".to_string()));
        assert_eq!(
            colored,
            vec![
                EditorNode::strong(vec![t("a")]),
                EditorNode::color("#f00", vec![EditorNode::strong(vec![t("b")])]),
            ]
        );
        assert!(is_formatted(&colored, 1, 2, &Format::Color("#f00".to_string())));
        assert_eq!(inline_len(&colored), 2);
    }
}
