//! # Surface Parser
//!
//! Rebuilds a document tree from whatever the editable surface currently
//! holds. The surface drifts freely while the user types, so parsing is
//! tolerant and never fails:
//!
//! 1. Atomic units are recognized by their `data-type` marker wherever they
//!    sit, however much wrapper noise surrounds them.
//! 2. Content that follows an atomic core inside its wrapper (text typed
//!    into the trailing marker) is parsed as ordinary blocks and emitted
//!    right after the unit.
//! 3. Fold content is parsed recursively as a block sequence.
//! 4. Inline formatting is recognized structurally: `strong`/`b`,
//!    `em`/`i`, and any element with a `color` style or attribute.
//! 5. Unknown wrappers are unwrapped and their children promoted.
//! 6. Non-breaking spaces in text runs become ordinary spaces.
//!
//! Blocks keep the id found in `data-id`. Missing or duplicated ids (a
//! paragraph split by the host copies the attribute) get fresh ones. The
//! result is never empty.

use crate::markers::*;
use crate::surface::{SurfaceFragment, SurfaceNode};
use jotter_model::{clamp_width, Align, EditorNode, IdGenerator, DEFAULT_CODE_LANGUAGE, DEFAULT_WIDTH_PERCENT};
use std::collections::HashSet;
use tracing::{debug, instrument};

const NBSP: char = '\u{a0}';

/// Surface to document tree parser
pub struct SurfaceParser<'g> {
    ids: &'g mut IdGenerator,
    seen: HashSet<String>,
}

impl<'g> SurfaceParser<'g> {
    pub fn new(ids: &'g mut IdGenerator) -> Self {
        Self {
            ids,
            seen: HashSet::new(),
        }
    }

    /// Parse a whole surface into root blocks
    #[instrument(skip(self, fragment), fields(elements = fragment.nodes.len()))]
    pub fn parse(&mut self, fragment: &SurfaceFragment) -> Vec<EditorNode> {
        self.seen.clear();
        for node in &fragment.nodes {
            reserve_surface_ids(node, self.ids);
        }
        let mut blocks = self.parse_blocks(&fragment.nodes);

        if blocks.is_empty() {
            debug!("Surface is empty, emitting a blank paragraph");
            blocks.push(EditorNode::empty_paragraph(self.ids.new_id()));
        }

        blocks
    }

    fn parse_blocks(&mut self, nodes: &[SurfaceNode]) -> Vec<EditorNode> {
        let mut out = Vec::new();
        let mut loose: Vec<EditorNode> = Vec::new();

        for node in nodes {
            let tag = match node {
                SurfaceNode::Text { content } => {
                    // Source formatting between blocks
                    if content.contains('\n') && content.trim().is_empty() {
                        continue;
                    }
                    push_text(&mut loose, content);
                    continue;
                }
                SurfaceNode::Element { tag, .. } => tag.to_ascii_lowercase(),
            };

            if let Some(kind) = node.attr(ATTR_TYPE).filter(|t| is_atomic_type(t)) {
                self.flush_loose(&mut loose, &mut out);
                out.push(self.parse_atomic(kind, node));
                continue;
            }

            match node.attr(ATTR_ROLE) {
                Some(ROLE_PLACEHOLDER) => continue,
                Some(ROLE_TRAILING) | Some(ROLE_ATOMIC) => {
                    self.flush_loose(&mut loose, &mut out);
                    out.extend(self.parse_blocks(node.children()));
                    continue;
                }
                _ => {}
            }

            if contains_atomic(node) {
                self.flush_loose(&mut loose, &mut out);
                out.extend(self.parse_blocks(node.children()));
                continue;
            }

            match tag.as_str() {
                "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    self.flush_loose(&mut loose, &mut out);
                    out.push(self.parse_text_block(&tag, node));
                }
                "ul" | "ol" => {
                    self.flush_loose(&mut loose, &mut out);
                    if node.attr(ATTR_TYPE) == Some(TYPE_TASK_LIST) {
                        out.push(self.parse_task_list(node));
                    } else {
                        out.push(self.parse_list(node, tag == "ol"));
                    }
                }
                "li" => {
                    self.flush_loose(&mut loose, &mut out);
                    if node.attr(ATTR_TYPE) == Some(TYPE_TASK_ITEM) {
                        let id = self.claim_id(None);
                        let item = self.parse_task_item(node);
                        out.push(EditorNode::TaskList {
                            id,
                            children: vec![item],
                        });
                    } else {
                        let id = self.claim_id(None);
                        let item = self.parse_list_item(node);
                        out.push(EditorNode::List {
                            id,
                            ordered: false,
                            children: vec![item],
                        });
                    }
                }
                "br" => {
                    // A hard break at block level ends the current line
                    self.flush_loose(&mut loose, &mut out);
                }
                "input" => {}
                _ if is_inline_tag(&tag) => {
                    for inline in self.parse_inline(std::slice::from_ref(node)) {
                        push_inline(&mut loose, inline);
                    }
                }
                _ => {
                    // Unknown wrapper: its content forms its own lines
                    self.flush_loose(&mut loose, &mut out);
                    if has_block_content(node) {
                        out.extend(self.parse_blocks(node.children()));
                    } else {
                        let children = self.parse_inline(node.children());
                        let id = self.claim_id(node.attr(ATTR_ID));
                        out.push(EditorNode::Paragraph {
                            id,
                            align: read_align(node),
                            children,
                        });
                    }
                }
            }
        }

        self.flush_loose(&mut loose, &mut out);
        out
    }

    fn flush_loose(&mut self, loose: &mut Vec<EditorNode>, out: &mut Vec<EditorNode>) {
        if loose.is_empty() {
            return;
        }
        let id = self.claim_id(None);
        out.push(EditorNode::paragraph(id, std::mem::take(loose)));
    }

    fn parse_text_block(&mut self, tag: &str, node: &SurfaceNode) -> EditorNode {
        let id = self.claim_id(node.attr(ATTR_ID));
        let align = read_align(node);
        let children = self.parse_inline(node.children());

        match tag {
            "h1" => EditorNode::Heading1 {
                id,
                align,
                children,
            },
            "h2" | "h3" | "h4" | "h5" | "h6" => EditorNode::Heading2 {
                id,
                align,
                children,
            },
            _ => EditorNode::Paragraph {
                id,
                align,
                children,
            },
        }
    }

    fn parse_list(&mut self, node: &SurfaceNode, ordered: bool) -> EditorNode {
        let id = self.claim_id(node.attr(ATTR_ID));
        let mut items = Vec::new();

        for child in node.children() {
            if is_ignorable(child) {
                continue;
            }
            if child.is_tag("li") {
                items.push(self.parse_list_item(child));
            } else {
                let children = self.parse_inline(std::slice::from_ref(child));
                if !children.is_empty() {
                    let item_id = self.claim_id(None);
                    items.push(EditorNode::ListItem {
                        id: item_id,
                        children,
                    });
                }
            }
        }

        EditorNode::List {
            id,
            ordered,
            children: items,
        }
    }

    fn parse_list_item(&mut self, node: &SurfaceNode) -> EditorNode {
        let id = self.claim_id(node.attr(ATTR_ID));
        let children = self.parse_inline(node.children());
        EditorNode::ListItem { id, children }
    }

    fn parse_task_list(&mut self, node: &SurfaceNode) -> EditorNode {
        let id = self.claim_id(node.attr(ATTR_ID));
        let mut items = Vec::new();

        for child in node.children() {
            if is_ignorable(child) {
                continue;
            }
            if child.is_tag("li") {
                items.push(self.parse_task_item(child));
            } else {
                let children = self.parse_inline(std::slice::from_ref(child));
                if !children.is_empty() {
                    let item_id = self.claim_id(None);
                    items.push(EditorNode::TaskItem {
                        id: item_id,
                        checked: false,
                        children,
                    });
                }
            }
        }

        EditorNode::TaskList {
            id,
            children: items,
        }
    }

    fn parse_task_item(&mut self, node: &SurfaceNode) -> EditorNode {
        let id = self.claim_id(node.attr(ATTR_ID));
        let checked = match node.attr(ATTR_CHECKED) {
            Some(value) => value == "true",
            None => node
                .find(&|n: &SurfaceNode| n.is_tag("input"))
                .map(|input| input.has_attr("checked"))
                .unwrap_or(false),
        };
        let children = self.parse_inline(node.children());
        EditorNode::TaskItem {
            id,
            checked,
            children,
        }
    }

    fn parse_atomic(&mut self, kind: &str, core: &SurfaceNode) -> EditorNode {
        let id = self.claim_id(core.attr(ATTR_ID));

        match kind {
            TYPE_IMAGE => {
                let img = core.find(&|n: &SurfaceNode| n.is_tag("img"));
                let url = core
                    .attr(ATTR_URL)
                    .or_else(|| img.and_then(|i| i.attr("src")))
                    .unwrap_or_default()
                    .to_string();
                let width = core
                    .attr(ATTR_WIDTH)
                    .and_then(parse_percent)
                    .or_else(|| img.and_then(|i| i.style("width")).and_then(parse_percent))
                    .unwrap_or(DEFAULT_WIDTH_PERCENT);

                EditorNode::Image {
                    id,
                    url,
                    asset_path: core.attr(ATTR_ASSET_PATH).map(str::to_string),
                    width_percent: clamp_width(width),
                    align: read_align(core),
                }
            }

            TYPE_FILE => EditorNode::File {
                id,
                url: core.attr(ATTR_URL).unwrap_or_default().to_string(),
                file_name: core.attr(ATTR_FILE_NAME).map(str::to_string),
                file_size: None,
                asset_path: core.attr(ATTR_ASSET_PATH).map(str::to_string),
                align: read_align(core),
            },

            TYPE_CODE => {
                let language = core
                    .attr(ATTR_LANGUAGE)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .unwrap_or(DEFAULT_CODE_LANGUAGE)
                    .to_string();
                let content = core
                    .find(&|n: &SurfaceNode| n.attr(ATTR_ROLE) == Some(ROLE_CODE_CONTENT))
                    .or_else(|| core.find(&|n: &SurfaceNode| n.is_tag("code")))
                    .map(code_text)
                    .unwrap_or_default();

                EditorNode::Code {
                    id,
                    content,
                    language,
                }
            }

            _ => {
                let folded = core.attr(ATTR_FOLDED) == Some("true");
                let children = match core
                    .find(&|n: &SurfaceNode| n.attr(ATTR_ROLE) == Some(ROLE_FOLD_CONTENT))
                {
                    Some(content) => self.parse_blocks(content.children()),
                    None => Vec::new(),
                };

                EditorNode::Fold {
                    id,
                    folded,
                    children,
                }
            }
        }
    }

    fn parse_inline(&mut self, nodes: &[SurfaceNode]) -> Vec<EditorNode> {
        let mut out = Vec::new();

        for node in nodes {
            match node {
                SurfaceNode::Text { content } => push_text(&mut out, content),
                SurfaceNode::Element { tag, .. } => {
                    let tag = tag.to_ascii_lowercase();
                    match node.attr(ATTR_ROLE) {
                        Some(ROLE_PLACEHOLDER) | Some(ROLE_CHECKBOX) => continue,
                        _ => {}
                    }

                    let wrapped = match tag.as_str() {
                        "br" => {
                            push_text(&mut out, "\n");
                            continue;
                        }
                        "input" | "img" => continue,
                        "strong" | "b" => Some(EditorNode::strong(self.parse_inline(node.children()))),
                        "em" | "i" => Some(EditorNode::em(self.parse_inline(node.children()))),
                        _ => read_color(node).map(|hex| {
                            EditorNode::color(hex, self.parse_inline(node.children()))
                        }),
                    };

                    match wrapped {
                        Some(inline) => push_inline(&mut out, inline),
                        None => {
                            for inline in self.parse_inline(node.children()) {
                                push_inline(&mut out, inline);
                            }
                        }
                    }
                }
            }
        }

        out
    }

    fn claim_id(&mut self, candidate: Option<&str>) -> String {
        if let Some(id) = candidate.map(str::trim).filter(|id| !id.is_empty()) {
            if self.seen.insert(id.to_string()) {
                self.ids.reserve(id);
                return id.to_string();
            }
        }

        let id = self.ids.new_id();
        self.seen.insert(id.clone());
        id
    }
}

/// Parse with a fresh seen-id set
pub fn parse(fragment: &SurfaceFragment, ids: &mut IdGenerator) -> Vec<EditorNode> {
    SurfaceParser::new(ids).parse(fragment)
}

fn reserve_surface_ids(node: &SurfaceNode, ids: &mut IdGenerator) {
    if let Some(id) = node.attr(ATTR_ID) {
        ids.reserve(id);
    }
    for child in node.children() {
        reserve_surface_ids(child, ids);
    }
}

fn push_text(out: &mut Vec<EditorNode>, content: &str) {
    if content.is_empty() {
        return;
    }
    let content = content.replace(NBSP, " ");
    if let Some(EditorNode::Text { value }) = out.last_mut() {
        value.push_str(&content);
        return;
    }
    out.push(EditorNode::text(content));
}

fn push_inline(out: &mut Vec<EditorNode>, node: EditorNode) {
    match node {
        EditorNode::Text { value } => push_text(out, &value),
        other => {
            // Formatting that lost all of its text disappears
            if other.children().map(|c| c.is_empty()).unwrap_or(false) {
                return;
            }
            out.push(other);
        }
    }
}

fn contains_atomic(node: &SurfaceNode) -> bool {
    node.children().iter().any(|child| {
        child.attr(ATTR_TYPE).map(is_atomic_type).unwrap_or(false) || contains_atomic(child)
    })
}

fn has_block_content(node: &SurfaceNode) -> bool {
    node.children().iter().any(|child| match child.tag() {
        Some(tag) => {
            let tag = tag.to_ascii_lowercase();
            !is_inline_tag(&tag) && tag != "br" && tag != "input"
        }
        None => false,
    })
}

fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "strong" | "b" | "em" | "i" | "u" | "s" | "span" | "font" | "a" | "code" | "mark" | "small" | "sub" | "sup"
    )
}

fn is_ignorable(node: &SurfaceNode) -> bool {
    match node {
        SurfaceNode::Text { content } => content.trim().is_empty(),
        SurfaceNode::Element { .. } => node.attr(ATTR_ROLE) == Some(ROLE_PLACEHOLDER),
    }
}

fn read_align(node: &SurfaceNode) -> Align {
    node.attr(ATTR_ALIGN)
        .and_then(Align::parse)
        .or_else(|| node.style("text-align").and_then(Align::parse))
        .unwrap_or_default()
}

fn read_color(node: &SurfaceNode) -> Option<String> {
    node.style("color")
        .or_else(|| node.attr("color"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(normalize_color)
}

/// `rgb(r, g, b)` becomes `#rrggbb`; other values are kept verbatim
fn normalize_color(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgb(")
        .or_else(|| lower.strip_prefix("rgba("))
        .and_then(|rest| rest.strip_suffix(')'));

    if let Some(inner) = inner {
        let channels: Vec<u8> = inner
            .split(',')
            .take(3)
            .filter_map(|c| c.trim().parse::<u8>().ok())
            .collect();
        if channels.len() == 3 {
            return format!("#{:02x}{:02x}{:02x}", channels[0], channels[1], channels[2]);
        }
    }

    value.to_string()
}

fn parse_percent(value: &str) -> Option<u32> {
    value.trim().trim_end_matches('%').trim().parse::<f64>().ok().map(|v| v.round().max(0.0) as u32)
}

fn code_text(node: &SurfaceNode) -> String {
    let mut out = String::new();
    collect_code_text(node, &mut out);
    out.replace(NBSP, " ")
}

fn collect_code_text(node: &SurfaceNode, out: &mut String) {
    match node {
        SurfaceNode::Text { content } => out.push_str(content),
        SurfaceNode::Element { .. } if node.is_tag("br") => out.push('\n'),
        SurfaceNode::Element { children, .. } => {
            for child in children {
                collect_code_text(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str) -> SurfaceNode {
        SurfaceNode::element(tag)
    }

    fn txt(s: &str) -> SurfaceNode {
        SurfaceNode::text(s)
    }

    #[test]
    fn test_empty_surface_yields_blank_paragraph() {
        let mut ids = IdGenerator::from_seed("t");
        let nodes = parse(&SurfaceFragment::new(), &mut ids);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_empty_block());
    }

    #[test]
    fn test_nbsp_becomes_space() {
        let mut ids = IdGenerator::from_seed("t");
        let fragment = SurfaceFragment::from_nodes(vec![el("p")
            .with_attr(ATTR_ID, "p1")
            .with_child(txt("a\u{a0}b"))]);
        let nodes = parse(&fragment, &mut ids);
        assert_eq!(nodes[0].plain_text(), "a b");
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let mut ids = IdGenerator::from_seed("t");
        let fragment = SurfaceFragment::from_nodes(vec![
            el("p").with_attr(ATTR_ID, "p1").with_child(txt("one")),
            el("p").with_attr(ATTR_ID, "p1").with_child(txt("two")),
        ]);
        let nodes = parse(&fragment, &mut ids);
        assert_eq!(nodes[0].id(), Some("p1"));
        assert_ne!(nodes[1].id(), Some("p1"));
    }

    #[test]
    fn test_inline_formatting_is_structural() {
        let mut ids = IdGenerator::from_seed("t");
        let fragment = SurfaceFragment::from_nodes(vec![el("p").with_attr(ATTR_ID, "p1").with_children(vec![
            el("b").with_child(txt("bold")),
            el("i").with_child(txt("it")),
            el("span").with_style("color", "rgb(255, 0, 0)").with_child(txt("red")),
            el("u").with_child(txt("plain")),
        ])]);

        let nodes = parse(&fragment, &mut ids);
        let children = nodes[0].children().unwrap();
        assert_eq!(children[0], EditorNode::strong(vec![EditorNode::text("bold")]));
        assert_eq!(children[1], EditorNode::em(vec![EditorNode::text("it")]));
        assert_eq!(children[2], EditorNode::color("#ff0000", vec![EditorNode::text("red")]));
        assert_eq!(children[3], EditorNode::text("plain"));
    }

    #[test]
    fn test_unknown_wrappers_become_lines() {
        let mut ids = IdGenerator::from_seed("t");
        let fragment = SurfaceFragment::from_nodes(vec![
            el("div").with_child(txt("first")),
            el("div").with_child(txt("second")),
        ]);
        let nodes = parse(&fragment, &mut ids);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].plain_text(), "first");
        assert_eq!(nodes[1].plain_text(), "second");
    }

    #[test]
    fn test_color_normalization() {
        assert_eq!(normalize_color("rgb(0, 128, 255)"), "#0080ff");
        assert_eq!(normalize_color("#ABC"), "#ABC");
        assert_eq!(parse_percent("50%"), Some(50));
    }
}
