//! # Surface Renderer
//!
//! Projects a document tree onto the editable surface.
//!
//! ## Determinism
//!
//! Rendering is a pure function of the tree: the same nodes always produce
//! an identical fragment. Attributes and styles live in ordered maps and
//! nothing depends on time or environment.
//!
//! ## Atomic units
//!
//! Image, file, code and fold blocks render as a wrapper element holding
//! the non-editable core followed by a trailing empty-line marker:
//!
//! ```text
//! div[data-role=atomic]
//!   div[data-type=image|file|code|fold][data-id][contenteditable=false] ...
//!   div[data-role=trailing] > br[data-role=placeholder]
//! ```
//!
//! The trailing marker gives the caret somewhere to rest after the unit.
//! Everything the parser needs to rebuild the node is carried on the core
//! as `data-*` attributes; the visible chrome inside the core is decoration.

use crate::markers::*;
use crate::surface::{SurfaceFragment, SurfaceNode};
use jotter_model::{Align, EditorNode};
use tracing::{debug, instrument};

/// Renderer options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Show the size label in file chrome when the size is known
    pub show_file_size: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_file_size: true,
        }
    }
}

/// Document tree to surface projection
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a whole document
    #[instrument(skip(self, nodes), fields(blocks = nodes.len()))]
    pub fn render(&self, nodes: &[EditorNode]) -> SurfaceFragment {
        let fragment = SurfaceFragment::from_nodes(self.render_blocks(nodes));
        debug!(elements = fragment.nodes.len(), "Rendered surface");
        fragment
    }

    /// Render a single node, wrapping atomic blocks
    pub fn render_node(&self, node: &EditorNode) -> SurfaceNode {
        match node {
            EditorNode::Text { value } => SurfaceNode::text(value.clone()),

            EditorNode::Paragraph {
                id,
                align,
                children,
            } => self.text_block("p", id, *align, children),
            EditorNode::Heading1 {
                id,
                align,
                children,
            } => self.text_block("h1", id, *align, children),
            EditorNode::Heading2 {
                id,
                align,
                children,
            } => self.text_block("h2", id, *align, children),

            EditorNode::Strong { children } => {
                SurfaceNode::element("strong").with_children(self.render_inline(children))
            }
            EditorNode::Em { children } => {
                SurfaceNode::element("em").with_children(self.render_inline(children))
            }
            EditorNode::Color { hex, children } => SurfaceNode::element("span")
                .with_style("color", hex.clone())
                .with_children(self.render_inline(children)),

            EditorNode::List {
                id,
                ordered,
                children,
            } => SurfaceNode::element(if *ordered { "ol" } else { "ul" })
                .with_attr(ATTR_ID, id.clone())
                .with_children(self.container_children(children)),

            EditorNode::ListItem { id, children } => SurfaceNode::element("li")
                .with_attr(ATTR_ID, id.clone())
                .with_children(self.inline_or_placeholder(children)),

            EditorNode::TaskList { id, children } => SurfaceNode::element("ul")
                .with_attr(ATTR_ID, id.clone())
                .with_attr(ATTR_TYPE, TYPE_TASK_LIST)
                .with_children(self.container_children(children)),

            EditorNode::TaskItem {
                id,
                checked,
                children,
            } => self.task_item(id, *checked, children),

            EditorNode::Image { .. }
            | EditorNode::File { .. }
            | EditorNode::Code { .. }
            | EditorNode::Fold { .. } => self.atomic_unit(node),
        }
    }

    fn render_blocks(&self, nodes: &[EditorNode]) -> Vec<SurfaceNode> {
        nodes.iter().map(|node| self.render_node(node)).collect()
    }

    fn render_inline(&self, nodes: &[EditorNode]) -> Vec<SurfaceNode> {
        nodes.iter().map(|node| self.render_node(node)).collect()
    }

    fn container_children(&self, children: &[EditorNode]) -> Vec<SurfaceNode> {
        if children.is_empty() {
            vec![placeholder()]
        } else {
            self.render_blocks(children)
        }
    }

    fn inline_or_placeholder(&self, children: &[EditorNode]) -> Vec<SurfaceNode> {
        if children.is_empty() {
            vec![placeholder()]
        } else {
            self.render_inline(children)
        }
    }

    fn text_block(&self, tag: &str, id: &str, align: Align, children: &[EditorNode]) -> SurfaceNode {
        let mut el = SurfaceNode::element(tag)
            .with_attr(ATTR_ID, id)
            .with_attr(ATTR_ALIGN, align.as_str());
        if !align.is_left() {
            el = el.with_style("text-align", align.as_str());
        }
        el.with_children(self.inline_or_placeholder(children))
    }

    fn task_item(&self, id: &str, checked: bool, children: &[EditorNode]) -> SurfaceNode {
        let mut checkbox = SurfaceNode::element("input")
            .with_attr("type", "checkbox")
            .with_attr(ATTR_ROLE, ROLE_CHECKBOX)
            .with_attr(ATTR_EDITABLE, "false");
        if checked {
            checkbox = checkbox.with_attr("checked", "");
        }

        SurfaceNode::element("li")
            .with_attr(ATTR_ID, id)
            .with_attr(ATTR_TYPE, TYPE_TASK_ITEM)
            .with_attr(ATTR_CHECKED, bool_attr(checked))
            .with_child(checkbox)
            .with_child(
                SurfaceNode::element("div")
                    .with_attr(ATTR_ROLE, ROLE_TASK_CONTENT)
                    .with_children(self.inline_or_placeholder(children)),
            )
    }

    fn atomic_unit(&self, node: &EditorNode) -> SurfaceNode {
        let core = match node {
            EditorNode::Image {
                id,
                url,
                asset_path,
                width_percent,
                align,
            } => {
                let mut core = atomic_core(TYPE_IMAGE, id)
                    .with_attr(ATTR_URL, url.clone())
                    .with_attr(ATTR_ALIGN, align.as_str())
                    .with_attr(ATTR_WIDTH, width_percent.to_string());
                if let Some(path) = asset_path {
                    core = core.with_attr(ATTR_ASSET_PATH, path.clone());
                }
                core.with_child(
                    SurfaceNode::element("img")
                        .with_attr("src", url.clone())
                        .with_style("width", format!("{}%", width_percent)),
                )
            }

            EditorNode::File {
                id,
                url,
                file_name,
                file_size,
                asset_path,
                align,
            } => {
                let mut core = atomic_core(TYPE_FILE, id)
                    .with_attr(ATTR_URL, url.clone())
                    .with_attr(ATTR_ALIGN, align.as_str());
                if let Some(path) = asset_path {
                    core = core.with_attr(ATTR_ASSET_PATH, path.clone());
                }
                if let Some(name) = file_name {
                    core = core.with_attr(ATTR_FILE_NAME, name.clone());
                }

                let display_name = file_name.clone().unwrap_or_else(|| "file".to_string());
                core = core
                    .with_child(
                        SurfaceNode::element("span")
                            .with_attr(ATTR_ROLE, ROLE_FILE_ICON)
                            .with_attr(ATTR_EXT, extension_of(&display_name)),
                    )
                    .with_child(
                        SurfaceNode::element("span")
                            .with_attr(ATTR_ROLE, ROLE_FILE_NAME)
                            .with_child(SurfaceNode::text(display_name)),
                    );

                match file_size {
                    Some(size) if self.options.show_file_size => {
                        let label = format_file_size(*size);
                        core.with_attr(ATTR_FILE_SIZE, label.clone()).with_child(
                            SurfaceNode::element("span")
                                .with_attr(ATTR_ROLE, ROLE_FILE_SIZE)
                                .with_child(SurfaceNode::text(label)),
                        )
                    }
                    _ => core,
                }
            }

            EditorNode::Code {
                id,
                content,
                language,
            } => atomic_core(TYPE_CODE, id)
                .with_attr(ATTR_LANGUAGE, language.clone())
                .with_child(
                    SurfaceNode::element("div")
                        .with_attr(ATTR_ROLE, ROLE_CODE_HEADER)
                        .with_child(
                            SurfaceNode::element("span")
                                .with_attr(ATTR_ROLE, ROLE_CODE_LANGUAGE)
                                .with_child(SurfaceNode::text(language.clone())),
                        ),
                )
                .with_child(
                    SurfaceNode::element("pre").with_child(
                        SurfaceNode::element("code")
                            .with_attr(ATTR_ROLE, ROLE_CODE_CONTENT)
                            .with_attr(ATTR_EDITABLE, "true")
                            .with_attr("class", format!("language-{}", language))
                            .with_child(SurfaceNode::text(content.clone())),
                    ),
                ),

            EditorNode::Fold {
                id,
                folded,
                children,
            } => {
                let mut content = SurfaceNode::element("div")
                    .with_attr(ATTR_ROLE, ROLE_FOLD_CONTENT)
                    .with_attr(ATTR_EDITABLE, "true");
                if *folded {
                    content = content.with_style("display", "none");
                }

                atomic_core(TYPE_FOLD, id)
                    .with_attr(ATTR_FOLDED, bool_attr(*folded))
                    .with_child(
                        SurfaceNode::element("div")
                            .with_attr(ATTR_ROLE, ROLE_FOLD_HEADER)
                            .with_child(SurfaceNode::text(if *folded { "▶" } else { "▼" })),
                    )
                    .with_child(content.with_children(self.container_children(children)))
            }

            other => return self.render_node(other),
        };

        SurfaceNode::element("div")
            .with_attr(ATTR_ROLE, ROLE_ATOMIC)
            .with_child(core)
            .with_child(
                SurfaceNode::element("div")
                    .with_attr(ATTR_ROLE, ROLE_TRAILING)
                    .with_child(placeholder()),
            )
    }
}

/// Render with default options
pub fn render(nodes: &[EditorNode]) -> SurfaceFragment {
    Renderer::new().render(nodes)
}

fn atomic_core(kind: &str, id: &str) -> SurfaceNode {
    SurfaceNode::element("div")
        .with_attr(ATTR_TYPE, kind)
        .with_attr(ATTR_ID, id)
        .with_attr(ATTR_EDITABLE, "false")
}

fn placeholder() -> SurfaceNode {
    SurfaceNode::element("br").with_attr(ATTR_ROLE, ROLE_PLACEHOLDER)
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Lower-cased extension of a file name, empty when it has none
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Human-readable size label: `512 B`, `1.5 KB`, `2.0 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
