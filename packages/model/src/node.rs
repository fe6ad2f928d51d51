//! # Document Nodes
//!
//! The document is an ordered sequence of block-level root nodes. Every
//! node is one variant of [`EditorNode`]:
//!
//! ```text
//! blocks   paragraph heading1 heading2 list taskList image file code fold
//! items    listItem (under list) taskItem (under taskList)
//! inline   strong em color text
//! ```
//!
//! Block ids are stable tokens assigned at creation. They never change across
//! edits and are how the surface, the selection and the toolbar refer back to
//! a node. Inline containers and text runs carry no id.

use serde::{Deserialize, Serialize};

/// Default image width, in percent of the editor column
pub const DEFAULT_WIDTH_PERCENT: u32 = 100;

/// Smallest allowed image width
pub const MIN_WIDTH_PERCENT: u32 = 10;

/// Language assigned to code blocks that do not name one
pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

/// Deepest allowed nesting of folds, counting the outermost fold as 1
pub const MAX_FOLD_DEPTH: usize = 3;

/// Horizontal alignment of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    /// Parse a surface attribute value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "left" | "start" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            _ => None,
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Align::Left)
    }
}

/// Discriminant of an [`EditorNode`], used by predicates and tree walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Paragraph,
    Heading1,
    Heading2,
    Strong,
    Em,
    Color,
    List,
    ListItem,
    TaskList,
    TaskItem,
    Image,
    File,
    Code,
    Fold,
}

impl NodeKind {
    /// Name used for the `type` tag in persisted documents
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading1 => "heading1",
            NodeKind::Heading2 => "heading2",
            NodeKind::Strong => "strong",
            NodeKind::Em => "em",
            NodeKind::Color => "color",
            NodeKind::List => "list",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem => "taskItem",
            NodeKind::Image => "image",
            NodeKind::File => "file",
            NodeKind::Code => "code",
            NodeKind::Fold => "fold",
        }
    }

    /// Image, file, code and fold blocks are not directly text-editable
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            NodeKind::Image | NodeKind::File | NodeKind::Code | NodeKind::Fold
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Strong | NodeKind::Em | NodeKind::Color
        )
    }

    /// Blocks whose children are inline content (text and inline wrappers)
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading1
                | NodeKind::Heading2
                | NodeKind::ListItem
                | NodeKind::TaskItem
        )
    }

    /// Nodes allowed at the document root
    pub fn is_root_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading1
                | NodeKind::Heading2
                | NodeKind::List
                | NodeKind::TaskList
                | NodeKind::Image
                | NodeKind::File
                | NodeKind::Code
                | NodeKind::Fold
        )
    }
}

/// One node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorNode {
    Text {
        #[serde(default)]
        value: String,
    },

    Paragraph {
        #[serde(default)]
        id: String,
        #[serde(default)]
        align: Align,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    Heading1 {
        #[serde(default)]
        id: String,
        #[serde(default)]
        align: Align,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    Heading2 {
        #[serde(default)]
        id: String,
        #[serde(default)]
        align: Align,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    Strong {
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    Em {
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    Color {
        hex: String,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    List {
        #[serde(default)]
        id: String,
        #[serde(default)]
        ordered: bool,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    ListItem {
        #[serde(default)]
        id: String,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    TaskList {
        #[serde(default)]
        id: String,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    TaskItem {
        #[serde(default)]
        id: String,
        #[serde(default)]
        checked: bool,
        #[serde(default)]
        children: Vec<EditorNode>,
    },

    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default)]
        id: String,
        #[serde(default)]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_path: Option<String>,
        #[serde(default = "default_width_percent")]
        width_percent: u32,
        #[serde(default)]
        align: Align,
    },

    /// `file_size` is display-only: it is read if present, never written,
    /// and recomputed from the asset store after load.
    #[serde(rename_all = "camelCase")]
    File {
        #[serde(default)]
        id: String,
        #[serde(default)]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(default, skip_serializing)]
        file_size: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_path: Option<String>,
        #[serde(default)]
        align: Align,
    },

    Code {
        #[serde(default)]
        id: String,
        #[serde(default)]
        content: String,
        #[serde(default = "default_code_language")]
        language: String,
    },

    Fold {
        #[serde(default)]
        id: String,
        #[serde(default)]
        folded: bool,
        #[serde(default)]
        children: Vec<EditorNode>,
    },
}

fn default_width_percent() -> u32 {
    DEFAULT_WIDTH_PERCENT
}

fn default_code_language() -> String {
    DEFAULT_CODE_LANGUAGE.to_string()
}

/// Clamp an image width into the allowed `10..=100` range
pub fn clamp_width(percent: u32) -> u32 {
    percent.clamp(MIN_WIDTH_PERCENT, DEFAULT_WIDTH_PERCENT)
}

impl EditorNode {
    pub fn text(value: impl Into<String>) -> Self {
        EditorNode::Text {
            value: value.into(),
        }
    }

    pub fn paragraph(id: impl Into<String>, children: Vec<EditorNode>) -> Self {
        EditorNode::Paragraph {
            id: id.into(),
            align: Align::Left,
            children,
        }
    }

    pub fn empty_paragraph(id: impl Into<String>) -> Self {
        Self::paragraph(id, Vec::new())
    }

    pub fn strong(children: Vec<EditorNode>) -> Self {
        EditorNode::Strong { children }
    }

    pub fn em(children: Vec<EditorNode>) -> Self {
        EditorNode::Em { children }
    }

    pub fn color(hex: impl Into<String>, children: Vec<EditorNode>) -> Self {
        EditorNode::Color {
            hex: hex.into(),
            children,
        }
    }

    pub fn image(id: impl Into<String>, url: impl Into<String>, asset_path: Option<String>) -> Self {
        EditorNode::Image {
            id: id.into(),
            url: url.into(),
            asset_path,
            width_percent: DEFAULT_WIDTH_PERCENT,
            align: Align::Left,
        }
    }

    pub fn file(
        id: impl Into<String>,
        url: impl Into<String>,
        file_name: Option<String>,
        asset_path: Option<String>,
    ) -> Self {
        EditorNode::File {
            id: id.into(),
            url: url.into(),
            file_name,
            file_size: None,
            asset_path,
            align: Align::Left,
        }
    }

    pub fn code(id: impl Into<String>, content: impl Into<String>, language: impl Into<String>) -> Self {
        EditorNode::Code {
            id: id.into(),
            content: content.into(),
            language: language.into(),
        }
    }

    pub fn fold(id: impl Into<String>, children: Vec<EditorNode>) -> Self {
        EditorNode::Fold {
            id: id.into(),
            folded: false,
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            EditorNode::Text { .. } => NodeKind::Text,
            EditorNode::Paragraph { .. } => NodeKind::Paragraph,
            EditorNode::Heading1 { .. } => NodeKind::Heading1,
            EditorNode::Heading2 { .. } => NodeKind::Heading2,
            EditorNode::Strong { .. } => NodeKind::Strong,
            EditorNode::Em { .. } => NodeKind::Em,
            EditorNode::Color { .. } => NodeKind::Color,
            EditorNode::List { .. } => NodeKind::List,
            EditorNode::ListItem { .. } => NodeKind::ListItem,
            EditorNode::TaskList { .. } => NodeKind::TaskList,
            EditorNode::TaskItem { .. } => NodeKind::TaskItem,
            EditorNode::Image { .. } => NodeKind::Image,
            EditorNode::File { .. } => NodeKind::File,
            EditorNode::Code { .. } => NodeKind::Code,
            EditorNode::Fold { .. } => NodeKind::Fold,
        }
    }

    /// Stable id of a block node. Inline nodes and text runs have none.
    pub fn id(&self) -> Option<&str> {
        match self {
            EditorNode::Paragraph { id, .. }
            | EditorNode::Heading1 { id, .. }
            | EditorNode::Heading2 { id, .. }
            | EditorNode::List { id, .. }
            | EditorNode::ListItem { id, .. }
            | EditorNode::TaskList { id, .. }
            | EditorNode::TaskItem { id, .. }
            | EditorNode::Image { id, .. }
            | EditorNode::File { id, .. }
            | EditorNode::Code { id, .. }
            | EditorNode::Fold { id, .. } => Some(id.as_str()),
            EditorNode::Text { .. }
            | EditorNode::Strong { .. }
            | EditorNode::Em { .. }
            | EditorNode::Color { .. } => None,
        }
    }

    pub fn id_mut(&mut self) -> Option<&mut String> {
        match self {
            EditorNode::Paragraph { id, .. }
            | EditorNode::Heading1 { id, .. }
            | EditorNode::Heading2 { id, .. }
            | EditorNode::List { id, .. }
            | EditorNode::ListItem { id, .. }
            | EditorNode::TaskList { id, .. }
            | EditorNode::TaskItem { id, .. }
            | EditorNode::Image { id, .. }
            | EditorNode::File { id, .. }
            | EditorNode::Code { id, .. }
            | EditorNode::Fold { id, .. } => Some(id),
            EditorNode::Text { .. }
            | EditorNode::Strong { .. }
            | EditorNode::Em { .. }
            | EditorNode::Color { .. } => None,
        }
    }

    pub fn has_id(&self, target: &str) -> bool {
        self.id() == Some(target)
    }

    /// Ordered children of a container node
    pub fn children(&self) -> Option<&Vec<EditorNode>> {
        match self {
            EditorNode::Paragraph { children, .. }
            | EditorNode::Heading1 { children, .. }
            | EditorNode::Heading2 { children, .. }
            | EditorNode::Strong { children }
            | EditorNode::Em { children }
            | EditorNode::Color { children, .. }
            | EditorNode::List { children, .. }
            | EditorNode::ListItem { children, .. }
            | EditorNode::TaskList { children, .. }
            | EditorNode::TaskItem { children, .. }
            | EditorNode::Fold { children, .. } => Some(children),
            EditorNode::Text { .. }
            | EditorNode::Image { .. }
            | EditorNode::File { .. }
            | EditorNode::Code { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<EditorNode>> {
        match self {
            EditorNode::Paragraph { children, .. }
            | EditorNode::Heading1 { children, .. }
            | EditorNode::Heading2 { children, .. }
            | EditorNode::Strong { children }
            | EditorNode::Em { children }
            | EditorNode::Color { children, .. }
            | EditorNode::List { children, .. }
            | EditorNode::ListItem { children, .. }
            | EditorNode::TaskList { children, .. }
            | EditorNode::TaskItem { children, .. }
            | EditorNode::Fold { children, .. } => Some(children),
            EditorNode::Text { .. }
            | EditorNode::Image { .. }
            | EditorNode::File { .. }
            | EditorNode::Code { .. } => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.kind().is_atomic()
    }

    pub fn is_inline(&self) -> bool {
        self.kind().is_inline()
    }

    pub fn is_text_block(&self) -> bool {
        self.kind().is_text_block()
    }

    /// Alignment of blocks that carry one
    pub fn align(&self) -> Option<Align> {
        match self {
            EditorNode::Paragraph { align, .. }
            | EditorNode::Heading1 { align, .. }
            | EditorNode::Heading2 { align, .. }
            | EditorNode::Image { align, .. }
            | EditorNode::File { align, .. } => Some(*align),
            _ => None,
        }
    }

    pub fn align_mut(&mut self) -> Option<&mut Align> {
        match self {
            EditorNode::Paragraph { align, .. }
            | EditorNode::Heading1 { align, .. }
            | EditorNode::Heading2 { align, .. }
            | EditorNode::Image { align, .. }
            | EditorNode::File { align, .. } => Some(align),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants. Code blocks
    /// contribute their content.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            EditorNode::Text { value } => out.push_str(value),
            EditorNode::Code { content, .. } => out.push_str(content),
            other => {
                if let Some(children) = other.children() {
                    for child in children {
                        child.push_text(out);
                    }
                }
            }
        }
    }

    /// A text-bearing block with no visible text
    pub fn is_empty_block(&self) -> bool {
        self.is_text_block() && self.plain_text().is_empty()
    }

    /// Referenced asset path of image and file nodes
    pub fn asset_path(&self) -> Option<&str> {
        match self {
            EditorNode::Image { asset_path, .. } | EditorNode::File { asset_path, .. } => {
                asset_path.as_deref()
            }
            _ => None,
        }
    }
}
