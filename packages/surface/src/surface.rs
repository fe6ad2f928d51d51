use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Editable surface node
///
/// Attributes and styles are ordered maps so that rendering the same model
/// twice yields identical surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceNode {
    /// Visual element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        children: Vec<SurfaceNode>,
    },

    /// Text run
    Text { content: String },
}

impl SurfaceNode {
    pub fn element(tag: impl Into<String>) -> Self {
        SurfaceNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        SurfaceNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let SurfaceNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let SurfaceNode::Element { ref mut styles, .. } = self {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: SurfaceNode) -> Self {
        if let SurfaceNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<SurfaceNode>) -> Self {
        if let SurfaceNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            SurfaceNode::Element { tag, .. } => Some(tag),
            SurfaceNode::Text { .. } => None,
        }
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tag().map(|t| t.eq_ignore_ascii_case(name)).unwrap_or(false)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            SurfaceNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            SurfaceNode::Text { .. } => None,
        }
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let SurfaceNode::Element { attributes, .. } = self {
            attributes.insert(key.into(), value.into());
        }
    }

    pub fn style(&self, key: &str) -> Option<&str> {
        match self {
            SurfaceNode::Element { styles, .. } => styles.get(key).map(String::as_str),
            SurfaceNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[SurfaceNode] {
        match self {
            SurfaceNode::Element { children, .. } => children,
            SurfaceNode::Text { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SurfaceNode>> {
        match self {
            SurfaceNode::Element { children, .. } => Some(children),
            SurfaceNode::Text { .. } => None,
        }
    }

    /// Concatenated text of all descendant text runs
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            SurfaceNode::Text { content } => out.push_str(content),
            SurfaceNode::Element { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }

    /// Depth-first search over this node and its descendants
    pub fn find<P>(&self, pred: &P) -> Option<&SurfaceNode>
    where
        P: Fn(&SurfaceNode) -> bool,
    {
        if pred(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(pred))
    }

    pub fn find_mut<P>(&mut self, pred: &P) -> Option<&mut SurfaceNode>
    where
        P: Fn(&SurfaceNode) -> bool,
    {
        if pred(&*self) {
            return Some(self);
        }
        match self {
            SurfaceNode::Element { children, .. } => {
                children.iter_mut().find_map(|child| child.find_mut(pred))
            }
            SurfaceNode::Text { .. } => None,
        }
    }
}

/// The materialized surface: root-level elements in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceFragment {
    pub nodes: Vec<SurfaceNode>,
}

impl SurfaceFragment {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_nodes(nodes: Vec<SurfaceNode>) -> Self {
        Self { nodes }
    }

    pub fn add_node(&mut self, node: SurfaceNode) {
        self.nodes.push(node);
    }

    /// First element anywhere in the fragment carrying `data-id == id`
    pub fn find_by_id(&self, id: &str) -> Option<&SurfaceNode> {
        let pred = |n: &SurfaceNode| n.attr(crate::markers::ATTR_ID) == Some(id);
        self.nodes.iter().find_map(|node| node.find(&pred))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut SurfaceNode> {
        let pred = |n: &SurfaceNode| n.attr(crate::markers::ATTR_ID) == Some(id);
        self.nodes.iter_mut().find_map(|node| node.find_mut(&pred))
    }

    pub fn text_content(&self) -> String {
        self.nodes.iter().map(SurfaceNode::text_content).collect()
    }
}
