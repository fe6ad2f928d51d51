//! # Commands
//!
//! Toolbar and context-menu actions. Formatting commands act on the
//! selection the user made before clicking the toolbar, so they restore the
//! saved selection first; structural commands insert at the cursor or act
//! on a node by id.

use jotter_assets::ImportedAsset;
use jotter_common::locate;
use jotter_model::{Align, EditorNode, NodeKind};
use tracing::{debug, instrument};

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::mutations::Mutation;
use crate::selection::{Caret, InsertionPoint, Selection};
use crate::text_ops::{apply_format, Format};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Paragraph,
    Heading1,
    Heading2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bold,
    Italic,
    Color(String),
    ClearColor,
    BlockStyle(BlockStyle),
    List { ordered: bool },
    Align(Align),
    Undo,
    Redo,

    InsertCode { language: Option<String> },
    InsertFold,
    InsertTaskList,
    InsertAsset {
        asset: ImportedAsset,
        url: String,
        /// Position captured before an asynchronous import started
        at: Option<InsertionPoint>,
    },

    ToggleCheckbox { node_id: String },
    ToggleFold { node_id: String },
    DeleteBlock { node_id: String },
    SetCodeLanguage { node_id: String, language: String },
    SetCodeContent { node_id: String, content: String },
    SetImageWidth { node_id: String, width_percent: u32 },
    SetImageAlign { node_id: String, align: Align },
    SetFileAlign { node_id: String, align: Align },
    CopyCode { node_id: String },
}

impl Command {
    /// Commands that act on the selection made before the toolbar click
    pub fn uses_saved_selection(&self) -> bool {
        matches!(
            self,
            Command::Bold
                | Command::Italic
                | Command::Color(_)
                | Command::ClearColor
                | Command::BlockStyle(_)
                | Command::List { .. }
                | Command::Align(_)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub changed: bool,
    /// Text for the host to put on the clipboard
    pub clipboard: Option<String>,
}

impl CommandOutcome {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            clipboard: None,
        }
    }
}

impl Editor {
    #[instrument(skip(self), fields(version = self.version()))]
    pub fn dispatch(&mut self, command: Command) -> EditorResult<CommandOutcome> {
        if command.uses_saved_selection() && self.selection().current().is_none() {
            self.restore_selection();
        }

        let changed = match command {
            Command::Bold => self.format_selection(Format::Bold)?,
            Command::Italic => self.format_selection(Format::Italic)?,
            Command::Color(hex) => self.format_selection(Format::Color(hex))?,
            Command::ClearColor => self.format_selection(Format::ClearColor)?,
            Command::BlockStyle(style) => self.set_block_style(style)?,
            Command::List { ordered } => self.toggle_list(ordered)?,
            Command::Align(align) => self.align_current(align)?,
            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,

            Command::InsertCode { language } => {
                let language = language
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| self.config().default_code_language.clone());
                let id = self.new_id();
                let inserted =
                    self.insert_blocks(vec![EditorNode::code(id.clone(), "", language)], "insert code")?;
                if !inserted.is_empty() {
                    self.set_caret(Caret::AtomicCore { node_id: id });
                }
                true
            }
            Command::InsertFold => {
                let fold_id = self.new_id();
                let paragraph_id = self.new_id();
                let fold = EditorNode::fold(fold_id, vec![EditorNode::empty_paragraph(paragraph_id.clone())]);
                self.insert_blocks(vec![fold], "insert fold")?;
                self.set_caret(Caret::text(paragraph_id, 0));
                true
            }
            Command::InsertTaskList => {
                let list_id = self.new_id();
                let item_id = self.new_id();
                let list = EditorNode::TaskList {
                    id: list_id,
                    children: vec![EditorNode::TaskItem {
                        id: item_id.clone(),
                        checked: false,
                        children: vec![],
                    }],
                };
                self.insert_blocks(vec![list], "insert task list")?;
                self.set_caret(Caret::text(item_id, 0));
                true
            }
            Command::InsertAsset { asset, url, at } => {
                let id = self.new_id();
                let node = asset.to_node(id, url);
                match at {
                    Some(point) => self.insert_at(&point, vec![node], "attach")?,
                    None => self.insert_blocks(vec![node], "attach")?,
                };
                true
            }

            Command::ToggleCheckbox { node_id } => {
                let checked = match self.expect_node(&node_id)? {
                    EditorNode::TaskItem { checked, .. } => *checked,
                    _ => return Err(wrong_kind(node_id, "a task item")),
                };
                self.apply_one(Mutation::SetChecked {
                    node_id,
                    checked: !checked,
                })?
            }
            Command::ToggleFold { node_id } => {
                let folded = match self.expect_node(&node_id)? {
                    EditorNode::Fold { folded, .. } => *folded,
                    _ => return Err(wrong_kind(node_id, "a fold")),
                };
                self.apply_one(Mutation::SetFolded {
                    node_id,
                    folded: !folded,
                })?
            }
            Command::DeleteBlock { node_id } => {
                self.expect_node(&node_id)?;
                self.apply_one(Mutation::RemoveNode { node_id })?
            }
            Command::SetCodeLanguage { node_id, language } => {
                self.expect_kind(&node_id, NodeKind::Code, "a code block")?;
                self.apply_one(Mutation::SetCodeLanguage { node_id, language })?
            }
            Command::SetCodeContent { node_id, content } => {
                self.expect_kind(&node_id, NodeKind::Code, "a code block")?;
                self.apply_one(Mutation::SetCodeContent { node_id, content })?
            }
            Command::SetImageWidth {
                node_id,
                width_percent,
            } => {
                self.expect_kind(&node_id, NodeKind::Image, "an image")?;
                self.apply_one(Mutation::SetImageWidth {
                    node_id,
                    width_percent,
                })?
            }
            Command::SetImageAlign { node_id, align } => {
                self.expect_kind(&node_id, NodeKind::Image, "an image")?;
                self.apply_one(Mutation::SetAlign { node_id, align })?
            }
            Command::SetFileAlign { node_id, align } => {
                self.expect_kind(&node_id, NodeKind::File, "a file")?;
                self.apply_one(Mutation::SetAlign { node_id, align })?
            }
            Command::CopyCode { node_id } => {
                let content = match self.expect_node(&node_id)? {
                    EditorNode::Code { content, .. } => content.clone(),
                    _ => return Err(wrong_kind(node_id, "a code block")),
                };
                return Ok(CommandOutcome {
                    changed: false,
                    clipboard: Some(content),
                });
            }
        };

        Ok(CommandOutcome::changed(changed))
    }

    fn apply_one(&mut self, mutation: Mutation) -> EditorResult<bool> {
        let description = mutation.name();
        self.apply(vec![mutation], description)?;
        Ok(true)
    }

    fn expect_kind(&self, id: &str, kind: NodeKind, expected: &'static str) -> EditorResult<()> {
        if self.expect_node(id)?.kind() == kind {
            Ok(())
        } else {
            Err(wrong_kind(id.to_string(), expected))
        }
    }

    fn format_selection(&mut self, format: Format) -> EditorResult<bool> {
        let Some(Selection::Range(range)) = self.selection().current().cloned() else {
            debug!("Formatting without a range");
            return Ok(false);
        };
        let Some(block) = self.document().find(&range.block_id).filter(|b| b.is_text_block()) else {
            return Ok(false);
        };

        let children = block.children().map_or(&[][..], |c| c.as_slice());
        let formatted = apply_format(children, range.start, range.end, &format);
        if formatted.as_slice() == children {
            return Ok(false);
        }

        self.apply(
            vec![Mutation::SetChildren {
                node_id: range.block_id.clone(),
                children: formatted,
            }],
            "format",
        )?;
        self.set_selection(Selection::Range(range));
        Ok(true)
    }

    fn current_block(&self) -> Option<EditorNode> {
        let id = self.selection().current()?.node_id().to_string();
        self.document().find(&id).cloned()
    }

    fn set_block_style(&mut self, style: BlockStyle) -> EditorResult<bool> {
        let Some(block) = self.current_block() else {
            return Ok(false);
        };
        let (id, align, children) = match block {
            EditorNode::Paragraph { id, align, children }
            | EditorNode::Heading1 { id, align, children }
            | EditorNode::Heading2 { id, align, children } => (id, align, children),
            _ => return Ok(false),
        };

        let replacement = match style {
            BlockStyle::Paragraph => EditorNode::Paragraph {
                id: id.clone(),
                align,
                children,
            },
            BlockStyle::Heading1 => EditorNode::Heading1 {
                id: id.clone(),
                align,
                children,
            },
            BlockStyle::Heading2 => EditorNode::Heading2 {
                id: id.clone(),
                align,
                children,
            },
        };
        if self.document().find(&id) == Some(&replacement) {
            return Ok(false);
        }

        self.apply(
            vec![Mutation::ReplaceNode {
                node_id: id,
                node: replacement,
            }],
            "block style",
        )?;
        Ok(true)
    }

    /// Wrap the current block in a list, switch the list kind, or unwrap it
    /// when it already has the requested kind
    fn toggle_list(&mut self, ordered: bool) -> EditorResult<bool> {
        let Some(block) = self.current_block() else {
            return Ok(false);
        };
        let Some(block_id) = block.id().map(str::to_string) else {
            return Ok(false);
        };
        let offset = match self.selection().caret() {
            Some(Caret::Text { offset, .. }) => offset,
            _ => 0,
        };

        match block {
            EditorNode::Paragraph { children, .. }
            | EditorNode::Heading1 { children, .. }
            | EditorNode::Heading2 { children, .. } => {
                let list_id = self.new_id();
                let item_id = self.new_id();
                self.apply(
                    vec![Mutation::ReplaceNode {
                        node_id: block_id,
                        node: EditorNode::List {
                            id: list_id,
                            ordered,
                            children: vec![EditorNode::ListItem {
                                id: item_id.clone(),
                                children,
                            }],
                        },
                    }],
                    "list",
                )?;
                self.set_caret(Caret::text(item_id, offset));
                Ok(true)
            }
            EditorNode::ListItem { .. } => {
                let Some(list_id) = locate(self.nodes(), &block_id).and_then(|l| l.parent_id) else {
                    return Ok(false);
                };
                let Some(EditorNode::List {
                    ordered: current,
                    children,
                    ..
                }) = self.document().find(&list_id).cloned()
                else {
                    return Ok(false);
                };

                if current != ordered {
                    let list = EditorNode::List {
                        id: list_id.clone(),
                        ordered,
                        children,
                    };
                    self.apply(
                        vec![Mutation::ReplaceNode {
                            node_id: list_id,
                            node: list,
                        }],
                        "list",
                    )?;
                } else {
                    self.unwrap_list(&list_id, children)?;
                }
                self.set_caret(Caret::text(block_id, offset));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Replace a list with one paragraph per item, keeping item ids
    fn unwrap_list(&mut self, list_id: &str, items: Vec<EditorNode>) -> EditorResult<()> {
        let Some(location) = locate(self.nodes(), list_id) else {
            return Ok(());
        };
        let paragraphs: Vec<EditorNode> = items
            .into_iter()
            .filter_map(|item| match item {
                EditorNode::ListItem { id, children } => Some(EditorNode::paragraph(id, children)),
                _ => None,
            })
            .collect();
        debug!(list_id, paragraphs = paragraphs.len(), "Unwrapping list");

        self.apply(
            vec![
                Mutation::RemoveNode {
                    node_id: list_id.to_string(),
                },
                Mutation::InsertNodes {
                    parent_id: location.parent_id,
                    index: location.index,
                    nodes: paragraphs,
                },
            ],
            "list",
        )?;
        Ok(())
    }

    fn align_current(&mut self, align: Align) -> EditorResult<bool> {
        let Some(block) = self.current_block() else {
            return Ok(false);
        };
        let (Some(id), Some(current)) = (block.id(), block.align()) else {
            return Ok(false);
        };
        if current == align {
            return Ok(false);
        }
        self.apply_one(Mutation::SetAlign {
            node_id: id.to_string(),
            align,
        })
    }
}

fn wrong_kind(id: String, expected: &'static str) -> EditorError {
    EditorError::WrongKind { id, expected }
}
