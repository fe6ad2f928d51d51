//! # Edit Guards
//!
//! Turns a key event at a caret position into a plan: reject it, move the
//! caret, or apply mutations. Atomic units (images, files, code blocks and
//! folds) are never edited as text; keystrokes around them follow a small
//! state machine:
//!
//! ```text
//! AtomicCore      ── input ──▶ new paragraph after the unit
//! AfterAtomic     ── backspace ──▶ AtomicSelected ── backspace ──▶ unit removed
//!                 ── enter/input ──▶ new paragraph after the unit
//! AtomicSelected  ── input ──▶ unit replaced by a paragraph
//! FoldContentEnd  ── arrow down ──▶ next sibling (created if missing)
//! ```
//!
//! Plain text carets fall through to the inline text operations.

use jotter_common::{children_of, find_node, locate, text_blocks_in_order};
use jotter_model::{EditorNode, IdGenerator, NodeKind};

use crate::mutations::Mutation;
use crate::selection::{caret_at_end, caret_at_start, Caret};
use crate::text_ops::{concat, delete_range, inline_len, insert_text, split_at};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Character input (typed or pasted text)
    Input(String),
    Backspace,
    Enter,
    ArrowDown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditPlan {
    /// Swallow the event
    Reject,
    MoveCaret(Caret),
    Mutate {
        mutations: Vec<Mutation>,
        /// `None` when no sensible position remains
        caret: Option<Caret>,
    },
}

pub fn plan_edit(
    event: &EditEvent,
    caret: &Caret,
    nodes: &[EditorNode],
    ids: &mut IdGenerator,
) -> EditPlan {
    match caret {
        Caret::Text { block_id, offset } => plan_text(event, block_id, *offset, nodes, ids),
        Caret::AtomicCore { node_id } => match event {
            EditEvent::Input(text) => paragraph_after(nodes, node_id, text, ids),
            EditEvent::ArrowDown => EditPlan::MoveCaret(Caret::AfterAtomic {
                node_id: node_id.clone(),
            }),
            EditEvent::Backspace | EditEvent::Enter => EditPlan::Reject,
        },
        Caret::AfterAtomic { node_id } => match event {
            EditEvent::Input(text) => paragraph_after(nodes, node_id, text, ids),
            EditEvent::Enter => paragraph_after(nodes, node_id, "", ids),
            EditEvent::Backspace => EditPlan::MoveCaret(Caret::AtomicSelected {
                node_id: node_id.clone(),
            }),
            EditEvent::ArrowDown => move_below(nodes, node_id, ids),
        },
        Caret::AtomicSelected { node_id } => match event {
            EditEvent::Backspace => remove_atomic(nodes, node_id),
            EditEvent::Input(text) => replace_atomic(nodes, node_id, text, ids),
            EditEvent::Enter => paragraph_after(nodes, node_id, "", ids),
            EditEvent::ArrowDown => move_below(nodes, node_id, ids),
        },
        Caret::FoldContentEnd { fold_id } => plan_fold_end(event, fold_id, nodes, ids),
    }
}

fn plan_text(
    event: &EditEvent,
    block_id: &str,
    offset: usize,
    nodes: &[EditorNode],
    ids: &mut IdGenerator,
) -> EditPlan {
    let Some(block) = find_node(nodes, block_id).filter(|b| b.is_text_block()) else {
        return EditPlan::Reject;
    };
    let children = block.children().map_or(&[][..], |c| c.as_slice());
    let offset = offset.min(inline_len(children));

    match event {
        EditEvent::Input(text) if text.is_empty() => EditPlan::Reject,
        EditEvent::Input(text) => EditPlan::Mutate {
            mutations: vec![Mutation::SetChildren {
                node_id: block_id.to_string(),
                children: insert_text(children, offset, text),
            }],
            caret: Some(Caret::text(block_id, offset + text.chars().count())),
        },
        EditEvent::Backspace if offset > 0 => EditPlan::Mutate {
            mutations: vec![Mutation::SetChildren {
                node_id: block_id.to_string(),
                children: delete_range(children, offset - 1, offset),
            }],
            caret: Some(Caret::text(block_id, offset - 1)),
        },
        EditEvent::Backspace => backspace_at_start(block, nodes),
        EditEvent::Enter => split_block(block, offset, nodes, ids),
        EditEvent::ArrowDown => arrow_down(block, nodes, ids),
    }
}

/// Backspace at offset 0: select a preceding atomic unit, drop a preceding
/// empty paragraph, or merge into the preceding text
fn backspace_at_start(block: &EditorNode, nodes: &[EditorNode]) -> EditPlan {
    let Some(id) = block.id() else {
        return EditPlan::Reject;
    };
    let Some(location) = locate(nodes, id) else {
        return EditPlan::Reject;
    };
    if location.index == 0 {
        return EditPlan::Reject;
    }
    let Some(prev) = children_of(nodes, location.parent_id.as_deref())
        .and_then(|siblings| siblings.get(location.index - 1))
    else {
        return EditPlan::Reject;
    };
    let Some(prev_id) = prev.id() else {
        return EditPlan::Reject;
    };

    match prev.kind() {
        kind if kind.is_atomic() => EditPlan::MoveCaret(Caret::AtomicSelected {
            node_id: prev_id.to_string(),
        }),
        NodeKind::Paragraph if prev.is_empty_block() => EditPlan::Mutate {
            mutations: vec![Mutation::RemoveNode {
                node_id: prev_id.to_string(),
            }],
            caret: Some(Caret::text(id, 0)),
        },
        NodeKind::List | NodeKind::TaskList => match prev.children().and_then(|c| c.last()) {
            Some(item) => merge_into(item, block),
            None => EditPlan::Reject,
        },
        kind if kind.is_text_block() => merge_into(prev, block),
        _ => EditPlan::Reject,
    }
}

fn merge_into(target: &EditorNode, block: &EditorNode) -> EditPlan {
    let (Some(target_id), Some(block_id)) = (target.id(), block.id()) else {
        return EditPlan::Reject;
    };
    let head = target.children().map_or(&[][..], |c| c.as_slice());
    let tail = block.children().map_or(&[][..], |c| c.as_slice());

    EditPlan::Mutate {
        mutations: vec![
            Mutation::SetChildren {
                node_id: target_id.to_string(),
                children: concat(head, tail),
            },
            Mutation::RemoveNode {
                node_id: block_id.to_string(),
            },
        ],
        caret: Some(Caret::text(target_id, inline_len(head))),
    }
}

fn split_block(block: &EditorNode, offset: usize, nodes: &[EditorNode], ids: &mut IdGenerator) -> EditPlan {
    let Some(id) = block.id() else {
        return EditPlan::Reject;
    };
    let Some(location) = locate(nodes, id) else {
        return EditPlan::Reject;
    };
    let children = block.children().map_or(&[][..], |c| c.as_slice());
    let is_item = matches!(block.kind(), NodeKind::ListItem | NodeKind::TaskItem);

    if is_item && inline_len(children) == 0 {
        return exit_list(id, location.parent_id.as_deref(), nodes, ids);
    }

    let (left, right) = split_at(children, offset);
    let new_id = ids.new_id();
    let new_block = match block.kind() {
        NodeKind::ListItem => EditorNode::ListItem {
            id: new_id.clone(),
            children: right,
        },
        NodeKind::TaskItem => EditorNode::TaskItem {
            id: new_id.clone(),
            checked: false,
            children: right,
        },
        _ => EditorNode::Paragraph {
            id: new_id.clone(),
            align: block.align().unwrap_or_default(),
            children: right,
        },
    };

    EditPlan::Mutate {
        mutations: vec![
            Mutation::SetChildren {
                node_id: id.to_string(),
                children: left,
            },
            Mutation::InsertNodes {
                parent_id: location.parent_id,
                index: location.index + 1,
                nodes: vec![new_block],
            },
        ],
        caret: Some(Caret::text(new_id, 0)),
    }
}

/// Enter on an empty item leaves the list for a paragraph below it
fn exit_list(
    item_id: &str,
    list_id: Option<&str>,
    nodes: &[EditorNode],
    ids: &mut IdGenerator,
) -> EditPlan {
    let Some(list_location) = list_id.and_then(|l| locate(nodes, l)) else {
        return EditPlan::Reject;
    };
    let paragraph_id = ids.new_id();

    EditPlan::Mutate {
        mutations: vec![
            Mutation::RemoveNode {
                node_id: item_id.to_string(),
            },
            Mutation::InsertNodes {
                parent_id: list_location.parent_id,
                index: list_location.index + 1,
                nodes: vec![EditorNode::empty_paragraph(paragraph_id.clone())],
            },
        ],
        caret: Some(Caret::text(paragraph_id, 0)),
    }
}

fn arrow_down(block: &EditorNode, nodes: &[EditorNode], ids: &mut IdGenerator) -> EditPlan {
    let Some(id) = block.id() else {
        return EditPlan::Reject;
    };

    // Last block of a fold's content: leave the fold
    if let Some(location) = locate(nodes, id) {
        if let Some(parent_id) = location.parent_id.as_deref() {
            let in_fold = find_node(nodes, parent_id).is_some_and(|p| p.kind() == NodeKind::Fold);
            let siblings = children_of(nodes, Some(parent_id)).map_or(0, |c| c.len());
            if in_fold && location.index + 1 == siblings {
                return move_below(nodes, parent_id, ids);
            }
        }
    }

    let blocks = text_blocks_in_order(nodes);
    blocks
        .iter()
        .position(|b| b.has_id(id))
        .and_then(|i| blocks.get(i + 1))
        .and_then(|next| caret_at_start(next))
        .map_or(EditPlan::Reject, EditPlan::MoveCaret)
}

/// Move to the block after `node_id`, creating a paragraph if none follows
fn move_below(nodes: &[EditorNode], node_id: &str, ids: &mut IdGenerator) -> EditPlan {
    let Some(location) = locate(nodes, node_id) else {
        return EditPlan::Reject;
    };
    let next = children_of(nodes, location.parent_id.as_deref())
        .and_then(|siblings| siblings.get(location.index + 1));

    match next.and_then(caret_at_start) {
        Some(caret) => EditPlan::MoveCaret(caret),
        None => paragraph_after(nodes, node_id, "", ids),
    }
}

fn paragraph_after(nodes: &[EditorNode], node_id: &str, text: &str, ids: &mut IdGenerator) -> EditPlan {
    let Some(location) = locate(nodes, node_id) else {
        return EditPlan::Reject;
    };
    let (paragraph, caret) = new_paragraph(text, ids);

    EditPlan::Mutate {
        mutations: vec![Mutation::InsertNodes {
            parent_id: location.parent_id,
            index: location.index + 1,
            nodes: vec![paragraph],
        }],
        caret: Some(caret),
    }
}

fn new_paragraph(text: &str, ids: &mut IdGenerator) -> (EditorNode, Caret) {
    let id = ids.new_id();
    let children = if text.is_empty() {
        vec![]
    } else {
        vec![EditorNode::text(text)]
    };
    let caret = Caret::text(id.clone(), text.chars().count());
    (EditorNode::paragraph(id, children), caret)
}

fn remove_atomic(nodes: &[EditorNode], node_id: &str) -> EditPlan {
    let Some(location) = locate(nodes, node_id) else {
        return EditPlan::Reject;
    };
    let siblings = children_of(nodes, location.parent_id.as_deref()).unwrap_or(&[]);

    let caret = siblings
        .get(location.index + 1)
        .and_then(caret_at_start)
        .or_else(|| {
            location
                .index
                .checked_sub(1)
                .and_then(|i| siblings.get(i))
                .and_then(caret_at_end)
        });

    EditPlan::Mutate {
        mutations: vec![Mutation::RemoveNode {
            node_id: node_id.to_string(),
        }],
        caret,
    }
}

fn replace_atomic(nodes: &[EditorNode], node_id: &str, text: &str, ids: &mut IdGenerator) -> EditPlan {
    let Some(location) = locate(nodes, node_id) else {
        return EditPlan::Reject;
    };
    let (paragraph, caret) = new_paragraph(text, ids);

    EditPlan::Mutate {
        mutations: vec![
            Mutation::RemoveNode {
                node_id: node_id.to_string(),
            },
            Mutation::InsertNodes {
                parent_id: location.parent_id,
                index: location.index,
                nodes: vec![paragraph],
            },
        ],
        caret: Some(caret),
    }
}

fn plan_fold_end(
    event: &EditEvent,
    fold_id: &str,
    nodes: &[EditorNode],
    ids: &mut IdGenerator,
) -> EditPlan {
    let Some(fold) = find_node(nodes, fold_id).filter(|f| f.kind() == NodeKind::Fold) else {
        return EditPlan::Reject;
    };
    let content = fold.children().map_or(&[][..], |c| c.as_slice());
    let last = content.last();

    match event {
        EditEvent::ArrowDown => move_below(nodes, fold_id, ids),
        EditEvent::Input(_) | EditEvent::Backspace if last.is_some_and(|l| l.is_text_block()) => {
            match last.and_then(caret_at_end) {
                Some(caret) => plan_edit(event, &caret, nodes, ids),
                None => EditPlan::Reject,
            }
        }
        EditEvent::Backspace => match last.and_then(EditorNode::id) {
            Some(id) => EditPlan::MoveCaret(Caret::AtomicSelected {
                node_id: id.to_string(),
            }),
            None => EditPlan::Reject,
        },
        EditEvent::Input(text) => append_to_fold(fold_id, content.len(), text, ids),
        EditEvent::Enter => append_to_fold(fold_id, content.len(), "", ids),
    }
}

fn append_to_fold(fold_id: &str, len: usize, text: &str, ids: &mut IdGenerator) -> EditPlan {
    let (paragraph, caret) = new_paragraph(text, ids);
    EditPlan::Mutate {
        mutations: vec![Mutation::InsertNodes {
            parent_id: Some(fold_id.to_string()),
            index: len,
            nodes: vec![paragraph],
        }],
        caret: Some(caret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> IdGenerator {
        IdGenerator::from_seed("n")
    }

    fn p(id: &str, text: &str) -> EditorNode {
        EditorNode::paragraph(id, vec![EditorNode::text(text)])
    }

    #[test]
    fn test_typing_in_atomic_core_creates_paragraph_after() {
        let nodes = vec![EditorNode::code("c1", "x", "rust")];
        let plan = plan_edit(
            &EditEvent::Input("a".to_string()),
            &Caret::AtomicCore {
                node_id: "c1".to_string(),
            },
            &nodes,
            &mut ids(),
        );
        assert_eq!(
            plan,
            EditPlan::Mutate {
                mutations: vec![Mutation::InsertNodes {
                    parent_id: None,
                    index: 1,
                    nodes: vec![p("n-1", "a")],
                }],
                caret: Some(Caret::text("n-1", 1)),
            }
        );
    }

    #[test]
    fn test_backspace_in_core_is_rejected() {
        let nodes = vec![EditorNode::image("i1", "u", None)];
        let caret = Caret::AtomicCore {
            node_id: "i1".to_string(),
        };
        assert_eq!(
            plan_edit(&EditEvent::Backspace, &caret, &nodes, &mut ids()),
            EditPlan::Reject
        );
    }

    #[test]
    fn test_backspace_after_image_selects_then_removes() {
        let nodes = vec![EditorNode::image("i1", "u", None), p("p1", "x")];

        let first = plan_edit(&EditEvent::Backspace, &Caret::text("p1", 0), &nodes, &mut ids());
        let selected = Caret::AtomicSelected {
            node_id: "i1".to_string(),
        };
        assert_eq!(first, EditPlan::MoveCaret(selected.clone()));

        let second = plan_edit(&EditEvent::Backspace, &selected, &nodes, &mut ids());
        assert_eq!(
            second,
            EditPlan::Mutate {
                mutations: vec![Mutation::RemoveNode {
                    node_id: "i1".to_string()
                }],
                caret: Some(Caret::text("p1", 0)),
            }
        );
    }

    #[test]
    fn test_backspace_merges_into_previous() {
        let nodes = vec![p("p1", "Hello"), p("p2", "World")];
        let plan = plan_edit(&EditEvent::Backspace, &Caret::text("p2", 0), &nodes, &mut ids());
        assert_eq!(
            plan,
            EditPlan::Mutate {
                mutations: vec![
                    Mutation::SetChildren {
                        node_id: "p1".to_string(),
                        children: vec![EditorNode::text("HelloWorld")],
                    },
                    Mutation::RemoveNode {
                        node_id: "p2".to_string()
                    },
                ],
                caret: Some(Caret::text("p1", 5)),
            }
        );
    }

    #[test]
    fn test_backspace_removes_empty_previous_paragraph() {
        let nodes = vec![EditorNode::empty_paragraph("p1"), p("p2", "x")];
        let plan = plan_edit(&EditEvent::Backspace, &Caret::text("p2", 0), &nodes, &mut ids());
        assert_eq!(
            plan,
            EditPlan::Mutate {
                mutations: vec![Mutation::RemoveNode {
                    node_id: "p1".to_string()
                }],
                caret: Some(Caret::text("p2", 0)),
            }
        );
    }

    #[test]
    fn test_backspace_at_document_start_is_rejected() {
        let nodes = vec![p("p1", "x")];
        assert_eq!(
            plan_edit(&EditEvent::Backspace, &Caret::text("p1", 0), &nodes, &mut ids()),
            EditPlan::Reject
        );
    }

    #[test]
    fn test_enter_splits_paragraph() {
        let nodes = vec![p("p1", "HelloWorld")];
        let plan = plan_edit(&EditEvent::Enter, &Caret::text("p1", 5), &nodes, &mut ids());
        assert_eq!(
            plan,
            EditPlan::Mutate {
                mutations: vec![
                    Mutation::SetChildren {
                        node_id: "p1".to_string(),
                        children: vec![EditorNode::text("Hello")],
                    },
                    Mutation::InsertNodes {
                        parent_id: None,
                        index: 1,
                        nodes: vec![p("n-1", "World")],
                    },
                ],
                caret: Some(Caret::text("n-1", 0)),
            }
        );
    }

    #[test]
    fn test_arrow_down_leaves_fold() {
        let nodes = vec![EditorNode::fold("f1", vec![p("p1", "in")])];

        let plan = plan_edit(&EditEvent::ArrowDown, &Caret::text("p1", 2), &nodes, &mut ids());
        assert_eq!(
            plan,
            EditPlan::Mutate {
                mutations: vec![Mutation::InsertNodes {
                    parent_id: None,
                    index: 1,
                    nodes: vec![EditorNode::empty_paragraph("n-1")],
                }],
                caret: Some(Caret::text("n-1", 0)),
            }
        );

        let with_next = vec![nodes[0].clone(), p("p2", "out")];
        let fold_end = Caret::FoldContentEnd {
            fold_id: "f1".to_string(),
        };
        assert_eq!(
            plan_edit(&EditEvent::ArrowDown, &fold_end, &with_next, &mut ids()),
            EditPlan::MoveCaret(Caret::text("p2", 0))
        );
    }

    #[test]
    fn test_enter_on_empty_item_exits_list() {
        let nodes = vec![EditorNode::TaskList {
            id: "tl".to_string(),
            children: vec![EditorNode::TaskItem {
                id: "t1".to_string(),
                checked: false,
                children: vec![],
            }],
        }];
        let plan = plan_edit(&EditEvent::Enter, &Caret::text("t1", 0), &nodes, &mut ids());
        let EditPlan::Mutate { mutations, caret } = plan else {
            panic!("expected mutations");
        };
        assert_eq!(
            mutations[0],
            Mutation::RemoveNode {
                node_id: "t1".to_string()
            }
        );
        assert_eq!(caret, Some(Caret::text("n-1", 0)));
    }
}
