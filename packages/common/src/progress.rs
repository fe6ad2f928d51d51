use crate::visitor::{walk_node, Visitor};
use jotter_model::EditorNode;
use std::fmt;

/// Checked/total count over every task item in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskProgress {
    pub done: usize,
    pub total: usize,
}

impl TaskProgress {
    pub fn of(nodes: &[EditorNode]) -> Self {
        let mut counter = ProgressCounter::default();
        counter.visit_document(nodes);
        counter.progress
    }

    pub fn has_tasks(&self) -> bool {
        self.total > 0
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

impl fmt::Display for TaskProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

#[derive(Default)]
struct ProgressCounter {
    progress: TaskProgress,
}

impl Visitor for ProgressCounter {
    fn visit_node(&mut self, node: &EditorNode) {
        if let EditorNode::TaskItem { checked, .. } = node {
            self.progress.total += 1;
            if *checked {
                self.progress.done += 1;
            }
        }
        walk_node(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, checked: bool) -> EditorNode {
        EditorNode::TaskItem {
            id: id.to_string(),
            checked,
            children: vec![EditorNode::text(id)],
        }
    }

    #[test]
    fn test_two_of_three() {
        let nodes = vec![
            EditorNode::TaskList {
                id: "tl1".to_string(),
                children: vec![item("a", true), item("b", false)],
            },
            EditorNode::fold(
                "f",
                vec![EditorNode::TaskList {
                    id: "tl2".to_string(),
                    children: vec![item("c", true)],
                }],
            ),
        ];

        let progress = TaskProgress::of(&nodes);
        assert_eq!(progress.to_string(), "2/3");
        assert!(progress.has_tasks());
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_no_tasks() {
        let progress = TaskProgress::of(&[EditorNode::empty_paragraph("p")]);
        assert_eq!(progress, TaskProgress::default());
        assert!(!progress.is_complete());
    }
}
