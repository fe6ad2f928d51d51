//! Command dispatcher behavior

use jotter_editor::{
    BlockStyle, Caret, Command, EditEvent, Editor, EditorConfig, EditorError, Selection, TextRange,
};
use jotter_model::{Align, EditorNode, IdGenerator};

fn editor(source: &str) -> Editor {
    Editor::load_with_ids(source, IdGenerator::from_seed("c"), EditorConfig::default())
}

fn hello() -> Editor {
    editor(r#"[{"type":"paragraph","id":"p1","children":[{"type":"text","value":"Hello world"}]}]"#)
}

fn select(editor: &mut Editor, block: &str, start: usize, end: usize) {
    editor.set_selection(Selection::Range(TextRange {
        block_id: block.to_string(),
        start,
        end,
    }));
}

#[test]
fn test_bold_uses_saved_selection_after_blur() {
    let mut editor = hello();
    select(&mut editor, "p1", 0, 5);
    editor.save_selection();
    editor.blur();

    let outcome = editor.dispatch(Command::Bold).unwrap();

    assert!(outcome.changed);
    assert_eq!(
        editor.nodes()[0],
        EditorNode::paragraph(
            "p1",
            vec![
                EditorNode::strong(vec![EditorNode::text("Hello")]),
                EditorNode::text(" world"),
            ]
        )
    );
    assert!(editor.render_markup().contains("<strong>Hello</strong>"));
}

#[test]
fn test_bold_twice_toggles_off() {
    let mut editor = hello();
    select(&mut editor, "p1", 0, 5);
    editor.dispatch(Command::Bold).unwrap();
    editor.dispatch(Command::Bold).unwrap();
    assert_eq!(
        editor.nodes()[0],
        EditorNode::paragraph("p1", vec![EditorNode::text("Hello world")])
    );
}

#[test]
fn test_color_and_italic() {
    let mut editor = hello();
    select(&mut editor, "p1", 6, 11);
    editor.dispatch(Command::Color("#e03131".to_string())).unwrap();
    editor.dispatch(Command::Italic).unwrap();

    assert_eq!(
        editor.nodes()[0],
        EditorNode::paragraph(
            "p1",
            vec![
                EditorNode::text("Hello "),
                EditorNode::color("#e03131", vec![EditorNode::em(vec![EditorNode::text("world")])]),
            ]
        )
    );
}

#[test]
fn test_formatting_without_range_is_a_no_op() {
    let mut editor = hello();
    editor.set_caret(Caret::text("p1", 2));
    assert!(!editor.dispatch(Command::Bold).unwrap().changed);
    assert!(!editor.can_undo());
}

#[test]
fn test_heading_and_alignment() {
    let mut editor = hello();
    editor.set_caret(Caret::text("p1", 0));

    editor.dispatch(Command::BlockStyle(BlockStyle::Heading1)).unwrap();
    editor.dispatch(Command::Align(Align::Center)).unwrap();

    assert_eq!(
        editor.nodes()[0],
        EditorNode::Heading1 {
            id: "p1".to_string(),
            align: Align::Center,
            children: vec![EditorNode::text("Hello world")],
        }
    );

    editor.dispatch(Command::Undo).unwrap();
    editor.dispatch(Command::Undo).unwrap();
    assert!(matches!(editor.nodes()[0], EditorNode::Paragraph { align: Align::Left, .. }));
}

#[test]
fn test_list_wrap_switch_and_unwrap() {
    let mut editor = hello();
    editor.set_caret(Caret::text("p1", 3));

    editor.dispatch(Command::List { ordered: false }).unwrap();
    let item_id = match &editor.nodes()[0] {
        EditorNode::List {
            ordered: false,
            children,
            ..
        } => children[0].id().unwrap().to_string(),
        other => panic!("expected list, got {:?}", other),
    };
    assert_eq!(editor.selection().caret(), Some(Caret::text(item_id.clone(), 3)));

    editor.dispatch(Command::List { ordered: true }).unwrap();
    assert!(matches!(editor.nodes()[0], EditorNode::List { ordered: true, .. }));

    editor.dispatch(Command::List { ordered: true }).unwrap();
    assert_eq!(
        editor.nodes(),
        &[EditorNode::paragraph(item_id, vec![EditorNode::text("Hello world")])]
    );
}

#[test]
fn test_structural_commands_share_the_undo_log() {
    let mut editor = hello();
    editor.set_caret(Caret::text("p1", 11));

    editor.dispatch(Command::InsertTaskList).unwrap();
    editor.handle_edit(EditEvent::Input("buy milk".to_string())).unwrap();
    assert_eq!(editor.nodes().len(), 2);
    assert_eq!(editor.task_progress().to_string(), "0/1");

    editor.dispatch(Command::Undo).unwrap();
    editor.dispatch(Command::Undo).unwrap();
    assert_eq!(editor.nodes().len(), 1);

    editor.dispatch(Command::Redo).unwrap();
    assert_eq!(editor.nodes().len(), 2);
}

#[test]
fn test_insert_replaces_empty_paragraph() {
    let mut editor = editor(r#"[{"type":"paragraph","id":"p1"}]"#);
    editor.set_caret(Caret::text("p1", 0));

    editor
        .dispatch(Command::InsertCode {
            language: Some("rust".to_string()),
        })
        .unwrap();

    assert_eq!(editor.nodes().len(), 1);
    assert!(matches!(&editor.nodes()[0], EditorNode::Code { language, .. } if language == "rust"));
}

#[test]
fn test_insert_without_selection_appends() {
    let mut editor = hello();
    editor.dispatch(Command::InsertCode { language: None }).unwrap();

    assert_eq!(editor.nodes().len(), 2);
    assert!(matches!(&editor.nodes()[1], EditorNode::Code { language, .. } if language == "plaintext"));
}

#[test]
fn test_node_commands() {
    let mut editor = editor(
        r#"[
            {"type":"taskList","id":"tl","children":[{"type":"taskItem","id":"t1"}]},
            {"type":"fold","id":"f1","children":[{"type":"paragraph","id":"p1"}]},
            {"type":"code","id":"c1","content":"fn main() {}","language":"rust"},
            {"type":"image","id":"i1","url":"u"},
            {"type":"file","id":"d1","url":"u","fileName":"a.pdf"}
        ]"#,
    );

    editor.dispatch(Command::ToggleCheckbox { node_id: "t1".to_string() }).unwrap();
    editor.dispatch(Command::ToggleFold { node_id: "f1".to_string() }).unwrap();
    editor
        .dispatch(Command::SetCodeLanguage {
            node_id: "c1".to_string(),
            language: "  ".to_string(),
        })
        .unwrap();
    editor
        .dispatch(Command::SetImageWidth {
            node_id: "i1".to_string(),
            width_percent: 5,
        })
        .unwrap();
    editor
        .dispatch(Command::SetFileAlign {
            node_id: "d1".to_string(),
            align: Align::Right,
        })
        .unwrap();

    assert_eq!(editor.task_progress().to_string(), "1/1");
    assert!(matches!(editor.document().find("f1"), Some(EditorNode::Fold { folded: true, .. })));
    assert!(matches!(
        editor.document().find("c1"),
        Some(EditorNode::Code { language, .. }) if language == "plaintext"
    ));
    assert!(matches!(
        editor.document().find("i1"),
        Some(EditorNode::Image { width_percent: 10, .. })
    ));
    assert_eq!(editor.document().find("d1").and_then(|n| n.align()), Some(Align::Right));

    let copied = editor.dispatch(Command::CopyCode { node_id: "c1".to_string() }).unwrap();
    assert!(!copied.changed);
    assert_eq!(copied.clipboard.as_deref(), Some("fn main() {}"));
}

#[test]
fn test_node_commands_check_kind() {
    let mut editor = hello();
    assert!(matches!(
        editor.dispatch(Command::ToggleFold { node_id: "p1".to_string() }),
        Err(EditorError::WrongKind { .. })
    ));
    assert!(matches!(
        editor.dispatch(Command::SetImageAlign {
            node_id: "p1".to_string(),
            align: Align::Center,
        }),
        Err(EditorError::WrongKind { .. })
    ));
    assert!(matches!(
        editor.dispatch(Command::DeleteBlock { node_id: "nope".to_string() }),
        Err(EditorError::UnknownNode(_))
    ));
}

#[test]
fn test_deleting_last_task_drops_the_list() {
    let mut editor = editor(
        r#"[
            {"type":"paragraph","id":"p1"},
            {"type":"taskList","id":"tl","children":[{"type":"taskItem","id":"t1"}]}
        ]"#,
    );
    editor.dispatch(Command::DeleteBlock { node_id: "t1".to_string() }).unwrap();
    assert!(editor.document().find("tl").is_none());

    editor.dispatch(Command::DeleteBlock { node_id: "p1".to_string() }).unwrap();
    assert_eq!(editor.nodes().len(), 1);
    assert!(editor.nodes()[0].is_empty_block());
}

#[test]
fn test_typing_around_code_block() {
    let mut editor = editor(r#"[{"type":"code","id":"c1","content":"x","language":"rust"}]"#);
    editor.set_caret(Caret::AtomicCore {
        node_id: "c1".to_string(),
    });

    assert!(editor.handle_edit(EditEvent::Input("a".to_string())).unwrap());
    assert_eq!(editor.nodes().len(), 2);
    assert_eq!(editor.nodes()[1].plain_text(), "a");

    editor.handle_edit(EditEvent::Enter).unwrap();
    editor.handle_edit(EditEvent::Input("b".to_string())).unwrap();
    assert_eq!(editor.nodes().len(), 3);
    assert_eq!(editor.nodes()[2].plain_text(), "b");
}

#[test]
fn test_insert_at_fold_content_end_goes_into_the_fold() {
    let mut editor = editor(
        r#"[
            {"type":"fold","id":"f1","children":[
                {"type":"fold","id":"f2","children":[{"type":"paragraph","id":"p1","children":[{"type":"text","value":"x"}]}]}
            ]},
            {"type":"paragraph","id":"p2"}
        ]"#,
    );
    editor.set_caret(Caret::FoldContentEnd {
        fold_id: "f2".to_string(),
    });
    editor.dispatch(Command::InsertCode { language: None }).unwrap();

    let f2 = &editor.nodes()[0].children().unwrap()[0];
    let kinds: Vec<_> = f2.children().unwrap().iter().map(|n| n.kind().as_str()).collect();
    assert_eq!(kinds, vec!["paragraph", "code"]);
    assert_eq!(editor.nodes().len(), 2);
}

#[test]
fn test_fold_at_deepest_content_end_is_rejected() {
    let mut editor = editor(
        r#"[{"type":"fold","id":"f1","children":[
            {"type":"fold","id":"f2","children":[
                {"type":"fold","id":"f3","children":[{"type":"paragraph","id":"p1"}]}
            ]}
        ]}]"#,
    );
    let before = editor.nodes().to_vec();
    editor.set_caret(Caret::FoldContentEnd {
        fold_id: "f3".to_string(),
    });

    assert!(matches!(
        editor.dispatch(Command::InsertFold),
        Err(EditorError::Mutation(_))
    ));
    assert_eq!(editor.nodes(), before.as_slice());
    assert!(!editor.can_undo());
}
