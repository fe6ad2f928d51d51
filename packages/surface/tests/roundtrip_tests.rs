use jotter_model::{Align, EditorNode, IdGenerator};
use jotter_surface::markers::*;
use jotter_surface::{enrich, parse_markup, render, to_markup, SurfaceFragment, SurfaceNode, SurfaceParser};

fn parse(fragment: &SurfaceFragment) -> Vec<EditorNode> {
    let mut ids = IdGenerator::from_seed("rt");
    SurfaceParser::new(&mut ids).parse(fragment)
}

fn rich_document() -> Vec<EditorNode> {
    vec![
        EditorNode::Heading1 {
            id: "h1".to_string(),
            align: Align::Center,
            children: vec![EditorNode::text("Title")],
        },
        EditorNode::paragraph(
            "p1",
            vec![
                EditorNode::text("Hello "),
                EditorNode::strong(vec![EditorNode::em(vec![EditorNode::text("big")])]),
                EditorNode::color("#ff0000", vec![EditorNode::text(" red")]),
            ],
        ),
        EditorNode::empty_paragraph("p2"),
        EditorNode::List {
            id: "l1".to_string(),
            ordered: true,
            children: vec![
                EditorNode::ListItem {
                    id: "li1".to_string(),
                    children: vec![EditorNode::text("one")],
                },
                EditorNode::ListItem {
                    id: "li2".to_string(),
                    children: vec![],
                },
            ],
        },
        EditorNode::TaskList {
            id: "t1".to_string(),
            children: vec![
                EditorNode::TaskItem {
                    id: "ti1".to_string(),
                    checked: true,
                    children: vec![EditorNode::text("done")],
                },
                EditorNode::TaskItem {
                    id: "ti2".to_string(),
                    checked: false,
                    children: vec![EditorNode::text("todo")],
                },
            ],
        },
        EditorNode::Image {
            id: "i1".to_string(),
            url: "asset://a.png".to_string(),
            asset_path: Some("assets/a.png".to_string()),
            width_percent: 40,
            align: Align::Right,
        },
        EditorNode::file(
            "f1",
            "asset://r.pdf",
            Some("report.pdf".to_string()),
            Some("assets/r.pdf".to_string()),
        ),
        EditorNode::code("c1", "fn main() {\n    let s = \"x\";\n}", "rust"),
        EditorNode::Fold {
            id: "fold1".to_string(),
            folded: true,
            children: vec![
                EditorNode::paragraph("fp1", vec![EditorNode::text("inside")]),
                EditorNode::fold("fold2", vec![EditorNode::code("c2", "", "plaintext")]),
            ],
        },
        EditorNode::fold("fold3", vec![]),
    ]
}

#[test]
fn test_parse_render_roundtrip() {
    let doc = rich_document();
    assert_eq!(parse(&render(&doc)), doc);
}

#[test]
fn test_roundtrip_through_markup() {
    let doc = rich_document();
    let html = to_markup(&render(&doc));
    assert_eq!(parse(&parse_markup(&html)), doc);
}

#[test]
fn test_enrichment_is_invisible_to_parser() {
    let doc = rich_document();
    let mut fragment = render(&doc);
    enrich(&mut fragment, |ext| (ext == "pdf").then(|| "aWNvbg==".to_string()));

    let icon = fragment
        .find_by_id("f1")
        .and_then(|core| core.find(&|n: &SurfaceNode| n.attr(ATTR_ROLE) == Some(ROLE_FILE_ICON)))
        .and_then(|n| n.attr(ATTR_ICON));
    assert_eq!(icon, Some("data:image/png;base64,aWNvbg=="));

    let tokens = fragment
        .find_by_id("c1")
        .and_then(|core| core.find(&|n: &SurfaceNode| n.attr(ATTR_TOKEN) == Some("keyword")));
    assert!(tokens.is_some());

    assert_eq!(parse(&fragment), doc);
}

#[test]
fn test_file_size_is_not_read_back() {
    let doc = vec![EditorNode::File {
        id: "f1".to_string(),
        url: "asset://r.pdf".to_string(),
        file_name: Some("r.pdf".to_string()),
        file_size: Some(4096),
        asset_path: None,
        align: Align::Left,
    }];

    match &parse(&render(&doc))[0] {
        EditorNode::File { file_size, .. } => assert!(file_size.is_none()),
        other => panic!("Expected file, got {:?}", other),
    }
}

#[test]
fn test_text_typed_after_atomic_becomes_paragraph() {
    let mut fragment = render(&[EditorNode::image("i1", "asset://a.png", None)]);

    // The user types into the trailing marker
    let wrapper = &mut fragment.nodes[0];
    let trailing = wrapper.children_mut().unwrap().last_mut().unwrap();
    *trailing.children_mut().unwrap() = vec![SurfaceNode::text("typed")];

    let nodes = parse(&fragment);
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].id(), Some("i1"));
    assert!(matches!(nodes[1], EditorNode::Paragraph { .. }));
    assert_eq!(nodes[1].plain_text(), "typed");
}

#[test]
fn test_atomic_recognized_inside_wrapper_noise() {
    let html = r#"<section><span><div data-type="code" data-id="c9" data-language="python"><pre><code data-role="code-content">print(1)</code></pre></div></span></section>"#;
    let nodes = parse(&parse_markup(html));
    assert_eq!(nodes, vec![EditorNode::code("c9", "print(1)", "python")]);
}

#[test]
fn test_host_html_with_nbsp_and_plain_divs() {
    let html = "<p data-id=\"p1\">a&nbsp;&nbsp;b</p><div>new line</div>";
    let nodes = parse(&parse_markup(html));
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].id(), Some("p1"));
    assert_eq!(nodes[0].plain_text(), "a  b");
    assert_eq!(nodes[1].plain_text(), "new line");
    assert_ne!(nodes[1].id(), Some("p1"));
}

#[test]
fn test_render_is_stable_across_calls() {
    let doc = rich_document();
    assert_eq!(to_markup(&render(&doc)), to_markup(&render(&doc)));
}

/// Text values that sit on the edges of the markup codec
const EDGE_TEXTS: &[&str] = &[
    " leading",
    "trailing ",
    "  both  ",
    "   ",
    "line\nbreak",
    "ends with newline\n",
    "&amp; stays literal",
    "<b>not bold</b>",
    "a &nbsp; b",
    "5 < 6 && 7 > 3",
    "&#169; &copy",
    "\"quoted\" 'single'",
    "tab\there",
    "émoji ✓ 日本",
];

fn text_document(text: &str) -> Vec<EditorNode> {
    vec![
        EditorNode::paragraph("p1", vec![EditorNode::text(text)]),
        EditorNode::Heading2 {
            id: "h1".to_string(),
            align: Align::Right,
            children: vec![EditorNode::strong(vec![EditorNode::text(text)])],
        },
        EditorNode::List {
            id: "l1".to_string(),
            ordered: false,
            children: vec![EditorNode::ListItem {
                id: "li1".to_string(),
                children: vec![EditorNode::text(text)],
            }],
        },
        EditorNode::TaskList {
            id: "t1".to_string(),
            children: vec![EditorNode::TaskItem {
                id: "ti1".to_string(),
                checked: false,
                children: vec![EditorNode::color("#00ff00", vec![EditorNode::text(text)])],
            }],
        },
        EditorNode::code("c1", text, "plaintext"),
        EditorNode::fold("fold1", vec![EditorNode::paragraph("fp1", vec![EditorNode::text(text)])]),
    ]
}

#[test]
fn test_edge_texts_survive_render_and_parse() {
    for text in EDGE_TEXTS {
        let doc = text_document(text);
        assert_eq!(parse(&render(&doc)), doc, "text {:?}", text);
    }
}

#[test]
fn test_edge_texts_survive_markup() {
    for text in EDGE_TEXTS {
        let doc = text_document(text);
        let html = to_markup(&render(&doc));
        assert_eq!(parse(&parse_markup(&html)), doc, "text {:?} via {}", text, html);
    }
}

#[test]
fn test_document_shapes_roundtrip() {
    let documents = vec![
        vec![EditorNode::empty_paragraph("p1")],
        vec![EditorNode::image("i1", "asset://a.png", Some("assets/a.png".to_string()))],
        vec![
            EditorNode::code("c1", "", "plaintext"),
            EditorNode::code("c2", "x", "python"),
        ],
        vec![EditorNode::fold(
            "f1",
            vec![EditorNode::fold(
                "f2",
                vec![EditorNode::fold("f3", vec![EditorNode::empty_paragraph("p1")])],
            )],
        )],
        vec![
            EditorNode::file("f1", "asset://a", None, None),
            EditorNode::file("f2", "asset://b", Some("b.txt".to_string()), None),
        ],
    ];

    for doc in documents {
        assert_eq!(parse(&render(&doc)), doc);
        assert_eq!(parse(&parse_markup(&to_markup(&render(&doc)))), doc);
    }
}
