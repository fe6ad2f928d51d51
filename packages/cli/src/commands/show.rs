use crate::config::Config;
use anyhow::Result;
use clap::Args;
use jotter_model::EditorNode;
use jotter_workspace::open_entry;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entry id
    pub entry: String,

    /// Print the rendered surface markup instead of an outline
    #[arg(long)]
    pub html: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let entries = config.entries(cwd);
    let session = open_entry(&entries, &args.entry, config.editor)?;

    if args.html {
        println!("{}", session.editor().render_markup());
    } else {
        let mut out = String::new();
        outline(session.editor().nodes(), 0, &mut out);
        print!("{}", out);
    }
    Ok(())
}

/// One line per block, children indented under folds and lists
pub(crate) fn outline(nodes: &[EditorNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let label = match node {
            EditorNode::TaskItem { checked, .. } => {
                format!("[{}] {}", if *checked { "x" } else { " " }, node.plain_text())
            }
            EditorNode::Fold { folded, .. } => {
                format!("fold{}", if *folded { " (folded)" } else { "" })
            }
            EditorNode::List { ordered, .. } => {
                let kind = if *ordered { "ordered list" } else { "list" };
                kind.to_string()
            }
            EditorNode::TaskList { .. } => "tasks".to_string(),
            EditorNode::Image { asset_path, url, .. } => {
                format!("image {}", asset_path.as_deref().unwrap_or(url))
            }
            EditorNode::File { file_name, .. } => {
                format!("file {}", file_name.as_deref().unwrap_or("(unnamed)"))
            }
            EditorNode::Code { language, content, .. } => {
                format!("code [{}] {} lines", language, content.lines().count())
            }
            other => format!("{}: {}", other.kind().as_str(), other.plain_text()),
        };
        out.push_str(&indent);
        out.push_str(&label);
        out.push('\n');

        let nested = matches!(
            node,
            EditorNode::Fold { .. } | EditorNode::List { .. } | EditorNode::TaskList { .. }
        );
        if nested {
            if let Some(children) = node.children() {
                outline(children, depth + 1, out);
            }
        }
    }
}
