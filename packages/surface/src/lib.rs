//! # Jotter Surface
//!
//! The editable surface is a derived projection of the document tree:
//!
//! ```text
//! Vec<EditorNode> ──Renderer──▶ SurfaceFragment ──(user edits)──▶ SurfaceFragment
//!        ▲                                                              │
//!        └───────────────────────SurfaceParser──────────────────────────┘
//! ```
//!
//! Rendering is deterministic and parsing is tolerant, so that for any tree
//! the parser produced, `parse(render(tree)) == tree`.

pub mod enrich;
pub mod markers;
pub mod markup;
pub mod parser;
pub mod renderer;
pub mod surface;

pub use enrich::{enrich, highlight, HighlightSpan, TokenClass};
pub use markup::{parse_markup, to_markup};
pub use parser::SurfaceParser;
pub use renderer::{format_file_size, render, RenderOptions, Renderer};
pub use surface::{SurfaceFragment, SurfaceNode};
