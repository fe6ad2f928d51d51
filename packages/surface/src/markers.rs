//! Attribute vocabulary shared by the renderer and the parser.
//!
//! Whatever the renderer writes here the parser reads back under the same
//! name; derived display attributes (file size label, icons, highlight
//! tokens) are written but never read.

pub const ATTR_ID: &str = "data-id";
pub const ATTR_TYPE: &str = "data-type";
pub const ATTR_ROLE: &str = "data-role";
pub const ATTR_ALIGN: &str = "data-align";
pub const ATTR_WIDTH: &str = "data-width";
pub const ATTR_URL: &str = "data-url";
pub const ATTR_ASSET_PATH: &str = "data-asset-path";
pub const ATTR_FILE_NAME: &str = "data-file-name";
pub const ATTR_FILE_SIZE: &str = "data-file-size";
pub const ATTR_EXT: &str = "data-ext";
pub const ATTR_ICON: &str = "data-icon";
pub const ATTR_LANGUAGE: &str = "data-language";
pub const ATTR_FOLDED: &str = "data-folded";
pub const ATTR_CHECKED: &str = "data-checked";
pub const ATTR_TOKEN: &str = "data-token";
pub const ATTR_EDITABLE: &str = "contenteditable";

pub const TYPE_IMAGE: &str = "image";
pub const TYPE_FILE: &str = "file";
pub const TYPE_CODE: &str = "code";
pub const TYPE_FOLD: &str = "fold";
pub const TYPE_TASK_LIST: &str = "task-list";
pub const TYPE_TASK_ITEM: &str = "task-item";

/// Wrapper around an atomic unit and its trailing marker
pub const ROLE_ATOMIC: &str = "atomic";
/// Empty line after an atomic unit where the caret can rest
pub const ROLE_TRAILING: &str = "trailing";
/// Keeps empty containers from collapsing to zero height
pub const ROLE_PLACEHOLDER: &str = "placeholder";
pub const ROLE_CHECKBOX: &str = "checkbox";
pub const ROLE_TASK_CONTENT: &str = "task-content";
pub const ROLE_CODE_HEADER: &str = "code-header";
pub const ROLE_CODE_LANGUAGE: &str = "code-language";
pub const ROLE_CODE_CONTENT: &str = "code-content";
pub const ROLE_FOLD_HEADER: &str = "fold-header";
pub const ROLE_FOLD_CONTENT: &str = "fold-content";
pub const ROLE_FILE_ICON: &str = "file-icon";
pub const ROLE_FILE_NAME: &str = "file-name";
pub const ROLE_FILE_SIZE: &str = "file-size";

/// Element tags that never have children
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "br" | "img" | "input" | "hr" | "wbr" | "meta" | "link" | "source"
    )
}

/// `data-type` values that mark atomic units
pub fn is_atomic_type(value: &str) -> bool {
    matches!(value, TYPE_IMAGE | TYPE_FILE | TYPE_CODE | TYPE_FOLD)
}
