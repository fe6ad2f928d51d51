//! # Jotter Assets
//!
//! Binary attachments stored next to a document, named by a hash of their
//! bytes so identical content is stored once. Unreferenced files are swept
//! on save.

pub mod error;
pub mod gc;
pub mod icons;
pub mod import;
pub mod naming;
pub mod store;

pub use error::{AssetError, AssetResult};
pub use gc::{collect_garbage, referenced_assets, GcReport};
pub use icons::{IconCache, IconProvider};
pub use import::{read_source, AssetImporter, AssetKind, ImportedAsset, PreparedAsset};
pub use naming::{
    asset_file_name, asset_path_for, content_id, display_name, extension_of, is_image_name,
    sanitize_extension, ASSETS_DIR, DEFAULT_DIGEST_LENGTH,
};
pub use store::{asset_path_of, AssetStore, MemoryAssetStore};
