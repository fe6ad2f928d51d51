use crate::naming::sanitize_extension;
use std::collections::HashMap;
use tracing::debug;

/// Source of file-type icons, usually the host platform
pub trait IconProvider {
    /// Base64 PNG for an extension. Empty or `Err` means no icon.
    fn icon_for_extension(&self, extension: &str) -> Result<String, String>;
}

/// Per-extension memoizing wrapper around an [`IconProvider`]
///
/// Misses are cached too, so a failing provider is asked once per
/// extension.
pub struct IconCache<P: IconProvider> {
    provider: P,
    cache: HashMap<String, Option<String>>,
}

impl<P: IconProvider> IconCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
        }
    }

    pub fn icon_for(&mut self, extension: &str) -> Option<String> {
        let key = sanitize_extension(extension);
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let icon = match self.provider.icon_for_extension(&key) {
            Ok(data) if !data.is_empty() => Some(data),
            Ok(_) => None,
            Err(e) => {
                debug!(extension = %key, error = %e, "Icon lookup failed");
                None
            }
        };
        self.cache.insert(key, icon.clone());
        icon
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
