use jotter_assets::IconProvider;

/// File-type icons from the host platform.
///
/// No native icon source is wired up, so every lookup comes back empty and
/// file chrome falls back to its generic glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformIconProvider;

impl IconProvider for PlatformIconProvider {
    fn icon_for_extension(&self, _extension: &str) -> Result<String, String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jotter_assets::IconCache;

    #[test]
    fn test_empty_icons_are_cached_as_missing() {
        let mut cache = IconCache::new(PlatformIconProvider);
        assert_eq!(cache.icon_for("PDF"), None);
        assert_eq!(cache.icon_for("pdf"), None);
        assert_eq!(cache.cached_len(), 1);
    }
}
