// Extension groups for requests that are classified as static assets
// before any fingerprinting happens.

use crate::config::ComparisonConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetGroup {
    Images,
    ScriptsStyles,
    FontsMedia,
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico"];
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".css", ".map"];
const FONT_MEDIA_EXTENSIONS: &[&str] = &[
    ".woff", ".woff2", ".ttf", ".eot", ".mp4", ".webm", ".ogg", ".mp3",
];

impl AssetGroup {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AssetGroup::Images => IMAGE_EXTENSIONS,
            AssetGroup::ScriptsStyles => SCRIPT_EXTENSIONS,
            AssetGroup::FontsMedia => FONT_MEDIA_EXTENSIONS,
        }
    }

    fn enabled(&self, config: &ComparisonConfig) -> bool {
        match self {
            AssetGroup::Images => config.static_images,
            AssetGroup::ScriptsStyles => config.static_scripts,
            AssetGroup::FontsMedia => config.static_fonts_media,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.extensions().iter().any(|ext| path.ends_with(ext))
    }
}

/// The first enabled group whose extension list matches `path`.
///
/// `path` must already have its query string removed.
pub fn static_group(path: &str, config: &ComparisonConfig) -> Option<AssetGroup> {
    [
        AssetGroup::Images,
        AssetGroup::ScriptsStyles,
        AssetGroup::FontsMedia,
    ]
    .into_iter()
    .find(|group| group.enabled(config) && group.matches(path))
}
