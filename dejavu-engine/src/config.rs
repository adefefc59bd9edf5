use crate::error::EngineError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Which request facets take part in fingerprinting, and how results are reported.
///
/// Every combination is valid. With everything off the fingerprint is just
/// method, origin and path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonConfig {
    pub static_images: bool,
    pub static_scripts: bool,
    pub static_fonts_media: bool,

    pub use_query_param_names: bool,
    pub use_query_param_values: bool,
    pub use_body_param_names: bool,
    pub use_body_param_values: bool,
    pub use_json_keys: bool,

    pub use_cookie_names: bool,
    pub use_cookie_values: bool,
    pub use_header_names: bool,
    pub use_header_values: bool,

    /// Report Duplicate and StaticAsset outcomes as Suppressed.
    pub disable_duplicate_marking: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            static_images: true,
            static_scripts: true,
            static_fonts_media: true,
            use_query_param_names: true,
            use_query_param_values: true,
            use_body_param_names: true,
            use_body_param_values: false,
            use_json_keys: true,
            use_cookie_names: false,
            use_cookie_values: false,
            use_header_names: false,
            use_header_values: false,
            disable_duplicate_marking: false,
        }
    }
}

/// A single switch in [`ComparisonConfig`], addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    StaticImages,
    StaticScripts,
    StaticFontsMedia,
    QueryParamNames,
    QueryParamValues,
    BodyParamNames,
    BodyParamValues,
    JsonKeys,
    CookieNames,
    CookieValues,
    HeaderNames,
    HeaderValues,
    DisableDuplicateMarking,
}

impl Toggle {
    pub const ALL: [Toggle; 13] = [
        Toggle::StaticImages,
        Toggle::StaticScripts,
        Toggle::StaticFontsMedia,
        Toggle::QueryParamNames,
        Toggle::QueryParamValues,
        Toggle::BodyParamNames,
        Toggle::BodyParamValues,
        Toggle::JsonKeys,
        Toggle::CookieNames,
        Toggle::CookieValues,
        Toggle::HeaderNames,
        Toggle::HeaderValues,
        Toggle::DisableDuplicateMarking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::StaticImages => "static-images",
            Toggle::StaticScripts => "static-scripts",
            Toggle::StaticFontsMedia => "static-fonts-media",
            Toggle::QueryParamNames => "query-names",
            Toggle::QueryParamValues => "query-values",
            Toggle::BodyParamNames => "body-names",
            Toggle::BodyParamValues => "body-values",
            Toggle::JsonKeys => "json-keys",
            Toggle::CookieNames => "cookie-names",
            Toggle::CookieValues => "cookie-values",
            Toggle::HeaderNames => "header-names",
            Toggle::HeaderValues => "header-values",
            Toggle::DisableDuplicateMarking => "no-duplicate-marking",
        }
    }
}

impl FromStr for Toggle {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Toggle::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| EngineError::UnknownToggle(s.to_string()))
    }
}

impl ComparisonConfig {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::StaticImages => self.static_images,
            Toggle::StaticScripts => self.static_scripts,
            Toggle::StaticFontsMedia => self.static_fonts_media,
            Toggle::QueryParamNames => self.use_query_param_names,
            Toggle::QueryParamValues => self.use_query_param_values,
            Toggle::BodyParamNames => self.use_body_param_names,
            Toggle::BodyParamValues => self.use_body_param_values,
            Toggle::JsonKeys => self.use_json_keys,
            Toggle::CookieNames => self.use_cookie_names,
            Toggle::CookieValues => self.use_cookie_values,
            Toggle::HeaderNames => self.use_header_names,
            Toggle::HeaderValues => self.use_header_values,
            Toggle::DisableDuplicateMarking => self.disable_duplicate_marking,
        }
    }

    pub fn set(&mut self, toggle: Toggle, enabled: bool) {
        let slot = match toggle {
            Toggle::StaticImages => &mut self.static_images,
            Toggle::StaticScripts => &mut self.static_scripts,
            Toggle::StaticFontsMedia => &mut self.static_fonts_media,
            Toggle::QueryParamNames => &mut self.use_query_param_names,
            Toggle::QueryParamValues => &mut self.use_query_param_values,
            Toggle::BodyParamNames => &mut self.use_body_param_names,
            Toggle::BodyParamValues => &mut self.use_body_param_values,
            Toggle::JsonKeys => &mut self.use_json_keys,
            Toggle::CookieNames => &mut self.use_cookie_names,
            Toggle::CookieValues => &mut self.use_cookie_values,
            Toggle::HeaderNames => &mut self.use_header_names,
            Toggle::HeaderValues => &mut self.use_header_values,
            Toggle::DisableDuplicateMarking => &mut self.disable_duplicate_marking,
        };
        *slot = enabled;
    }

    pub fn with(mut self, toggle: Toggle, enabled: bool) -> Self {
        self.set(toggle, enabled);
        self
    }

    /// A configuration with every comparison dimension and static group off.
    pub fn minimal() -> Self {
        Toggle::ALL
            .into_iter()
            .fold(Self::default(), |cfg, t| cfg.with(t, false))
    }
}

/// Published configuration snapshot.
///
/// Readers clone the current `Arc` once per classification; writers build a
/// new value and swap it in, so a single decision never sees a mix of old
/// and new flags.
#[derive(Debug, Default)]
pub struct SharedConfig {
    current: RwLock<Arc<ComparisonConfig>>,
}

impl SharedConfig {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<ComparisonConfig> {
        self.current.read().clone()
    }

    /// Apply `edit` to a copy of the current config and publish it.
    ///
    /// `then` runs while the write lock is still held and receives whether
    /// the published value differs from the previous one.
    pub fn update_with<F, T>(&self, edit: F, then: T) -> bool
    where
        F: FnOnce(&mut ComparisonConfig),
        T: FnOnce(bool),
    {
        let mut guard = self.current.write();
        let mut next = (**guard).clone();
        edit(&mut next);
        let changed = next != **guard;
        *guard = Arc::new(next);
        then(changed);
        changed
    }
}
