use crate::config::{ComparisonConfig, SharedConfig, Toggle};
use crate::fingerprint::{Fingerprint, build_key};
use crate::registry::SeenRegistry;
use crate::request::InspectedRequest;
use crate::static_assets::static_group;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationDecision {
    /// First occurrence of this fingerprint.
    Unique,
    /// Fingerprint was already in the registry.
    Duplicate,
    /// Path matched an enabled static-asset group.
    StaticAsset,
    /// Duplicate or StaticAsset while duplicate marking is disabled.
    Suppressed,
}

impl ClassificationDecision {
    pub const ALL: [ClassificationDecision; 4] = [
        ClassificationDecision::Unique,
        ClassificationDecision::Duplicate,
        ClassificationDecision::StaticAsset,
        ClassificationDecision::Suppressed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationDecision::Unique => "unique",
            ClassificationDecision::Duplicate => "duplicate",
            ClassificationDecision::StaticAsset => "static_asset",
            ClassificationDecision::Suppressed => "suppressed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

/// Classifies requests as first-seen or repeat traffic.
///
/// Safe to share across threads; live classification and a history replay
/// may run at the same time against the same registry.
#[derive(Debug, Default)]
pub struct ClassificationEngine {
    config: SharedConfig,
    registry: Arc<SeenRegistry>,
}

impl ClassificationEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            config: SharedConfig::new(config),
            registry: Arc::new(SeenRegistry::new()),
        }
    }

    pub fn config(&self) -> Arc<ComparisonConfig> {
        self.config.snapshot()
    }

    pub fn registry(&self) -> &Arc<SeenRegistry> {
        &self.registry
    }

    pub fn classify<R: InspectedRequest + ?Sized>(&self, request: &R) -> ClassificationDecision {
        let config = self.config.snapshot();
        let path = request.path_without_query();

        if let Some(group) = static_group(path, &config) {
            debug!("{} {} is a static asset ({:?})", request.method(), path, group);
            return Self::report(ClassificationDecision::StaticAsset, &config);
        }

        let fingerprint = build_key(request, &config);
        let decision = if self.registry.insert_if_absent(fingerprint.clone()) {
            ClassificationDecision::Unique
        } else {
            ClassificationDecision::Duplicate
        };
        debug!("{:?}: {}", decision, fingerprint);

        Self::report(decision, &config)
    }

    /// The key `request` would be registered under with the current settings.
    pub fn fingerprint<R: InspectedRequest + ?Sized>(&self, request: &R) -> Fingerprint {
        build_key(request, &self.config.snapshot())
    }

    /// Forget every fingerprint seen so far.
    pub fn reset(&self) {
        let forgotten = self.registry.len();
        self.registry.clear();
        info!("Seen registry reset ({} fingerprints forgotten)", forgotten);
    }

    pub fn set_toggle(&self, toggle: Toggle, enabled: bool) -> bool {
        self.update_config(|cfg| cfg.set(toggle, enabled))
    }

    /// Edit the settings. The registry is cleared under the same write lock,
    /// so no fingerprint computed under the old rules survives the change.
    pub fn update_config<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut ComparisonConfig),
    {
        let registry = &self.registry;
        self.config.update_with(edit, |changed| {
            registry.clear();
            if changed {
                info!("Comparison settings changed; seen registry cleared");
            }
        })
    }

    pub fn replace_config(&self, config: ComparisonConfig) -> bool {
        self.update_config(|cfg| *cfg = config)
    }

    fn report(decision: ClassificationDecision, config: &ComparisonConfig) -> ClassificationDecision {
        match decision {
            ClassificationDecision::Duplicate | ClassificationDecision::StaticAsset
                if config.disable_duplicate_marking =>
            {
                ClassificationDecision::Suppressed
            }
            other => other,
        }
    }
}
