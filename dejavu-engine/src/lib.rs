pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod registry;
pub mod replay;
pub mod request;
pub mod static_assets;

pub use config::{ComparisonConfig, SharedConfig, Toggle};
pub use engine::{ClassificationDecision, ClassificationEngine};
pub use error::EngineError;
pub use fingerprint::{Fingerprint, build_key};
pub use static_assets::AssetGroup;
pub use registry::SeenRegistry;
pub use replay::{
    AnnotationSink, CollectingSink, HistoryProvider, HistoryReplayer, MemoryHistory,
    ReplayProgressCallback,
};
pub use request::{CapturedRequest, HttpHeader, HttpParameter, InspectedRequest, ParameterType};
