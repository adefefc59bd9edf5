// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_config, classify_records, import_history, initialize_installation, render_config,
    render_report, replay_database,
};
