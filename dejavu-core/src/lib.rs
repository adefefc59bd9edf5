pub mod data;
pub mod error;
pub mod history;
pub mod report;
pub mod settings;

pub use data::Database;
pub use error::{CoreError, Result};
pub use history::{HistoryFile, HistoryRecord};
pub use report::{ClassificationSummary, ReportFormat};
