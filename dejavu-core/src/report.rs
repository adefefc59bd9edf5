// Report generation from stored highlights

use crate::data::Database;
use crate::error::Result;
use chrono::Utc;
use colored::Colorize;
use dejavu_engine::ClassificationDecision;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Number of requests carrying each highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub unique: u64,
    pub duplicate: u64,
    pub static_asset: u64,
    pub suppressed: u64,
    pub total: u64,
}

impl ClassificationSummary {
    pub fn from_decisions<I>(decisions: I) -> Self
    where
        I: IntoIterator<Item = ClassificationDecision>,
    {
        let mut summary = Self::default();
        for decision in decisions {
            summary.add(decision, 1);
        }
        summary
    }

    pub fn from_counts(counts: &[(ClassificationDecision, u64)]) -> Self {
        let mut summary = Self::default();
        for (decision, count) in counts {
            summary.add(*decision, *count);
        }
        summary
    }

    pub fn add(&mut self, decision: ClassificationDecision, count: u64) {
        match decision {
            ClassificationDecision::Unique => self.unique += count,
            ClassificationDecision::Duplicate => self.duplicate += count,
            ClassificationDecision::StaticAsset => self.static_asset += count,
            ClassificationDecision::Suppressed => self.suppressed += count,
        }
        self.total += count;
    }

    pub fn count(&self, decision: ClassificationDecision) -> u64 {
        match decision {
            ClassificationDecision::Unique => self.unique,
            ClassificationDecision::Duplicate => self.duplicate,
            ClassificationDecision::StaticAsset => self.static_asset,
            ClassificationDecision::Suppressed => self.suppressed,
        }
    }

    /// Share of highlighted requests that were repeats, as a percentage.
    pub fn duplicate_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.duplicate as f64 * 100.0 / self.total as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub stored_requests: u64,
    pub summary: ClassificationSummary,
}

impl ReportData {
    /// Requests in the store that no replay has highlighted yet.
    pub fn unannotated(&self) -> u64 {
        self.stored_requests.saturating_sub(self.summary.total)
    }
}

pub fn gather_report_data(db: &Database) -> Result<ReportData> {
    let stored_requests = db.request_count()?;
    let summary = ClassificationSummary::from_counts(&db.annotation_counts()?);

    Ok(ReportData {
        stored_requests,
        summary,
    })
}

fn decision_label(decision: ClassificationDecision) -> &'static str {
    match decision {
        ClassificationDecision::Unique => "Unique",
        ClassificationDecision::Duplicate => "Duplicate",
        ClassificationDecision::StaticAsset => "Static asset",
        ClassificationDecision::Suppressed => "Suppressed",
    }
}

/// One request as it would appear in a highlighted history view.
pub fn highlight_line(id: u64, method: &str, url: &str, decision: ClassificationDecision) -> String {
    let line = format!("{:>6}  {:<7} {}", id, method, url);
    match decision {
        ClassificationDecision::Unique => line.cyan().to_string(),
        ClassificationDecision::Duplicate | ClassificationDecision::StaticAsset => {
            line.bright_black().to_string()
        }
        ClassificationDecision::Suppressed => line,
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();
    let rule = "━".repeat(60);

    report.push_str(&format!("{}\n", rule.bright_blue()));
    report.push_str(&format!("{}\n", "  DEJAVU HIGHLIGHT REPORT".bright_white().bold()));
    report.push_str(&format!("{}\n\n", rule.bright_blue()));

    report.push_str(&format!(
        "Generated:        {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Stored requests:  {}\n", data.stored_requests));
    report.push_str(&format!("Highlighted:      {}\n", data.summary.total));
    if data.unannotated() > 0 {
        report.push_str(&format!(
            "Not highlighted:  {}  (run `dejavu replay`)\n",
            data.unannotated()
        ));
    }
    report.push('\n');

    for decision in ClassificationDecision::ALL {
        let label = format!("{:<14}", decision_label(decision));
        let label = match decision {
            ClassificationDecision::Unique => label.cyan().bold(),
            ClassificationDecision::Duplicate | ClassificationDecision::StaticAsset => {
                label.bright_black().bold()
            }
            ClassificationDecision::Suppressed => label.normal(),
        };
        report.push_str(&format!("  {} {}\n", label, data.summary.count(decision)));
    }

    report.push_str(&format!(
        "\nDuplicate ratio:  {:.1}%\n",
        data.summary.duplicate_ratio()
    ));
    report.push_str(&format!("{}\n", rule.bright_blue()));

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Dejavu",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "history": {
                "stored_requests": data.stored_requests,
                "highlighted": data.summary.total,
                "not_highlighted": data.unannotated()
            },
            "summary": data.summary,
            "duplicate_ratio": data.summary.duplicate_ratio()
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
