// Tests for report generation functionality

use dejavu_core::report::{
    ClassificationSummary, ReportData, ReportFormat, gather_report_data, generate_json_report,
    generate_text_report, highlight_line, save_report,
};
use dejavu_core::{Database, HistoryRecord};
use dejavu_engine::ClassificationDecision;
use tempfile::TempDir;

use ClassificationDecision::{Duplicate, StaticAsset, Suppressed, Unique};

fn sample_data() -> ReportData {
    ReportData {
        stored_requests: 6,
        summary: ClassificationSummary::from_decisions([Unique, Duplicate, Duplicate, StaticAsset]),
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("txt"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("Json"), Some(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert_eq!(ReportFormat::from_str("csv"), None);
    assert_eq!(ReportFormat::from_str(""), None);
}

// ============================================================================
// Summary Tests
// ============================================================================

#[test]
fn test_summary_from_decisions() {
    let summary = ClassificationSummary::from_decisions([Unique, Duplicate, Suppressed, Unique]);
    assert_eq!(summary.unique, 2);
    assert_eq!(summary.duplicate, 1);
    assert_eq!(summary.static_asset, 0);
    assert_eq!(summary.suppressed, 1);
    assert_eq!(summary.total, 4);
}

#[test]
fn test_summary_from_counts_matches_from_decisions() {
    let from_counts = ClassificationSummary::from_counts(&[(Unique, 1), (Duplicate, 2), (StaticAsset, 1)]);
    assert_eq!(from_counts, sample_data().summary);
}

#[test]
fn test_summary_count_accessor() {
    let summary = sample_data().summary;
    assert_eq!(summary.count(Duplicate), 2);
    assert_eq!(summary.count(Suppressed), 0);
}

#[test]
fn test_duplicate_ratio() {
    assert_eq!(sample_data().summary.duplicate_ratio(), 50.0);
    assert_eq!(ClassificationSummary::default().duplicate_ratio(), 0.0);
}

#[test]
fn test_unannotated_count() {
    assert_eq!(sample_data().unannotated(), 2);

    let over = ReportData {
        stored_requests: 0,
        summary: sample_data().summary,
    };
    assert_eq!(over.unannotated(), 0);
}

// ============================================================================
// Report Generation Tests
// ============================================================================

#[test]
fn test_generate_text_report() {
    let report = generate_text_report(&sample_data());

    assert!(report.contains("DEJAVU HIGHLIGHT REPORT"));
    assert!(report.contains("Stored requests:  6"));
    assert!(report.contains("Highlighted:      4"));
    assert!(report.contains("Not highlighted:  2"));
    assert!(report.contains("Duplicate ratio:  50.0%"));
}

#[test]
fn test_text_report_omits_unannotated_line_when_complete() {
    let data = ReportData {
        stored_requests: 4,
        summary: sample_data().summary,
    };
    assert!(!generate_text_report(&data).contains("Not highlighted"));
}

#[test]
fn test_generate_json_report() {
    let json = generate_json_report(&sample_data()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "Dejavu");
    assert_eq!(report["metadata"]["format"], "json");
    assert!(report["metadata"]["generated_at"].is_string());
    assert_eq!(report["history"]["stored_requests"], 6);
    assert_eq!(report["history"]["not_highlighted"], 2);
    assert_eq!(report["summary"]["duplicate"], 2);
    assert_eq!(report["summary"]["static_asset"], 1);
    assert_eq!(report["summary"]["total"], 4);
}

#[test]
fn test_highlight_line_keeps_request_text() {
    for decision in ClassificationDecision::ALL {
        let line = highlight_line(12, "GET", "http://example.com/a", decision);
        assert!(line.contains("http://example.com/a"));
        assert!(line.contains("12"));
    }
}

#[test]
fn test_suppressed_line_is_plain() {
    let line = highlight_line(1, "GET", "http://example.com/a", Suppressed);
    assert!(!line.contains('\u{1b}'));
}

// ============================================================================
// Database Report Tests
// ============================================================================

#[test]
fn test_gather_report_data_from_database() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    for url in ["http://example.com/a", "http://example.com/a", "http://example.com/b"] {
        db.record_request(&HistoryRecord::new("GET", url)).unwrap();
    }
    db.set_annotation(1, Unique).unwrap();
    db.set_annotation(2, Duplicate).unwrap();

    let data = gather_report_data(&db).unwrap();
    assert_eq!(data.stored_requests, 3);
    assert_eq!(data.summary.unique, 1);
    assert_eq!(data.summary.duplicate, 1);
    assert_eq!(data.unannotated(), 1);
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}
