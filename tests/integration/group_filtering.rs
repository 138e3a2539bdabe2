use bdmetrics::dataset::Dataset;
use bdmetrics::filter::{apply_filter, to_name_set};
use bdmetrics::resolver::{ErrorPolicy, HierarchyResolver, ResolveOptions};
use bdmetrics::test_utils::{MockHub, group_ref, init_test_logging, project_ref};
use tempfile::TempDir;

use crate::common::{SCANS_CSV, TOTALS_CSV, write_zip};

/// Platform -> {Payments -> [billing, ledger, Reporting -> [ledger]], Tools -> []}
fn platform_hub() -> MockHub {
    let hub = MockHub::new();
    hub.root_group("platform", "Platform");
    hub.group("platform", vec![group_ref("payments"), group_ref("tools")]);
    hub.group("payments", vec![project_ref("billing"), project_ref("ledger"), group_ref("reporting")]);
    hub.group("reporting", vec![project_ref("ledger")]);
    hub.group("tools", vec![]);
    hub.project("billing", "billing");
    hub.project("ledger", "ledger");
    hub
}

#[tokio::test]
async fn test_resolve_then_filter_archive() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("export.zip");
    write_zip(&archive, &[("data/scans.csv", SCANS_CSV), ("totals.csv", TOTALS_CSV)]);

    let hub = platform_hub();
    let report = HierarchyResolver::new(&hub, ResolveOptions::default())
        .resolve("Platform")
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.projects().total_count(), 2);
    assert_eq!(report.summary.groups_visited, 4);
    assert_eq!(report.summary.duplicates_ignored, 1);

    let dataset = Dataset::load_zip(&archive).unwrap();
    let (filtered, summary) = apply_filter(dataset, &to_name_set(report.projects()));

    // payroll is not part of Platform; totals.csv has no projectName column
    assert_eq!(filtered.get("data/scans.csv").unwrap().len(), 3);
    assert_eq!(filtered.get("totals.csv").unwrap().len(), 2);
    assert_eq!(summary.passed_through, vec!["totals.csv".to_string()]);
    assert_eq!(summary.rows_before, 6);
    assert_eq!(summary.rows_after, 5);

    let out = temp.path().join("out");
    filtered.write_csv_dir(&out).unwrap();
    let written = std::fs::read_to_string(out.join("data/scans.csv")).unwrap();
    assert!(!written.contains("payroll"));
    assert!(written.starts_with("projectName,scanDate,scans\n"));
}

#[tokio::test]
async fn test_partial_resolution_still_filters_known_projects() {
    let hub = platform_hub();
    hub.fail("https://hub.test/api/project-groups/payments/children", 502);
    hub.group("tools", vec![project_ref("payroll")]);
    hub.project("payroll", "payroll");

    let report = HierarchyResolver::new(&hub, ResolveOptions::default())
        .resolve("Platform")
        .await
        .unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.summary.subtrees_skipped, 1);

    let mut dataset = Dataset::new();
    dataset.insert(
        "scans.csv",
        bdmetrics::dataset::RecordBatch::from_reader(SCANS_CSV.as_bytes()).unwrap(),
    );
    let (filtered, _) = apply_filter(dataset, &to_name_set(report.projects()));
    assert_eq!(filtered.total_rows(), 1);
}

#[tokio::test]
async fn test_strict_resolution_fails_whole_request() {
    let hub = platform_hub();
    hub.fail("https://hub.test/api/projects/ledger", 500);

    let options = ResolveOptions {
        policy: ErrorPolicy::Strict,
        ..ResolveOptions::default()
    };
    let err = HierarchyResolver::new(&hub, options).resolve("Platform").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_empty_group_filters_everything_with_column() {
    let hub = platform_hub();
    let report = HierarchyResolver::new(&hub, ResolveOptions::default())
        .resolve("Unknown")
        .await
        .unwrap();
    assert!(!report.group_found());

    let names = to_name_set(report.projects());
    assert!(names.is_empty());

    let mut dataset = Dataset::new();
    dataset.insert(
        "scans.csv",
        bdmetrics::dataset::RecordBatch::from_reader(SCANS_CSV.as_bytes()).unwrap(),
    );
    let (filtered, summary) = apply_filter(dataset, &names);
    assert!(filtered.is_empty_rows());
    assert_eq!(summary.retained_percent(), Some(0.0));
}
