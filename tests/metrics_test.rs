//! Unit tests for metrics.rs module

use std::time::Duration;
use stockroom::metrics::{MetricsCollector, MetricsTimer};

#[test]
fn test_metrics_collector_default_names() {
    let collector = MetricsCollector::default();
    assert_eq!(collector.db_operations_total, "stockroom_db_operations_total");
    assert_eq!(collector.db_operation_duration, "stockroom_db_operation_duration_seconds");
    assert_eq!(collector.registrations_total, "stockroom_registrations_total");
    assert_eq!(collector.inventory_changes_total, "stockroom_inventory_changes_total");
    assert_eq!(collector.stock_alerts_total, "stockroom_stock_alerts_total");
    assert_eq!(collector.export_operations_total, "stockroom_export_operations_total");
    assert_eq!(collector.errors_total, "stockroom_errors_total");
}

#[test]
fn test_metric_names_share_prefix() {
    let c = MetricsCollector::default();
    let names = [
        c.db_operations_total,
        c.db_operation_duration,
        c.db_connection_pool_size,
        c.registrations_total,
        c.logins_total,
        c.inventory_changes_total,
        c.stock_alerts_total,
        c.export_operations_total,
        c.export_rows_total,
        c.errors_total,
    ];
    assert!(names.iter().all(|name| name.starts_with("stockroom_")));
}

#[test]
fn test_metrics_initialization() {
    // Only one global recorder can be installed per process
    let _ = MetricsCollector::init();
    assert!(MetricsCollector::init().is_err());
}

#[test]
fn test_record_all_metric_kinds() {
    let collector = MetricsCollector::default();
    collector.record_db_operation("items", Duration::from_millis(2), true);
    collector.record_db_operation("insert_item", Duration::from_millis(5), false);
    collector.record_registration(true);
    collector.record_login(false);
    collector.record_inventory_change("change_quantity");
    collector.record_stock_alert();
    collector.record_export("json", 0);
    collector.record_error("database", "history");
    collector.update_connection_pool_size(4);
}

#[test]
fn test_metrics_timer() {
    let collector = MetricsCollector::default();
    let timer = MetricsTimer::new(collector, "user_count");
    std::thread::sleep(Duration::from_millis(1));
    timer.finish(true);
}

#[test]
fn test_collector_is_copy() {
    let collector = MetricsCollector::default();
    let copy = collector;
    assert_eq!(copy.logins_total, collector.logins_total);
}
