use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};

use crate::error::{Result, StockroomError};

/// Metric names recorded by the store and the service layer
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Database metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,
    pub db_connection_pool_size: &'static str,

    // Account metrics
    pub registrations_total: &'static str,
    pub logins_total: &'static str,

    // Inventory metrics
    pub inventory_changes_total: &'static str,
    pub stock_alerts_total: &'static str,

    // Export metrics
    pub export_operations_total: &'static str,
    pub export_rows_total: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            db_operations_total: "stockroom_db_operations_total",
            db_operation_duration: "stockroom_db_operation_duration_seconds",
            db_connection_pool_size: "stockroom_db_connection_pool_size",

            registrations_total: "stockroom_registrations_total",
            logins_total: "stockroom_logins_total",

            inventory_changes_total: "stockroom_inventory_changes_total",
            stock_alerts_total: "stockroom_stock_alerts_total",

            export_operations_total: "stockroom_export_operations_total",
            export_rows_total: "stockroom_export_rows_total",

            errors_total: "stockroom_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Install the no-op recorder so the metric macros have a sink
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| StockroomError::InvalidConfig(format!("Failed to initialize metrics recorder: {e}")))
    }

    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &str, duration: Duration, success: bool) {
        let labels = [
            ("operation", operation.to_string()),
            ("status", if success { "success" } else { "error" }.to_string()),
        ];

        counter!(self.db_operations_total, &labels).increment(1);
        histogram!(self.db_operation_duration, &labels).record(duration.as_secs_f64());

        if !success {
            self.record_error("database", operation);
        }
    }

    /// Record a registration attempt
    pub fn record_registration(&self, success: bool) {
        let labels = [("status", if success { "success" } else { "error" }.to_string())];
        counter!(self.registrations_total, &labels).increment(1);
    }

    /// Record a login attempt
    pub fn record_login(&self, success: bool) {
        let labels = [("status", if success { "success" } else { "rejected" }.to_string())];
        counter!(self.logins_total, &labels).increment(1);
    }

    /// Record an inventory mutation by history action kind
    pub fn record_inventory_change(&self, action: &str) {
        let labels = [("action", action.to_string())];
        counter!(self.inventory_changes_total, &labels).increment(1);
    }

    /// Record a stock alert
    pub fn record_stock_alert(&self) {
        counter!(self.stock_alerts_total).increment(1);
    }

    /// Record export operation metrics
    pub fn record_export(&self, format: &str, rows: usize) {
        let labels = [("format", format.to_string())];
        counter!(self.export_operations_total, &labels).increment(1);
        counter!(self.export_rows_total, &labels).increment(rows as u64);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        let labels = [("type", error_type.to_string()), ("operation", operation.to_string())];
        counter!(self.errors_total, &labels).increment(1);
    }

    /// Update connection pool size
    pub fn update_connection_pool_size(&self, size: u32) {
        gauge!(self.db_connection_pool_size).set(f64::from(size));
    }
}

/// Times one database operation and records it when finished
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: &'static str,
    start: Instant,
}

impl MetricsTimer {
    pub fn new(collector: MetricsCollector, operation: &'static str) -> Self {
        Self {
            collector,
            operation,
            start: Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector.record_db_operation(self.operation, duration, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.db_operations_total, "stockroom_db_operations_total");
        assert_eq!(collector.errors_total, "stockroom_errors_total");
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        let collector = MetricsCollector::default();
        collector.record_db_operation("insert_item", Duration::from_millis(3), false);
        collector.record_inventory_change("add");
        collector.record_export("csv", 4);
        MetricsTimer::new(collector, "select").finish(true);
    }
}
