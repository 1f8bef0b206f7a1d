//! Stockroom - personal inventory tracking
//!
//! A Rust library for keeping a per-user inventory of named items with
//! quantities, backed by a single SQLite file.
//!
//! # Features
//!
//! - Account registration and login
//! - Per-user inventory and history tables provisioned at registration
//! - Append-only history of every add, delete, rename and quantity change
//! - Stock alerts when an item runs out
//! - Inventory breakdown and export to TXT, CSV and JSON

/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Inventory and history export
pub mod export;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Repository traits for inventory and history access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Inventory operations paired with their history rows
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{Result, StockroomError};
pub use models::{HistoryAction, HistoryEntry, InventoryItem, InventoryTables, OutputFormat};
pub use repository::{HistoryRepository, InventoryRepository};
pub use service::{InventoryService, Notifier, Session};
