//! Data models for accounts, inventory items and history entries
//!
//! This module contains the data structures passed between the store, the
//! service layer and the exporters.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

use crate::error::{Result, StockroomError};
use crate::schema::{history, inventory};

/// Placeholder stored in the old-name column when the action has no previous name.
pub const NOT_APPLICABLE: &str = "N/A";

/// Format of the history timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[allow(clippy::expect_used)]
static NON_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("valid regex"));
#[allow(clippy::expect_used)]
static INVENTORY_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^inventory_[a-z0-9_]+$").expect("valid regex"));

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Generated user identifier
    pub user_id: i64,
    /// Display name entered at registration
    pub name: String,
    /// Unique email address
    pub email: String,
}

/// Data for registering a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name, also the source of the per-user table names
    pub name: String,
    /// Email address, must be unique
    pub email: String,
    /// Password as entered
    pub password: String,
}

/// Registration form as entered by the user, before validation
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password typed a second time
    pub confirm_password: String,
}

/// Names of the inventory and history tables that belong to one user.
///
/// Only built from a sanitised display name or from a mapping row that passes
/// the same pattern, so the names are always safe to splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InventoryTables {
    inventory: String,
    history: String,
}

impl InventoryTables {
    /// Derive the table pair for a display name.
    ///
    /// `"Alex Ho"` becomes `inventory_alex_ho` / `history_inventory_alex_ho`.
    pub fn for_display_name(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let slug = NON_IDENT.replace_all(&lowered, "_");
        let slug = slug.trim_matches('_');
        if slug.is_empty() {
            return Err(StockroomError::Validation(format!(
                "name {name:?} must contain at least one ASCII letter or digit"
            )));
        }
        Ok(Self::from_parts(format!("{}{slug}", inventory::TABLE_PREFIX)))
    }

    /// Rebuild the pair from an inventory table name stored in the mapping table.
    pub fn from_inventory_table(inventory_table: &str) -> Result<Self> {
        if !INVENTORY_TABLE.is_match(inventory_table) {
            return Err(StockroomError::Validation(format!(
                "stored inventory table name {inventory_table:?} is not a valid identifier"
            )));
        }
        Ok(Self::from_parts(inventory_table.to_string()))
    }

    fn from_parts(inventory: String) -> Self {
        let history = format!("{}{inventory}", history::TABLE_PREFIX);
        Self { inventory, history }
    }

    /// Inventory table name
    #[must_use]
    pub fn inventory(&self) -> &str {
        &self.inventory
    }

    /// History table name
    #[must_use]
    pub fn history(&self) -> &str {
        &self.history
    }
}

/// One row of a user's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    /// Row id in the inventory table
    pub id: i64,
    /// Item name, used as the lookup key
    pub name: String,
    /// Quantity, may be negative
    pub quantity: i32,
}

/// Kind of change recorded in a history row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    /// Item inserted
    Add,
    /// Item removed
    Delete,
    /// Item renamed
    Rename,
    /// Item quantity changed
    ChangeQuantity,
    /// Action text not produced by this crate
    Unknown(String),
}

impl HistoryAction {
    /// Text stored in the actions column
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::ChangeQuantity => "change_quantity",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for HistoryAction {
    fn from(raw: &str) -> Self {
        match raw {
            "add" => Self::Add,
            "delete" => Self::Delete,
            "rename" => Self::Rename,
            "change_quantity" => Self::ChangeQuantity,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A history row about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Kind of change
    pub action: HistoryAction,
    /// Previous item name, or `N/A`
    pub old_name: String,
    /// Item name after the change
    pub current_name: String,
    /// Initial quantity for adds, delta for quantity changes, 0 otherwise
    pub quantity: i32,
}

impl NewHistoryEntry {
    /// Item added with an initial quantity
    #[must_use]
    pub fn add(item: &str, quantity: i32) -> Self {
        Self {
            action: HistoryAction::Add,
            old_name: NOT_APPLICABLE.to_string(),
            current_name: item.to_string(),
            quantity,
        }
    }

    /// Item deleted
    #[must_use]
    pub fn delete(item: &str) -> Self {
        Self {
            action: HistoryAction::Delete,
            old_name: item.to_string(),
            current_name: item.to_string(),
            quantity: 0,
        }
    }

    /// Item renamed
    #[must_use]
    pub fn rename(old_name: &str, new_name: &str) -> Self {
        Self {
            action: HistoryAction::Rename,
            old_name: old_name.to_string(),
            current_name: new_name.to_string(),
            quantity: 0,
        }
    }

    /// Item quantity moved by `delta`
    #[must_use]
    pub fn change_quantity(item: &str, delta: i32) -> Self {
        Self {
            action: HistoryAction::ChangeQuantity,
            old_name: NOT_APPLICABLE.to_string(),
            current_name: item.to_string(),
            quantity: delta,
        }
    }
}

/// A history row read back from a user's history table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Row id in the history table
    pub id: i64,
    /// User who made the change
    pub user_id: i64,
    /// Display name of that user, empty if the account row is missing
    pub user_name: String,
    /// Kind of change
    pub action: HistoryAction,
    /// Local time of the change
    pub timestamp: NaiveDateTime,
    /// Previous item name, or `N/A`
    pub old_name: String,
    /// Item name after the change
    pub current_name: String,
    /// Quantity or quantity delta
    pub quantity: i32,
}

impl HistoryEntry {
    /// Human readable line for the history screen.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.action {
            HistoryAction::Rename => format!("Renamed '{}' to '{}.'", self.old_name, self.current_name),
            HistoryAction::Add => format!("Added {} to database.", self.current_name),
            HistoryAction::Delete => format!("Deleted {} from database.", self.old_name),
            HistoryAction::ChangeQuantity if self.quantity <= 0 => {
                format!("Changed quantity of {}: {}", self.current_name, self.quantity)
            },
            HistoryAction::ChangeQuantity => {
                format!("Changed quantity of {}: +{}", self.current_name, self.quantity)
            },
            HistoryAction::Unknown(_) => "Unknown action".to_string(),
        }
    }
}

/// Share of one item in the inventory total, as drawn on the data screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemShare {
    /// Item name
    pub name: String,
    /// Item quantity
    pub quantity: i32,
    /// Percentage of the total positive quantity, 0 to 100
    pub percent: f64,
}

/// Raised when an item's quantity is set to the alert threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAlert {
    /// User who owns the item
    pub user_id: i64,
    /// Item name
    pub item: String,
    /// Quantity that triggered the alert
    pub quantity: i32,
}

impl StockAlert {
    /// Notification text
    #[must_use]
    pub fn message(&self) -> String {
        if self.quantity == 0 {
            format!("Item \"{}\" has reached zero quantity.", self.item)
        } else {
            format!("Item \"{}\" has reached a quantity of {}.", self.item, self.quantity)
        }
    }
}

/// Outcome of a quantity update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityChange {
    /// Quantity before the update
    pub old_quantity: i32,
    /// Quantity after the update
    pub new_quantity: i32,
    /// Alert raised by this update, if any
    pub alert: Option<StockAlert>,
}

impl QuantityChange {
    /// Signed difference recorded in the history table
    #[must_use]
    pub const fn delta(&self) -> i32 {
        self.new_quantity.wrapping_sub(self.old_quantity)
    }
}

/// Output format for exported inventories and history logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = StockroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(StockroomError::Validation(format!("unknown output format: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn entry(action: HistoryAction, old: &str, current: &str, quantity: i32) -> HistoryEntry {
        HistoryEntry {
            id: 1,
            user_id: 7,
            user_name: "Alex".to_string(),
            action,
            timestamp: NaiveDate::from_ymd_opt(2024, 4, 2)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
            old_name: old.to_string(),
            current_name: current.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_table_names_from_display_name() {
        let tables = InventoryTables::for_display_name("Alex Ho").unwrap();
        assert_eq!(tables.inventory(), "inventory_alex_ho");
        assert_eq!(tables.history(), "history_inventory_alex_ho");
    }

    #[test]
    fn test_table_names_strip_sql_metacharacters() {
        let tables = InventoryTables::for_display_name("bob\"; DROP TABLE users; --").unwrap();
        assert_eq!(tables.inventory(), "inventory_bob_drop_table_users");
    }

    #[test]
    fn test_table_names_reject_symbol_only_name() {
        assert!(InventoryTables::for_display_name("!!!").is_err());
        assert!(InventoryTables::for_display_name("   ").is_err());
    }

    #[test]
    fn test_stored_table_name_must_match_pattern() {
        assert!(InventoryTables::from_inventory_table("inventory_alex").is_ok());
        assert!(InventoryTables::from_inventory_table("inventory_Alex Ho").is_err());
        assert!(InventoryTables::from_inventory_table("users").is_err());
    }

    #[test]
    fn test_describe_each_action() {
        assert_eq!(entry(HistoryAction::Add, NOT_APPLICABLE, "Apples", 3).describe(), "Added Apples to database.");
        assert_eq!(entry(HistoryAction::Delete, "Apples", "Apples", 0).describe(), "Deleted Apples from database.");
        assert_eq!(
            entry(HistoryAction::Rename, "Apples", "Pears", 0).describe(),
            "Renamed 'Apples' to 'Pears.'"
        );
        assert_eq!(
            entry(HistoryAction::ChangeQuantity, NOT_APPLICABLE, "Pears", 4).describe(),
            "Changed quantity of Pears: +4"
        );
        assert_eq!(
            entry(HistoryAction::ChangeQuantity, NOT_APPLICABLE, "Pears", -2).describe(),
            "Changed quantity of Pears: -2"
        );
        assert_eq!(
            entry(HistoryAction::ChangeQuantity, NOT_APPLICABLE, "Pears", 0).describe(),
            "Changed quantity of Pears: 0"
        );
        assert_eq!(entry(HistoryAction::from("restock"), "a", "b", 0).describe(), "Unknown action");
    }

    #[test]
    fn test_action_text_round_trips_through_column_value() {
        for action in [HistoryAction::Add, HistoryAction::Delete, HistoryAction::Rename, HistoryAction::ChangeQuantity] {
            assert_eq!(HistoryAction::from(action.as_str()), action);
        }
    }

    #[test]
    fn test_stock_alert_message() {
        let alert = StockAlert { user_id: 1, item: "Milk".to_string(), quantity: 0 };
        assert_eq!(alert.message(), "Item \"Milk\" has reached zero quantity.");

        let alert = StockAlert { quantity: 5, ..alert };
        assert_eq!(alert.message(), "Item \"Milk\" has reached a quantity of 5.");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    proptest! {
        #[test]
        fn derived_table_names_are_plain_identifiers(name in "\\PC{1,40}") {
            if let Ok(tables) = InventoryTables::for_display_name(&name) {
                prop_assert!(INVENTORY_TABLE.is_match(tables.inventory()));
                prop_assert!(tables.history().starts_with("history_inventory_"));
            }
        }
    }
}
