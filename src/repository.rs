//! Data access for the per-user inventory and history tables.
//!
//! Both traits are implemented for a bare [`rusqlite::Connection`], which lets
//! the service layer run a mutation and its history row inside one
//! transaction, and for [`crate::Database`], where each call checks out its own
//! pooled connection.

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{HistoryAction, HistoryEntry, InventoryItem, InventoryTables, NewHistoryEntry, TIMESTAMP_FORMAT};
use crate::schema::{history, inventory, users};

/// CRUD over one user's inventory table, keyed by item name
pub trait InventoryRepository {
    /// Insert an item and return its row id
    fn insert_item(&self, tables: &InventoryTables, name: &str, quantity: i32) -> Result<i64>;

    /// Delete every row with this item name, returning the number removed
    fn delete_item(&self, tables: &InventoryTables, name: &str) -> Result<usize>;

    /// Overwrite the quantity of an item, returning the number of rows changed
    fn update_item_quantity(&self, tables: &InventoryTables, name: &str, new_quantity: i32) -> Result<usize>;

    /// Rename an item, returning the number of rows changed
    fn update_item_name(&self, tables: &InventoryTables, old_name: &str, new_name: &str) -> Result<usize>;

    /// All items in row order
    fn items(&self, tables: &InventoryTables) -> Result<Vec<InventoryItem>>;

    /// All item names in row order
    fn item_names(&self, tables: &InventoryTables) -> Result<Vec<String>>;

    /// Quantity of an item, `None` if there is no such item
    fn item_quantity(&self, tables: &InventoryTables, name: &str) -> Result<Option<i32>>;
}

/// Append-only access to one user's history table
pub trait HistoryRepository {
    /// Append a history row and return its row id
    fn insert_action(&self, tables: &InventoryTables, user_id: i64, entry: &NewHistoryEntry) -> Result<i64>;

    /// Append an `add` row
    fn insert_add_action(&self, tables: &InventoryTables, user_id: i64, item: &str, quantity: i32) -> Result<i64> {
        self.insert_action(tables, user_id, &NewHistoryEntry::add(item, quantity))
    }

    /// Append a `delete` row
    fn insert_delete_action(&self, tables: &InventoryTables, user_id: i64, item: &str) -> Result<i64> {
        self.insert_action(tables, user_id, &NewHistoryEntry::delete(item))
    }

    /// Append a `rename` row
    fn insert_rename_action(&self, tables: &InventoryTables, user_id: i64, old_name: &str, new_name: &str) -> Result<i64> {
        self.insert_action(tables, user_id, &NewHistoryEntry::rename(old_name, new_name))
    }

    /// Append a `change_quantity` row carrying the signed delta
    fn insert_change_quantity_action(&self, tables: &InventoryTables, user_id: i64, item: &str, delta: i32) -> Result<i64> {
        self.insert_action(tables, user_id, &NewHistoryEntry::change_quantity(item, delta))
    }

    /// Every history row written by `user_id`, oldest first
    fn history(&self, user_id: i64, tables: &InventoryTables) -> Result<Vec<HistoryEntry>>;
}

impl InventoryRepository for Connection {
    fn insert_item(&self, tables: &InventoryTables, name: &str, quantity: i32) -> Result<i64> {
        self.execute(
            &format!(
                "INSERT INTO \"{}\" ({}, {}) VALUES (?1, ?2)",
                tables.inventory(),
                inventory::ITEM,
                inventory::QTY
            ),
            params![name, quantity],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn delete_item(&self, tables: &InventoryTables, name: &str) -> Result<usize> {
        let removed = self.execute(
            &format!("DELETE FROM \"{}\" WHERE {} = ?1", tables.inventory(), inventory::ITEM),
            params![name],
        )?;
        Ok(removed)
    }

    fn update_item_quantity(&self, tables: &InventoryTables, name: &str, new_quantity: i32) -> Result<usize> {
        let changed = self.execute(
            &format!(
                "UPDATE \"{}\" SET {} = ?1 WHERE {} = ?2",
                tables.inventory(),
                inventory::QTY,
                inventory::ITEM
            ),
            params![new_quantity, name],
        )?;
        Ok(changed)
    }

    fn update_item_name(&self, tables: &InventoryTables, old_name: &str, new_name: &str) -> Result<usize> {
        let changed = self.execute(
            &format!(
                "UPDATE \"{}\" SET {} = ?1 WHERE {} = ?2",
                tables.inventory(),
                inventory::ITEM,
                inventory::ITEM
            ),
            params![new_name, old_name],
        )?;
        Ok(changed)
    }

    fn items(&self, tables: &InventoryTables) -> Result<Vec<InventoryItem>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {}, {}, {} FROM \"{}\" ORDER BY {}",
            inventory::ID,
            inventory::ITEM,
            inventory::QTY,
            tables.inventory(),
            inventory::ID
        ))?;

        let item_iter = stmt.query_map([], map_inventory_item)?;

        let mut results = Vec::new();
        for item in item_iter {
            results.push(item?);
        }

        Ok(results)
    }

    fn item_names(&self, tables: &InventoryTables) -> Result<Vec<String>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {} FROM \"{}\" ORDER BY {}",
            inventory::ITEM,
            tables.inventory(),
            inventory::ID
        ))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(names)
    }

    fn item_quantity(&self, tables: &InventoryTables, name: &str) -> Result<Option<i32>> {
        let quantity = self
            .query_row(
                &format!(
                    "SELECT {} FROM \"{}\" WHERE {} = ?1 ORDER BY {} LIMIT 1",
                    inventory::QTY,
                    tables.inventory(),
                    inventory::ITEM,
                    inventory::ID
                ),
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(quantity)
    }
}

impl HistoryRepository for Connection {
    fn insert_action(&self, tables: &InventoryTables, user_id: i64, entry: &NewHistoryEntry) -> Result<i64> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        self.execute(
            &format!(
                "INSERT INTO \"{}\" ({}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                tables.history(),
                history::USER_ID,
                history::ACTIONS,
                history::QTY,
                history::TIMESTAMP,
                history::OLD_NAME,
                history::CURRENT_NAME
            ),
            params![
                user_id,
                entry.action.as_str(),
                entry.quantity,
                timestamp,
                entry.old_name,
                entry.current_name
            ],
        )?;

        Ok(self.last_insert_rowid())
    }

    fn history(&self, user_id: i64, tables: &InventoryTables) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.prepare(&format!(
            "SELECT h.{id}, h.{user_id}, h.{actions}, h.{timestamp}, h.{old_name}, h.{current_name}, h.{qty}, \
                    u.{name} AS user_name \
             FROM \"{table}\" h LEFT JOIN {users} u ON u.{user_col} = h.{user_id} \
             WHERE h.{user_id} = ?1 ORDER BY h.{id}",
            id = history::ID,
            user_id = history::USER_ID,
            actions = history::ACTIONS,
            timestamp = history::TIMESTAMP,
            old_name = history::OLD_NAME,
            current_name = history::CURRENT_NAME,
            qty = history::QTY,
            name = users::NAME,
            table = tables.history(),
            users = users::TABLE,
            user_col = users::USER_ID,
        ))?;

        let entry_iter = stmt.query_map(params![user_id], map_history_entry)?;

        let mut results = Vec::new();
        for entry in entry_iter {
            results.push(entry?);
        }

        Ok(results)
    }
}

/// Map a database row to an InventoryItem
fn map_inventory_item(row: &Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get(inventory::ID)?,
        name: row.get(inventory::ITEM)?,
        quantity: row.get(inventory::QTY)?,
    })
}

/// Map a database row to a HistoryEntry
fn map_history_entry(row: &Row) -> rusqlite::Result<HistoryEntry> {
    let action: String = row.get(history::ACTIONS)?;
    let user_name: Option<String> = row.get("user_name")?;

    Ok(HistoryEntry {
        id: row.get(history::ID)?,
        user_id: row.get(history::USER_ID)?,
        user_name: user_name.unwrap_or_default(),
        action: HistoryAction::from(action.as_str()),
        timestamp: row.get(history::TIMESTAMP)?,
        old_name: row.get(history::OLD_NAME)?,
        current_name: row.get(history::CURRENT_NAME)?,
        quantity: row.get(history::QTY)?,
    })
}
