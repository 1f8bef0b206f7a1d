//! Database schema definitions
//!
//! Table and column names used with rusqlite. The account and mapping tables
//! have fixed names; inventory and history tables are created per user, so
//! only their column names are fixed here and the table name comes from
//! [`crate::models::InventoryTables`].

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Generated user identifier column
    pub const USER_ID: &str = "user";
    /// Display name column
    pub const NAME: &str = "name";
    /// Email address column (unique)
    pub const EMAIL: &str = "email";
    /// Password column
    pub const PASSWORD: &str = "password";
}

/// User to inventory table mapping schema
pub mod user_inventory_map {
    /// Table name
    pub const TABLE: &str = "user_inventory_map";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Generated user identifier column
    pub const USER_ID: &str = "user_id";
    /// Name of the user's inventory table
    pub const INVENTORY_TABLE_NAME: &str = "inventory_table_name";
}

/// Per-user inventory table columns
pub mod inventory {
    /// Prefix of every inventory table name
    pub const TABLE_PREFIX: &str = "inventory_";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Item name column
    pub const ITEM: &str = "item";
    /// Quantity column
    pub const QTY: &str = "qty";
}

/// Per-user history table columns
pub mod history {
    /// Prefix prepended to the inventory table name
    pub const TABLE_PREFIX: &str = "history_";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Generated user identifier column
    pub const USER_ID: &str = "user_id";
    /// Action kind column
    pub const ACTIONS: &str = "actions";
    /// Local timestamp column
    pub const TIMESTAMP: &str = "timestamp";
    /// Previous item name column
    pub const OLD_NAME: &str = "old_name";
    /// Current item name column
    pub const CURRENT_NAME: &str = "current_name";
    /// Quantity (or quantity delta) column
    pub const QTY: &str = "qty";
}

/// DDL for the fixed tables, run once per connection pool.
pub const CREATE_FIXED_TABLES: &str = "
CREATE TABLE IF NOT EXISTS users (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    user INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_inventory_map (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    inventory_table_name TEXT NOT NULL UNIQUE,
    FOREIGN KEY(user_id) REFERENCES users(user)
);
";

/// DDL for one user's inventory table.
#[must_use]
pub fn create_inventory_table(table: &str) -> String {
    format!(
        "CREATE TABLE \"{table}\" ({} INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT NOT NULL, {} INTEGER NOT NULL)",
        inventory::ID,
        inventory::ITEM,
        inventory::QTY
    )
}

/// DDL for one user's history table.
#[must_use]
pub fn create_history_table(table: &str) -> String {
    format!(
        "CREATE TABLE \"{table}\" (\
            {} INTEGER PRIMARY KEY AUTOINCREMENT, \
            {} INTEGER NOT NULL, \
            {} TEXT NOT NULL, \
            {} TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
            {} TEXT NOT NULL, \
            {} TEXT NOT NULL, \
            {} INTEGER NOT NULL, \
            FOREIGN KEY({}) REFERENCES {}({}))",
        history::ID,
        history::USER_ID,
        history::ACTIONS,
        history::TIMESTAMP,
        history::OLD_NAME,
        history::CURRENT_NAME,
        history::QTY,
        history::USER_ID,
        users::TABLE,
        users::USER_ID
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_user_ddl_contains_table_name() {
        assert!(create_inventory_table("inventory_alex").contains("\"inventory_alex\""));
        assert!(create_history_table("history_inventory_alex").contains("\"history_inventory_alex\""));
    }

    #[test]
    fn fixed_ddl_mentions_both_tables() {
        assert!(CREATE_FIXED_TABLES.contains(users::TABLE));
        assert!(CREATE_FIXED_TABLES.contains(user_inventory_map::TABLE));
    }
}
