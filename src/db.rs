use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, DatabaseConfig};
use crate::error::{Result, StockroomError};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{HistoryEntry, InventoryItem, InventoryTables, NewHistoryEntry, NewUser, User};
use crate::repository::{HistoryRepository, InventoryRepository};
use crate::schema::{self, user_inventory_map, users};

/// Candidate ids tried before registration gives up
const MAX_ID_ATTEMPTS: u32 = 8;

/// Pool of connections to the inventory database file
pub type DbPool = Pool<SqliteConnectionManager>;
/// One connection checked out of [`DbPool`]
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    metrics: MetricsCollector,
}

impl Database {
    /// Open (creating if needed) the database at `path` with default pool settings
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path.as_ref(), &AppConfig::default().database)
    }

    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let timeout = Duration::from_secs(config.connection_timeout_secs);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(timeout)
            .build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        let metrics = MetricsCollector::default();
        metrics.update_connection_pool_size(config.max_connections);
        info!(path = %path.display(), max_connections = config.max_connections, "Database opened");

        Ok(Self { pool, metrics })
    }

    /// Create the account and mapping tables if they don't exist
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(schema::CREATE_FIXED_TABLES)?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside one transaction on one connection.
    ///
    /// Commits when `f` succeeds; any error rolls everything back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Check out a connection, run one operation, and record its outcome
    fn run<T>(&self, operation: &'static str, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let timer = MetricsTimer::new(self.metrics, operation);
        let result = self.get_connection().and_then(|conn| f(&conn));
        timer.finish(result.is_ok());
        if let Err(e) = &result {
            warn!(operation, error = %e, "Database operation failed");
        }
        result
    }

    /// Register a user and provision their inventory and history tables.
    ///
    /// All steps share one transaction, so a failure leaves no account, mapping
    /// row, or half-created table behind.
    pub fn register_user(&self, new_user: &NewUser) -> Result<i64> {
        let tables = InventoryTables::for_display_name(&new_user.name)?;
        let result = self.transaction(|tx| provision_user(tx, new_user, &tables));
        self.metrics.record_registration(result.is_ok());

        match &result {
            Ok(user_id) => info!(user_id, inventory_table = tables.inventory(), "Registered user"),
            Err(e) => warn!(email = %new_user.email, error = %e, "Registration failed"),
        }
        result
    }

    /// User id for an email/password pair, `None` if no account matches
    pub fn user_id_for_credentials(&self, email: &str, password: &str) -> Result<Option<i64>> {
        let user_id = self.run("user_id_for_credentials", |conn| {
            let user_id = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ?1 AND {} = ?2",
                        users::USER_ID,
                        users::TABLE,
                        users::EMAIL,
                        users::PASSWORD
                    ),
                    params![email, password],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(user_id)
        })?;

        self.metrics.record_login(user_id.is_some());
        Ok(user_id)
    }

    /// Get a user by generated id
    pub fn user(&self, user_id: i64) -> Result<Option<User>> {
        self.run("user", |conn| {
            let user = conn
                .query_row(
                    &format!(
                        "SELECT {}, {}, {} FROM {} WHERE {} = ?1",
                        users::USER_ID,
                        users::NAME,
                        users::EMAIL,
                        users::TABLE,
                        users::USER_ID
                    ),
                    params![user_id],
                    |row| {
                        Ok(User {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            email: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Display name for a user id
    pub fn user_name(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self.user(user_id)?.map(|user| user.name))
    }

    /// Inventory table name recorded for a user in the mapping table
    pub fn inventory_table_name(&self, user_id: i64) -> Result<Option<String>> {
        self.run("inventory_table_name", |conn| {
            let name = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE {} = ?1",
                        user_inventory_map::INVENTORY_TABLE_NAME,
                        user_inventory_map::TABLE,
                        user_inventory_map::USER_ID
                    ),
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(name)
        })
    }

    /// Inventory and history table pair for a user
    pub fn inventory_tables(&self, user_id: i64) -> Result<Option<InventoryTables>> {
        self.inventory_table_name(user_id)?
            .map(|name| InventoryTables::from_inventory_table(&name))
            .transpose()
    }

    /// Whether a table with this name exists in the database file
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        self.run("table_exists", |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![table],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Number of registered accounts
    pub fn user_count(&self) -> Result<i64> {
        self.run("user_count", |conn| {
            let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", users::TABLE), [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

impl InventoryRepository for Database {
    fn insert_item(&self, tables: &InventoryTables, name: &str, quantity: i32) -> Result<i64> {
        self.run("insert_item", |conn| conn.insert_item(tables, name, quantity))
    }

    fn delete_item(&self, tables: &InventoryTables, name: &str) -> Result<usize> {
        self.run("delete_item", |conn| conn.delete_item(tables, name))
    }

    fn update_item_quantity(&self, tables: &InventoryTables, name: &str, new_quantity: i32) -> Result<usize> {
        self.run("update_item_quantity", |conn| conn.update_item_quantity(tables, name, new_quantity))
    }

    fn update_item_name(&self, tables: &InventoryTables, old_name: &str, new_name: &str) -> Result<usize> {
        self.run("update_item_name", |conn| conn.update_item_name(tables, old_name, new_name))
    }

    fn items(&self, tables: &InventoryTables) -> Result<Vec<InventoryItem>> {
        self.run("items", |conn| conn.items(tables))
    }

    fn item_names(&self, tables: &InventoryTables) -> Result<Vec<String>> {
        self.run("item_names", |conn| conn.item_names(tables))
    }

    fn item_quantity(&self, tables: &InventoryTables, name: &str) -> Result<Option<i32>> {
        self.run("item_quantity", |conn| conn.item_quantity(tables, name))
    }
}

impl HistoryRepository for Database {
    fn insert_action(&self, tables: &InventoryTables, user_id: i64, entry: &NewHistoryEntry) -> Result<i64> {
        self.run("insert_action", |conn| conn.insert_action(tables, user_id, entry))
    }

    fn history(&self, user_id: i64, tables: &InventoryTables) -> Result<Vec<HistoryEntry>> {
        self.run("history", |conn| conn.history(user_id, tables))
    }
}

/// Every registration step, run on the caller's transaction
fn provision_user(conn: &Connection, new_user: &NewUser, tables: &InventoryTables) -> Result<i64> {
    let email_taken: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)", users::TABLE, users::EMAIL),
        params![new_user.email],
        |row| row.get(0),
    )?;
    if email_taken {
        return Err(StockroomError::EmailTaken(new_user.email.clone()));
    }

    let table_taken: bool = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1) \
             OR EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2))",
            user_inventory_map::TABLE,
            user_inventory_map::INVENTORY_TABLE_NAME
        ),
        params![tables.inventory(), tables.history()],
        |row| row.get(0),
    )?;
    if table_taken {
        return Err(StockroomError::TableConflict(tables.inventory().to_string()));
    }

    let user_id = allocate_user_id(conn, &new_user.name)?;

    conn.execute(&schema::create_inventory_table(tables.inventory()), [])?;
    conn.execute(&schema::create_history_table(tables.history()), [])?;

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
            users::TABLE,
            users::USER_ID,
            users::NAME,
            users::EMAIL,
            users::PASSWORD
        ),
        params![user_id, new_user.name, new_user.email, new_user.password],
    )?;

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            user_inventory_map::TABLE,
            user_inventory_map::USER_ID,
            user_inventory_map::INVENTORY_TABLE_NAME
        ),
        params![user_id, tables.inventory()],
    )?;

    Ok(user_id)
}

/// Draw user id candidates until one is free
fn allocate_user_id(conn: &Connection, name: &str) -> Result<i64> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = generate_user_id(name);
        let taken: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)", users::TABLE, users::USER_ID),
            params![candidate],
            |row| row.get(0),
        )?;
        if candidate > 0 && !taken {
            return Ok(candidate);
        }
        debug!(attempt, "User id candidate collided, retrying");
    }
    Err(StockroomError::IdExhausted(MAX_ID_ATTEMPTS))
}

/// String hash of the name and the current time in milliseconds in the low
/// 31 bits, random bits above it. Always non-negative.
fn generate_user_id(name: &str) -> i64 {
    let seed = format!("{name}{}", Utc::now().timestamp_millis());
    let hash = seed
        .bytes()
        .fold(0_u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    let salt = rand::random::<u32>() >> 1;
    (i64::from(salt) << 31) | i64::from(hash & 0x7fff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_positive() {
        for _ in 0..100 {
            assert!(generate_user_id("Alex") >= 0);
        }
    }

    #[test]
    fn test_generated_ids_differ_for_same_name() {
        let a = generate_user_id("Alex");
        let b = generate_user_id("Alex");
        let c = generate_user_id("Alex");
        assert!(a != b || b != c);
    }
}
