//! Inventory operations as the main screen performs them.
//!
//! Every mutation is written together with its history row in one
//! transaction, and quantity updates that land on the alert threshold are
//! handed to a [`Notifier`].

use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Result, StockroomError};
use crate::metrics::MetricsCollector;
use crate::models::{
    HistoryAction, HistoryEntry, InventoryItem, InventoryTables, ItemShare, NewUser, QuantityChange, RegistrationForm,
    StockAlert,
};
use crate::repository::{HistoryRepository, InventoryRepository};
use crate::validation::InputValidator;

/// Receives stock alerts
pub trait Notifier {
    /// Deliver one alert
    fn notify(&self, alert: &StockAlert);
}

/// Writes stock alerts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &StockAlert) {
        warn!(user_id = alert.user_id, item = %alert.item, quantity = alert.quantity, "{}", alert.message());
    }
}

/// A logged-in user and the tables their inventory lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Generated user identifier
    pub user_id: i64,
    /// Display name
    pub user_name: String,
    /// The user's inventory and history tables
    pub tables: InventoryTables,
}

/// Inventory operations for logged-in users
pub struct InventoryService<N = LogNotifier> {
    database: Database,
    notifier: N,
    alert_threshold: i32,
    metrics: MetricsCollector,
}

impl InventoryService<LogNotifier> {
    /// Service that logs stock alerts
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self::with_notifier(database, LogNotifier)
    }
}

impl<N: Notifier> InventoryService<N> {
    /// Service that hands stock alerts to `notifier`
    pub fn with_notifier(database: Database, notifier: N) -> Self {
        Self {
            database,
            notifier,
            alert_threshold: 0,
            metrics: MetricsCollector::default(),
        }
    }

    /// Quantity that raises a stock alert when an item is set to it
    #[must_use]
    pub const fn with_alert_threshold(mut self, threshold: i32) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Underlying store
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Alert sink
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Validate a registration form and create the account
    pub fn register(&self, form: &RegistrationForm) -> Result<i64> {
        InputValidator::validate_registration(form)?;

        self.database.register_user(&NewUser {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.trim().to_string(),
        })
    }

    /// Check credentials and open a session, `None` for a wrong email or password
    pub fn login(&self, email: &str, password: &str) -> Result<Option<Session>> {
        InputValidator::validate_login(email, password)?;

        match self.database.user_id_for_credentials(email.trim(), password.trim())? {
            Some(user_id) => self.session(user_id).map(Some),
            None => {
                info!(email = email.trim(), "Login rejected");
                Ok(None)
            },
        }
    }

    /// Open a session for a known user id
    pub fn session(&self, user_id: i64) -> Result<Session> {
        let user = self.database.user(user_id)?.ok_or(StockroomError::UserNotFound(user_id))?;
        let tables = self
            .database
            .inventory_tables(user_id)?
            .ok_or(StockroomError::UserNotFound(user_id))?;

        Ok(Session {
            user_id,
            user_name: user.name,
            tables,
        })
    }

    /// Add a new item and record an `add` row
    pub fn add_item(&self, session: &Session, name: &str, quantity: i32) -> Result<i64> {
        InputValidator::validate_item_name(name)?;
        let name = name.trim();

        let row_id = self.database.transaction(|tx| {
            if tx.item_quantity(&session.tables, name)?.is_some() {
                return Err(StockroomError::DuplicateItem(name.to_string()));
            }
            let row_id = tx.insert_item(&session.tables, name, quantity)?;
            tx.insert_add_action(&session.tables, session.user_id, name, quantity)?;
            Ok(row_id)
        })?;

        self.metrics.record_inventory_change(HistoryAction::Add.as_str());
        info!(user_id = session.user_id, item = name, quantity, "Item added");
        Ok(row_id)
    }

    /// Delete an item and record a `delete` row
    pub fn delete_item(&self, session: &Session, name: &str) -> Result<()> {
        let name = name.trim();
        self.database.transaction(|tx| {
            if tx.delete_item(&session.tables, name)? == 0 {
                return Err(StockroomError::ItemNotFound(name.to_string()));
            }
            tx.insert_delete_action(&session.tables, session.user_id, name)?;
            Ok(())
        })?;

        self.metrics.record_inventory_change(HistoryAction::Delete.as_str());
        info!(user_id = session.user_id, item = name, "Item deleted");
        Ok(())
    }

    /// Rename an item and record a `rename` row
    pub fn rename_item(&self, session: &Session, old_name: &str, new_name: &str) -> Result<()> {
        InputValidator::validate_item_name(new_name)?;
        let old_name = old_name.trim();
        let new_name = new_name.trim();

        self.database.transaction(|tx| {
            if new_name != old_name && tx.item_quantity(&session.tables, new_name)?.is_some() {
                return Err(StockroomError::DuplicateItem(new_name.to_string()));
            }
            if tx.update_item_name(&session.tables, old_name, new_name)? == 0 {
                return Err(StockroomError::ItemNotFound(old_name.to_string()));
            }
            tx.insert_rename_action(&session.tables, session.user_id, old_name, new_name)?;
            Ok(())
        })?;

        self.metrics.record_inventory_change(HistoryAction::Rename.as_str());
        info!(user_id = session.user_id, from = old_name, to = new_name, "Item renamed");
        Ok(())
    }

    /// Overwrite an item's quantity and record the signed change.
    ///
    /// Raises a stock alert when the new quantity equals the alert threshold.
    pub fn set_quantity(&self, session: &Session, name: &str, new_quantity: i32) -> Result<QuantityChange> {
        let name = name.trim();
        let old_quantity = self.database.transaction(|tx| {
            let old_quantity = tx
                .item_quantity(&session.tables, name)?
                .ok_or_else(|| StockroomError::ItemNotFound(name.to_string()))?;
            let delta = new_quantity
                .checked_sub(old_quantity)
                .ok_or_else(|| StockroomError::Validation(format!("quantity change for {name} overflows")))?;

            tx.update_item_quantity(&session.tables, name, new_quantity)?;
            tx.insert_change_quantity_action(&session.tables, session.user_id, name, delta)?;
            Ok(old_quantity)
        })?;

        self.metrics.record_inventory_change(HistoryAction::ChangeQuantity.as_str());
        info!(user_id = session.user_id, item = name, old_quantity, new_quantity, "Quantity changed");

        let alert = (new_quantity == self.alert_threshold).then(|| StockAlert {
            user_id: session.user_id,
            item: name.to_string(),
            quantity: new_quantity,
        });
        if let Some(alert) = &alert {
            self.metrics.record_stock_alert();
            self.notifier.notify(alert);
        }

        Ok(QuantityChange {
            old_quantity,
            new_quantity,
            alert,
        })
    }

    /// Items for the inventory grid
    pub fn items(&self, session: &Session) -> Result<Vec<InventoryItem>> {
        self.database.items(&session.tables)
    }

    /// History log for the history screen
    pub fn history(&self, session: &Session) -> Result<Vec<HistoryEntry>> {
        self.database.history(session.user_id, &session.tables)
    }

    /// Per-item shares for the data screen
    pub fn breakdown(&self, session: &Session) -> Result<Vec<ItemShare>> {
        let items = self.database.items(&session.tables)?;
        Ok(breakdown(&items))
    }
}

/// Share of each positive-quantity item in the total.
///
/// Items at or below zero are left out; an inventory with no positive
/// quantities yields an empty breakdown.
#[must_use]
pub fn breakdown(items: &[InventoryItem]) -> Vec<ItemShare> {
    let total: i64 = items.iter().filter(|i| i.quantity > 0).map(|i| i64::from(i.quantity)).sum();
    if total == 0 {
        return Vec::new();
    }

    items
        .iter()
        .filter(|item| item.quantity > 0)
        .map(|item| ItemShare {
            name: item.name.clone(),
            quantity: item.quantity,
            percent: f64::from(item.quantity) * 100.0 / total as f64,
        })
        .collect()
}
