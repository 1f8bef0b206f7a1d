use std::path::Path;

use crate::error::{Result, StockroomError};
use crate::models::RegistrationForm;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

fn rejected(message: impl Into<String>) -> StockroomError {
    StockroomError::Validation(message.into())
}

impl InputValidator {
    /// Validate a display name entered at registration
    pub fn validate_user_name(name: &str) -> Result<()> {
        Self::validate_label("User name", name)
    }

    /// Validate an item name
    pub fn validate_item_name(name: &str) -> Result<()> {
        Self::validate_label("Item name", name)
    }

    fn validate_label(what: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(rejected(format!("{what} cannot be empty")));
        }

        if value.chars().count() > 100 {
            return Err(rejected(format!("{what} too long (max 100 characters)")));
        }

        if value.contains('\0') || value.contains('\r') || value.contains('\n') {
            return Err(rejected(format!("{what} contains invalid characters")));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(rejected("Email cannot be empty"));
        }

        if email.len() > 254 {
            return Err(rejected("Email too long (max 254 characters)"));
        }

        let Some((local_part, domain_part)) = email.split_once('@') else {
            return Err(rejected("Email must contain @ symbol"));
        };

        if domain_part.contains('@') {
            return Err(rejected("Email must have exactly one @ symbol"));
        }

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(rejected("Email local part invalid"));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(rejected("Email domain invalid"));
        }

        Ok(())
    }

    /// Validate a password and its confirmation
    pub fn validate_password(password: &str, confirm: &str) -> Result<()> {
        if password.is_empty() || confirm.is_empty() {
            return Err(rejected("Password cannot be empty"));
        }

        if password != confirm {
            return Err(rejected("Passwords do not match"));
        }

        Ok(())
    }

    /// Validate a full registration form
    ///
    /// Fields are compared after trimming, as typed into the register screen.
    pub fn validate_registration(form: &RegistrationForm) -> Result<()> {
        if [&form.name, &form.email, &form.password, &form.confirm_password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(rejected("Please fill in all fields"));
        }

        Self::validate_user_name(form.name.trim())?;
        Self::validate_email(form.email.trim())?;
        Self::validate_password(form.password.trim(), form.confirm_password.trim())
    }

    /// Validate login input
    pub fn validate_login(email: &str, password: &str) -> Result<()> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(rejected("Please enter email and password"));
        }
        Ok(())
    }

    /// Parse a quantity typed as text
    pub fn parse_quantity(raw: &str) -> Result<i32> {
        raw.trim()
            .parse::<i32>()
            .map_err(|e| rejected(format!("Quantity {raw:?} is not a whole number: {e}")))
    }

    /// Validate database file path
    pub fn validate_database_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(rejected("Database path cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(rejected("Database path too long (max 4096 characters)"));
        }

        if path.is_dir() {
            return Err(rejected(format!("Database path is a directory: {}", path.display())));
        }

        Ok(())
    }
}
