//! File writing utilities for inventory and history export.
//!
//! Writes a user's inventory or history log to TXT, CSV, or JSON.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::error::Result;
use crate::models::{HistoryEntry, InventoryItem, OutputFormat, TIMESTAMP_FORMAT};

/// Build `output_dir/<stem>.<ext>`, creating the directory if needed.
pub fn export_path(output_dir: &Path, stem: &str, format: OutputFormat) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    Ok(output_dir.join(format!("{stem}.{}", format.extension())))
}

/// Write inventory items to a file in the specified format.
pub fn write_items_to_file(items: &[InventoryItem], format: OutputFormat, file_path: &Path) -> Result<()> {
    match format {
        OutputFormat::Txt => write_items_txt(items, file_path),
        OutputFormat::Csv => write_items_csv(items, file_path),
        OutputFormat::Json => {
            let writer = BufWriter::new(File::create(file_path)?);
            serde_json::to_writer_pretty(writer, items)?;
            Ok(())
        },
    }
}

/// Write history entries to a file in the specified format.
pub fn write_history_to_file(entries: &[HistoryEntry], format: OutputFormat, file_path: &Path) -> Result<()> {
    match format {
        OutputFormat::Txt => write_history_txt(entries, file_path),
        OutputFormat::Csv => write_history_csv(entries, file_path),
        OutputFormat::Json => write_history_json(entries, file_path),
    }
}

/// Format: `item, quantity` one per line
fn write_items_txt(items: &[InventoryItem], file_path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(file_path)?);

    for item in items {
        writeln!(writer, "{}, {}", item.name, item.quantity)?;
    }

    writer.flush()?;
    Ok(())
}

/// Includes header row: `ID, Item, Quantity`
fn write_items_csv(items: &[InventoryItem], file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;

    writer.write_record(["ID", "Item", "Quantity"])?;
    for item in items {
        writer.write_record([item.id.to_string(), item.name.clone(), item.quantity.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Format: `timestamp, user, description` one per line
fn write_history_txt(entries: &[HistoryEntry], file_path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(file_path)?);

    for entry in entries {
        writeln!(
            writer,
            "{}, {}, {}",
            entry.timestamp.format(TIMESTAMP_FORMAT),
            entry.user_name,
            entry.describe()
        )?;
    }

    writer.flush()?;
    Ok(())
}

fn write_history_csv(entries: &[HistoryEntry], file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;

    writer.write_record(["ID", "Timestamp", "User", "Action", "Old Name", "Current Name", "Quantity", "Description"])?;
    for entry in entries {
        writer.write_record([
            entry.id.to_string(),
            entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            entry.user_name.clone(),
            entry.action.to_string(),
            entry.old_name.clone(),
            entry.current_name.clone(),
            entry.quantity.to_string(),
            entry.describe(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_history_json(entries: &[HistoryEntry], file_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(file_path)?);

    let json_entries: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "id": e.id,
                "timestamp": e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                "user": e.user_name,
                "action": e.action.as_str(),
                "old_name": e.old_name,
                "current_name": e.current_name,
                "quantity": e.quantity,
                "description": e.describe(),
            })
        })
        .collect();

    serde_json::to_writer_pretty(writer, &json_entries)?;
    Ok(())
}
