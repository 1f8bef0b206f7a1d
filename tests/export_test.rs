use std::fs;

use chrono::NaiveDateTime;
use tempfile::tempdir;

use stockroom::export::{export_path, write_history_to_file, write_items_to_file};
use stockroom::models::{HistoryAction, HistoryEntry, InventoryItem, OutputFormat};

fn items() -> Vec<InventoryItem> {
    vec![
        InventoryItem {
            id: 1,
            name: "Apples".to_string(),
            quantity: 5,
        },
        InventoryItem {
            id: 2,
            name: "Bolts, M4".to_string(),
            quantity: -2,
        },
    ]
}

fn history() -> Vec<HistoryEntry> {
    let timestamp = NaiveDateTime::parse_from_str("2025-01-20 12:21:19", "%Y-%m-%d %H:%M:%S").unwrap();
    vec![
        HistoryEntry {
            id: 1,
            user_id: 42,
            user_name: "Alex".to_string(),
            action: HistoryAction::Add,
            timestamp,
            old_name: "N/A".to_string(),
            current_name: "Apples".to_string(),
            quantity: 5,
        },
        HistoryEntry {
            id: 2,
            user_id: 42,
            user_name: "Alex".to_string(),
            action: HistoryAction::ChangeQuantity,
            timestamp,
            old_name: "N/A".to_string(),
            current_name: "Apples".to_string(),
            quantity: -5,
        },
    ]
}

#[test]
fn test_export_path_creates_directory() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let out = temp_dir.path().join("output");

    let path = export_path(&out, "inventory_alex", OutputFormat::Csv).unwrap();

    assert!(out.is_dir());
    assert_eq!(path, out.join("inventory_alex.csv"));
}

#[test]
fn test_items_txt_export() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("items.txt");

    write_items_to_file(&items(), OutputFormat::Txt, &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "Apples, 5\nBolts, M4, -2\n");
}

#[test]
fn test_items_csv_export_quotes_fields() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("items.csv");

    write_items_to_file(&items(), OutputFormat::Csv, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["ID", "Item", "Quantity"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][1], "Bolts, M4");
    assert_eq!(&rows[1][2], "-2");
}

#[test]
fn test_items_json_export() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("items.json");

    write_items_to_file(&items(), OutputFormat::Json, &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value[0]["name"], "Apples");
    assert_eq!(value[0]["quantity"], 5);
    assert_eq!(value[1]["id"], 2);
}

#[test]
fn test_history_txt_export_uses_descriptions() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("history.txt");

    write_history_to_file(&history(), OutputFormat::Txt, &path).unwrap();

    let lines: Vec<String> = fs::read_to_string(&path).unwrap().lines().map(str::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "2025-01-20 12:21:19, Alex, Added Apples to database.",
            "2025-01-20 12:21:19, Alex, Changed quantity of Apples: -5",
        ]
    );
}

#[test]
fn test_history_csv_export() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("history.csv");

    write_history_to_file(&history(), OutputFormat::Csv, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 8);
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(&first[3], "add");
    assert_eq!(&first[4], "N/A");
    assert_eq!(&first[7], "Added Apples to database.");
}

#[test]
fn test_history_json_export() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("history.json");

    write_history_to_file(&history(), OutputFormat::Json, &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[1]["action"], "change_quantity");
    assert_eq!(value[1]["quantity"], -5);
    assert_eq!(value[1]["timestamp"], "2025-01-20 12:21:19");
}

#[test]
fn test_empty_exports() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("empty.json");

    write_items_to_file(&[], OutputFormat::Json, &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
    assert_eq!("json".parse::<OutputFormat>().unwrap().extension(), "json");
    assert!("xml".parse::<OutputFormat>().is_err());
}
