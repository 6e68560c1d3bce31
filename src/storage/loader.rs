//! Entity table loading
//!
//! Tables come as a JSON array of rows or as JSON Lines. A directory is
//! scanned for `*.entity.json` / `*.entity.jsonl` files, directly inside it
//! and one level of per-source subdirectories below it.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cluster::ClusterError;
use crate::error::EntclustErrorTrait;
use crate::models::{EntityRow, EntityTable};

/// File name suffixes recognised as entity tables during directory scans
pub const ENTITY_TABLE_SUFFIXES: [&str; 2] = [".entity.json", ".entity.jsonl"];

/// Load and concatenate every table under `paths`, in argument order
pub fn load_tables<P: AsRef<Path>>(paths: &[P]) -> Result<EntityTable> {
    let mut table = EntityTable::default();
    for path in paths {
        table.extend(load_table(path.as_ref())?);
    }
    Ok(table)
}

/// Load a single table file or every table found under a directory
pub fn load_table(path: &Path) -> Result<EntityTable> {
    if path.is_dir() {
        let files = discover_tables(path)?;
        if files.is_empty() {
            tracing::warn!(dir = %path.display(), "No entity tables found");
        }
        let mut table = EntityTable::default();
        for file in &files {
            table.extend(read_table_file(file)?);
        }
        tracing::info!(
            dir = %path.display(),
            files = files.len(),
            rows = table.len(),
            "Loaded entity tables"
        );
        Ok(table)
    } else {
        read_table_file(path)
    }
}

/// Entity table files under `dir`, sorted by path
pub fn discover_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in read_dir_sorted(dir)? {
        if entry.is_dir() {
            for nested in read_dir_sorted(&entry)? {
                if nested.is_file() && is_entity_table(&nested) {
                    found.push(nested);
                }
            }
        } else if is_entity_table(&entry) {
            found.push(entry);
        }
    }

    found.sort();
    Ok(found)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to scan: {}", dir.display()))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn is_entity_table(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| ENTITY_TABLE_SUFFIXES.iter().any(|s| n.ends_with(s)))
        .unwrap_or(false)
}

/// Read one table file, detecting JSON array vs JSON Lines
pub fn read_table_file(path: &Path) -> Result<EntityTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open entity table: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let is_jsonl = path.extension().map(|e| e == "jsonl").unwrap_or(false);
    let table = if is_jsonl {
        parse_json_lines(reader, path)?
    } else {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .with_context(|| format!("Failed to read entity table: {}", path.display()))?;
        parse_table_text(&text, path)?
    };

    tracing::debug!(path = %path.display(), rows = table.len(), "Entity table read");
    Ok(table)
}

/// Parse table text that is either a JSON array or JSON Lines
///
/// A row that does not deserialize is logged and skipped; only text that is
/// not JSON at all fails the table.
pub fn parse_table_text(text: &str, path: &Path) -> Result<EntityTable> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(EntityTable::default());
    }

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|e| ClusterError::table_load_failed(path, e.to_string()))?;
        let mut rows = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let label = row_label(&value, || format!("row {}", index + 1));
            match serde_json::from_value::<EntityRow>(value) {
                Ok(row) => rows.push(row),
                Err(e) => skip_row(path, ClusterError::invalid_record(label, e.to_string())),
            }
        }
        Ok(EntityTable::new(rows))
    } else {
        parse_json_lines(text.as_bytes(), path)
    }
}

fn parse_json_lines<R: BufRead>(reader: R, path: &Path) -> Result<EntityTable> {
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line from {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EntityRow>(&line) {
            Ok(row) => rows.push(row),
            Err(e) => skip_row(
                path,
                ClusterError::invalid_record(format!("line {}", index + 1), e.to_string()),
            ),
        }
    }

    Ok(EntityTable::new(rows))
}

/// Entity id of a raw row when it has one
fn row_label(value: &Value, fallback: impl FnOnce() -> String) -> String {
    value
        .get("id")
        .or_else(|| value.get("e"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(fallback)
}

fn skip_row(path: &Path, err: ClusterError) {
    tracing::warn!(
        path = %path.display(),
        error = %err,
        category = err.category().as_str(),
        "Skipping malformed entity row"
    );
}
