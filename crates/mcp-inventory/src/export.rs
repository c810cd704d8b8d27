//! Tabular and document exports of an inventory.
//!
//! Both files are rendered from one [`InventoryDocument`] snapshot, so they always
//! agree for a given run.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ExportError;
use crate::inventory::Inventory;
use crate::model::{HostIdentity, Platform, ServerRecord};
use crate::risk::is_sensitive_key;

pub const CSV_FILE_NAME: &str = "mcp_inventory.csv";
pub const JSON_FILE_NAME: &str = "mcp_inventory.json";

const MASK_PREFIX_CHARS: usize = 10;
const MASK_PLACEHOLDER: &str = "***";
const MASK_ELLIPSIS: &str = "...";

pub fn iso8601(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Mask the value of a sensitive-looking key; other values pass through.
pub fn mask_value(key: &str, value: &str) -> String {
    if !is_sensitive_key(key) {
        return value.to_string();
    }
    if value.chars().count() > MASK_PREFIX_CHARS {
        let prefix: String = value.chars().take(MASK_PREFIX_CHARS).collect();
        format!("{prefix}{MASK_ELLIPSIS}")
    } else {
        MASK_PLACEHOLDER.to_string()
    }
}

pub fn mask_env(env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    env.iter()
        .map(|(k, v)| (k.clone(), mask_value(k, v)))
        .collect()
}

/// One exported server, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub timestamp: String,
    pub server_name: String,
    pub command: String,
    pub args: String,
    /// JSON object with masked values.
    pub env_vars: String,
    pub config_path: String,
    pub url: String,
    pub risk_score: String,
    pub risk_factors: String,
    pub hostname: String,
    pub user: String,
}

impl RecordRow {
    pub fn from_record(record: &ServerRecord, host: &HostIdentity) -> Result<Self, ExportError> {
        let factors: Vec<&str> = record.risk_factors().iter().map(|f| f.as_str()).collect();
        Ok(Self {
            timestamp: iso8601(record.discovered_at()),
            server_name: record.name().to_string(),
            command: record.command().to_string(),
            args: record.args().join(" "),
            env_vars: serde_json::to_string(&mask_env(record.env_vars()))?,
            config_path: record.config_path().to_string(),
            url: record.url().unwrap_or_default().to_string(),
            risk_score: format!("{:.2}", record.risk_score()),
            risk_factors: factors.join(";"),
            hostname: host.hostname.clone(),
            user: host.user.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanMetadata {
    pub timestamp: String,
    pub hostname: String,
    pub user: String,
    pub platform: String,
    pub total_servers: usize,
}

/// Everything both exporters write, captured once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryDocument {
    pub scan_metadata: ScanMetadata,
    pub servers: Vec<RecordRow>,
}

impl InventoryDocument {
    pub fn snapshot(
        inventory: &Inventory,
        host: &HostIdentity,
        platform: Platform,
    ) -> Result<Self, ExportError> {
        let servers = inventory
            .records()
            .iter()
            .map(|r| RecordRow::from_record(r, host))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            scan_metadata: ScanMetadata {
                timestamp: iso8601(Utc::now()),
                hostname: host.hostname.clone(),
                user: host.user.clone(),
                platform: platform.system_name().to_string(),
                total_servers: servers.len(),
            },
            servers,
        })
    }
}

pub fn write_csv(doc: &InventoryDocument, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &doc.servers {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(())
}

pub fn write_json(doc: &InventoryDocument, path: &Path) -> Result<(), ExportError> {
    let file = fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writer.write_all(b"\n").map_err(|e| ExportError::io(path, e))?;
    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(())
}

/// Which exports to produce and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTargets {
    pub dir: PathBuf,
    pub csv: bool,
    pub json: bool,
}

/// Write the enabled exports into `targets.dir`. Writes nothing for an empty inventory.
pub fn export_inventory(
    inventory: &Inventory,
    host: &HostIdentity,
    platform: Platform,
    targets: &ExportTargets,
) -> Result<Vec<PathBuf>, ExportError> {
    if inventory.is_empty() {
        tracing::warn!("no servers to export");
        return Ok(Vec::new());
    }
    if !targets.csv && !targets.json {
        return Ok(Vec::new());
    }
    fs::create_dir_all(&targets.dir).map_err(|e| ExportError::io(&targets.dir, e))?;
    let doc = InventoryDocument::snapshot(inventory, host, platform)?;

    let mut written = Vec::new();
    if targets.csv {
        let path = targets.dir.join(CSV_FILE_NAME);
        write_csv(&doc, &path)?;
        tracing::info!("exported {} server(s) to {}", doc.servers.len(), path.display());
        written.push(path);
    }
    if targets.json {
        let path = targets.dir.join(JSON_FILE_NAME);
        write_json(&doc, &path)?;
        tracing::info!("exported {} server(s) to {}", doc.servers.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
