//! Form and report exports
//!
//! - Form snapshot: pretty JSON named after the vessel identifier field,
//!   `<identifier>_query.json`, or `vessel_query.json` when it is empty
//! - Report text: `classification_report_<YYYYMMDD_HHMMSS>.txt`

use crate::form::QueryForm;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vesselid_common::time::file_stamp;
use vesselid_common::Result;

pub const DEFAULT_FORM_FILE: &str = "vessel_query.json";

/// Identifier text reduced to a safe file-name stem
fn sanitize(identifier: &str) -> String {
    identifier
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

pub fn form_file_name(form: &QueryForm) -> String {
    let identifier = form
        .scalar(form.config().identifier_field)
        .map(sanitize)
        .unwrap_or_default();
    if identifier.is_empty() {
        DEFAULT_FORM_FILE.to_string()
    } else {
        format!("{}_query.json", identifier)
    }
}

pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("classification_report_{}.txt", file_stamp(at))
}

/// Write the form snapshot into `dir`
pub fn export_form(dir: &Path, form: &QueryForm) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(form_file_name(form));
    let json = serde_json::to_string_pretty(&form.to_json())?;
    fs::write(&path, json)?;
    info!(path = %path.display(), "Exported form snapshot");
    Ok(path)
}

/// Write report text into `dir`
pub fn export_report(dir: &Path, text: &str, at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(at));
    fs::write(&path, text)?;
    info!(path = %path.display(), "Exported classification report");
    Ok(path)
}

/// Read a snapshot file for [`QueryForm::from_snapshot`]
pub fn read_snapshot(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
