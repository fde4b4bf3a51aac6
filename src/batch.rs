// BgpPolicyModel: Translating vendor BGP configuration into a neutral policy model
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! The batch driver.
//!
//! Walks the parse-result directories of one network snapshot
//! (`<outputs>/<network>/<snapshot>/<os>/*.json`), translates each device,
//! and writes one policy-model document per device to
//! `<policies>/<network>/<snapshot>/<device>.json`.
//!
//! Files are processed in lexicographic order so runs are deterministic.
//! Two failure regimes apply: files that are not BGP speakers (empty
//! parses, no `bgp` section, no loopback) are *skipped* with a log line,
//! and files that fail structurally (bad JSON, unexpected nesting,
//! flattening errors) are isolated so the rest of the run continues.

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use lazy_static::lazy_static;
use log::{error, info};
use regex::Regex;
use serde_json::Value;

use crate::config::CONFIG;
use crate::model::PolicyModelDocument;
use crate::types::{BatchError, OsType, SkipReason};
use crate::{junos, xr};

lazy_static! {
    static ref LOOPBACK: Regex = Regex::new(r"^[Ll]o(opback)?\d").unwrap();
}

/// Translate every parse result of one snapshot, all OS types.
pub fn translate_snapshot(network: &str, snapshot: &str) -> Result<(), BatchError> {
    let save_dir = CONFIG.policies_dir(network, snapshot);
    fs::create_dir_all(&save_dir)
        .map_err(|source| BatchError::Io { path: save_dir.clone(), source })?;

    for os_type in OsType::ALL {
        let dir = CONFIG.outputs_dir(network, snapshot, os_type);
        if !dir.is_dir() {
            info!("parse-result dir {} for {os_type} not found", dir.display());
            continue;
        }
        for path in sorted_files(&dir)? {
            if let Err(e) = translate_file(&path, os_type, &save_dir) {
                error!("skip {}: {e}", path.display());
            }
        }
    }
    Ok(())
}

/// Translate one parse-result file and write the document next to its
/// siblings. Returns `Ok(())` for skipped non-BGP-speakers as well.
pub fn translate_file(
    path: &Path,
    os_type: OsType,
    save_dir: &Path,
) -> Result<(), BatchError> {
    info!("loading {}", path.display());
    let raw = fs::read_to_string(path)
        .map_err(|source| BatchError::Io { path: path.to_path_buf(), source })?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|source| BatchError::Json { path: path.to_path_buf(), source })?;
    let device = unwrap_parse_result(&value, path)?;

    if let Err(reason) = valid_parsed_result(os_type, device) {
        info!("skip parse result {} ({os_type}): {reason}", path.display());
        return Ok(());
    }

    let document = translate_device(device, os_type, path)?;
    let save_file = save_dir.join(format!("{}.json", file_basename(path)));
    info!("save file: {}", save_file.display());
    let pretty = serde_json::to_string_pretty(&document)
        .map_err(|source| BatchError::Json { path: save_file.clone(), source })?;
    fs::write(&save_file, pretty)
        .map_err(|source| BatchError::Io { path: save_file, source })?;
    Ok(())
}

fn translate_device(
    device: &Value,
    os_type: OsType,
    path: &Path,
) -> Result<PolicyModelDocument, BatchError> {
    match os_type {
        OsType::CiscoIosXr => {
            let config = serde_json::from_value(device.clone())
                .map_err(|source| BatchError::Json { path: path.to_path_buf(), source })?;
            Ok(xr::translate_device(&config)?)
        }
        OsType::Juniper => {
            // Junos parse results are nested one level deeper.
            let device = device.get(0).ok_or_else(|| malformed(path))?;
            let config = serde_json::from_value(device.clone())
                .map_err(|source| BatchError::Json { path: path.to_path_buf(), source })?;
            Ok(junos::translate_device(&config))
        }
    }
}

/// Check that a parse result describes a BGP speaker worth translating.
pub fn valid_parsed_result(os_type: OsType, device: &Value) -> Result<(), SkipReason> {
    let device = match os_type {
        OsType::Juniper => device.get(0).unwrap_or(&Value::Null),
        OsType::CiscoIosXr => device,
    };
    let Some(obj) = device.as_object() else {
        return Err(SkipReason::EmptyParse);
    };
    if obj.is_empty() || obj.values().all(section_is_empty) {
        return Err(SkipReason::EmptyParse);
    }
    if !obj.contains_key("bgp") {
        return Err(SkipReason::NoBgpConfig);
    }

    let has_loopback = obj
        .get("interfaces")
        .and_then(Value::as_array)
        .map_or(false, |interfaces| {
            interfaces
                .iter()
                .filter_map(|i| i.get("name").and_then(Value::as_str))
                .any(|name| LOOPBACK.is_match(name))
        });
    if !has_loopback {
        return Err(SkipReason::NoLoopback);
    }
    Ok(())
}

fn section_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// The two levels of list nesting every parse result is wrapped in.
fn unwrap_parse_result<'a>(value: &'a Value, path: &Path) -> Result<&'a Value, BatchError> {
    value.get(0).and_then(|v| v.get(0)).ok_or_else(|| malformed(path))
}

fn malformed(path: &Path) -> BatchError {
    BatchError::MalformedInput {
        path: path.to_path_buf(),
        reason: "expected a doubly-nested parse result".to_string(),
    }
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    Ok(fs::read_dir(dir)
        .map_err(|source| BatchError::Io { path: dir.to_path_buf(), source })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .sorted()
        .collect_vec())
}

/// The output file name: the input name with a known config extension
/// (`.txt`, `.conf`, `.json`) stripped, anything else kept verbatim.
pub(crate) fn file_basename(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt" | "conf" | "json") => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string(),
        _ => name.to_string(),
    }
}
