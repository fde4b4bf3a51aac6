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

//! This module contains the code for reading the directory configuration.
//!
//! All directories can be overridden through environment variables; the
//! defaults match the layout used by the surrounding tooling:
//!
//! - `MDDO_TTP_CONFIGS_DIR` (default `./configs`): raw config files, only
//!   relevant to the external parser, kept for completeness.
//! - `MDDO_TTP_OUTPUTS_DIR` (default `./ttp_output`): parse results, the
//!   *input* of this tool, as `<outputs>/<network>/<snapshot>/<os>/*.json`.
//! - `MDDO_BGP_POLICIES_DIR` (default `./policy_model_output`): translated
//!   policy models, as `<policies>/<network>/<snapshot>/*.json`.

use std::path::PathBuf;

use lazy_static::lazy_static;

use crate::types::OsType;

fn env_dir(var: &str, default: &str) -> PathBuf {
    std::env::var(var).unwrap_or_else(|_| default.to_string()).into()
}

lazy_static! {
    /// The directory layout for one invocation.
    pub static ref CONFIG: Directories = Directories {
        configs: env_dir("MDDO_TTP_CONFIGS_DIR", "./configs"),
        outputs: env_dir("MDDO_TTP_OUTPUTS_DIR", "./ttp_output"),
        policies: env_dir("MDDO_BGP_POLICIES_DIR", "./policy_model_output"),
    };
}

/// Root directories of the batch layout.
#[derive(Debug, Clone)]
pub struct Directories {
    /// Raw config files (consumed by the external parser, not by us).
    pub configs: PathBuf,
    /// Parse results (our input).
    pub outputs: PathBuf,
    /// Translated policy models (our output).
    pub policies: PathBuf,
}

impl Directories {
    /// Directory holding the parse results for one network snapshot and OS.
    pub fn outputs_dir(&self, network: &str, snapshot: &str, os_type: OsType) -> PathBuf {
        self.outputs.join(network).join(snapshot).join(os_type.as_str())
    }

    /// Directory receiving the translated policy models for one snapshot.
    pub fn policies_dir(&self, network: &str, snapshot: &str) -> PathBuf {
        self.policies.join(network).join(snapshot)
    }
}
