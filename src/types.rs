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

//! Shared type definitions: vendor OS types and the error taxonomy.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The vendor OS a parsed configuration tree originates from. The string
/// representation doubles as the per-vendor directory name in the batch
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsType {
    /// Juniper Junos
    Juniper,
    /// Cisco IOS-XR
    CiscoIosXr,
}

impl OsType {
    /// All supported OS types, in the order the batch driver processes them.
    pub const ALL: [Self; 2] = [Self::Juniper, Self::CiscoIosXr];

    /// The directory name used for this OS type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Juniper => "juniper",
            Self::CiscoIosXr => "cisco_ios_xr",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a parsed config file was skipped instead of translated. Skipping is
/// not an error: a config without BGP content is simply not a BGP speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The parse result contains no data at all.
    EmptyParse,
    /// The config has no `bgp` section.
    NoBgpConfig,
    /// No interface name matches the loopback pattern.
    NoLoopback,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyParse => write!(f, "parse result is empty"),
            Self::NoBgpConfig => write!(f, "no bgp configuration found"),
            Self::NoLoopback => write!(f, "no loopback interface found"),
        }
    }
}

/// Errors raised while translating a single device. These are *structural*
/// failures: the ordinary "could not translate this match/action" cases are
/// handled in-band (logged, `_message` markers) and never abort a device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// A conditional rule carries an unsupported boolean operator.
    #[error("unsupported condition operator `{op}` in policy {policy}")]
    UnknownOperator {
        /// Name of the vendor policy being flattened.
        policy: String,
        /// The offending operator.
        op: String,
    },
    /// An `if`/`elseif` rule has no condition attached.
    #[error("conditional rule without condition in policy {policy}")]
    MissingCondition {
        /// Name of the vendor policy being flattened.
        policy: String,
    },
    /// The vendor policy nests conditionals deeper than the engine allows.
    #[error("policy {policy} nests deeper than the limit of {limit}")]
    NestingTooDeep {
        /// Name of the vendor policy being flattened.
        policy: String,
        /// The configured depth limit.
        limit: usize,
    },
}

/// Errors raised by the batch driver. Per-file failures are isolated by the
/// driver itself; this type escapes only for problems with the run as a
/// whole (e.g. an unreadable output directory).
#[derive(Error, Debug)]
pub enum BatchError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory that was accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A parse-result file is not valid JSON.
    #[error("cannot parse {path}: {source}")]
    Json {
        /// The offending file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The parse result does not have the expected nesting structure.
    #[error("unexpected input structure in {path}: {reason}")]
    MalformedInput {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
    /// Flattening a policy failed structurally.
    #[error(transparent)]
    Translation(#[from] TranslationError),
}
