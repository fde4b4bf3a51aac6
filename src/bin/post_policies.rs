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

//! Pack translated policy-model documents into a topology-store merge
//! payload. The payload is written to a file (or stdout) so the upload can
//! be done with any HTTP client.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use bgp_policy_model::config::CONFIG;
use bgp_policy_model::merge;

/// Assemble the node-attribute patch payload of one snapshot.
#[derive(Debug, Parser)]
struct Cli {
    /// Target network name
    #[clap(long = "network", short = 'n')]
    network: String,
    /// Target snapshot name
    #[clap(long = "snapshot", short = 's', default_value = "original_asis")]
    snapshot: String,
    /// Write the payload to this file instead of stdout
    #[clap(long = "output", short = 'o')]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();
    let dir = CONFIG.policies_dir(&args.network, &args.snapshot);
    let documents = merge::read_documents(&dir)?;
    let payload = merge::build_payload(documents);
    let json = serde_json::to_string_pretty(&payload)?;

    match args.output {
        Some(path) => fs::write(path, json)?,
        None => std::io::stdout().write_all(json.as_bytes())?,
    }
    Ok(())
}
