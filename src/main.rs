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

use clap::Parser;

use bgp_policy_model::batch;

/// Translate parsed vendor BGP configurations into policy-model documents.
#[derive(Debug, Parser)]
struct Cli {
    /// Target network name
    #[clap(long = "network", short = 'n')]
    network: String,
    /// Target snapshot name
    #[clap(long = "snapshot", short = 's', default_value = "original_asis")]
    snapshot: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();
    batch::translate_snapshot(&args.network, &args.snapshot)?;
    Ok(())
}
