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

use crate::context::TranslationContext;
use crate::model::{
    CommunitySet, LengthRange, PrefixEntry, PrefixMatchType, PrefixSet,
};

mod test_flatten;
mod test_synth;
mod test_xr;

/// A context preloaded with the sets the translator tests refer to.
fn ctx_with_sets() -> TranslationContext {
    let mut ctx = TranslationContext::new("10.0.0.1/32");
    ctx.prefix_set.push(PrefixSet {
        name: "aggregated-prefixes".to_string(),
        prefixes: vec![
            exact_prefix("10.100.0.0/16"),
            exact_prefix("10.110.0.0/20"),
        ],
    });
    ctx.prefix_set.push(PrefixSet {
        name: "longer-prefixes".to_string(),
        prefixes: vec![
            exact_prefix("192.168.0.0/24"),
            PrefixEntry {
                prefix: "172.16.0.0/12".to_string(),
                match_type: PrefixMatchType::Upto,
                length: LengthRange::upto("24"),
            },
        ],
    });
    ctx.community_set.push(CommunitySet {
        name: "peer-in".to_string(),
        communities: vec!["65001:10".to_string(), "65001:20".to_string()],
    });
    ctx.community_set.push(CommunitySet {
        name: "customer-in".to_string(),
        communities: vec!["65001:30".to_string()],
    });
    ctx
}

fn exact_prefix(prefix: &str) -> PrefixEntry {
    let length = prefix.rsplit('/').next().unwrap();
    PrefixEntry {
        prefix: prefix.to_string(),
        match_type: PrefixMatchType::Exact,
        length: LengthRange::exact(length),
    }
}
