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

//! The Cisco IOS-XR adapter.
//!
//! Translates one parsed IOS-XR device into a policy-model document: sets
//! are reshaped, route-policies are flattened (see [`crate::flatten`]), BGP
//! neighbors are extracted with their per-address-family policy bindings,
//! and a final pass materializes `next-hop-self` into the export policies
//! (synthesizing the `ibgp-export` policy where the config relies on the
//! implicit iBGP behavior).

use ipnet::Ipv4Net;
use log::{error, info, warn};

use crate::context::TranslationContext;
use crate::flatten::translate_policy;
use crate::model::{
    Action, AddressFamily, AsPathEntry, AsPathSet, BgpNeighbor, CommunitySet, Condition,
    LengthRange, PolicyModel, PolicyModelDocument, PrefixEntry, PrefixMatchType, PrefixSet,
    Statement, IBGP_EXPORT, NEXT_HOP_SELF_STMT,
};
use crate::ttp::{XrAddressFamily, XrDeviceConfig, XrNeighbor, XrPrefixEntry};
use crate::types::TranslationError;

/// Translate one parsed IOS-XR device into its policy-model document.
pub fn translate_device(
    config: &XrDeviceConfig,
) -> Result<PolicyModelDocument, TranslationError> {
    let mut ctx = TranslationContext::new(node_address(config).unwrap_or_default());

    translate_bgp_neighbors(&mut ctx, config);
    translate_community_sets(&mut ctx, config);
    translate_aspath_sets(&mut ctx, config);
    translate_prefix_sets(&mut ctx, config);

    for policy in &config.policies {
        translate_policy(&mut ctx, policy)?;
    }
    apply_next_hop_self(&mut ctx);

    Ok(ctx.into_document(true))
}

/// The device identity: the IPv4 address of `Loopback0`.
fn node_address(config: &XrDeviceConfig) -> Option<String> {
    let loopback = config.interfaces.iter().find(|i| i.name == "Loopback0");
    let Some(loopback) = loopback else {
        info!("Loopback0 not found");
        return None;
    };
    let Some(ipv4) = &loopback.ipv4 else {
        info!("ipv4 address not found on Loopback0");
        return None;
    };
    info!("-- node: {}", ipv4.address);
    Some(ipv4.address.clone())
}

fn translate_bgp_neighbors(ctx: &mut TranslationContext, config: &XrDeviceConfig) {
    let Some(bgp) = &config.bgp else { return };
    for ttp_neighbor in &bgp.neighbors {
        match translate_neighbor(ttp_neighbor) {
            Some(neighbor) => {
                info!("append neighbor {}", neighbor.remote_ip);
                ctx.bgp_neighbors.push(neighbor);
            }
            // Typically a neighbor-group member; its session parameters
            // live elsewhere and cannot be bound to policies here.
            None => error!("no remote-as/ip found in neighbor {ttp_neighbor:?}"),
        }
    }
}

fn translate_neighbor(ttp_neighbor: &XrNeighbor) -> Option<BgpNeighbor> {
    let remote_as = ttp_neighbor.remote_as?;
    let remote_ip = ttp_neighbor.remote_ip.clone()?;
    let address_families =
        ttp_neighbor.address_families.iter().map(translate_af).collect();
    Some(BgpNeighbor { remote_as, remote_ip, address_families })
}

fn translate_af(ttp_af: &XrAddressFamily) -> AddressFamily {
    let mut af = AddressFamily::new(&ttp_af.afi, &ttp_af.safi);
    if let Some(policy) = &ttp_af.configs.route_policy {
        if let Some(import) = &policy.import {
            af.route_policy_in = import.clone();
        }
        if let Some(export) = &policy.export {
            af.route_policy_out = export.clone();
        }
    }
    for attr in &ttp_af.configs.attrs {
        match attr.value.as_str() {
            "send-community-ebgp" => af.send_community_ebgp = true,
            "next-hop-self" => {
                af.next_hop_self = true;
                // No explicit export policy: rely on the synthesized
                // ibgp-export policy instead.
                if ttp_af.configs.route_policy.is_none() {
                    info!("auto generate ibgp-export binding for {ttp_af:?}");
                    af.route_policy_out = IBGP_EXPORT.to_string();
                }
            }
            "remove-private-AS" => af.remove_private_as = true,
            _ => {}
        }
    }
    af
}

fn translate_community_sets(ctx: &mut TranslationContext, config: &XrDeviceConfig) {
    for set in &config.community_sets {
        info!("-- community: {}", set.name);
        ctx.community_set.push(CommunitySet {
            name: set.name.clone(),
            communities: set.communities.clone(),
        });
    }
}

fn translate_aspath_sets(ctx: &mut TranslationContext, config: &XrDeviceConfig) {
    for set in &config.as_path_sets {
        info!("-- as-path-set: {}", set.name);
        let mut entries = Vec::new();
        match &set.conditions {
            // An empty set matches everything.
            None => entries.push(AsPathEntry {
                name: Some(set.name.clone()),
                pattern: Some("*".to_string()),
                length: None,
            }),
            Some(conditions) => {
                for (i, condition) in conditions.iter().enumerate() {
                    let entry_name = format!("{}_{}", set.name, i + 1);
                    if let Some(pattern) = &condition.pattern {
                        entries.push(AsPathEntry {
                            name: Some(entry_name.clone()),
                            pattern: Some(translate_aspath_pattern(pattern)),
                            length: None,
                        });
                    }
                    if let Some(length) = &condition.length {
                        match condition.condition.as_deref() {
                            Some("le") => entries.push(AsPathEntry {
                                name: None,
                                pattern: None,
                                length: Some(LengthRange::upto(length.clone())),
                            }),
                            Some("ge") => entries.push(AsPathEntry {
                                name: Some(entry_name),
                                pattern: None,
                                length: Some(LengthRange::at_least(length.clone())),
                            }),
                            other => {
                                warn!("unknown length condition {other:?} in {}", set.name)
                            }
                        }
                    }
                }
            }
        }
        ctx.aspath_set.push(AsPathSet { group_name: set.name.clone(), entries });
    }
}

/// Rewrite an IOS-XR `ios-regex` AS-path pattern into the model's
/// space-separated form.
fn translate_aspath_pattern(pattern: &str) -> String {
    pattern.replace('_', " ")
}

fn translate_prefix_sets(ctx: &mut TranslationContext, config: &XrDeviceConfig) {
    for set in &config.prefix_sets {
        info!("-- prefix-set: {}", set.name);
        let Some(ttp_prefixes) = &set.prefixes else {
            info!("no prefixes found in {}", set.name);
            continue;
        };
        let prefixes = ttp_prefixes.iter().map(translate_prefix_entry).collect();
        ctx.prefix_set.push(PrefixSet { name: set.name.clone(), prefixes });
    }
}

/// Translate one prefix with its raw length condition (`ge 24`, `le 28`,
/// `ge 24 le 28`, or none for an exact match).
fn translate_prefix_entry(entry: &XrPrefixEntry) -> PrefixEntry {
    // fall back to the raw token when the prefix does not parse
    let own_length = entry
        .prefix
        .parse::<Ipv4Net>()
        .map(|net| net.prefix_len().to_string())
        .unwrap_or_else(|_| entry.prefix.rsplit('/').next().unwrap_or_default().to_string());
    let exact = || PrefixEntry {
        prefix: entry.prefix.clone(),
        match_type: PrefixMatchType::Exact,
        length: LengthRange::exact(own_length.clone()),
    };

    let Some(condition) = &entry.condition else {
        return exact();
    };
    let tokens: Vec<&str> = condition.split_whitespace().collect();
    match tokens.as_slice() {
        ["ge", min] => PrefixEntry {
            prefix: entry.prefix.clone(),
            match_type: PrefixMatchType::PrefixLengthRange,
            length: LengthRange::between(*min, "32"),
        },
        ["le", max] => PrefixEntry {
            prefix: entry.prefix.clone(),
            match_type: PrefixMatchType::Upto,
            length: LengthRange::upto(*max),
        },
        ["ge", min, "le", max] => PrefixEntry {
            prefix: entry.prefix.clone(),
            match_type: PrefixMatchType::PrefixLengthRange,
            length: LengthRange::between(*min, *max),
        },
        _ => {
            warn!("unknown prefix condition `{condition}` on {}, matching exactly", entry.prefix);
            exact()
        }
    }
}

/// Synthesize the `ibgp-export` policy, unless the config defines one.
fn auto_gen_ibgp_export(ctx: &mut TranslationContext) {
    if ctx.policies.iter().any(|p| p.name == IBGP_EXPORT) {
        info!("ibgp-export policy found");
        return;
    }
    info!("ibgp-export policy not found, generating");
    let mut policy = PolicyModel::new(IBGP_EXPORT);
    policy.statements.push(Statement::new(
        NEXT_HOP_SELF_STMT,
        vec![Condition::Protocol("bgp".to_string())],
        vec![
            Action::LocalPreference("100".to_string()),
            Action::NextHop("self".to_string()),
        ],
    ));
    ctx.policies.push(policy);
}

/// Materialize `next-hop-self` configured on an address family into the
/// head of its export policy.
fn apply_next_hop_self(ctx: &mut TranslationContext) {
    let exports: Vec<String> = ctx
        .bgp_neighbors
        .iter()
        .flat_map(|n| &n.address_families)
        .filter(|af| af.next_hop_self)
        .map(|af| af.route_policy_out.clone())
        .collect();

    for export in exports {
        if export.is_empty() {
            info!("next-hop-self without export policy");
            continue;
        }
        if export.contains(IBGP_EXPORT) {
            auto_gen_ibgp_export(ctx);
        }
        match ctx.policy_mut(&export) {
            Some(policy) => {
                if !policy.has_next_hop_self_in_head() {
                    policy.insert_next_hop_self_in_head();
                }
            }
            None => warn!("no export policy found: {export}"),
        }
    }
}
