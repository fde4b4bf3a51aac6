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

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::model::{
    Action, Condition, LengthRange, PrefixMatchType, NEXT_HOP_SELF_STMT,
};
use crate::ttp::XrDeviceConfig;
use crate::xr::translate_device;

fn device(value: Value) -> XrDeviceConfig {
    serde_json::from_value(value).unwrap()
}

fn sample_device() -> XrDeviceConfig {
    device(json!({
        "interfaces": [
            {"name": "GigabitEthernet0/0/0/0", "ipv4": {"address": "172.16.0.1/30"}},
            {"name": "Loopback0", "ipv4": {"address": "10.0.0.1/32"}},
        ],
        "bgp": {
            "neighbors": [
                {
                    "remote-as": 65520,
                    "remote-ip": "172.16.0.2",
                    "address-families": [
                        {
                            "afi": "ipv4",
                            "safi": "unicast",
                            "configs": {
                                "attrs": [
                                    {"value": "next-hop-self"},
                                    {"value": "send-community-ebgp"},
                                ],
                            },
                        },
                    ],
                },
                // neighbor-group member without session parameters
                {"address-families": []},
            ],
        },
        "community-sets": [
            {"name": "peer-in", "communities": ["65001:10", "65001:20"]},
        ],
        "as-path-sets": [
            {"name": "via-transit", "conditions": [{"pattern": "_65010_"}]},
            {
                "name": "short-paths",
                "conditions": [
                    {"length": "3", "condition": "le"},
                    {"length": 1, "condition": "ge"},
                ],
            },
            {"name": "any-path"},
        ],
        "prefix-sets": [
            {
                "name": "customer-routes",
                "prefixes": [
                    {"prefix": "10.100.0.0/16"},
                    {"prefix": "10.110.0.0/16", "condition": "ge 24"},
                    {"prefix": "10.120.0.0/16", "condition": "le 28"},
                    {"prefix": "10.130.0.0/16", "condition": "ge 20 le 24"},
                ],
            },
            {"name": "empty-set"},
        ],
        "policies": [
            {
                "name": "static-out",
                "rules": [{"action": "done"}],
            },
        ],
    }))
}

#[test]
fn node_is_the_loopback_address() {
    let document = translate_device(&sample_device()).unwrap();
    assert_eq!(document.node, "10.0.0.1/32");
}

#[test]
fn incomplete_neighbors_are_dropped() {
    let document = translate_device(&sample_device()).unwrap();
    let neighbors = document.bgp_neighbors.unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].remote_as, 65520);
    assert_eq!(neighbors[0].remote_ip, "172.16.0.2");

    let af = &neighbors[0].address_families[0];
    assert_eq!(af.afi, "ipv4");
    assert_eq!(af.safi, "unicast");
    assert!(af.next_hop_self);
    assert!(af.send_community_ebgp);
    assert!(!af.remove_private_as);
}

#[test]
fn next_hop_self_without_policy_binds_ibgp_export() {
    let document = translate_device(&sample_device()).unwrap();
    let neighbors = document.bgp_neighbors.unwrap();
    assert_eq!(neighbors[0].address_families[0].route_policy_out, "ibgp-export");

    // the policy is synthesized with the next-hop-self statement in head
    let ibgp = document.policies.iter().find(|p| p.name == "ibgp-export").unwrap();
    assert_eq!(ibgp.statements.len(), 1);
    assert_eq!(ibgp.statements[0].name, NEXT_HOP_SELF_STMT);
    assert_eq!(
        ibgp.statements[0].conditions,
        vec![Condition::Protocol("bgp".to_string())]
    );
    assert_eq!(
        ibgp.statements[0].actions,
        vec![
            Action::LocalPreference("100".to_string()),
            Action::NextHop("self".to_string()),
        ]
    );
}

#[test]
fn next_hop_self_with_explicit_export_policy() {
    let config = device(json!({
        "interfaces": [{"name": "Loopback0", "ipv4": {"address": "10.0.0.2/32"}}],
        "bgp": {
            "neighbors": [
                {
                    "remote-as": 65520,
                    "remote-ip": "172.16.0.2",
                    "address-families": [
                        {
                            "afi": "ipv4",
                            "safi": "unicast",
                            "configs": {
                                "route-policy": {"out": "ebgp-out"},
                                "attrs": [{"value": "next-hop-self"}],
                            },
                        },
                    ],
                },
            ],
        },
        "policies": [
            {"name": "ebgp-out", "rules": [{"action": "done"}]},
        ],
    }));
    let document = translate_device(&config).unwrap();

    // no ibgp-export is generated; the existing policy is amended instead
    assert!(document.policies.iter().all(|p| p.name != "ibgp-export"));
    let export = document.policies.iter().find(|p| p.name == "ebgp-out").unwrap();
    assert_eq!(export.statements[0].name, NEXT_HOP_SELF_STMT);
    assert_eq!(
        export.statements[0].actions,
        vec![Action::NextHop("self".to_string())]
    );
    assert_eq!(export.statements[1].name, "ebgp-out-10");
}

#[test]
fn aspath_sets_are_reshaped() {
    let document = translate_device(&sample_device()).unwrap();
    assert_eq!(document.as_path_set.len(), 3);

    // ios-regex patterns use spaces instead of underscores
    let pattern_set = &document.as_path_set[0];
    assert_eq!(pattern_set.group_name, "via-transit");
    assert_eq!(pattern_set.entries.len(), 1);
    assert_eq!(pattern_set.entries[0].name.as_deref(), Some("via-transit_1"));
    assert_eq!(pattern_set.entries[0].pattern.as_deref(), Some(" 65010 "));

    // `le` entries carry no name, `ge` entries do
    let length_set = &document.as_path_set[1];
    assert_eq!(length_set.entries.len(), 2);
    assert_eq!(length_set.entries[0].name, None);
    assert_eq!(length_set.entries[0].length, Some(LengthRange::upto("3")));
    assert_eq!(length_set.entries[1].name.as_deref(), Some("short-paths_2"));
    assert_eq!(length_set.entries[1].length, Some(LengthRange::at_least("1")));

    // an empty set matches everything
    let wildcard_set = &document.as_path_set[2];
    assert_eq!(wildcard_set.entries.len(), 1);
    assert_eq!(wildcard_set.entries[0].name.as_deref(), Some("any-path"));
    assert_eq!(wildcard_set.entries[0].pattern.as_deref(), Some("*"));
}

#[test]
fn prefix_sets_are_reshaped() {
    let document = translate_device(&sample_device()).unwrap();
    // the set without prefixes is dropped
    assert_eq!(document.prefix_set.len(), 1);
    let prefixes = &document.prefix_set[0].prefixes;
    assert_eq!(prefixes.len(), 4);

    assert_eq!(prefixes[0].match_type, PrefixMatchType::Exact);
    assert_eq!(prefixes[0].length, LengthRange::exact("16"));

    assert_eq!(prefixes[1].match_type, PrefixMatchType::PrefixLengthRange);
    assert_eq!(prefixes[1].length, LengthRange::between("24", "32"));

    assert_eq!(prefixes[2].match_type, PrefixMatchType::Upto);
    assert_eq!(prefixes[2].length, LengthRange::upto("28"));

    assert_eq!(prefixes[3].match_type, PrefixMatchType::PrefixLengthRange);
    assert_eq!(prefixes[3].length, LengthRange::between("20", "24"));
}

#[test]
fn translation_is_deterministic() {
    let a = serde_json::to_value(translate_device(&sample_device()).unwrap()).unwrap();
    let b = serde_json::to_value(translate_device(&sample_device()).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn document_wire_shape() {
    let document = translate_device(&sample_device()).unwrap();
    let value = serde_json::to_value(&document).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert!(keys.contains(&"node"));
    assert!(keys.contains(&"prefix-set"));
    assert!(keys.contains(&"as-path-set"));
    assert!(keys.contains(&"community-set"));
    assert!(keys.contains(&"policies"));
    assert!(keys.contains(&"bgp_neighbors"));

    assert_eq!(
        value["prefix-set"][0]["prefixes"][0],
        json!({
            "prefix": "10.100.0.0/16",
            "match-type": "exact",
            "length": {"min": "16", "max": "16"},
        })
    );
}
