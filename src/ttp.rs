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

//! # Parsed configuration trees
//!
//! Typed views of the structured trees produced by the external
//! template-matching parser. The parser wraps each device in nested lists
//! (`[[DeviceConfig]]` for IOS-XR, one level deeper for Junos); the batch
//! driver unwraps those before deserializing into the types here.
//!
//! Numeric-looking tokens (prefix lengths, AS-path lengths) may arrive as
//! JSON strings or numbers depending on the template; they are normalized
//! to strings on deserialization.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{AsPathSet, PrefixSet};

/// Accept a JSON string or number (or null) and normalize it to a string.
fn stringly_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

// ===== IOS-XR =====

/// One parsed IOS-XR device configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct XrDeviceConfig {
    /// All interfaces with their addresses.
    #[serde(default)]
    pub interfaces: Vec<XrInterface>,
    /// The BGP section, if the device speaks BGP.
    #[serde(default)]
    pub bgp: Option<XrBgp>,
    /// Configured community-sets.
    #[serde(rename = "community-sets", default)]
    pub community_sets: Vec<XrCommunitySet>,
    /// Configured as-path-sets.
    #[serde(rename = "as-path-sets", default)]
    pub as_path_sets: Vec<XrAsPathSet>,
    /// Configured prefix-sets.
    #[serde(rename = "prefix-sets", default)]
    pub prefix_sets: Vec<XrPrefixSet>,
    /// Configured route-policies.
    #[serde(default)]
    pub policies: Vec<XrPolicy>,
}

/// One interface of an IOS-XR device.
#[derive(Debug, Clone, Deserialize)]
pub struct XrInterface {
    /// Interface name (e.g. `Loopback0`).
    pub name: String,
    /// The IPv4 address block, if configured.
    #[serde(default)]
    pub ipv4: Option<XrInterfaceIpv4>,
}

/// IPv4 configuration of an interface.
#[derive(Debug, Clone, Deserialize)]
pub struct XrInterfaceIpv4 {
    /// Address as a CIDR string.
    pub address: String,
}

/// The BGP section of an IOS-XR device.
#[derive(Debug, Clone, Deserialize)]
pub struct XrBgp {
    /// All configured neighbors.
    #[serde(default)]
    pub neighbors: Vec<XrNeighbor>,
}

/// One BGP neighbor block. `remote-as`/`remote-ip` may be missing when the
/// neighbor only references a neighbor-group.
#[derive(Debug, Clone, Deserialize)]
pub struct XrNeighbor {
    /// The neighbor's AS number.
    #[serde(rename = "remote-as", default)]
    pub remote_as: Option<u32>,
    /// The neighbor's address.
    #[serde(rename = "remote-ip", default)]
    pub remote_ip: Option<String>,
    /// Configured address families.
    #[serde(rename = "address-families", default)]
    pub address_families: Vec<XrAddressFamily>,
}

/// One address-family block of a neighbor.
#[derive(Debug, Clone, Deserialize)]
pub struct XrAddressFamily {
    /// Address family identifier.
    pub afi: String,
    /// Subsequent address family identifier.
    pub safi: String,
    /// The statements configured under the address family.
    #[serde(default)]
    pub configs: XrAfConfigs,
}

/// Statements under an address family.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XrAfConfigs {
    /// Attached route-policies, keyed by direction.
    #[serde(rename = "route-policy", default)]
    pub route_policy: Option<XrRoutePolicyRef>,
    /// Flag-like attributes (`next-hop-self`, `send-community-ebgp`, …).
    #[serde(default)]
    pub attrs: Vec<XrAfAttr>,
}

/// Import/export route-policy references.
#[derive(Debug, Clone, Deserialize)]
pub struct XrRoutePolicyRef {
    /// Import policy name.
    #[serde(rename = "in", default)]
    pub import: Option<String>,
    /// Export policy name.
    #[serde(rename = "out", default)]
    pub export: Option<String>,
}

/// One flag attribute of an address family.
#[derive(Debug, Clone, Deserialize)]
pub struct XrAfAttr {
    /// The attribute keyword.
    pub value: String,
}

/// A configured community-set.
#[derive(Debug, Clone, Deserialize)]
pub struct XrCommunitySet {
    /// Name of the set.
    pub name: String,
    /// The member community values.
    #[serde(default)]
    pub communities: Vec<String>,
}

/// A configured as-path-set.
#[derive(Debug, Clone, Deserialize)]
pub struct XrAsPathSet {
    /// Name of the set.
    pub name: String,
    /// Match conditions; absent for an empty set.
    #[serde(default)]
    pub conditions: Option<Vec<XrAsPathCondition>>,
}

/// One condition of an as-path-set: a regex pattern, a length bound, or
/// both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XrAsPathCondition {
    /// The `ios-regex` pattern, if any.
    #[serde(default)]
    pub pattern: Option<String>,
    /// The length bound value, if any.
    #[serde(default, deserialize_with = "stringly_opt")]
    pub length: Option<String>,
    /// The length comparison operator (`le` or `ge`).
    #[serde(default)]
    pub condition: Option<String>,
}

/// A configured prefix-set.
#[derive(Debug, Clone, Deserialize)]
pub struct XrPrefixSet {
    /// Name of the set.
    pub name: String,
    /// Member prefixes; absent when the set is empty.
    #[serde(default)]
    pub prefixes: Option<Vec<XrPrefixEntry>>,
}

/// One prefix of a prefix-set, with its raw condition tokens (e.g.
/// `ge 24 le 28`).
#[derive(Debug, Clone, Deserialize)]
pub struct XrPrefixEntry {
    /// The prefix as a CIDR string.
    pub prefix: String,
    /// The raw length condition, if any.
    #[serde(default)]
    pub condition: Option<String>,
}

/// A parsed route-policy: its name and ordered rule list.
#[derive(Debug, Clone, Deserialize)]
pub struct XrPolicy {
    /// Name of the route-policy.
    pub name: String,
    /// The rules, in configuration order.
    #[serde(default)]
    pub rules: Vec<XrRule>,
}

/// One rule of a route-policy: either a plain action or a conditional
/// block.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum XrRule {
    /// An `if`/`elseif`/`else` block with nested rules.
    Conditional(XrConditionalRule),
    /// A plain action rule.
    Plain(XrPlainRule),
}

/// A conditional block of a route-policy.
#[derive(Debug, Clone, Deserialize)]
pub struct XrConditionalRule {
    /// Which branch keyword opened the block.
    #[serde(rename = "if")]
    pub branch: XrBranch,
    /// The boolean condition; absent for `else`.
    #[serde(default)]
    pub condition: Option<XrRuleCondition>,
    /// The rules inside the block.
    #[serde(default)]
    pub rules: Vec<XrRule>,
}

/// The branch keyword of a conditional rule. Unknown keywords are kept as
/// [`XrBranch::Other`] so one odd rule does not fail the whole device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XrBranch {
    /// An `if` branch.
    If,
    /// An `elseif` branch.
    Elseif,
    /// An `else` branch.
    Else,
    /// An unrecognized branch keyword.
    #[serde(other)]
    Other,
}

/// The boolean condition of an `if`/`elseif` rule: an operator over raw
/// match expressions.
#[derive(Debug, Clone, Deserialize)]
pub struct XrRuleCondition {
    /// `and`, `or`, or `state` (a single test).
    pub op: String,
    /// The raw match expressions.
    #[serde(default)]
    pub matches: Vec<String>,
}

/// A plain action rule (`set …`, `delete …`, `pass`, …).
#[derive(Debug, Clone, Deserialize)]
pub struct XrPlainRule {
    /// The action keyword.
    pub action: String,
    /// The attribute being modified, if any.
    #[serde(default)]
    pub attr: Option<String>,
    /// The attribute value, if any.
    #[serde(default, deserialize_with = "stringly_opt")]
    pub value: Option<String>,
}

// ===== Junos =====

/// One parsed Junos device configuration. Prefix- and as-path-sets arrive
/// already in their model shape; policy statements carry raw condition and
/// action strings that need re-parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct JunosDeviceConfig {
    /// All interfaces with their addresses.
    #[serde(default)]
    pub interfaces: Vec<JunosInterface>,
    /// Configured prefix-sets (already model-shaped).
    #[serde(rename = "prefix-sets", default)]
    pub prefix_sets: Vec<PrefixSet>,
    /// Configured as-path groups (already model-shaped).
    #[serde(rename = "aspath-sets", default)]
    pub aspath_sets: Vec<AsPathSet>,
    /// Configured community definitions.
    #[serde(rename = "community-sets", default)]
    pub community_sets: Vec<JunosCommunitySet>,
    /// Configured policy-statements.
    #[serde(default)]
    pub policies: Vec<JunosPolicy>,
}

/// One interface of a Junos device.
#[derive(Debug, Clone, Deserialize)]
pub struct JunosInterface {
    /// Interface name (e.g. `lo0`).
    pub name: String,
    /// Address as a CIDR string.
    #[serde(default)]
    pub address: Option<String>,
}

/// A Junos community definition.
#[derive(Debug, Clone, Deserialize)]
pub struct JunosCommunitySet {
    /// Name of the community.
    pub community: String,
    /// The member values as one whitespace-separated string.
    pub members: String,
}

/// One Junos policy-statement.
#[derive(Debug, Clone, Deserialize)]
pub struct JunosPolicy {
    /// Name of the policy.
    pub name: String,
    /// The terms, keyed by term name, in configuration order. Absent for
    /// policies that only carry a default (`then` without `term`).
    #[serde(default)]
    pub statements: Option<JunosStatements>,
    /// The default actions, if any.
    #[serde(default)]
    pub default: Option<JunosDefault>,
}

/// Default actions of a policy-statement.
#[derive(Debug, Clone, Deserialize)]
pub struct JunosDefault {
    /// The raw actions.
    #[serde(default)]
    pub actions: Vec<RawEntry>,
}

/// The terms of a policy-statement. The parser emits them as a JSON object
/// keyed by term name; order is significant, so deserialization keeps the
/// object's own order instead of going through a sorted map. The batch
/// driver routes documents through [`serde_json::Value`], so `serde_json`
/// needs its `preserve_order` feature for this to hold end to end.
#[derive(Debug, Clone, Default)]
pub struct JunosStatements(pub Vec<(String, Vec<JunosTermEntry>)>);

impl<'de> Deserialize<'de> for JunosStatements {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = JunosStatements;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of term name to term entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut terms = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    terms.push(entry);
                }
                Ok(JunosStatements(terms))
            }
        }

        deserializer.deserialize_map(Visitor)
    }
}

/// One entry of a term: either its `from` conditions or its `then` actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JunosTermEntry {
    /// The term's match conditions.
    Conditions {
        /// Raw condition objects.
        conditions: Vec<RawEntry>,
    },
    /// The term's actions.
    Actions {
        /// Raw action objects.
        actions: Vec<RawEntry>,
    },
}

/// A raw single-key object from the parser (`{"route-filter": "10.0.0.0/8
/// exact"}`). Unknown keys are kept so the adapter can surface them as
/// translation failures instead of aborting the device.
pub type RawEntry = serde_json::Map<String, Value>;
