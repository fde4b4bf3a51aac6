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

//! # The vendor-neutral policy model
//!
//! This module contains the output data model: everything that ends up in
//! the per-device policy-model document. Conditions and actions are closed
//! tagged unions; their serialized form is the externally-tagged JSON object
//! the downstream topology tooling expects (e.g. `{"route-filter": {…}}` or
//! `{"target": "accept"}`).
//!
//! All collections are plain vectors: ordering is significant everywhere
//! (statement order mirrors vendor rule order) and translation must be
//! deterministic, so nothing here relies on map iteration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name prefix of a synthesized policy that accepts when a branch condition
/// holds.
pub const IF_CONDITION: &str = "if-condition-";
/// Name prefix of the logical complement of an [`IF_CONDITION`] policy.
pub const NOT_IF_CONDITION: &str = "not-if-condition-";
/// Sentinel statement name marking the synthesized next-hop-self statement.
pub const NEXT_HOP_SELF_STMT: &str = "_generated_next-hop-self";
/// Name of the auto-generated iBGP export policy.
pub const IBGP_EXPORT: &str = "ibgp-export";

/// The complete policy model of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyModelDocument {
    /// The device identity: its loopback address (CIDR string).
    pub node: String,
    /// All prefix-sets, in configuration order.
    #[serde(rename = "prefix-set")]
    pub prefix_set: Vec<PrefixSet>,
    /// All AS-path-sets, including synthesized `_generated_…` sets.
    #[serde(rename = "as-path-set")]
    pub as_path_set: Vec<AsPathSet>,
    /// All community-sets, including derived `…-and-…` sets.
    #[serde(rename = "community-set")]
    pub community_set: Vec<CommunitySet>,
    /// All policies, including synthesized conditional policies.
    pub policies: Vec<PolicyModel>,
    /// BGP neighbors with their per-address-family policy bindings. Only
    /// emitted by the IOS-XR adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp_neighbors: Option<Vec<BgpNeighbor>>,
}

/// A named set of IP prefixes with match semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixSet {
    /// Name of the set.
    pub name: String,
    /// The member prefixes, in configuration order.
    pub prefixes: Vec<PrefixEntry>,
}

impl PrefixSet {
    /// Whether every entry matches exactly (no length ranges). Exact-only
    /// sets can be referenced by name instead of being expanded into
    /// individual route-filters.
    pub fn only_exact(&self) -> bool {
        self.prefixes.iter().all(|p| p.match_type == PrefixMatchType::Exact)
    }
}

/// One prefix of a [`PrefixSet`], or the payload of a route-filter
/// condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixEntry {
    /// The prefix as a CIDR string.
    pub prefix: String,
    /// How the prefix is matched against a route.
    #[serde(rename = "match-type")]
    pub match_type: PrefixMatchType,
    /// Mask-length bounds. For `exact`, both bounds equal the prefix's own
    /// mask length (IOS-XR) or are absent (Junos route-filters).
    pub length: LengthRange,
}

/// Match semantics of a prefix entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrefixMatchType {
    /// The route's prefix must equal the entry.
    Exact,
    /// The route's mask length may be anything up to `length.max`.
    Upto,
    /// The route's prefix may be the entry or any more-specific prefix.
    Orlonger,
    /// The route's mask length must fall within `length`.
    PrefixLengthRange,
}

impl FromStr for PrefixMatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "upto" => Ok(Self::Upto),
            "orlonger" => Ok(Self::Orlonger),
            "prefix-length-range" => Ok(Self::PrefixLengthRange),
            other => Err(format!("unknown prefix match-type `{other}`")),
        }
    }
}

/// An inclusive mask-length (or AS-path-length) range. Bounds are kept as
/// the strings the parser produced; an empty range serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LengthRange {
    /// Lower bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    /// Upper bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl LengthRange {
    /// A range with both bounds set to the same value (exact match).
    pub fn exact(len: impl Into<String>) -> Self {
        let len = len.into();
        Self { min: Some(len.clone()), max: Some(len) }
    }

    /// A range with only an upper bound.
    pub fn upto(max: impl Into<String>) -> Self {
        Self { min: None, max: Some(max.into()) }
    }

    /// A range with only a lower bound.
    pub fn at_least(min: impl Into<String>) -> Self {
        Self { min: Some(min.into()), max: None }
    }

    /// A range with both bounds.
    pub fn between(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self { min: Some(min.into()), max: Some(max.into()) }
    }
}

/// A named group of AS-path match entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsPathSet {
    /// Name of the group.
    #[serde(rename = "group-name")]
    pub group_name: String,
    /// The match entries. A set configured without conditions carries a
    /// single wildcard entry (pattern `*`).
    #[serde(rename = "as-path")]
    pub entries: Vec<AsPathEntry>,
}

/// One entry of an [`AsPathSet`]: a regex-like pattern, a length bound, or
/// both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AsPathEntry {
    /// Entry name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Regex-like pattern matched against the AS path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// AS-path length bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthRange>,
}

/// A named set of BGP community values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySet {
    /// Name of the set. Derived sets synthesized for AND-combined matches
    /// join their member names with `-and-`.
    pub name: String,
    /// The member community values.
    pub communities: Vec<String>,
}

/// One match condition of a [`Statement`]. A statement's conditions are
/// ANDed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Match one prefix entry inline.
    #[serde(rename = "route-filter")]
    RouteFilter(PrefixEntry),
    /// Match a prefix-set by name (exact-only sets).
    #[serde(rename = "prefix-list")]
    PrefixList(String),
    /// Match a prefix-list with an explicit match-type (Junos).
    #[serde(rename = "prefix-list-filter")]
    PrefixListFilter(PrefixListFilter),
    /// Match an AS-path-set by name.
    #[serde(rename = "as-path-group")]
    AsPathGroup(String),
    /// Match any of the named community-sets.
    #[serde(rename = "community")]
    Community(Vec<String>),
    /// The route must be accepted by the referenced policy. Used to encode
    /// branch conditions; the referenced policy must exist in the same
    /// document.
    #[serde(rename = "policy")]
    Policy(String),
    /// Match the protocol the route was sourced from.
    #[serde(rename = "protocol")]
    Protocol(String),
    /// A marker for a match that could not be translated. Kept in the
    /// output so failures stay visible.
    #[serde(rename = "_message")]
    Message(TranslationFailure),
}

/// Payload of a [`Condition::Message`] marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFailure {
    /// The raw vendor match expression that could not be translated.
    #[serde(rename = "TRANSLATION_FAILED")]
    pub translation_failed: String,
}

impl TranslationFailure {
    /// Wrap a raw match expression in a failure marker condition.
    pub fn condition(raw: impl Into<String>) -> Condition {
        Condition::Message(Self { translation_failed: raw.into() })
    }
}

/// Payload of a [`Condition::PrefixListFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixListFilter {
    /// The referenced prefix-list.
    #[serde(rename = "prefix-list")]
    pub prefix_list: String,
    /// How the list is matched.
    #[serde(rename = "match-type")]
    pub match_type: PrefixMatchType,
}

/// One action of a [`Statement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Set the MED.
    #[serde(rename = "metric")]
    Metric(String),
    /// Set the local preference.
    #[serde(rename = "local-preference")]
    LocalPreference(String),
    /// Add, set or delete a community-set.
    #[serde(rename = "community")]
    Community(CommunityAction),
    /// Set the next hop (`self` or an address).
    #[serde(rename = "next-hop")]
    NextHop(String),
    /// Set the origin attribute.
    #[serde(rename = "origin")]
    Origin(String),
    /// Prepend ASNs to the AS path.
    #[serde(rename = "as-path-prepend")]
    AsPathPrepend(Vec<AsPathPrepend>),
    /// Apply a sub-policy by name (not inlined).
    #[serde(rename = "apply")]
    Apply(String),
    /// Terminal action.
    #[serde(rename = "target")]
    Target(Target),
}

/// Payload of an [`Action::Community`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityAction {
    /// Whether the set is added, set or deleted.
    pub action: CommunityActionType,
    /// The community-set name.
    pub name: String,
}

/// How a community action modifies the route's communities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityActionType {
    /// Add the set's values (additive).
    Add,
    /// Replace the communities with the set's values.
    Set,
    /// Delete the set's values.
    Delete,
}

impl FromStr for CommunityActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "set" => Ok(Self::Set),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown community action `{other}`")),
        }
    }
}

/// One AS of an [`Action::AsPathPrepend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsPathPrepend {
    /// The AS number to prepend (kept as the parsed token).
    pub asn: String,
    /// How many times to prepend it.
    pub repeat: u32,
}

/// Terminal action of a statement, mirroring the vendor's
/// `pass`/`drop`/`done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Continue with the next term (`pass`).
    #[serde(rename = "next term")]
    NextTerm,
    /// Reject the route (`drop`).
    #[serde(rename = "reject")]
    Reject,
    /// Accept the route (`done`).
    #[serde(rename = "accept")]
    Accept,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next term" => Ok(Self::NextTerm),
            "reject" => Ok(Self::Reject),
            "accept" => Ok(Self::Accept),
            other => Err(format!("unknown target `{other}`")),
        }
    }
}

/// One conditional rule of a policy: match conditions plus the actions to
/// apply when they hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    /// Statement name (a numbering aid, not semantically load-bearing).
    pub name: String,
    /// The ANDed match conditions.
    pub conditions: Vec<Condition>,
    /// The actions applied on a match.
    pub actions: Vec<Action>,
}

impl Statement {
    /// Create a statement.
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<Condition>,
        actions: Vec<Action>,
    ) -> Self {
        Self { name: name.into(), conditions, actions }
    }

    /// Whether the statement carries no actions yet. Empty statements are
    /// never flushed into a policy.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The default (fall-through) behavior of a policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyDefault {
    /// Actions applied when no statement matched.
    pub actions: Vec<Action>,
}

/// A named, ordered list of statements applied to routes during BGP
/// import/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyModel {
    /// Name of the policy.
    pub name: String,
    /// The statements, in vendor rule order.
    pub statements: Vec<Statement>,
    /// The fall-through behavior.
    pub default: PolicyDefault,
}

impl PolicyModel {
    /// Create an empty policy with an empty default.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), statements: Vec::new(), default: PolicyDefault::default() }
    }

    /// Set the default to a terminal accept.
    pub fn set_default_accept(&mut self) {
        self.default = PolicyDefault { actions: vec![Action::Target(Target::Accept)] };
    }

    /// Set the default to a terminal reject.
    pub fn set_default_reject(&mut self) {
        self.default = PolicyDefault { actions: vec![Action::Target(Target::Reject)] };
    }

    /// Prepend a statement rejecting every route that the given policy
    /// accepts. Used to encode "an earlier branch already matched".
    pub fn insert_policy_as_reject_statement(
        &mut self,
        policy_name: &str,
        statement_name: impl Into<String>,
    ) {
        self.statements.insert(
            0,
            Statement::new(
                statement_name,
                vec![Condition::Policy(policy_name.to_string())],
                vec![Action::Target(Target::Reject)],
            ),
        );
    }

    /// Whether the synthesized next-hop-self statement already heads the
    /// statement list.
    pub fn has_next_hop_self_in_head(&self) -> bool {
        self.statements.first().map_or(false, |s| s.name == NEXT_HOP_SELF_STMT)
    }

    /// Prepend the synthesized next-hop-self statement.
    pub fn insert_next_hop_self_in_head(&mut self) {
        self.statements.insert(
            0,
            Statement::new(
                NEXT_HOP_SELF_STMT,
                vec![],
                vec![Action::NextHop("self".to_string())],
            ),
        );
    }
}

/// Derive the name of the logical complement of a synthesized conditional
/// policy (`if-condition-…` ↔ `not-if-condition-…`). Returns `None` for
/// policies that are not synthesized conditionals.
pub fn opposite_policy_name(name: &str) -> Option<String> {
    if let Some(rest) = name.strip_prefix(IF_CONDITION) {
        Some(format!("{NOT_IF_CONDITION}{rest}"))
    } else {
        name.strip_prefix(NOT_IF_CONDITION).map(|rest| format!("{IF_CONDITION}{rest}"))
    }
}

/// One address-family of a BGP neighbor, with its policy bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressFamily {
    /// Address family identifier (e.g. `ipv4`).
    pub afi: String,
    /// Subsequent address family identifier (e.g. `unicast`).
    pub safi: String,
    /// Whether communities are sent to eBGP peers.
    pub send_community_ebgp: bool,
    /// Whether the next hop is rewritten to self on export.
    pub next_hop_self: bool,
    /// Whether private ASNs are stripped on export.
    pub remove_private_as: bool,
    /// Name of the import policy, or empty.
    pub route_policy_in: String,
    /// Name of the export policy, or empty.
    pub route_policy_out: String,
}

impl AddressFamily {
    /// A new address family with no attributes or policies set.
    pub fn new(afi: impl Into<String>, safi: impl Into<String>) -> Self {
        Self {
            afi: afi.into(),
            safi: safi.into(),
            send_community_ebgp: false,
            next_hop_self: false,
            remove_private_as: false,
            route_policy_in: String::new(),
            route_policy_out: String::new(),
        }
    }
}

/// One BGP neighbor of the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpNeighbor {
    /// The neighbor's AS number.
    pub remote_as: u32,
    /// The neighbor's address.
    pub remote_ip: String,
    /// The configured address families.
    pub address_families: Vec<AddressFamily>,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextTerm => write!(f, "next term"),
            Self::Reject => write!(f, "reject"),
            Self::Accept => write!(f, "accept"),
        }
    }
}
