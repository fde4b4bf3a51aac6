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

//! The mutable per-device translation state.
//!
//! One [`TranslationContext`] is created per parsed device and threaded
//! through all translation components. The components append synthesized
//! policies and derived sets as they go; when the device is done the
//! context is turned into the output document. Nothing is shared between
//! devices.

use log::warn;

use crate::model::{
    opposite_policy_name, AsPathSet, BgpNeighbor, CommunitySet, PolicyModel,
    PolicyModelDocument, PrefixSet,
};

/// All translation state of one device.
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    /// The device identity (loopback address, CIDR string).
    pub node: String,
    /// Prefix-sets, configured ones first, then derived ones.
    pub prefix_set: Vec<PrefixSet>,
    /// AS-path-sets, configured ones first, then `_generated_…` sets.
    pub aspath_set: Vec<AsPathSet>,
    /// Community-sets, configured ones first, then `…-and-…` sets.
    pub community_set: Vec<CommunitySet>,
    /// All policies translated so far, including synthesized ones.
    pub policies: Vec<PolicyModel>,
    /// BGP neighbors with their policy bindings.
    pub bgp_neighbors: Vec<BgpNeighbor>,
}

impl TranslationContext {
    /// Create an empty context for one device.
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into(), ..Default::default() }
    }

    /// Look up a policy by name. Logs when the name resolves to zero or
    /// several policies (both indicate an inconsistent source config).
    pub fn policy(&self, name: &str) -> Option<&PolicyModel> {
        let mut matches = self.policies.iter().filter(|p| p.name == name);
        let found = matches.next();
        if found.is_none() {
            warn!("no policy object found for name {name}");
        } else if matches.next().is_some() {
            warn!("multiple policy objects found for name {name}, using the first");
        }
        found
    }

    /// Look up a policy by name, mutably.
    pub fn policy_mut(&mut self, name: &str) -> Option<&mut PolicyModel> {
        self.policies.iter_mut().find(|p| p.name == name)
    }

    /// Look up the logical complement of a synthesized conditional policy.
    pub fn opposite_policy(&self, name: &str) -> Option<&PolicyModel> {
        let opposite = opposite_policy_name(name)?;
        self.policy(&opposite)
    }

    /// Look up a prefix-set by name.
    pub fn prefix_set(&self, name: &str) -> Option<&PrefixSet> {
        self.prefix_set.iter().find(|s| s.name == name)
    }

    /// Look up a community-set by name.
    pub fn community_set(&self, name: &str) -> Option<&CommunitySet> {
        self.community_set.iter().find(|s| s.name == name)
    }

    /// Add a community-set unless one with the same name already exists.
    pub fn add_community_set(&mut self, set: CommunitySet) {
        if self.community_set(&set.name).is_none() {
            self.community_set.push(set);
        }
    }

    /// Add an AS-path-set unless one with the same group name already
    /// exists.
    pub fn add_aspath_set(&mut self, set: AsPathSet) {
        if !self.aspath_set.iter().any(|s| s.group_name == set.group_name) {
            self.aspath_set.push(set);
        }
    }

    /// Turn the context into the output document. The IOS-XR adapter emits
    /// neighbors; the Junos adapter does not.
    pub fn into_document(self, include_neighbors: bool) -> PolicyModelDocument {
        PolicyModelDocument {
            node: self.node,
            prefix_set: self.prefix_set,
            as_path_set: self.aspath_set,
            community_set: self.community_set,
            policies: self.policies,
            bgp_neighbors: include_neighbors.then_some(self.bgp_neighbors),
        }
    }
}
