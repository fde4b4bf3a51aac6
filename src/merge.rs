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

//! Assembly of the topology-store merge payload.
//!
//! The translated per-device documents are packed into a single patch
//! object for the topology data store: one node patch per device (keyed by
//! the node id, the loopback address without its mask length), plus
//! termination-point patches binding import/export policies to the peers
//! that rely on the synthesized `ibgp-export` policy.

use std::fs;
use std::path::Path;

use itertools::Itertools;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{
    AsPathSet, CommunitySet, PolicyModel, PolicyModelDocument, PrefixSet, IBGP_EXPORT,
};
use crate::types::BatchError;

lazy_static! {
    static ref MASK_LENGTH: Regex = Regex::new(r"/\d+$").unwrap();
}

/// The complete merge payload: one patch per translated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePayload {
    /// The node patches.
    pub node: Vec<NodePatch>,
}

/// The attribute patch for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    /// The node id: the loopback address without its mask length.
    #[serde(rename = "node-id")]
    pub node_id: String,
    /// The BGP process attributes.
    #[serde(rename = "mddo-topology:bgp-proc-node-attributes")]
    pub attributes: NodeAttributes,
    /// Termination-point patches; absent for devices without a neighbor
    /// section (Junos).
    #[serde(
        rename = "ietf-network-topology:termination-point",
        skip_serializing_if = "Option::is_none"
    )]
    pub termination_points: Option<Vec<TpPatch>>,
}

/// The BGP process attributes of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// All policies of the device.
    pub policy: Vec<PolicyModel>,
    /// All prefix-sets of the device.
    #[serde(rename = "prefix-set")]
    pub prefix_set: Vec<PrefixSet>,
    /// All AS-path-sets of the device.
    #[serde(rename = "as-path-set")]
    pub as_path_set: Vec<AsPathSet>,
    /// All community-sets of the device.
    #[serde(rename = "community-set")]
    pub community_set: Vec<CommunitySet>,
}

/// The attribute patch for one termination point (one BGP peer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpPatch {
    /// The termination-point id, `peer_<remote-ip>`.
    #[serde(rename = "tp-id")]
    pub tp_id: String,
    /// The policy bindings of the peer.
    #[serde(rename = "mddo-topology:bgp-proc-termination-point-attributes")]
    pub attributes: TpAttributes,
}

/// Import/export policy bindings of a peer. Empty bindings are omitted
/// entirely rather than sent as empty arrays.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TpAttributes {
    /// The import policies.
    #[serde(rename = "import-policy", skip_serializing_if = "Option::is_none")]
    pub import_policy: Option<Vec<String>>,
    /// The export policies.
    #[serde(rename = "export-policy", skip_serializing_if = "Option::is_none")]
    pub export_policy: Option<Vec<String>>,
}

/// Pack the translated documents into one merge payload.
pub fn build_payload(documents: Vec<PolicyModelDocument>) -> MergePayload {
    MergePayload { node: documents.into_iter().map(convert_document).collect() }
}

fn convert_document(doc: PolicyModelDocument) -> NodePatch {
    let node_id = MASK_LENGTH.replace(&doc.node, "").into_owned();
    let attributes = NodeAttributes {
        policy: doc.policies,
        prefix_set: doc.prefix_set,
        as_path_set: doc.as_path_set,
        community_set: doc.community_set,
    };

    let termination_points = doc.bgp_neighbors.map(|neighbors| {
        neighbors
            .iter()
            .filter_map(|neighbor| {
                // Only ipv4 peers that rewrite the next hop need a patch.
                let af = neighbor
                    .address_families
                    .iter()
                    .find(|af| af.afi == "ipv4" && af.next_hop_self)?;
                if !af.route_policy_out.contains(IBGP_EXPORT) {
                    return None;
                }
                Some(TpPatch {
                    tp_id: format!("peer_{}", neighbor.remote_ip),
                    attributes: TpAttributes {
                        import_policy: (!af.route_policy_in.is_empty())
                            .then(|| vec![af.route_policy_in.clone()]),
                        export_policy: (!af.route_policy_out.is_empty())
                            .then(|| vec![af.route_policy_out.clone()]),
                    },
                })
            })
            .collect()
    });

    NodePatch { node_id, attributes, termination_points }
}

/// Read every translated policy-model document of one snapshot, in
/// lexicographic file order.
pub fn read_documents(dir: &Path) -> Result<Vec<PolicyModelDocument>, BatchError> {
    let files = fs::read_dir(dir)
        .map_err(|source| BatchError::Io { path: dir.to_path_buf(), source })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .sorted()
        .collect_vec();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        info!("loading policy model: {}", path.display());
        let raw = fs::read_to_string(&path)
            .map_err(|source| BatchError::Io { path: path.clone(), source })?;
        let doc = serde_json::from_str(&raw)
            .map_err(|source| BatchError::Json { path: path.clone(), source })?;
        documents.push(doc);
    }
    Ok(documents)
}
