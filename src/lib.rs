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

//! # BgpPolicyModel
//!
//! This is a library for translating vendor-specific BGP routing policy
//! configuration (Cisco IOS-XR and Juniper Junos) into a vendor-neutral
//! *policy model*: one JSON document per device, containing its prefix-sets,
//! AS-path-sets, community-sets, route policies, and BGP neighbor bindings.
//!
//! The library does *not* parse raw configuration text. It consumes the
//! structured trees produced by an external template-matching parser (see
//! [`ttp`]) and rebuilds them as an ordered sequence of policy statements
//! with conditions, actions and defaults (see [`model`]).
//!
//! ## Main Concepts
//!
//! The heart of the crate is the [`flatten`] module: IOS-XR route-policies
//! are small imperative programs with `if`/`elseif`/`else` blocks, while the
//! policy model is a flat, declarative list of statements. The flattening
//! engine compiles the control flow into conditions: for every branch it
//! synthesizes a pair of auxiliary policies (`if-condition-<name>` and its
//! logical complement `not-if-condition-<name>`, see [`synth`]) and tags the
//! branch body statements with references to them. Nested branches reference
//! their parent's synthesized policy, and `elseif`/`else` branches reject
//! whenever an earlier branch at the same level matched.
//!
//! All translation state (the growing set collections and the policy list)
//! lives in an explicit [`context::TranslationContext`] that is threaded
//! through every component, so independent devices can be translated
//! independently.
//!
//! Vendor differences are confined to the two adapters: [`xr`] (the full
//! flattening path, including BGP neighbor extraction and the auto-generated
//! `ibgp-export` policy) and [`junos`] (a single-pass reshaping, since Junos
//! policy terms are already flat). The [`batch`] module drives one
//! translation per parsed config file, skipping files that are not BGP
//! speakers, and [`merge`] assembles the topology-store patch payload.

pub mod action;
pub mod batch;
pub mod condition;
pub mod config;
pub mod context;
pub mod flatten;
pub mod junos;
pub mod merge;
pub mod model;
pub mod synth;
pub mod ttp;
pub mod types;
pub mod xr;

#[cfg(test)]
mod test;
