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

//! The Juniper Junos adapter.
//!
//! Junos policy-statements are already flat (ordered terms with `from`
//! conditions and `then` actions), so no flattening is needed: the adapter
//! reshapes each term into a model statement, re-parsing the raw condition
//! and action strings the parser leaves unstructured (`route-filter`
//! expressions, bracketed community lists, quoted prepend strings).
//!
//! Junos documents carry no neighbor section.

use log::{info, warn};

use serde_json::Value;

use crate::context::TranslationContext;
use crate::model::{
    Action, AsPathPrepend, CommunityAction, CommunitySet, Condition, LengthRange, PolicyDefault,
    PolicyModel, PolicyModelDocument, PrefixEntry, PrefixListFilter, PrefixMatchType, Statement,
    TranslationFailure,
};
use crate::ttp::{JunosDeviceConfig, JunosPolicy, JunosTermEntry, RawEntry};

/// Translate one parsed Junos device into its policy-model document.
pub fn translate_device(config: &JunosDeviceConfig) -> PolicyModelDocument {
    let node = config
        .interfaces
        .iter()
        .filter(|i| i.name == "lo0")
        .filter_map(|i| i.address.clone())
        .last()
        .unwrap_or_default();
    let mut ctx = TranslationContext::new(node);

    ctx.prefix_set = config.prefix_sets.clone();
    ctx.aspath_set = config.aspath_sets.clone();
    for set in &config.community_sets {
        ctx.community_set.push(CommunitySet {
            name: set.community.clone(),
            communities: set.members.split_whitespace().map(str::to_string).collect(),
        });
    }

    for policy in &config.policies {
        if let Some(model) = translate_policy(policy) {
            ctx.policies.push(model);
        }
    }

    ctx.into_document(false)
}

fn translate_policy(policy: &JunosPolicy) -> Option<PolicyModel> {
    let default = policy
        .default
        .as_ref()
        .map(|d| PolicyDefault { actions: translate_actions(&d.actions) })
        .unwrap_or_default();

    let Some(terms) = &policy.statements else {
        info!("statements not found in {}", policy.name);
        // A bare default (a `then` without any `term`) still yields a
        // policy; a policy with neither is dropped.
        return policy.default.is_some().then(|| PolicyModel {
            name: policy.name.clone(),
            statements: vec![],
            default,
        });
    };

    let statements = terms
        .0
        .iter()
        .map(|(name, entries)| translate_term(name, entries))
        .collect();
    Some(PolicyModel { name: policy.name.clone(), statements, default })
}

fn translate_term(name: &str, entries: &[JunosTermEntry]) -> Statement {
    let mut conditions = Vec::new();
    let mut actions = Vec::new();
    for entry in entries {
        match entry {
            JunosTermEntry::Conditions { conditions: raw } => {
                conditions.extend(raw.iter().map(translate_condition));
            }
            JunosTermEntry::Actions { actions: raw } => {
                actions.extend(translate_actions(raw));
            }
        }
    }
    Statement::new(name, conditions, actions)
}

fn translate_actions(raw: &[RawEntry]) -> Vec<Action> {
    raw.iter().filter_map(translate_action).collect()
}

/// Reshape one raw `from` entry. Unknown entries become failure markers so
/// they stay visible in the output.
fn translate_condition(raw: &RawEntry) -> Condition {
    let Some((key, value)) = raw.iter().next() else {
        return TranslationFailure::condition("");
    };
    match (key.as_str(), value_str(value)) {
        ("route-filter", Some(expr)) => translate_route_filter(&expr),
        ("prefix-list-filter", Some(expr)) => match expr.split_whitespace().collect::<Vec<_>>()[..]
        {
            [prefix_list, match_type] => Condition::PrefixListFilter(PrefixListFilter {
                prefix_list: prefix_list.to_string(),
                match_type: parse_match_type(match_type),
            }),
            _ => unknown_condition(key, value),
        },
        // `[ 65001:100 65001:200 ]` or a single bare value
        ("community", Some(expr)) => Condition::Community(
            expr.trim_matches(['[', ']'].as_slice())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        ),
        ("prefix-list", Some(name)) => Condition::PrefixList(name),
        ("as-path-group", Some(name)) => Condition::AsPathGroup(name),
        ("policy", Some(name)) => Condition::Policy(name),
        ("protocol", Some(name)) => Condition::Protocol(name),
        _ => unknown_condition(key, value),
    }
}

fn unknown_condition(key: &str, value: &Value) -> Condition {
    let raw = format!("{key} {value}");
    info!("condition `{raw}` could not be translated");
    TranslationFailure::condition(raw)
}

/// Parse a `route-filter` expression: `<prefix> [<match-type> [<arg>]]`.
/// The length argument keeps Junos' `/nn` mask notation and is stripped to
/// the bare number (`prefix-length-range /25-/27`, `upto /24`).
fn translate_route_filter(expr: &str) -> Condition {
    let mut tokens = expr.split_whitespace();
    let prefix = tokens.next().unwrap_or_default().to_string();
    let elems: Vec<&str> = tokens.collect();

    let (match_type, length) = match elems[..] {
        [match_type] => (parse_match_type(match_type), LengthRange::default()),
        ["prefix-length-range", range] => {
            let (min, max) = range.split_once('-').unwrap_or((range, range));
            (
                PrefixMatchType::PrefixLengthRange,
                LengthRange::between(min.trim_start_matches('/'), max.trim_start_matches('/')),
            )
        }
        ["upto", max] => (PrefixMatchType::Upto, LengthRange::upto(max.trim_start_matches('/'))),
        _ => {
            warn!("route-filter `{expr}` has no recognizable match-type, matching exactly");
            (PrefixMatchType::Exact, LengthRange::default())
        }
    };
    Condition::RouteFilter(PrefixEntry { prefix, match_type, length })
}

fn parse_match_type(raw: &str) -> PrefixMatchType {
    raw.parse().unwrap_or_else(|e| {
        warn!("{e}, matching exactly");
        PrefixMatchType::Exact
    })
}

/// Reshape one raw `then` entry. Actions the model cannot express are
/// logged and dropped.
fn translate_action(raw: &RawEntry) -> Option<Action> {
    let (key, value) = raw.iter().next()?;
    let value_string = value_str(value);
    match (key.as_str(), value_string) {
        // `"65001 65001"` prepends each listed ASN once
        ("as-path-prepend", Some(expr)) => Some(Action::AsPathPrepend(
            expr.trim_matches('"')
                .split_whitespace()
                .map(|asn| AsPathPrepend { asn: asn.to_string(), repeat: 1 })
                .collect(),
        )),
        ("community", Some(expr)) => match expr.split_whitespace().collect::<Vec<_>>()[..] {
            [action, name] => match action.parse() {
                Ok(action) => Some(Action::Community(CommunityAction {
                    action,
                    name: name.to_string(),
                })),
                Err(e) => {
                    warn!("{e}, dropping action");
                    None
                }
            },
            _ => {
                warn!("community action `{expr}` could not be translated");
                None
            }
        },
        ("local-preference", Some(v)) => Some(Action::LocalPreference(v)),
        ("metric", Some(v)) => Some(Action::Metric(v)),
        ("next-hop", Some(v)) => Some(Action::NextHop(v)),
        ("origin", Some(v)) => Some(Action::Origin(v)),
        ("apply", Some(v)) => Some(Action::Apply(v)),
        ("target", Some(v)) => match v.parse() {
            Ok(target) => Some(Action::Target(target)),
            Err(e) => {
                warn!("{e}, dropping action");
                None
            }
        },
        _ => {
            warn!("action `{key} {value}` could not be translated");
            None
        }
    }
}

/// The string form of a raw scalar value (numbers are common for
/// `local-preference` and `metric`).
fn value_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
