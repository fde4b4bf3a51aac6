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

//! Translation of plain IOS-XR rules (`set …`, `delete …`, `prepend`,
//! `apply`, `pass`/`drop`/`done`) into model actions.

use log::{info, warn};

use crate::model::{
    Action, AsPathPrepend, CommunityAction, CommunityActionType, Target,
};
use crate::ttp::XrPlainRule;

/// Translate one plain rule. Returns `None` for rules the model cannot
/// express; those are logged and dropped rather than aborting the policy.
pub fn translate_rule(rule: &XrPlainRule) -> Option<Action> {
    info!("translate rule: {rule:?}");
    match rule.action.as_str() {
        "set" => translate_set(rule),
        "delete" => translate_delete(rule),
        "prepend" => translate_prepend(rule),
        "apply" => rule.value.clone().map(Action::Apply),
        "pass" => Some(Action::Target(Target::NextTerm)),
        "drop" => Some(Action::Target(Target::Reject)),
        "done" => Some(Action::Target(Target::Accept)),
        other => {
            warn!("unsupported action `{other}`, dropping rule");
            None
        }
    }
}

fn translate_set(rule: &XrPlainRule) -> Option<Action> {
    let value = rule.value.clone()?;
    match rule.attr.as_deref()? {
        "med" => Some(Action::Metric(value)),
        "local-preference" => Some(Action::LocalPreference(value)),
        "community" => {
            let name = value.split_whitespace().next()?.to_string();
            let action = if value.contains("additive") {
                CommunityActionType::Add
            } else {
                CommunityActionType::Set
            };
            Some(Action::Community(CommunityAction { action, name }))
        }
        "next-hop" => Some(Action::NextHop(value)),
        "origin" => Some(Action::Origin(value)),
        other => {
            warn!("unsupported set attribute `{other}`, dropping rule");
            None
        }
    }
}

/// `delete community in <set>`. The set name is the last token; a negated
/// form (`not in`) cannot be expressed and is translated as if it were
/// positive.
fn translate_delete(rule: &XrPlainRule) -> Option<Action> {
    if rule.attr.as_deref()? != "community" {
        return None;
    }
    let value = rule.value.as_deref()?;
    if value.contains("not in") {
        warn!("negated community delete `{value}` translated as positive match");
    }
    let name = value.split_whitespace().last()?.to_string();
    Some(Action::Community(CommunityAction { action: CommunityActionType::Delete, name }))
}

/// `prepend as-path <asn> [<repeat>]`, defaulting to a single prepend.
fn translate_prepend(rule: &XrPlainRule) -> Option<Action> {
    let value = rule.value.as_deref()?;
    let mut tokens = value.split_whitespace();
    let asn = tokens.next()?.to_string();
    let repeat = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1);
    Some(Action::AsPathPrepend(vec![AsPathPrepend { asn, repeat }]))
}
