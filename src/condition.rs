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

//! Translation of raw IOS-XR boolean match expressions into model
//! conditions.
//!
//! A single match expression can fan out into several conditions (a
//! `destination in <set>` over a non-exact prefix-set becomes one
//! route-filter per member), and `as-path length` tests synthesize a
//! `_generated_…` AS-path-set in the context as a side effect.

use log::info;

use crate::context::TranslationContext;
use crate::model::{AsPathEntry, AsPathSet, Condition, LengthRange};

/// Translate one raw match expression. Returns `None` when the expression
/// is not supported (the caller emits a `TRANSLATION_FAILED` marker); a
/// successful translation always yields at least one condition.
pub fn translate_match(ctx: &mut TranslationContext, raw: &str) -> Option<Vec<Condition>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match *tokens.first()? {
        "destination" => translate_destination(ctx, raw, &tokens),
        "as-path" => Some(translate_as_path(ctx, raw, &tokens)),
        "community" => translate_community(&tokens),
        _ => None,
    }
}

/// `destination in <prefix-set>`: reference the set by name when every
/// member matches exactly, otherwise expand it into one route-filter per
/// member.
fn translate_destination(
    ctx: &TranslationContext,
    raw: &str,
    tokens: &[&str],
) -> Option<Vec<Condition>> {
    let name = *tokens.last()?;
    let Some(set) = ctx.prefix_set(name) else {
        info!("{raw}: prefix-set {name} not found");
        return None;
    };
    if set.only_exact() {
        return Some(vec![Condition::PrefixList(name.to_string())]);
    }
    info!("{raw}: expanding prefix-set {name} into route-filters");
    let filters: Vec<Condition> = set
        .prefixes
        .iter()
        .map(|entry| Condition::RouteFilter(entry.clone()))
        .collect();
    (!filters.is_empty()).then_some(filters)
}

/// `as-path in <set>` or `as-path length le|ge <n>`. Length tests have no
/// named set to reference, so one is synthesized on the fly; its name is
/// the expression itself with spaces replaced by underscores.
fn translate_as_path(ctx: &mut TranslationContext, raw: &str, tokens: &[&str]) -> Vec<Condition> {
    if tokens.contains(&"length") {
        let name = format!("_generated_{}", raw.replace(' ', "_"));
        let bound = tokens.last().map(|s| s.to_string()).unwrap_or_default();
        let length = if tokens.contains(&"le") {
            LengthRange::upto(bound)
        } else {
            LengthRange::at_least(bound)
        };
        ctx.add_aspath_set(AsPathSet {
            group_name: name.clone(),
            entries: vec![AsPathEntry {
                name: Some(name.clone()),
                pattern: None,
                length: Some(length),
            }],
        });
        return vec![Condition::AsPathGroup(name)];
    }
    let name = tokens.last().map(|s| s.to_string()).unwrap_or_default();
    vec![Condition::AsPathGroup(name)]
}

/// `community matches-any <set>`. `matches-every` is not representable in
/// the model and falls through to a translation failure.
fn translate_community(tokens: &[&str]) -> Option<Vec<Condition>> {
    match tokens {
        ["community", "matches-any", set] => {
            Some(vec![Condition::Community(vec![set.to_string()])])
        }
        ["community", "matches-every", _] => {
            info!("matches-every is not implemented");
            None
        }
        _ => None,
    }
}
