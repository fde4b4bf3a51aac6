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

//! The conditional-policy synthesizer.
//!
//! Every `if`/`elseif` branch of a vendor policy becomes a pair of
//! auxiliary policies: `if-condition-<basename>` accepts exactly the routes
//! matching the branch condition (default reject), and its complement
//! `not-if-condition-<basename>` rejects them (default accept). The
//! flattening engine then encodes branch membership as plain `policy`
//! conditions referencing these names.
//!
//! Boolean structure maps onto policy structure: ANDed matches share one
//! statement (conditions within a statement are conjunctive), ORed matches
//! fan out into one statement per match (a policy accepts when any
//! statement does).

use log::info;

use crate::condition::translate_match;
use crate::context::TranslationContext;
use crate::model::{
    Action, Condition, CommunitySet, PolicyModel, Statement, Target, TranslationFailure,
    IF_CONDITION, NOT_IF_CONDITION,
};
use crate::ttp::XrRuleCondition;
use crate::types::TranslationError;

/// Synthesize the `(if, not-if)` policy pair for one branch condition.
/// `policy` is the vendor policy being flattened (for error context) and
/// `basename` the unique branch name the pair is derived from.
pub fn generate_conditional_policies(
    ctx: &mut TranslationContext,
    policy: &str,
    basename: &str,
    condition: &XrRuleCondition,
) -> Result<(PolicyModel, PolicyModel), TranslationError> {
    let if_name = format!("{IF_CONDITION}{basename}");

    let mut if_policy = match condition.op.as_str() {
        // A single test is translated like a one-element conjunction.
        "and" | "state" => {
            let mut statement = Statement::new("10", vec![], vec![]);
            for raw in &condition.matches {
                statement.conditions.extend(translated_or_marker(ctx, raw));
            }
            if condition.op == "and" {
                fold_community_conditions(ctx, &mut statement);
            }
            statement.actions.push(Action::Target(Target::Accept));
            PolicyModel {
                name: if_name.clone(),
                statements: vec![statement],
                default: Default::default(),
            }
        }
        "or" => {
            let statements = condition
                .matches
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    Statement::new(
                        i.to_string(),
                        translated_or_marker(ctx, raw),
                        vec![Action::Target(Target::Accept)],
                    )
                })
                .collect();
            PolicyModel { name: if_name.clone(), statements, default: Default::default() }
        }
        op => {
            return Err(TranslationError::UnknownOperator {
                policy: policy.to_string(),
                op: op.to_string(),
            })
        }
    };
    if_policy.set_default_reject();

    let mut not_if_policy = PolicyModel {
        name: format!("{NOT_IF_CONDITION}{basename}"),
        statements: vec![Statement::new(
            "10",
            vec![Condition::Policy(if_name)],
            vec![Action::Target(Target::Reject)],
        )],
        default: Default::default(),
    };
    not_if_policy.set_default_accept();

    Ok((if_policy, not_if_policy))
}

/// Translate one match, falling back to a `TRANSLATION_FAILED` marker so
/// unsupported expressions stay visible in the output.
fn translated_or_marker(ctx: &mut TranslationContext, raw: &str) -> Vec<Condition> {
    match translate_match(ctx, raw) {
        Some(conditions) => conditions,
        None => {
            info!("{raw} could not be translated");
            vec![TranslationFailure::condition(raw)]
        }
    }
}

/// ANDed community matches cannot be expressed directly (a `community`
/// condition matches *any* of its sets), so two or more of them are folded
/// into a single derived community-set whose name joins the members with
/// `-and-` and whose values are the concatenated member values.
fn fold_community_conditions(ctx: &mut TranslationContext, statement: &mut Statement) {
    let referenced: Vec<String> = statement
        .conditions
        .iter()
        .filter_map(|c| match c {
            Condition::Community(names) => names.first().cloned(),
            _ => None,
        })
        .collect();
    if referenced.len() < 2 {
        return;
    }

    let mut member_names = Vec::new();
    let mut member_values = Vec::new();
    for name in &referenced {
        if let Some(set) = ctx.community_set(name) {
            member_names.push(set.name.clone());
            member_values.extend(set.communities.iter().cloned());
        }
    }
    let folded_name = member_names.join("-and-");
    ctx.community_set.push(CommunitySet {
        name: folded_name.clone(),
        communities: member_values,
    });
    info!("create derived community-set: {folded_name}");

    statement.conditions.retain(|c| !matches!(c, Condition::Community(_)));
    statement.conditions.push(Condition::Community(vec![folded_name]));
}
