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
use serde_json::json;

use super::ctx_with_sets;
use crate::model::{Action, Condition, Target, TranslationFailure};
use crate::synth::generate_conditional_policies;
use crate::ttp::XrRuleCondition;
use crate::types::TranslationError;

fn condition(op: &str, matches: &[&str]) -> XrRuleCondition {
    serde_json::from_value(json!({"op": op, "matches": matches})).unwrap()
}

#[test]
fn single_test_yields_policy_pair() {
    let mut ctx = ctx_with_sets();
    let (if_policy, not_if_policy) = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-10",
        &condition("state", &["community matches-any peer-in"]),
    )
    .unwrap();

    assert_eq!(if_policy.name, "if-condition-ebgp-in-10");
    assert_eq!(if_policy.statements.len(), 1);
    assert_eq!(if_policy.statements[0].name, "10");
    assert_eq!(
        if_policy.statements[0].conditions,
        vec![Condition::Community(vec!["peer-in".to_string()])]
    );
    assert_eq!(if_policy.statements[0].actions, vec![Action::Target(Target::Accept)]);
    assert_eq!(if_policy.default.actions, vec![Action::Target(Target::Reject)]);

    assert_eq!(not_if_policy.name, "not-if-condition-ebgp-in-10");
    assert_eq!(not_if_policy.statements.len(), 1);
    assert_eq!(
        not_if_policy.statements[0].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(not_if_policy.statements[0].actions, vec![Action::Target(Target::Reject)]);
    assert_eq!(not_if_policy.default.actions, vec![Action::Target(Target::Accept)]);
}

#[test]
fn and_folds_multiple_community_matches() {
    let mut ctx = ctx_with_sets();
    let (if_policy, _) = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-10",
        &condition(
            "and",
            &[
                "community matches-any peer-in",
                "community matches-any customer-in",
            ],
        ),
    )
    .unwrap();

    // one statement, its two community conditions replaced by the folded set
    assert_eq!(if_policy.statements.len(), 1);
    assert_eq!(
        if_policy.statements[0].conditions,
        vec![Condition::Community(vec!["peer-in-and-customer-in".to_string()])]
    );

    let folded = ctx.community_set("peer-in-and-customer-in").unwrap();
    assert_eq!(
        folded.communities,
        vec!["65001:10".to_string(), "65001:20".to_string(), "65001:30".to_string()]
    );
}

#[test]
fn and_keeps_mixed_conditions_conjunctive() {
    let mut ctx = ctx_with_sets();
    let (if_policy, _) = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-10",
        &condition(
            "and",
            &[
                "destination in aggregated-prefixes",
                "community matches-any peer-in",
            ],
        ),
    )
    .unwrap();

    assert_eq!(
        if_policy.statements[0].conditions,
        vec![
            Condition::PrefixList("aggregated-prefixes".to_string()),
            Condition::Community(vec!["peer-in".to_string()]),
        ]
    );
    // a single community match is not folded
    assert!(ctx.community_set("peer-in-and-customer-in").is_none());
}

#[test]
fn or_fans_out_into_statements() {
    let mut ctx = ctx_with_sets();
    let (if_policy, _) = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-20",
        &condition(
            "or",
            &[
                "community matches-any peer-in",
                "destination in aggregated-prefixes",
            ],
        ),
    )
    .unwrap();

    assert_eq!(if_policy.statements.len(), 2);
    assert_eq!(if_policy.statements[0].name, "0");
    assert_eq!(
        if_policy.statements[0].conditions,
        vec![Condition::Community(vec!["peer-in".to_string()])]
    );
    assert_eq!(if_policy.statements[1].name, "1");
    assert_eq!(
        if_policy.statements[1].conditions,
        vec![Condition::PrefixList("aggregated-prefixes".to_string())]
    );
    for statement in &if_policy.statements {
        assert_eq!(statement.actions, vec![Action::Target(Target::Accept)]);
    }
}

#[test]
fn untranslatable_match_becomes_marker() {
    let mut ctx = ctx_with_sets();
    let (if_policy, _) = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-10",
        &condition("state", &["rd in some-set"]),
    )
    .unwrap();

    assert_eq!(
        if_policy.statements[0].conditions,
        vec![TranslationFailure::condition("rd in some-set")]
    );
}

#[test]
fn unknown_operator_is_an_error() {
    let mut ctx = ctx_with_sets();
    let err = generate_conditional_policies(
        &mut ctx,
        "ebgp-in",
        "ebgp-in-10",
        &condition("xor", &["community matches-any peer-in"]),
    )
    .unwrap_err();

    assert_eq!(
        err,
        TranslationError::UnknownOperator {
            policy: "ebgp-in".to_string(),
            op: "xor".to_string(),
        }
    );
}
