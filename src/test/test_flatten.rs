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
use serde_json::{json, Value};

use super::ctx_with_sets;
use crate::context::TranslationContext;
use crate::flatten::{translate_policy, MAX_NESTING_DEPTH};
use crate::model::{Action, Condition, Target};
use crate::ttp::XrPolicy;
use crate::types::TranslationError;

fn policy(value: Value) -> XrPolicy {
    serde_json::from_value(value).unwrap()
}

/// Every `policy` condition must reference a policy of the same context.
fn assert_referential_closure(ctx: &TranslationContext) {
    for policy in &ctx.policies {
        for statement in &policy.statements {
            for condition in &statement.conditions {
                if let Condition::Policy(name) = condition {
                    assert!(
                        ctx.policies.iter().any(|p| &p.name == name),
                        "dangling policy reference {name} in {}",
                        policy.name
                    );
                }
            }
        }
    }
}

#[test]
fn plain_rules_share_one_statement() {
    let mut ctx = ctx_with_sets();
    let ttp_policy = policy(json!({
        "name": "static-out",
        "rules": [
            {"action": "set", "attr": "local-preference", "value": "200"},
            {"action": "done"},
        ],
    }));
    translate_policy(&mut ctx, &ttp_policy).unwrap();

    assert_eq!(ctx.policies.len(), 1);
    let model = &ctx.policies[0];
    assert_eq!(model.name, "static-out");
    assert_eq!(model.statements.len(), 1);
    assert_eq!(model.statements[0].name, "static-out-10");
    assert!(model.statements[0].conditions.is_empty());
    assert_eq!(
        model.statements[0].actions,
        vec![
            Action::LocalPreference("200".to_string()),
            Action::Target(Target::Accept),
        ]
    );
    assert!(model.default.actions.is_empty());
}

#[test]
fn if_else_flattens_into_conditioned_statements() {
    let mut ctx = ctx_with_sets();
    let ttp_policy = policy(json!({
        "name": "ebgp-in",
        "rules": [
            {
                "if": "if",
                "condition": {"op": "state", "matches": ["community matches-any peer-in"]},
                "rules": [
                    {"action": "set", "attr": "local-preference", "value": "200"},
                    {"action": "done"},
                ],
            },
            {
                "if": "else",
                "rules": [{"action": "drop"}],
            },
        ],
    }));
    translate_policy(&mut ctx, &ttp_policy).unwrap();

    let names: Vec<&str> = ctx.policies.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "if-condition-ebgp-in-10",
            "not-if-condition-ebgp-in-10",
            "if-condition-ebgp-in-20-else",
            "ebgp-in",
        ]
    );

    let model = ctx.policy("ebgp-in").unwrap();
    assert_eq!(model.statements.len(), 2);
    assert_eq!(model.statements[0].name, "ebgp-in-10");
    assert_eq!(
        model.statements[0].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(
        model.statements[0].actions,
        vec![
            Action::LocalPreference("200".to_string()),
            Action::Target(Target::Accept),
        ]
    );
    assert_eq!(model.statements[1].name, "ebgp-in-20");
    assert_eq!(
        model.statements[1].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-20-else".to_string())]
    );
    assert_eq!(model.statements[1].actions, vec![Action::Target(Target::Reject)]);

    // the else policy rejects whatever the earlier branch accepted
    let else_policy = ctx.policy("if-condition-ebgp-in-20-else").unwrap();
    assert_eq!(else_policy.statements.len(), 1);
    assert_eq!(else_policy.statements[0].name, "past-policy-0");
    assert_eq!(
        else_policy.statements[0].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(else_policy.statements[0].actions, vec![Action::Target(Target::Reject)]);
    assert_eq!(else_policy.default.actions, vec![Action::Target(Target::Accept)]);

    assert_referential_closure(&ctx);
}

#[test]
fn elseif_negates_earlier_branches() {
    let mut ctx = ctx_with_sets();
    let ttp_policy = policy(json!({
        "name": "ebgp-in",
        "rules": [
            {
                "if": "if",
                "condition": {"op": "state", "matches": ["community matches-any peer-in"]},
                "rules": [{"action": "set", "attr": "local-preference", "value": "200"}],
            },
            {
                "if": "elseif",
                "condition": {"op": "state", "matches": ["community matches-any customer-in"]},
                "rules": [{"action": "set", "attr": "local-preference", "value": "300"}],
            },
        ],
    }));
    translate_policy(&mut ctx, &ttp_policy).unwrap();

    let elseif_policy = ctx.policy("if-condition-ebgp-in-20").unwrap();
    assert_eq!(elseif_policy.statements.len(), 2);
    assert_eq!(elseif_policy.statements[0].name, "past-policy-0");
    assert_eq!(
        elseif_policy.statements[0].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(
        elseif_policy.statements[0].actions,
        vec![Action::Target(Target::Reject)]
    );
    assert_eq!(elseif_policy.statements[1].name, "10");
    assert_eq!(
        elseif_policy.statements[1].conditions,
        vec![Condition::Community(vec!["customer-in".to_string()])]
    );
    assert_referential_closure(&ctx);
}

#[test]
fn nested_if_recurses_with_parent_negation() {
    let mut ctx = ctx_with_sets();
    let ttp_policy = policy(json!({
        "name": "ebgp-in",
        "rules": [
            {
                "if": "if",
                "condition": {"op": "state", "matches": ["community matches-any peer-in"]},
                "rules": [
                    {"action": "set", "attr": "local-preference", "value": "100"},
                    {
                        "if": "if",
                        "condition": {
                            "op": "state",
                            "matches": ["destination in aggregated-prefixes"],
                        },
                        "rules": [{"action": "drop"}],
                    },
                    {"action": "set", "attr": "med", "value": "50"},
                ],
            },
        ],
    }));
    translate_policy(&mut ctx, &ttp_policy).unwrap();

    let names: Vec<&str> = ctx.policies.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "if-condition-ebgp-in-10",
            "not-if-condition-ebgp-in-10",
            "if-condition-ebgp-in-10-20-10",
            "not-if-condition-ebgp-in-10-20-10",
            "ebgp-in",
        ]
    );

    // the nested branch rejects routes not accepted by its parent
    let inner = ctx.policy("if-condition-ebgp-in-10-20-10").unwrap();
    assert_eq!(inner.statements[0].name, "parent-policy");
    assert_eq!(
        inner.statements[0].conditions,
        vec![Condition::Policy("not-if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(inner.statements[0].actions, vec![Action::Target(Target::Reject)]);

    // statements around the splice keep the outer branch condition
    let model = ctx.policy("ebgp-in").unwrap();
    assert_eq!(model.statements.len(), 3);
    assert_eq!(model.statements[0].name, "ebgp-in-10");
    assert_eq!(model.statements[0].actions, vec![Action::LocalPreference("100".to_string())]);
    assert_eq!(model.statements[1].name, "ebgp-in-10-20-10");
    assert_eq!(
        model.statements[1].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10-20-10".to_string())]
    );
    assert_eq!(model.statements[1].actions, vec![Action::Target(Target::Reject)]);
    assert_eq!(model.statements[2].name, "ebgp-in-10");
    assert_eq!(
        model.statements[2].conditions,
        vec![Condition::Policy("if-condition-ebgp-in-10".to_string())]
    );
    assert_eq!(model.statements[2].actions, vec![Action::Metric("50".to_string())]);

    assert_referential_closure(&ctx);
}

#[test]
fn untranslatable_plain_rule_is_skipped() {
    let mut ctx = ctx_with_sets();
    let ttp_policy = policy(json!({
        "name": "odd",
        "rules": [
            {"action": "unset", "attr": "med", "value": "1"},
            {"action": "done"},
        ],
    }));
    translate_policy(&mut ctx, &ttp_policy).unwrap();

    let model = &ctx.policies[0];
    assert_eq!(model.statements.len(), 1);
    // the statement is numbered by the rule that opened it
    assert_eq!(model.statements[0].name, "odd-20");
    assert_eq!(model.statements[0].actions, vec![Action::Target(Target::Accept)]);
}

#[test]
fn nesting_deeper_than_the_limit_fails() {
    let mut rule = json!({"action": "drop"});
    for _ in 0..(MAX_NESTING_DEPTH + 3) {
        rule = json!({
            "if": "if",
            "condition": {"op": "state", "matches": ["community matches-any peer-in"]},
            "rules": [rule],
        });
    }
    let ttp_policy = policy(json!({"name": "deep", "rules": [rule]}));

    let mut ctx = ctx_with_sets();
    let err = translate_policy(&mut ctx, &ttp_policy).unwrap_err();
    assert!(matches!(err, TranslationError::NestingTooDeep { limit, .. } if limit == MAX_NESTING_DEPTH));
}
