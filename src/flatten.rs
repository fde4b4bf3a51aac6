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

//! The policy flattening engine.
//!
//! IOS-XR route-policies are small imperative programs; the policy model is
//! a flat statement list. Flattening walks the rule list with a statement
//! accumulator:
//!
//! * Plain rules append their action to the open statement, or open a new
//!   one (conditioned on the parent branch, if inside one).
//! * An `if` rule synthesizes its policy pair (see [`crate::synth`]),
//!   flushes the open statement, and opens a new statement conditioned on
//!   the `if-condition-…` policy. Nested conditionals recurse with the
//!   branch's policy as parent; their statements are spliced in place.
//! * `elseif` additionally prepends reject statements for every earlier
//!   branch at the same level; `else` synthesizes a default-accept policy
//!   carrying only those rejects.
//!
//! Rule numbering follows the vendor convention of counting in tens:
//! the n-th rule of policy `P` gets the basename `P-<10n>`, and nested
//! rules extend it (`P-10-20-…`).

use log::info;

use crate::action::translate_rule;
use crate::context::TranslationContext;
use crate::model::{
    opposite_policy_name, Condition, PolicyModel, Statement, IF_CONDITION,
};
use crate::synth::generate_conditional_policies;
use crate::ttp::{XrBranch, XrConditionalRule, XrPolicy, XrRule, XrRuleCondition};
use crate::types::TranslationError;

/// Upper bound on conditional nesting. Real configurations stay in the
/// single digits; anything deeper indicates a parser loop.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Flatten one vendor route-policy and append it (and every synthesized
/// auxiliary policy) to the context.
pub fn translate_policy(
    ctx: &mut TranslationContext,
    ttp_policy: &XrPolicy,
) -> Result<(), TranslationError> {
    info!("translating policy: {}", ttp_policy.name);
    let statements = flatten_rules(ctx, &ttp_policy.name, &ttp_policy.rules, None, 0)?;
    let policy = PolicyModel {
        name: ttp_policy.name.clone(),
        statements,
        default: Default::default(),
    };
    info!("appending policy: {}", policy.name);
    ctx.policies.push(policy);
    Ok(())
}

/// Flatten a rule list into statements. `parent` is the name of the
/// enclosing branch's `if-condition-…` policy when recursing into a nested
/// conditional.
fn flatten_rules(
    ctx: &mut TranslationContext,
    policy_name: &str,
    rules: &[XrRule],
    parent: Option<&str>,
    depth: usize,
) -> Result<Vec<Statement>, TranslationError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(TranslationError::NestingTooDeep {
            policy: policy_name.to_string(),
            limit: MAX_NESTING_DEPTH,
        });
    }

    let mut statements: Vec<Statement> = Vec::new();
    // The accumulator: plain rules pile their actions into this statement
    // until a conditional rule (or the end of the list) flushes it.
    let mut statement = Statement::default();
    // The `if-condition-…` policies of earlier branches at this level,
    // negated by subsequent `elseif`/`else` branches.
    let mut past_conditionals: Vec<String> = Vec::new();
    let mut count = 0usize;

    for rule in rules {
        count += 10;
        let basename = format!("{policy_name}-{count}");

        match rule {
            XrRule::Plain(plain) => {
                past_conditionals.clear();
                let Some(action) = translate_rule(plain) else {
                    info!("{plain:?} could not be translated");
                    continue;
                };
                if !statement.is_empty() {
                    statement.actions.push(action);
                } else {
                    let conditions = parent
                        .map(|p| vec![Condition::Policy(p.to_string())])
                        .unwrap_or_default();
                    statement = Statement::new(basename, conditions, vec![action]);
                }
            }
            XrRule::Conditional(cond) => match cond.branch {
                XrBranch::If => {
                    info!("'if' rule found in {policy_name}");
                    past_conditionals.clear();
                    let if_name = synthesize_branch(
                        ctx,
                        policy_name,
                        &basename,
                        cond,
                        parent,
                        &past_conditionals,
                    )?;
                    past_conditionals.push(if_name.clone());
                    flush(&mut statements, &mut statement);
                    translate_branch_body(
                        ctx,
                        &basename,
                        cond,
                        &if_name,
                        depth,
                        &mut statements,
                        &mut statement,
                    )?;
                }
                XrBranch::Elseif => {
                    info!("'elseif' rule found in {policy_name}");
                    let if_name = synthesize_branch(
                        ctx,
                        policy_name,
                        &basename,
                        cond,
                        parent,
                        &past_conditionals,
                    )?;
                    past_conditionals.push(if_name.clone());
                    flush(&mut statements, &mut statement);
                    translate_branch_body(
                        ctx,
                        &basename,
                        cond,
                        &if_name,
                        depth,
                        &mut statements,
                        &mut statement,
                    )?;
                }
                XrBranch::Else => {
                    info!("'else' rule found in {policy_name}");
                    let mut else_policy =
                        PolicyModel::new(format!("{IF_CONDITION}{basename}-else"));
                    else_policy.set_default_accept();
                    for (i, past) in past_conditionals.iter().enumerate() {
                        else_policy
                            .insert_policy_as_reject_statement(past, format!("past-policy-{i}"));
                    }
                    let else_name = else_policy.name.clone();
                    ctx.policies.push(else_policy);

                    flush(&mut statements, &mut statement);
                    statement = Statement::new(
                        basename,
                        vec![Condition::Policy(else_name)],
                        vec![],
                    );
                    // An `else` body cannot open further branches.
                    for inner in &cond.rules {
                        match inner {
                            XrRule::Plain(plain) => match translate_rule(plain) {
                                Some(action) => statement.actions.push(action),
                                None => info!("{plain:?} could not be translated"),
                            },
                            XrRule::Conditional(_) => {
                                info!("conditional rule inside 'else' not translated")
                            }
                        }
                    }
                    flush(&mut statements, &mut statement);
                }
                XrBranch::Other => info!("rule not translated: unknown branch keyword"),
            },
        }
    }

    flush(&mut statements, &mut statement);
    Ok(statements)
}

/// Move the accumulator into the statement list if it carries any action.
fn flush(statements: &mut Vec<Statement>, statement: &mut Statement) {
    if !statement.is_empty() {
        statements.push(std::mem::take(statement));
    }
}

/// Synthesize the policy pair for an `if`/`elseif` branch, prepend the
/// negations of earlier branches and of the parent branch, and register the
/// pair in the context. Returns the `if-condition-…` policy name.
fn synthesize_branch(
    ctx: &mut TranslationContext,
    policy_name: &str,
    basename: &str,
    rule: &XrConditionalRule,
    parent: Option<&str>,
    past_conditionals: &[String],
) -> Result<String, TranslationError> {
    let condition: &XrRuleCondition =
        rule.condition.as_ref().ok_or_else(|| TranslationError::MissingCondition {
            policy: policy_name.to_string(),
        })?;
    let (mut if_policy, not_if_policy) =
        generate_conditional_policies(ctx, policy_name, basename, condition)?;

    // Earlier branches at this level must not have matched.
    for (i, past) in past_conditionals.iter().enumerate() {
        if_policy.insert_policy_as_reject_statement(past, format!("past-policy-{i}"));
    }
    // Inside a nested branch, the parent condition must hold; routes not
    // accepted by the parent are rejected upfront.
    if let Some(parent) = parent {
        if let Some(opposite) = opposite_policy_name(parent) {
            if_policy.insert_policy_as_reject_statement(&opposite, "parent-policy");
        }
    }

    let if_name = if_policy.name.clone();
    ctx.policies.push(if_policy);
    ctx.policies.push(not_if_policy);
    Ok(if_name)
}

/// Translate the body of an `if`/`elseif` branch. Plain rules accumulate
/// into statements conditioned on the branch policy; nested conditionals
/// recurse (numbered `<basename>-<10k>`) and splice their statements in
/// place.
fn translate_branch_body(
    ctx: &mut TranslationContext,
    basename: &str,
    rule: &XrConditionalRule,
    if_name: &str,
    depth: usize,
    statements: &mut Vec<Statement>,
    statement: &mut Statement,
) -> Result<(), TranslationError> {
    let base_conditions = vec![Condition::Policy(if_name.to_string())];
    *statement = Statement::new(basename, base_conditions.clone(), vec![]);

    let mut child_count = 10usize;
    for inner in &rule.rules {
        match inner {
            XrRule::Conditional(_) => {
                info!("translate nested conditional in {basename}");
                flush(statements, statement);
                *statement = Statement::new(basename, base_conditions.clone(), vec![]);
                let dummy_name = format!("{basename}-{child_count}");
                let child = flatten_rules(
                    ctx,
                    &dummy_name,
                    std::slice::from_ref(inner),
                    Some(if_name),
                    depth + 1,
                )?;
                statements.extend(child);
            }
            XrRule::Plain(plain) => match translate_rule(plain) {
                Some(action) => statement.actions.push(action),
                None => info!("{plain:?} could not be translated"),
            },
        }
        child_count += 10;
    }

    flush(statements, statement);
    Ok(())
}
