// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id, required};
use crate::services::Context;
use crate::services::budgets::BudgetInput;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context as _, Result};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let created = ctx.create_budget(user, budget_input(sub)?).await?;
            match created {
                Some(id) => println!("Budget created (id {})", id),
                None => println!("Budget created"),
            }
        }
        Some(("update", sub)) => {
            let id = id(sub)?;
            ctx.update_budget(user, id, budget_input(sub)?).await?;
            println!("Budget {} updated", id);
        }
        Some(("rm", sub)) => {
            let id = id(sub)?;
            ctx.delete_budget(user, id).await?;
            println!("Budget {} deleted", id);
        }
        Some(("active", sub)) => active(ctx, user, sub, cancel).await?,
        _ => {}
    }
    Ok(())
}

fn budget_input(sub: &clap::ArgMatches) -> Result<BudgetInput> {
    Ok(BudgetInput {
        category_id: sub
            .get_one::<i64>("category")
            .copied()
            .context("--category is required")?,
        target_amount: parse_decimal(required(sub, "amount")?)?,
        start_date: parse_date(required(sub, "start")?)?,
        end_date: parse_date(required(sub, "end")?)?,
    })
}

async fn active(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let (budgets, categories) = tokio::try_join!(
        ctx.active_budgets(user, cancel),
        ctx.category_index(user, cancel),
    )?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        return Ok(());
    }
    let rows = budgets
        .iter()
        .map(|b| {
            let left = b.budget.target_amount - b.spent_amount;
            vec![
                b.budget.id.map(|i| i.to_string()).unwrap_or_default(),
                b.budget
                    .category_id
                    .and_then(|c| categories.name_of(c))
                    .unwrap_or("-")
                    .to_string(),
                format!("{} .. {}", b.budget.start_date, b.budget.end_date),
                format!("{:.2}", b.budget.target_amount),
                format!("{:.2}", b.spent_amount),
                if left < Decimal::ZERO {
                    format!("{:.2} over", left.abs())
                } else {
                    format!("{:.2}", left)
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Category", "Window", "Target", "Spent", "Left"],
            rows
        )
    );
    Ok(())
}
