// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id, optional, optional_date, optional_decimal};
use crate::services::Context;
use crate::services::savings::GoalInput;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(ctx, user, sub, cancel).await?,
        Some(("add", sub)) => {
            let created = ctx.create_goal(user, goal_input(sub)?).await?;
            match created {
                Some(id) => println!("Goal created (id {})", id),
                None => println!("Goal created"),
            }
        }
        Some(("update", sub)) => {
            let id = id(sub)?;
            ctx.update_goal(user, id, goal_input(sub)?).await?;
            println!("Goal {} updated", id);
        }
        Some(("rm", sub)) => {
            let id = id(sub)?;
            ctx.delete_goal(user, id).await?;
            println!("Goal {} deleted", id);
        }
        _ => {}
    }
    Ok(())
}

fn goal_input(sub: &clap::ArgMatches) -> Result<GoalInput> {
    Ok(GoalInput {
        name: optional(sub, "name").map(str::to_string),
        target_amount: optional_decimal(sub, "target")?,
        priority: sub.get_one::<i64>("priority").copied(),
        target_date: optional_date(sub, "date")?,
    })
}

async fn list(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let report = ctx.savings_goals_with_progress(user, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    let rows = report
        .goals
        .iter()
        .map(|g| {
            vec![
                g.goal.priority.to_string(),
                g.goal.name.clone(),
                format!("{:.2}", g.goal.target_amount),
                format!("{:.2}", g.current_amount),
                format!("{:.2}%", g.progress_percentage),
                if g.is_fully_funded { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Priority", "Goal", "Target", "Funded", "Progress", "Done"],
            rows
        )
    );
    println!("Savings pool: {:.2}", report.total_savings_pool);
    Ok(())
}
