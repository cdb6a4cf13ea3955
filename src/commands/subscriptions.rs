// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id, optional, optional_date, required};
use crate::services::Context;
use crate::services::subscriptions::NewSubscription;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
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
        Some(("track", sub)) => track(ctx, user, sub).await?,
        Some(("untrack", sub)) => {
            let id = id(sub)?;
            ctx.untrack_subscription(user, id).await?;
            println!("Stopped tracking subscription {}", id);
        }
        _ => {}
    }
    Ok(())
}

async fn list(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let overview = ctx.list_subscriptions_and_suggestions(user, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &overview)? {
        return Ok(());
    }

    let tracked = overview
        .subscriptions
        .iter()
        .map(|s| {
            vec![
                s.id.map(|i| i.to_string()).unwrap_or_default(),
                s.name.clone(),
                format!("{:.2}", s.amount),
                s.billing_cycle.clone().unwrap_or_default(),
                s.next_payment_date.map(|d| d.to_string()).unwrap_or_default(),
                s.status.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Name", "Amount", "Cycle", "Next", "Status"], tracked)
    );

    if overview.suggestions.is_empty() {
        return Ok(());
    }
    println!("Possible subscriptions:");
    let suggested = overview
        .suggestions
        .iter()
        .map(|c| {
            vec![
                c.description.clone(),
                format!("{:.2}", c.amount),
                c.recurrence.as_str().to_string(),
                c.average_interval_days.to_string(),
                c.next_possible_payment_date.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Description", "Amount", "Every", "Avg days", "Next (est.)"],
            suggested
        )
    );
    Ok(())
}

async fn track(ctx: &Context, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewSubscription {
        name: required(sub, "name")?.to_string(),
        amount: parse_decimal(required(sub, "amount")?)?,
        currency: optional(sub, "currency").map(str::to_uppercase),
        billing_cycle: optional(sub, "cycle").map(str::to_string),
        next_payment_date: optional_date(sub, "next")?,
        category_id: sub.get_one::<i64>("category").copied(),
        notes: optional(sub, "notes").map(str::to_string),
        ..NewSubscription::default()
    };
    let name = new.name.clone();
    match ctx.track_subscription(user, new).await? {
        Some(id) => println!("Tracking '{}' (id {})", name, id),
        None => println!("Tracking '{}'", name),
    }
    Ok(())
}
