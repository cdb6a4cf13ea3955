// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::services::Context;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let days = m.get_one::<u32>("days").copied();
    let forecast = ctx.compute_forecast(user, days, cancel).await?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &forecast)? {
        return Ok(());
    }

    let ccy = forecast.summary_metrics.currency.as_str();
    let rows = forecast
        .daily_balances
        .iter()
        .map(|p| {
            vec![
                p.date.to_string(),
                format!("{:.2}", p.income),
                format!("{:.2}", p.expense),
                format!("{:.2}", p.balance),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Income", "Expense", "Balance"], rows)
    );

    let s = &forecast.summary_metrics;
    println!("Lowest balance:  {}", fmt_money(&s.lowest_projected_balance, ccy));
    println!("Average balance: {}", fmt_money(&s.average_projected_balance, ccy));
    println!("Total income:    {}", fmt_money(&s.total_projected_income, ccy));
    println!("Total expenses:  {}", fmt_money(&s.total_projected_expenses, ccy));
    for w in &forecast.warnings {
        println!("! {}", w.message);
    }
    Ok(())
}

pub async fn warnings(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let alerts = ctx.compute_cash_flow_warnings(user, cancel).await?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &alerts)? {
        return Ok(());
    }
    if alerts.is_empty() {
        println!("No cash-flow warnings.");
        return Ok(());
    }
    let rows = alerts
        .iter()
        .map(|a| {
            vec![
                format!("{:?}", a.kind).to_uppercase(),
                a.message.clone(),
                format!("{:?}", a.call_to_action).to_lowercase(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Level", "Message", "Go to"], rows));
    Ok(())
}
