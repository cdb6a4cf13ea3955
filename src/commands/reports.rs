// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::services::Context;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("earnings", sub)) => earnings(ctx, user, sub, cancel).await?,
        Some(("monthly", sub)) => monthly(ctx, user, sub, cancel).await?,
        Some(("categories", sub)) => categories(ctx, user, sub, cancel).await?,
        Some(("range", sub)) => range(ctx, user, sub, cancel).await?,
        _ => {}
    }
    Ok(())
}

fn window(sub: &clap::ArgMatches) -> Result<(NaiveDate, NaiveDate)> {
    Ok((
        parse_date(required(sub, "start")?)?,
        parse_date(required(sub, "end")?)?,
    ))
}

async fn earnings(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let r = ctx.earnings_report(user, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let rows = vec![
        vec![r.last_month_name.clone(), fmt_money(&r.last_month_earnings, &r.currency)],
        vec![r.previous_month_name.clone(), fmt_money(&r.previous_month_earnings, &r.currency)],
        vec!["Change".into(), format!("{}%", r.percentage_change)],
    ];
    println!("{}", pretty_table(&["Month", "Earnings"], rows));
    Ok(())
}

async fn monthly(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let window = match sub.get_one::<String>("start") {
        Some(_) => Some(window(sub)?),
        None => None,
    };
    let r = ctx.monthly_spending_report(user, window, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let ccy = &r.statistics.currency;
    let rows = r
        .monthly_data
        .iter()
        .map(|m| {
            vec![
                m.month_name.clone(),
                fmt_money(&m.total_amount, ccy),
                m.record_count.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Spent", "Records"], rows));
    println!(
        "Total {}  Average {}  Month over month {}%",
        fmt_money(&r.statistics.total_spending, ccy),
        fmt_money(&r.statistics.average_monthly_spending, ccy),
        r.statistics.month_over_month_change
    );
    Ok(())
}

async fn categories(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let (start, end) = window(sub)?;
    let r = ctx.category_spending_report(user, start, end, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let ccy = &ctx.config.default_currency;
    let rows = r
        .categories
        .iter()
        .map(|c| {
            vec![
                c.category_name.clone(),
                fmt_money(&c.total_amount, ccy),
                c.record_count.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Category", "Spent", "Records"], rows));
    Ok(())
}

async fn range(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let (start, end) = window(sub)?;
    let r = ctx.range_earnings_report(user, start, end, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Total".into(), fmt_money(&r.total_earnings, &r.currency)],
        vec!["Records".into(), r.record_count.to_string()],
        vec!["Months".into(), r.months_span.to_string()],
        vec!["Per month".into(), fmt_money(&r.average_per_month, &r.currency)],
    ];
    println!("{}", pretty_table(&["", "Earnings"], rows));
    Ok(())
}
