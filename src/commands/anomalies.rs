// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::optional_decimal;
use crate::services::Context;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let sensitivity = optional_decimal(m, "sensitivity")?;
    let report = ctx.detect_anomalies(user, sensitivity, cancel).await?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if report.anomalies.is_empty() {
        println!(
            "No anomalies in {} recent expenses.",
            report.summary.checked_transactions
        );
        return Ok(());
    }
    let rows = report
        .anomalies
        .iter()
        .map(|a| {
            vec![
                a.date.to_string(),
                a.category_name.clone(),
                format!("{:.2}", a.amount),
                a.description.clone().unwrap_or_default(),
                a.reason.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Category", "Amount", "Description", "Why"], rows)
    );
    Ok(())
}
