// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id, required};
use crate::services::Context;
use crate::services::installments::InstallmentUpdate;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context as _, Result, bail};
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let installments = ctx.list_installments(user, cancel).await?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &installments)? {
                return Ok(());
            }
            let rows = installments
                .iter()
                .map(|i| {
                    vec![
                        i.id.map(|v| v.to_string()).unwrap_or_default(),
                        i.due_date.to_string(),
                        format!("{:.2}", i.payment),
                        if i.paid { "paid" } else { "due" }.to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Due", "Payment", "State"], rows));
        }
        Some(("pay", sub)) => {
            let id = id(sub)?;
            let paid = !sub.get_flag("unpaid");
            ctx.set_installment_paid(user, id, paid).await?;
            println!(
                "Installment {} marked {}",
                id,
                if paid { "paid" } else { "unpaid" }
            );
        }
        Some(("batch", sub)) => batch(ctx, user, sub, cancel).await?,
        _ => {}
    }
    Ok(())
}

async fn batch(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let path = required(sub, "path")?;
    let raw = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    let updates: Vec<InstallmentUpdate> =
        serde_json::from_str(&raw).with_context(|| format!("Parse {}", path))?;
    let result = ctx.batch_update_installments(user, updates, cancel).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &result)? {
        return Ok(());
    }
    println!(
        "Batch update: {} successful, {} failed",
        result.successful.len(),
        result.failed.len()
    );
    for f in &result.failed {
        println!("  #{}: {}", f.id, f.message);
    }
    if result.successful.is_empty() && !result.failed.is_empty() {
        bail!("no installment was updated");
    }
    Ok(())
}
