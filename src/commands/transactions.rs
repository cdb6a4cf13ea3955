// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id, optional, required};
use crate::services::Context;
use crate::services::transactions::ImportRow;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("update", sub)) => {
            let id = id(sub)?;
            let category = required(sub, "category")?;
            let (category_id, category) = match category.parse::<i64>() {
                Ok(cid) => (Some(cid), None),
                Err(_) => (None, Some(category.to_string())),
            };
            let row = ImportRow {
                date: required(sub, "date")?.to_string(),
                amount: required(sub, "amount")?.to_string(),
                bank: optional(sub, "bank").map(str::to_string),
                category_id,
                category,
                description: optional(sub, "description").map(str::to_string),
                ref_no: optional(sub, "ref").map(str::to_string),
            };
            ctx.update_transaction(user, id, row, cancel).await?;
            println!("Transaction {} updated", id);
        }
        Some(("rm", sub)) => {
            let id = id(sub)?;
            ctx.delete_transaction(user, id).await?;
            println!("Transaction {} deleted", id);
        }
        _ => {}
    }
    Ok(())
}
