// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::services::Context;
use crate::services::transactions::{ImportReport, ImportRow};
use crate::utils::maybe_print_json;
use anyhow::{Context as _, Result, bail};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    ctx: &Context,
    user: &str,
    m: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(ctx, user, sub, cancel).await,
        _ => Ok(()),
    }
}

async fn import_transactions(
    ctx: &Context,
    user: &str,
    sub: &clap::ArgMatches,
    cancel: &CancellationToken,
) -> Result<()> {
    let path = required(sub, "path")?;
    let rows = read_rows(Path::new(path))?;
    let report = ctx.import_transactions(user, rows, cancel).await?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        print_report(&report);
    }
    if report.is_rejected() {
        bail!(
            "import rejected: {} of {} rows failed validation",
            report.validation_errors.len(),
            report.total
        );
    }
    Ok(())
}

/// JSON arrays are read as-is; anything else is parsed as CSV with a header row.
pub fn read_rows(path: &Path) -> Result<Vec<ImportRow>> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("Read {}", path.display()))?;
        return serde_json::from_str(&raw).with_context(|| format!("Parse {}", path.display()));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();
    let col = |rec: &csv::StringRecord, name: &str| -> Option<String> {
        headers
            .get(name)
            .and_then(|&i| rec.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        rows.push(ImportRow {
            date: col(&rec, "date").unwrap_or_default(),
            amount: col(&rec, "amount").unwrap_or_default(),
            bank: col(&rec, "bank"),
            category_id: col(&rec, "categories_id").and_then(|s| s.parse().ok()),
            category: col(&rec, "category"),
            description: col(&rec, "description"),
            ref_no: col(&rec, "ref_no"),
        });
    }
    Ok(rows)
}

fn print_report(report: &ImportReport) {
    println!(
        "Import completed: {} successful, {} failed (of {})",
        report.successful, report.failed, report.total
    );
    for e in report.validation_errors.iter().chain(&report.import_errors) {
        println!("  row {}: {}", e.row, e.error);
    }
}
