// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{optional, optional_decimal};
use crate::services::Context;
use crate::services::settings::SettingsUpdate;
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
        Some(("show", sub)) => {
            let s = ctx.get_or_create_settings(user, cancel).await?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                return Ok(());
            }
            let rows = vec![
                vec!["Monthly income estimate".into(), format!("{:.2}", s.monthly_income_estimate)],
                vec!["Warning threshold".into(), format!("{:.2}", s.warning_threshold)],
                vec!["Currency".into(), s.currency.clone().unwrap_or_default()],
                vec!["Time zone".into(), s.time_zone.clone().unwrap_or_default()],
                vec![
                    "Anomaly detection".into(),
                    if s.anomaly_detection_enabled { "on" } else { "off" }.into(),
                ],
                vec!["Sensitivity".into(), s.anomaly_detection_sensitivity.normalize().to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set", sub)) => {
            let update = SettingsUpdate {
                monthly_income_estimate: optional_decimal(sub, "income")?,
                warning_threshold: optional_decimal(sub, "threshold")?,
                currency: optional(sub, "currency").map(str::to_string),
                time_zone: optional(sub, "timezone").map(str::to_string),
                anomaly_detection_enabled: sub.get_one::<bool>("anomalies").copied(),
                anomaly_detection_sensitivity: optional_decimal(sub, "sensitivity")?,
                onboarding_completed: None,
            };
            if ctx.update_settings(user, update, cancel).await? {
                println!("Settings updated");
            } else {
                println!("Nothing to update");
            }
        }
        Some(("recalc-income", _)) => {
            let estimate = ctx.recalculate_income_estimate(user, cancel).await?;
            println!("Monthly income estimate set to {:.2}", estimate);
        }
        _ => {}
    }
    Ok(())
}
