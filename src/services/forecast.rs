// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::simulation::UNNAMED_PAYMENT;
use crate::analysis::{
    Forecast, SimulationInput, infer_income_schedule, project_budget, simulate,
};
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::{Budget, Installment, Item, Transaction};
use crate::store::{Filter, Query};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_HORIZON_DAYS: u32 = 30;
/// Ten years of days.
pub const MAX_HORIZON_DAYS: u32 = 3660;

impl Context {
    /// Projects the user's balance for `today..=today + horizon_days`.
    /// Any fetch failure fails the whole forecast.
    pub async fn compute_forecast(
        &self,
        user_id: &str,
        horizon_days: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Forecast> {
        let horizon = horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
        let start = self.today();
        if horizon > MAX_HORIZON_DAYS {
            return Err(Error::validation(format!(
                "horizon must be at most {} days",
                MAX_HORIZON_DAYS
            )));
        }
        let end = start
            .checked_add_days(Days::new(u64::from(horizon)))
            .ok_or_else(|| Error::validation("horizon runs past the supported date range"))?;
        let year_ago = start.checked_sub_months(Months::new(12)).unwrap_or(start);
        info!(user_id, %start, %end, "computing forecast");

        let (starting_balance, settings, income_history, categories, installments, budgets) = tokio::try_join!(
            self.balance_as_of(user_id, start, cancel),
            self.settings_or_neutral(user_id, cancel),
            self.fetch::<Transaction>(
                Table::BankStatements,
                Query::owned_by(user_id).filter(Filter::range("date", year_ago, start)),
                cancel,
            ),
            self.category_index(user_id, cancel),
            self.upcoming_unpaid_installments(user_id, start, end, cancel),
            self.fetch::<Budget>(
                Table::Budgets,
                Query::owned_by(user_id).filter(Filter::eq("is_active", true)),
                cancel,
            ),
        )?;

        let income_rules = infer_income_schedule(
            &income_history,
            &categories,
            settings.monthly_income_estimate,
        );

        let history_from = budgets
            .iter()
            .map(|b| b.start_date)
            .min()
            .map_or(start, |d| d.min(start));
        let spending: Vec<Transaction> = self
            .fetch(
                Table::BankStatements,
                Query::owned_by(user_id).filter(Filter::range("date", history_from, end)),
                cancel,
            )
            .await?;
        let projections = budgets
            .iter()
            .map(|b| project_budget(b, &spending, start))
            .collect();
        debug!(
            rules = income_rules.len(),
            installments = installments.len(),
            budgets = budgets.len(),
            "forecast inputs ready"
        );

        let forecast = simulate(&SimulationInput {
            start,
            end,
            starting_balance,
            income_rules,
            installments,
            budgets: projections,
            warning_threshold: settings.warning_threshold,
            currency: self.config.default_currency.clone(),
        });
        info!(
            user_id,
            days = forecast.daily_balances.len(),
            warnings = forecast.warnings.len(),
            "forecast done"
        );
        Ok(forecast)
    }

    /// Sum of every transaction dated on or before `as_of`.
    pub async fn balance_as_of(
        &self,
        user_id: &str,
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let rows: Vec<Transaction> = self
            .fetch(
                Table::BankStatements,
                Query::owned_by(user_id).filter(Filter::le("date", as_of)),
                cancel,
            )
            .await?;
        Ok(rows.iter().map(|t| t.amount).sum())
    }

    /// Unpaid installments due in `[from, to]`, with item names attached.
    pub async fn upcoming_unpaid_installments(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<Installment>> {
        let mut installments: Vec<Installment> = self
            .fetch(
                Table::Installments,
                Query::owned_by(user_id)
                    .filter(Filter::range("start_date", from, to))
                    .filter(Filter::eq("paid", false)),
                cancel,
            )
            .await?;
        self.attach_item_names(user_id, &mut installments, cancel)
            .await?;
        Ok(installments)
    }

    /// Looks up item names for installments; skipped when no items table is
    /// configured.
    async fn attach_item_names(
        &self,
        user_id: &str,
        installments: &mut [Installment],
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.config.tables.get(Table::Items).is_none() {
            return Ok(());
        }
        let mut ids: Vec<i64> = installments.iter().filter_map(|i| i.item_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }
        let items: Vec<Item> = self
            .fetch(
                Table::Items,
                Query::owned_by(user_id).filter(Filter::is_in("Id", ids)),
                cancel,
            )
            .await?;
        let names: HashMap<i64, String> = items
            .into_iter()
            .filter_map(|it| Some((it.id?, it.name?)))
            .collect();
        for inst in installments.iter_mut() {
            let name = inst.item_id.and_then(|id| names.get(&id).cloned());
            inst.item_name = Some(name.unwrap_or_else(|| UNNAMED_PAYMENT.to_string()));
        }
        Ok(())
    }
}
