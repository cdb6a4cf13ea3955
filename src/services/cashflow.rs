// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::alerts::AlertInput;
use crate::analysis::{CashFlowAlert, cash_flow_alerts};
use crate::config::Table;
use crate::error::Result;
use crate::models::{Budget, Installment};
use crate::store::{Filter, Query};
use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

impl Context {
    /// Rule-based alerts for installments in the lookahead window. Paid and
    /// unpaid installments both count.
    pub async fn compute_cash_flow_warnings(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CashFlowAlert>> {
        let limits = &self.config.alerts;
        let start = self.today();
        let end = start + Duration::days(limits.lookahead_days);

        let (installments, settings, budgets, categories) = tokio::try_join!(
            self.fetch::<Installment>(
                Table::Installments,
                Query::owned_by(user_id).filter(Filter::range("start_date", start, end)),
                cancel,
            ),
            self.settings_or_neutral(user_id, cancel),
            self.fetch::<Budget>(
                Table::Budgets,
                Query::owned_by(user_id)
                    .filter(Filter::ge("end_date", start))
                    .filter(Filter::le("start_date", end)),
                cancel,
            ),
            self.category_index(user_id, cancel),
        )?;

        let alerts = cash_flow_alerts(
            &AlertInput {
                today: start,
                installments: &installments,
                budgets: &budgets,
                categories: &categories,
                monthly_income_estimate: settings.monthly_income_estimate,
                currency: &self.config.default_currency,
            },
            limits,
        );
        info!(user_id, alerts = alerts.len(), "cash-flow warnings computed");
        Ok(alerts)
    }
}
