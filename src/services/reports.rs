// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::reports::{
    self, CategorySpendingReport, EarningsComparison, MonthlySpendingReport, RangeEarnings,
    first_of_month,
};
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::Transaction;
use crate::store::{Filter, Query};
use chrono::{Months, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::validation("start date must not be after end date"));
    }
    Ok(())
}

impl Context {
    /// The user's transactions in `start..=end` booked to one of
    /// `category_ids`. No request is made when the list is empty.
    pub(crate) async fn transactions_in_categories(
        &self,
        user_id: &str,
        category_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>> {
        if category_ids.is_empty() {
            debug!(user_id, "no categories of the requested type");
            return Ok(Vec::new());
        }
        self.fetch(
            Table::BankStatements,
            Query::owned_by(user_id)
                .filter(Filter::is_in("categories_id", category_ids.iter().copied()))
                .filter(Filter::range("date", start, end))
                .sort("date"),
            cancel,
        )
        .await
    }

    /// Earnings of last month against the month before.
    pub async fn earnings_report(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<EarningsComparison> {
        let today = self.today();
        let this_month = first_of_month(today);
        let from = this_month
            .checked_sub_months(Months::new(2))
            .unwrap_or(this_month);
        let to = this_month.pred_opt().unwrap_or(this_month);
        let categories = self.category_index(user_id, cancel).await?;
        let rows = self
            .transactions_in_categories(user_id, &categories.earning, from, to, cancel)
            .await?;
        Ok(reports::earnings_comparison(
            &rows,
            &categories,
            today,
            &self.config.default_currency,
        ))
    }

    /// Monthly spending over `start..=end`. Without a window it covers the
    /// twelve full months before the current one.
    pub async fn monthly_spending_report(
        &self,
        user_id: &str,
        window: Option<(NaiveDate, NaiveDate)>,
        cancel: &CancellationToken,
    ) -> Result<MonthlySpendingReport> {
        let (start, end) = match window {
            Some((start, end)) => {
                check_window(start, end)?;
                (start, end)
            }
            None => {
                let this_month = first_of_month(self.today());
                let start = this_month
                    .checked_sub_months(Months::new(12))
                    .unwrap_or(this_month);
                (start, this_month.pred_opt().unwrap_or(this_month))
            }
        };
        let categories = self.category_index(user_id, cancel).await?;
        let rows = self
            .transactions_in_categories(user_id, &categories.spending, start, end, cancel)
            .await?;
        let report = reports::monthly_spending(
            &rows,
            &categories,
            start,
            end,
            &self.config.default_currency,
        );
        info!(user_id, %start, %end, months = report.monthly_data.len(), "monthly spending report");
        Ok(report)
    }

    pub async fn category_spending_report(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<CategorySpendingReport> {
        check_window(start, end)?;
        let categories = self.category_index(user_id, cancel).await?;
        let rows = self
            .transactions_in_categories(user_id, &categories.spending, start, end, cancel)
            .await?;
        Ok(reports::category_spending(&rows, &categories))
    }

    pub async fn range_earnings_report(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<RangeEarnings> {
        check_window(start, end)?;
        let categories = self.category_index(user_id, cancel).await?;
        let rows = self
            .transactions_in_categories(user_id, &categories.earning, start, end, cancel)
            .await?;
        Ok(reports::range_earnings(
            &rows,
            &categories,
            start,
            end,
            &self.config.default_currency,
        ))
    }
}
