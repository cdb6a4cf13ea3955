// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::anomaly::{self, AnomalyReport, AnomalyWindows};
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::{Transaction, UserSettings};
use crate::store::{Filter, Query};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

impl Context {
    /// Runs the anomaly scan. Without an explicit sensitivity the user's
    /// setting applies, falling back to the default multiplier.
    pub async fn detect_anomalies(
        &self,
        user_id: &str,
        sensitivity: Option<Decimal>,
        cancel: &CancellationToken,
    ) -> Result<AnomalyReport> {
        if let Some(s) = sensitivity {
            if s <= Decimal::ZERO {
                return Err(Error::validation("sensitivity must be positive"));
            }
        }
        let today = self.today();
        let (transactions, categories, settings) = tokio::try_join!(
            self.fetch::<Transaction>(
                Table::BankStatements,
                Query::owned_by(user_id)
                    .filter(Filter::lt("amount", 0i64))
                    .filter(Filter::le("date", today)),
                cancel,
            ),
            self.category_index(user_id, cancel),
            self.settings_or_neutral(user_id, cancel),
        )?;
        let sensitivity = sensitivity
            .or(Some(settings.anomaly_detection_sensitivity).filter(|s| *s > Decimal::ZERO))
            .unwrap_or_else(|| Decimal::from(UserSettings::DEFAULT_SENSITIVITY));

        let report = anomaly::detect_anomalies(
            &transactions,
            &categories,
            sensitivity,
            today,
            AnomalyWindows::default(),
        );
        info!(
            user_id,
            checked = report.summary.checked_transactions,
            found = report.summary.found_anomalies,
            "anomaly scan finished"
        );
        Ok(report)
    }
}
