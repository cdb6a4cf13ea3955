// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::average_monthly_income;
use crate::analysis::reports::first_of_month;
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::UserSettings;
use crate::store::{Query, record_id};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use chrono::Months;
use tracing::{debug, info};

/// Fields a user may change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub monthly_income_estimate: Option<Decimal>,
    pub warning_threshold: Option<Decimal>,
    pub currency: Option<String>,
    pub time_zone: Option<String>,
    pub anomaly_detection_enabled: Option<bool>,
    pub anomaly_detection_sensitivity: Option<Decimal>,
    pub onboarding_completed: Option<bool>,
}

impl SettingsUpdate {
    fn into_patch(self) -> Result<Map<String, Value>> {
        let mut patch = Map::new();
        if let Some(v) = self.monthly_income_estimate {
            if v.is_sign_negative() && !v.is_zero() {
                return Err(Error::validation(
                    "monthly_income_estimate must be a non-negative number",
                ));
            }
            patch.insert("monthly_income_estimate".into(), json!(v));
        }
        if let Some(v) = self.warning_threshold {
            if v.is_sign_negative() && !v.is_zero() {
                return Err(Error::validation("warning_threshold must be a non-negative number"));
            }
            patch.insert("warning_threshold".into(), json!(v));
        }
        if let Some(c) = self.currency {
            let c = c.trim();
            if c.chars().count() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(Error::validation("currency must be a 3-letter code"));
            }
            patch.insert("currency".into(), json!(c.to_uppercase()));
        }
        if let Some(tz) = self.time_zone {
            patch.insert("time_zone".into(), json!(tz));
        }
        if let Some(v) = self.anomaly_detection_enabled {
            patch.insert("anomaly_detection_enabled".into(), json!(v));
        }
        if let Some(v) = self.anomaly_detection_sensitivity {
            if v < Decimal::ONE || v > Decimal::TEN {
                return Err(Error::validation(
                    "anomaly_detection_sensitivity must be between 1 and 10",
                ));
            }
            patch.insert("anomaly_detection_sensitivity".into(), json!(v));
        }
        if let Some(v) = self.onboarding_completed {
            patch.insert("onboarding_completed".into(), json!(v));
        }
        Ok(patch)
    }
}

impl Context {
    /// The user's settings row, if any. Read-only.
    pub async fn find_settings(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<UserSettings>> {
        let rows: Vec<UserSettings> = self
            .fetch_limited(Table::UserSettings, Query::owned_by(user_id), 1, cancel)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Settings for computations: a missing row reads as neutral defaults.
    pub async fn settings_or_neutral(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserSettings> {
        match self.find_settings(user_id, cancel).await? {
            Some(s) => Ok(s),
            None => {
                debug!(user_id, "no settings record; using neutral defaults");
                Ok(UserSettings::neutral(user_id))
            }
        }
    }

    /// Returns the settings row, creating one with defaults on first access.
    pub async fn get_or_create_settings(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserSettings> {
        if let Some(mut existing) = self.find_settings(user_id, cancel).await? {
            if existing.currency.as_deref().is_none_or(str::is_empty) {
                existing.currency = Some(self.config.default_currency.clone());
            }
            if existing.anomaly_detection_sensitivity.is_zero() {
                existing.anomaly_detection_sensitivity =
                    Decimal::from(UserSettings::DEFAULT_SENSITIVITY);
            }
            return Ok(existing);
        }

        let mut settings = UserSettings::neutral(user_id);
        settings.currency = Some(self.config.default_currency.clone());
        let body = json!({
            "user_id": user_id,
            "monthly_income_estimate": 0,
            "currency": self.config.default_currency,
            "anomaly_detection_enabled": false,
            "anomaly_detection_sensitivity": UserSettings::DEFAULT_SENSITIVITY,
            "onboarding_completed": false,
        });
        let created = self
            .store
            .create(self.table(Table::UserSettings)?, vec![body])
            .await?;
        settings.id = created.first().and_then(record_id);
        info!(user_id, "created default settings");
        Ok(settings)
    }

    /// Validates every supplied field before writing. Returns `false` when
    /// there was nothing to update.
    pub async fn update_settings(
        &self,
        user_id: &str,
        update: SettingsUpdate,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let mut patch = update.into_patch()?;
        if patch.is_empty() {
            return Ok(false);
        }
        let current = self.get_or_create_settings(user_id, cancel).await?;
        let id = current
            .id
            .ok_or_else(|| Error::upstream("settings record has no id"))?;
        patch.insert("Id".into(), json!(id));
        self.store
            .update(self.table(Table::UserSettings)?, vec![Value::Object(patch)])
            .await?;
        info!(user_id, "settings updated");
        Ok(true)
    }

    /// Re-derives the monthly income estimate from earnings since the first
    /// of the month six months back, stores it and returns it.
    pub async fn recalculate_income_estimate(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let today = self.today();
        let this_month = first_of_month(today);
        let from = this_month
            .checked_sub_months(Months::new(6))
            .unwrap_or(this_month);
        let categories = self.category_index(user_id, cancel).await?;
        let rows = self
            .transactions_in_categories(user_id, &categories.earning, from, today, cancel)
            .await?;
        let estimate = average_monthly_income(&rows, &categories).max(Decimal::ZERO);
        let update = SettingsUpdate {
            monthly_income_estimate: Some(estimate),
            ..SettingsUpdate::default()
        };
        self.update_settings(user_id, update, cancel).await?;
        info!(user_id, %estimate, "income estimate recalculated");
        Ok(estimate)
    }
}
