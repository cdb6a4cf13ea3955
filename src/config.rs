// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneycast", "moneycast"));

/// Logical tables the services read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    BankStatements,
    Categories,
    Items,
    Subscriptions,
    Installments,
    Budgets,
    UserSettings,
    SavingsGoals,
}

impl Table {
    pub fn env_var(self) -> &'static str {
        match self {
            Table::BankStatements => "BANK_STATEMENTS_TABLE_ID",
            Table::Categories => "CATEGORIES_TABLE_ID",
            Table::Items => "ITEMS_TABLE_ID",
            Table::Subscriptions => "SUBSCRIPTIONS_TABLE_ID",
            Table::Installments => "INSTALLMENTS_PER_RECORD_TABLE_ID",
            Table::Budgets => "BUDGET_MANAGER_TABLE_ID",
            Table::UserSettings => "USER_SETTINGS_TABLE_ID",
            Table::SavingsGoals => "SAVINGS_GOALS_TABLE_ID",
        }
    }

    pub const ALL: [Table; 8] = [
        Table::BankStatements,
        Table::Categories,
        Table::Items,
        Table::Subscriptions,
        Table::Installments,
        Table::Budgets,
        Table::UserSettings,
        Table::SavingsGoals,
    ];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub bank_statements: Option<String>,
    pub categories: Option<String>,
    pub items: Option<String>,
    pub subscriptions: Option<String>,
    pub installments: Option<String>,
    pub budgets: Option<String>,
    pub user_settings: Option<String>,
    pub savings_goals: Option<String>,
}

impl Tables {
    fn slot(&mut self, table: Table) -> &mut Option<String> {
        match table {
            Table::BankStatements => &mut self.bank_statements,
            Table::Categories => &mut self.categories,
            Table::Items => &mut self.items,
            Table::Subscriptions => &mut self.subscriptions,
            Table::Installments => &mut self.installments,
            Table::Budgets => &mut self.budgets,
            Table::UserSettings => &mut self.user_settings,
            Table::SavingsGoals => &mut self.savings_goals,
        }
    }

    pub fn get(&self, table: Table) -> Option<&str> {
        let v = match table {
            Table::BankStatements => &self.bank_statements,
            Table::Categories => &self.categories,
            Table::Items => &self.items,
            Table::Subscriptions => &self.subscriptions,
            Table::Installments => &self.installments,
            Table::Budgets => &self.budgets,
            Table::UserSettings => &self.user_settings,
            Table::SavingsGoals => &self.savings_goals,
        };
        v.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn require(&self, table: Table) -> Result<&str> {
        self.get(table).ok_or_else(|| {
            Error::Configuration(format!("missing table id; set {}", table.env_var()))
        })
    }

    pub fn set(&mut self, table: Table, id: impl Into<String>) {
        *self.slot(table) = Some(id.into());
    }
}

/// Absolute and income-relative limits for the rule-based cash-flow alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub lookahead_days: i64,
    pub major_window_days: i64,
    pub major_absolute: Decimal,
    pub major_income_ratio: Decimal,
    pub concentration_window_days: i64,
    pub concentration_absolute: Decimal,
    pub concentration_income_ratio: Decimal,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            major_window_days: 7,
            major_absolute: Decimal::new(5000, 0),
            major_income_ratio: Decimal::new(5, 1),
            concentration_window_days: 10,
            concentration_absolute: Decimal::new(15000, 0),
            concentration_income_ratio: Decimal::new(75, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub tables: Tables,
    pub default_currency: String,
    pub spending_category_type: String,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub max_records: usize,
    pub alerts: AlertThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            tables: Tables::default(),
            default_currency: "TRY".to_string(),
            spending_category_type: "spending".to_string(),
            request_timeout_secs: 15,
            page_size: 1000,
            max_records: 50_000,
            alerts: AlertThresholds::default(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON config file if present, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match config_path() {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(&path).map_err(|e| {
                    Error::Configuration(format!("read {}: {}", path.display(), e))
                })?;
                serde_json::from_str::<Config>(&raw).map_err(|e| {
                    Error::Configuration(format!("parse {}: {}", path.display(), e))
                })?
            }
            _ => Config::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Applies overrides from a key lookup; split out so tests can feed a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get("NOCODB_API_URL") {
            self.api_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = get("NOCODB_API_TOKEN") {
            self.api_token = Some(v);
        }
        for table in Table::ALL {
            if let Some(v) = get(table.env_var()) {
                self.tables.set(table, v);
            }
        }
        if let Some(v) = get("DEFAULT_CURRENCY") {
            self.default_currency = v.to_uppercase();
        }
        if let Some(v) = get("SPENDING_CATEGORY_TYPE") {
            self.spending_category_type = v;
        }
    }

    pub fn require_api(&self) -> Result<(&str, &str)> {
        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| Error::Configuration("missing NOCODB_API_URL".into()))?;
        let token = self
            .api_token
            .as_deref()
            .ok_or_else(|| Error::Configuration("missing NOCODB_API_TOKEN".into()))?;
        Ok((url, token))
    }

    /// Table ids for a local store: every logical table gets its own name.
    pub fn with_local_tables(mut self) -> Self {
        for table in Table::ALL {
            if self.tables.get(table).is_none() {
                self.tables.set(table, table.env_var().trim_end_matches("_TABLE_ID").to_lowercase());
            }
        }
        self
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MONEYCAST_CONFIG") {
        return Some(PathBuf::from(p));
    }
    ProjectDirs::from(APP.0, APP.1, APP.2).map(|proj| proj.config_dir().join("config.json"))
}
