// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Records as stored in the tables. Field names follow the store's column
//! names; decoding is lenient so a stray `null` or a numeric string degrades
//! to a neutral value instead of rejecting the whole response.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "wire::date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub amount: Decimal,
    #[serde(rename = "categories_id", default, deserialize_with = "wire::opt_id")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub bank: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub ref_no: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(rename = "category_name", default, deserialize_with = "wire::opt_text")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "wire::opt_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

/// One scheduled payment of an installment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(rename = "start_date", deserialize_with = "wire::date")]
    pub due_date: NaiveDate,
    #[serde(rename = "installment_payment", default, deserialize_with = "wire::decimal")]
    pub payment: Decimal,
    #[serde(rename = "categories_id", default, deserialize_with = "wire::opt_id")]
    pub category_id: Option<i64>,
    #[serde(rename = "items_id", default, deserialize_with = "wire::opt_id")]
    pub item_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub paid: bool,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
    /// Resolved from the items table; never stored on the installment.
    #[serde(default, skip_deserializing)]
    pub item_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(rename = "categories_id", default, deserialize_with = "wire::opt_id")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub target_amount: Decimal,
    #[serde(deserialize_with = "wire::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "wire::date")]
    pub end_date: NaiveDate,
    #[serde(default = "yes", deserialize_with = "wire::flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub monthly_income_estimate: Decimal,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub warning_threshold: Decimal,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub time_zone: Option<String>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub anomaly_detection_enabled: bool,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub anomaly_detection_sensitivity: Decimal,
    #[serde(default, deserialize_with = "wire::flag")]
    pub onboarding_completed: bool,
}

impl UserSettings {
    pub const DEFAULT_SENSITIVITY: i64 = 3;

    /// Neutral settings used when the user has no settings record.
    pub fn neutral(user_id: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            monthly_income_estimate: Decimal::ZERO,
            warning_threshold: Decimal::ZERO,
            currency: None,
            time_zone: None,
            anomaly_detection_enabled: false,
            anomaly_detection_sensitivity: Decimal::from(Self::DEFAULT_SENSITIVITY),
            onboarding_completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(rename = "goal_name", default, deserialize_with = "wire::text")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub target_amount: Decimal,
    #[serde(default = "first_priority", deserialize_with = "wire::priority")]
    pub priority: i64,
    #[serde(default, deserialize_with = "wire::opt_date")]
    pub target_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

/// A subscription the user tracks explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "wire::text")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub billing_cycle: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "wire::opt_date")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(rename = "categories_id", default, deserialize_with = "wire::opt_id")]
    pub category_id: Option<i64>,
    #[serde(default = "yes", deserialize_with = "wire::flag")]
    pub auto_renewal: bool,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "Id", default, deserialize_with = "wire::opt_id")]
    pub id: Option<i64>,
    #[serde(rename = "item_name", default, deserialize_with = "wire::opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
}

fn yes() -> bool {
    true
}

fn first_priority() -> i64 {
    1
}

pub(crate) mod wire {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn decimal_from_value(v: &Value) -> Option<Decimal> {
        match v {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(Decimal::from(i));
                }
                let s = n.to_string();
                Decimal::from_str(&s)
                    .or_else(|_| Decimal::from_scientific(&s))
                    .ok()
            }
            Value::String(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()
            }
            _ => None,
        }
    }

    pub fn id_from_value(v: &Value) -> Option<i64> {
        match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(map) => map.get("Id").and_then(id_from_value),
            Value::Array(items) => items.first().and_then(id_from_value),
            _ => None,
        }
    }

    pub fn date_from_str(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        let head = s.get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(decimal_from_value).unwrap_or(Decimal::ZERO))
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(id_from_value))
    }

    pub fn priority<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(opt_id(d)?.unwrap_or(1))
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        match v {
            Some(Value::String(s)) => {
                date_from_str(&s).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", s)))
            }
            other => Err(D::Error::custom(format!("expected date, got {:?}", other))),
        }
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::String(s)) => date_from_str(&s),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1"),
            _ => false,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }
}
