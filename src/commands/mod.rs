// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod anomalies;
pub mod budgets;
pub mod forecast;
pub mod goals;
pub mod importer;
pub mod installments;
pub mod reports;
pub mod settings;
pub mod subscriptions;
pub mod transactions;

use crate::utils::{parse_date, parse_decimal};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(crate) fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .with_context(|| format!("--{} is required", name))
}

pub(crate) fn optional<'a>(m: &'a clap::ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

pub(crate) fn id(m: &clap::ArgMatches) -> Result<i64> {
    m.get_one::<i64>("id").copied().context("--id is required")
}

pub(crate) fn optional_date(m: &clap::ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    optional(m, name).map(parse_date).transpose()
}

pub(crate) fn optional_decimal(m: &clap::ArgMatches, name: &str) -> Result<Option<Decimal>> {
    optional(m, name).map(parse_decimal).transpose()
}
