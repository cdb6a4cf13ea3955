// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed where-clause builder for the record store.
//!
//! A [`Filter`] renders to the store's `(field,op,value)~and(...)` syntax and
//! can also be evaluated against a JSON row, which is how the local backend
//! answers queries.

use crate::error::{Error, Result};
use crate::models::wire::{date_from_str, decimal_from_value, id_from_value};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<&String> for Literal {
    fn from(v: &String) -> Self {
        Literal::Text(v.clone())
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<Decimal> for Literal {
    fn from(v: Decimal) -> Self {
        Literal::Decimal(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<NaiveDate> for Literal {
    fn from(v: NaiveDate) -> Self {
        Literal::Date(v)
    }
}

impl Literal {
    fn render(&self) -> Result<String> {
        match self {
            Literal::Text(s) => {
                if s.contains(['(', ')', ',', '~']) {
                    return Err(Error::validation(format!(
                        "filter value '{}' contains a reserved character",
                        s
                    )));
                }
                Ok(s.clone())
            }
            Literal::Int(i) => Ok(i.to_string()),
            Literal::Decimal(d) => Ok(d.normalize().to_string()),
            Literal::Bool(b) => Ok(b.to_string()),
            Literal::Date(d) => Ok(format!("exactDate,{}", d.format("%Y-%m-%d"))),
        }
    }

    fn compare(&self, field: &Value) -> Option<Ordering> {
        match self {
            Literal::Date(d) => field.as_str().and_then(date_from_str).map(|f| f.cmp(d)),
            Literal::Int(i) => match field {
                Value::Object(_) | Value::Array(_) => id_from_value(field).map(|f| f.cmp(i)),
                _ => decimal_from_value(field).map(|f| f.cmp(&Decimal::from(*i))),
            },
            Literal::Decimal(d) => decimal_from_value(field).map(|f| f.cmp(d)),
            Literal::Bool(b) => {
                let f = match field {
                    Value::Bool(v) => *v,
                    Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
                    Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
                    _ => return None,
                };
                Some(f.cmp(b))
            }
            Literal::Text(s) => match field {
                Value::String(f) => Some(f.as_str().cmp(s.as_str())),
                Value::Number(n) => Some(n.to_string().as_str().cmp(s.as_str())),
                Value::Bool(v) => Some(v.to_string().as_str().cmp(s.as_str())),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
            Op::Gt => "gt",
            Op::Ge => "ge",
            Op::Lt => "lt",
            Op::Le => "le",
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Op::Eq => ord == Ordering::Equal,
            Op::Neq => ord != Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Cmp {
        field: String,
        op: Op,
        value: Literal,
    },
    In {
        field: String,
        values: Vec<Literal>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    fn cmp(field: &str, op: Op, value: impl Into<Literal>) -> Self {
        Filter::Cmp {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Eq, value)
    }

    pub fn neq(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Neq, value)
    }

    pub fn gt(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Gt, value)
    }

    pub fn ge(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Ge, value)
    }

    pub fn lt(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Lt, value)
    }

    pub fn le(field: &str, value: impl Into<Literal>) -> Self {
        Self::cmp(field, Op::Le, value)
    }

    /// Inclusive on both ends.
    pub fn range(field: &str, lo: impl Into<Literal>, hi: impl Into<Literal>) -> Self {
        Filter::And(vec![Self::ge(field, lo), Self::le(field, hi)])
    }

    pub fn is_in<I, L>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Filter::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Or(mut a), Filter::Or(b)) => {
                a.extend(b);
                Filter::Or(a)
            }
            (Filter::Or(mut a), f) => {
                a.push(f);
                Filter::Or(a)
            }
            (a, b) => Filter::Or(vec![a, b]),
        }
    }

    pub fn render(&self) -> Result<String> {
        match self {
            Filter::Cmp { field, op, value } => {
                check_field(field)?;
                Ok(format!("({},{},{})", field, op.as_str(), value.render()?))
            }
            Filter::In { field, values } => {
                check_field(field)?;
                if values.is_empty() {
                    return Err(Error::validation(format!(
                        "empty value set for '{}'",
                        field
                    )));
                }
                let parts = values
                    .iter()
                    .map(Literal::render)
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({},in,{})", field, parts.join(",")))
            }
            Filter::And(items) => render_group(items, "~and"),
            Filter::Or(items) => render_group(items, "~or"),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Cmp { field, op, value } => match row.get(field) {
                None | Some(Value::Null) => *op == Op::Neq,
                Some(v) => value.compare(v).is_some_and(|ord| op.accepts(ord)),
            },
            Filter::In { field, values } => match row.get(field) {
                None | Some(Value::Null) => false,
                Some(v) => values
                    .iter()
                    .any(|lit| lit.compare(v) == Some(Ordering::Equal)),
            },
            Filter::And(items) => items.iter().all(|f| f.matches(row)),
            Filter::Or(items) => items.iter().any(|f| f.matches(row)),
        }
    }
}

fn render_group(items: &[Filter], joiner: &str) -> Result<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let r = item.render()?;
        match item {
            Filter::And(v) | Filter::Or(v) if v.len() > 1 => parts.push(format!("({})", r)),
            _ => parts.push(r),
        }
    }
    Ok(parts.join(joiner))
}

fn check_field(field: &str) -> Result<()> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::validation(format!("invalid filter field '{}'", field)));
    }
    Ok(())
}
