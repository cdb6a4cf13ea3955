// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure computations over already-fetched records. Nothing here touches the
//! record store.

pub mod alerts;
pub mod anomaly;
pub mod categories;
pub mod income;
pub mod recurrence;
pub mod reports;
pub mod savings;
pub mod simulation;
pub mod weights;

pub use alerts::{AlertKind, CashFlowAlert, cash_flow_alerts};
pub use categories::CategoryIndex;
pub use income::{IncomeRule, infer_income_schedule};
pub use recurrence::{RecurrenceCandidate, detect_recurring};
pub use reports::average_monthly_income;
pub use savings::{SavingsReport, allocate, savings_pool};
pub use simulation::{BudgetProjection, Forecast, SimulationInput, project_budget, simulate};
pub use weights::spending_weights;
