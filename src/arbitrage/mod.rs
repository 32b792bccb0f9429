// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arbitrage cycles: plan, borrower contract, orchestration and dry runs.

pub mod borrower;
pub mod orchestrator;
pub mod plan;
pub mod simulation;

pub use borrower::ArbitrageBorrower;
pub use orchestrator::{ExecutionOutcome, Orchestrator};
pub use plan::{CyclePlan, Step, StepAmount};
pub use simulation::{simulate, SimulationReport, SimulationState};
