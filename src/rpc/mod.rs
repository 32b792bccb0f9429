// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! RPC module for driving the deployed arbitrage contract.

pub mod contracts;
pub mod executor;
pub mod gateway;
mod provider;

pub use executor::ChainOrchestrator;
pub use gateway::{AlloyGateway, ChainGateway, SubmissionReceipt};
pub use provider::create_provider;
