// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serializable description of one arbitrage cycle.

use crate::error::ArbError;
use crate::executor::{Distribution, SwapPath, DEFAULT_DEADLINE_BOUND_SECS};
use crate::flash::LoanRequest;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How much a step spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAmount {
    /// A fixed amount.
    Exact(U256),
    /// The borrower's whole balance of the input asset.
    #[default]
    Balance,
    /// min(reference amount, balance), debond only.
    Capped,
}

impl StepAmount {
    pub fn resolve(&self, balance: U256, reference: Option<U256>) -> U256 {
        match self {
            Self::Exact(n) => *n,
            Self::Balance => balance,
            Self::Capped => reference.map_or(balance, |r| r.min(balance)),
        }
    }
}

/// One conversion performed inside the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Swap {
        router: Address,
        path: SwapPath,
        #[serde(default)]
        amount: StepAmount,
        #[serde(default)]
        min_out: U256,
    },
    Debond {
        index: Address,
        distribution: Distribution,
        #[serde(default)]
        amount: StepAmount,
    },
}

impl Step {
    /// Whether the step leaves `asset` in the borrower's hands.
    fn produces(&self, asset: Address) -> bool {
        match self {
            Step::Swap { path, .. } => path.output() == asset,
            Step::Debond { distribution, .. } => distribution
                .legs()
                .iter()
                .any(|l| l.asset == asset && l.percentage > 0),
        }
    }
}

fn default_deadline_bound() -> u64 {
    DEFAULT_DEADLINE_BOUND_SECS
}

/// Borrow `principal` of `asset` from `lender`, run `steps`, repay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePlan {
    pub lender: Address,
    pub asset: Address,
    pub principal: U256,
    pub steps: Vec<Step>,
    #[serde(default = "default_deadline_bound")]
    pub deadline_bound_secs: u64,
}

impl CyclePlan {
    pub fn from_json(json: &str) -> Result<Self, ArbError> {
        let plan: Self = serde_json::from_str(json)
            .map_err(|e| ArbError::Config(format!("Invalid plan: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, ArbError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ArbError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ArbError> {
        if self.principal.is_zero() {
            return Err(ArbError::Config("plan borrows nothing".to_string()));
        }
        let last = self
            .steps
            .last()
            .ok_or_else(|| ArbError::Config("plan has no steps".to_string()))?;
        if !last.produces(self.asset) {
            return Err(ArbError::Config(format!(
                "last step does not return {} to repay the loan",
                self.asset
            )));
        }
        if let Some(Step::Swap { .. }) = self
            .steps
            .iter()
            .find(|s| matches!(s, Step::Swap { amount: StepAmount::Capped, .. }))
        {
            return Err(ArbError::Config(
                "capped amounts only apply to debond steps".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute deadline for a cycle started at `now`.
    pub fn deadline_from(&self, now: u64) -> u64 {
        now.saturating_add(self.deadline_bound_secs)
    }

    /// Loan request for `borrower` with the steps attached as callback data.
    pub fn loan_request(&self, borrower: Address) -> Result<LoanRequest, ArbError> {
        let context = encode_steps(&self.steps)?;
        Ok(LoanRequest::new(self.asset, self.principal, borrower).with_context(context))
    }
}

/// Callback data carrying `steps` through the lender.
pub fn encode_steps(steps: &[Step]) -> Result<Bytes, ArbError> {
    serde_json::to_vec(steps)
        .map(Bytes::from)
        .map_err(|e| ArbError::Config(format!("Failed to encode steps: {e}")))
}

pub fn decode_steps(data: &[u8]) -> Result<Vec<Step>, ArbError> {
    serde_json::from_slice(data)
        .map_err(|e| ArbError::VenueReverted(format!("malformed callback data: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "lender": "0x1111111111111111111111111111111111111111",
        "asset": "0x0101010101010101010101010101010101010101",
        "principal": "0x186a0",
        "steps": [
            {
                "kind": "swap",
                "router": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "path": [
                    { "address": "0x0101010101010101010101010101010101010101" },
                    { "address": "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0", "fee_on_transfer": true }
                ],
                "amount": { "exact": "0x186a0" }
            },
            {
                "kind": "debond",
                "index": "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0",
                "distribution": [
                    { "asset": "0x0101010101010101010101010101010101010101", "percentage": 100 }
                ],
                "amount": "capped"
            }
        ]
    }"#;

    #[test]
    fn loan_request_carries_steps() {
        let plan = CyclePlan::from_json(PLAN).unwrap();
        let request = plan.loan_request(Address::repeat_byte(0x22)).unwrap();
        assert_eq!(request.principal, plan.principal);
        assert_eq!(decode_steps(&request.context).unwrap(), plan.steps);

        assert!(matches!(
            decode_steps(b"not steps"),
            Err(ArbError::VenueReverted(_))
        ));
    }

    #[test]
    fn parses_plan_file() {
        let plan = CyclePlan::from_json(PLAN).unwrap();
        assert_eq!(plan.principal, U256::from(100_000));
        assert_eq!(plan.deadline_bound_secs, 1800);
        assert_eq!(plan.steps.len(), 2);
        match &plan.steps[0] {
            Step::Swap { path, amount, min_out, .. } => {
                assert!(path.has_fee_on_transfer());
                assert_eq!(*amount, StepAmount::Exact(U256::from(100_000)));
                assert_eq!(*min_out, U256::ZERO);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!(matches!(
            plan.steps[1],
            Step::Debond {
                amount: StepAmount::Capped,
                ..
            }
        ));
    }

    #[test]
    fn rejects_plan_that_cannot_repay() {
        let json = PLAN.replace(
            r#"{ "asset": "0x0101010101010101010101010101010101010101", "percentage": 100 }"#,
            r#"{ "asset": "0x0202020202020202020202020202020202020202", "percentage": 100 }"#,
        );
        assert!(matches!(
            CyclePlan::from_json(&json),
            Err(ArbError::Config(_))
        ));
    }

    #[test]
    fn rejects_bad_distribution_in_file() {
        let json = PLAN.replace(r#""percentage": 100"#, r#""percentage": 90"#);
        assert!(CyclePlan::from_json(&json).is_err());
    }

    #[test]
    fn step_amount_resolution() {
        let bal = U256::from(700);
        assert_eq!(StepAmount::Balance.resolve(bal, None), bal);
        assert_eq!(
            StepAmount::Exact(U256::from(5)).resolve(bal, None),
            U256::from(5)
        );
        assert_eq!(
            StepAmount::Capped.resolve(bal, Some(U256::from(500))),
            U256::from(500)
        );
        assert_eq!(StepAmount::Capped.resolve(bal, Some(U256::MAX)), bal);
    }
}
