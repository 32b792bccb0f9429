// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Contract bindings and calldata for the deployed arbitrage contract.

use crate::arbitrage::{CyclePlan, Step, StepAmount};
use crate::flash::CallbackInterface;
use crate::recovery::RecoveryMethod;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[sol(rpc)]
    interface IFlashArbitrage {
        struct ArbStep {
            uint8 kind;
            address venue;
            address[] path;
            bool feeOnTransfer;
            address[] assets;
            uint8[] percentages;
            uint8 amountMode;
            uint256 amount;
            uint256 minOut;
        }

        function executeArbitrage(
            address lender,
            address asset,
            uint256 amount,
            ArbStep[] steps,
            uint256 deadline
        ) external;

        function withdraw(address token) external;
        function emergencyWithdraw(address token) external;
        function owner() external view returns (address);
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }

    interface ILiquidityReceiver {
        function onLiquidityReceived(address asset, uint256 amount, uint256 fee, bytes data) external;
    }

    interface IFlashMintReceiver {
        function receiveFlashMint(address asset, uint256 amount, uint256 fee, bytes data) external;
    }

    interface IGenericCallback {
        function callback(bytes data) external;
    }
}

const STEP_SWAP: u8 = 0;
const STEP_DEBOND: u8 = 1;

const AMOUNT_EXACT: u8 = 0;
const AMOUNT_BALANCE: u8 = 1;
const AMOUNT_CAPPED: u8 = 2;

/// 4-byte selector a lender calls on the borrower for this interface.
pub fn callback_selector(interface: CallbackInterface) -> [u8; 4] {
    match interface {
        CallbackInterface::OnLiquidityReceived => {
            ILiquidityReceiver::onLiquidityReceivedCall::SELECTOR
        }
        CallbackInterface::ReceiveFlashMint => IFlashMintReceiver::receiveFlashMintCall::SELECTOR,
        CallbackInterface::Callback => IGenericCallback::callbackCall::SELECTOR,
    }
}

/// Whether deployed bytecode dispatches on `selector`.
///
/// Solidity dispatchers compare against `PUSH4 <selector>`, so the selector
/// appears verbatim in the runtime code.
pub fn code_exposes(code: &[u8], selector: [u8; 4]) -> bool {
    code.windows(5).any(|w| w[0] == 0x63 && w[1..] == selector)
}

fn encode_amount(amount: &StepAmount) -> (u8, U256) {
    match amount {
        StepAmount::Exact(n) => (AMOUNT_EXACT, *n),
        StepAmount::Balance => (AMOUNT_BALANCE, U256::ZERO),
        StepAmount::Capped => (AMOUNT_CAPPED, U256::ZERO),
    }
}

fn encode_step(step: &Step) -> IFlashArbitrage::ArbStep {
    match step {
        Step::Swap {
            router,
            path,
            amount,
            min_out,
        } => {
            let (mode, amount) = encode_amount(amount);
            IFlashArbitrage::ArbStep {
                kind: STEP_SWAP,
                venue: *router,
                path: path.addresses(),
                feeOnTransfer: path.has_fee_on_transfer(),
                assets: Vec::new(),
                percentages: Vec::new(),
                amountMode: mode,
                amount,
                minOut: *min_out,
            }
        }
        Step::Debond {
            index,
            distribution,
            amount,
        } => {
            let (mode, amount) = encode_amount(amount);
            IFlashArbitrage::ArbStep {
                kind: STEP_DEBOND,
                venue: *index,
                path: Vec::new(),
                feeOnTransfer: false,
                assets: distribution.assets(),
                percentages: distribution.percentages(),
                amountMode: mode,
                amount,
                minOut: U256::ZERO,
            }
        }
    }
}

/// `executeArbitrage` calldata for `plan` with an absolute `deadline`.
pub fn execute_calldata(plan: &CyclePlan, deadline: u64) -> Bytes {
    IFlashArbitrage::executeArbitrageCall {
        lender: plan.lender,
        asset: plan.asset,
        amount: plan.principal,
        steps: plan.steps.iter().map(encode_step).collect(),
        deadline: U256::from(deadline),
    }
    .abi_encode()
    .into()
}

pub fn recovery_calldata(method: RecoveryMethod, token: Address) -> Bytes {
    let data = match method {
        RecoveryMethod::Withdraw => IFlashArbitrage::withdrawCall { token }.abi_encode(),
        RecoveryMethod::EmergencyWithdraw => {
            IFlashArbitrage::emergencyWithdrawCall { token }.abi_encode()
        }
    };
    data.into()
}
