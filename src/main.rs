// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flash Arb - borrow, convert and repay in one atomic cycle.

use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::Context;
use clap::{Parser, Subcommand};
use flash_arb::arbitrage::{simulate, CyclePlan, SimulationState};
use flash_arb::config::Config;
use flash_arb::recovery::{RecoveryMethod, Withdrawal};
use flash_arb::rpc::{create_provider, AlloyGateway, ChainOrchestrator};
use flash_arb::ArbError;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flash-arb", version, about = "Flash-liquidity arbitrage client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dry-run a plan with eth_call, then submit it.
    Run {
        #[arg(long)]
        plan: PathBuf,
    },
    /// Execute a plan against an offline market snapshot.
    Simulate {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long)]
        state: PathBuf,
    },
    /// Withdraw the contract's balance of an asset to its owner.
    Recover {
        #[arg(long)]
        asset: Address,
        /// Use emergencyWithdraw instead of withdraw.
        #[arg(long)]
        emergency: bool,
    },
    /// Check the deployed contract exposes the configured callback.
    CheckInterface,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr.with_max_level(Level::WARN).or_else(std::io::stdout))
        .init();
}

fn load_plan(path: &Path, config: &Config) -> anyhow::Result<CyclePlan> {
    let mut plan =
        CyclePlan::load(path).with_context(|| format!("loading plan {}", path.display()))?;
    if plan.deadline_bound_secs > config.deadline_bound_secs {
        warn!(
            "Plan deadline bound {}s exceeds DEADLINE_BOUND_SECS, using {}s",
            plan.deadline_bound_secs, config.deadline_bound_secs
        );
        plan.deadline_bound_secs = config.deadline_bound_secs;
    }
    Ok(plan)
}

async fn connect(
    config: &Config,
) -> anyhow::Result<ChainOrchestrator<AlloyGateway<impl Provider + Clone + 'static>>> {
    let (provider, signer) = create_provider(&config.profile, config.private_key()?)?;
    config.check_signer(signer)?;
    let gateway = AlloyGateway::connect(provider, signer, config.profile.clone()).await?;
    Ok(ChainOrchestrator::new(
        gateway,
        config.arb_contract()?,
        config.callback_interface,
        config.profile.clone(),
    ))
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = Config::from_env()?;
    info!("🚀 Flash Arb starting on {}", config.profile);

    match cli.command {
        Command::Run { plan } => {
            let plan = load_plan(&plan, &config)?;
            let orchestrator = connect(&config).await?;
            let outcome = orchestrator.run_cycle(&plan).await;
            info!("📊 Outcome: {}", outcome);
            Ok(outcome.exit_code())
        }
        Command::Simulate { plan, state } => {
            let plan = load_plan(&plan, &config)?;
            let state = SimulationState::load(&state)
                .with_context(|| format!("loading state {}", state.display()))?;
            let report = simulate(&state, &plan, &config.profile)?;
            info!("📊 Outcome: {}, profit {}", report.outcome, report.profit);
            Ok(report.outcome.exit_code())
        }
        Command::Recover { asset, emergency } => {
            let method = if emergency {
                RecoveryMethod::EmergencyWithdraw
            } else {
                RecoveryMethod::Withdraw
            };
            let orchestrator = connect(&config).await?;
            match orchestrator.recover(asset, method).await {
                Ok(Withdrawal::Withdrawn(amount)) => info!("✅ Withdrew {} of {}", amount, asset),
                Ok(Withdrawal::NothingToWithdraw) => info!("✅ Nothing to withdraw"),
                Err(e) => {
                    error!("❌ Recovery failed: {}", e);
                    return Ok(e.exit_code());
                }
            }
            Ok(0)
        }
        Command::CheckInterface => {
            let orchestrator = connect(&config).await?;
            orchestrator.check_interface().await?;
            info!(
                "✅ {} exposes {}",
                orchestrator.contract(),
                config.callback_interface
            );
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {:#}", e);
            e.downcast_ref::<ArbError>().map_or(3, ArbError::exit_code)
        }
    };
    std::process::exit(code);
}
