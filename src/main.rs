//! Command line entry point: execute a single pump.fun trade.
//!
//! Usage: pump-trader <buy|sell> <MINT> [AMOUNT] [--no-wait]
//!
//! AMOUNT is SOL to spend for a buy and whole tokens to sell for a sell. Without it a
//! buy spends BUY_AMOUNT and a sell liquidates the whole balance.

use anyhow::{bail, Context, Result};
use pump_trader::chain::pubkeys::TOKEN_DECIMALS;
use pump_trader::chain::{BondingCurveManager, SolanaClient, TransactionSigner};
use pump_trader::trading::pricing::{sol_to_lamports, ui_to_raw_amount};
use pump_trader::trading::{
    ConfirmationMode, ConfirmationMonitor, ExecutionContext, ExecutionSettings, TokenBuyer,
    TokenSeller, TradeDirection, TradeExecutor, TradeIntent, Trader,
};
use pump_trader::{TokenInfo, TraderConfig};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

struct Command {
    direction: TradeDirection,
    mint: Pubkey,
    amount: Option<Decimal>,
    confirmation: ConfirmationMode,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut positional = Vec::new();
    let mut confirmation = ConfirmationMode::Await;
    for arg in args {
        match arg.as_str() {
            "--no-wait" => confirmation = ConfirmationMode::FireAndForget,
            _ => positional.push(arg.as_str()),
        }
    }

    let (direction, mint, amount) = match positional.as_slice() {
        [direction, mint] => (*direction, *mint, None),
        [direction, mint, amount] => (*direction, *mint, Some(*amount)),
        _ => bail!("usage: pump-trader <buy|sell> <MINT> [AMOUNT] [--no-wait]"),
    };

    let direction = match direction {
        "buy" => TradeDirection::Buy,
        "sell" => TradeDirection::Sell,
        other => bail!("unknown direction '{}', expected buy or sell", other),
    };
    let mint = Pubkey::from_str(mint).with_context(|| format!("invalid mint address '{}'", mint))?;
    let amount = amount
        .map(|a| Decimal::from_str(a).with_context(|| format!("invalid amount '{}'", a)))
        .transpose()?;

    Ok(Command {
        direction,
        mint,
        amount,
        confirmation,
    })
}

fn build_intent(command: &Command, config: &TraderConfig) -> Result<TradeIntent> {
    let intent = match (command.direction, command.amount) {
        (TradeDirection::Buy, Some(sol)) => {
            TradeIntent::buy(sol_to_lamports(sol).context("invalid SOL amount")?, config.buy_slippage)
        }
        (TradeDirection::Buy, None) => TradeIntent::buy_default(config.buy_slippage),
        (TradeDirection::Sell, Some(tokens)) => TradeIntent::sell(
            ui_to_raw_amount(tokens, TOKEN_DECIMALS).context("invalid token amount")?,
            config.sell_slippage,
        ),
        (TradeDirection::Sell, None) => TradeIntent::sell_all(config.sell_slippage),
    };
    Ok(intent
        .with_max_retries(config.max_retries)
        .with_confirmation(command.confirmation))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = TraderConfig::from_env()?;
    config.validate()?;
    let wallet = config.wallet()?;
    info!("Trading wallet: {}", wallet.pubkey());

    let client = Arc::new(SolanaClient::from_config(&config));
    let curve_reader = Arc::new(BondingCurveManager::new(client.clone()));
    let mut ctx = ExecutionContext::new(
        client.clone(),
        Arc::new(wallet),
        curve_reader,
        ExecutionSettings::from_config(&config)?,
    );

    // Fire-and-forget trades are followed until they settle before the process exits
    let mut monitor_handle = None;
    let mut update_receiver = None;
    if command.confirmation == ConfirmationMode::FireAndForget {
        let (pending_sender, pending_receiver) = mpsc::channel(16);
        let (update_sender, updates) = mpsc::channel(16);
        let monitor =
            ConfirmationMonitor::new(client.clone(), update_sender, config.confirm_poll_interval_ms);
        monitor_handle = Some(tokio::spawn(monitor.run(pending_receiver)));
        update_receiver = Some(updates);
        ctx = ctx.with_monitor(pending_sender);
    }

    let token = TokenInfo::from_mint(command.mint);
    let intent = build_intent(&command, &config)?;
    let span = info_span!("trade", direction = %command.direction, mint = %command.mint);
    let executor = match command.direction {
        TradeDirection::Buy => TradeExecutor::Buy(TokenBuyer::with_span(ctx, span)),
        TradeDirection::Sell => TradeExecutor::Sell(TokenSeller::with_span(ctx, span)),
    };

    let result = executor.execute(&token, &intent).await;
    drop(executor);

    if let (Some(handle), Some(mut updates)) = (monitor_handle, update_receiver) {
        while let Some((signature, settled)) = updates.recv().await {
            match settled.error() {
                None => info!("Trade {} settled", signature),
                Some(err) => warn!("Trade {} did not settle: {}", signature, err),
            }
        }
        handle.await.context("confirmation monitor panicked")?;
    }

    if let Some(err) = result.error() {
        bail!("{} failed: {}", command.direction, err);
    }
    Ok(())
}
